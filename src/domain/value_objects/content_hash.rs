//! Content addressing
//!
//! Content is keyed by a CIDv1 string: raw codec, sha2-256 multihash,
//! base32 (lower, unpadded) multibase. Legacy CIDv0 (`Qm...`) keys are not
//! produced and are rejected by [`is_cid_v1`].

use sha2::{Digest, Sha256};

const CID_V1: u8 = 0x01;
const RAW_CODEC: u8 = 0x55;
const SHA2_256: u8 = 0x12;
const SHA2_256_LEN: u8 = 0x20;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Computes the CIDv1 content hash of `bytes`
pub fn hash_v1(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);

    let mut cid = Vec::with_capacity(4 + digest.len());
    cid.extend_from_slice(&[CID_V1, RAW_CODEC, SHA2_256, SHA2_256_LEN]);
    cid.extend_from_slice(&digest);

    let mut encoded = String::with_capacity(1 + (cid.len() * 8).div_ceil(5));
    encoded.push('b');
    encoded.push_str(&base32_lower(&cid));
    encoded
}

/// Returns true for base32 CIDv1 strings
pub fn is_cid_v1(hash: &str) -> bool {
    let Some(body) = hash.strip_prefix('b') else {
        return false;
    };
    body.len() >= 58 && body.bytes().all(|c| BASE32_ALPHABET.contains(&c))
}

fn base32_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            let index = (buffer >> (bits - 5)) & 0x1f;
            out.push(BASE32_ALPHABET[index as usize] as char);
            bits -= 5;
        }
    }
    if bits > 0 {
        let index = (buffer << (5 - bits)) & 0x1f;
        out.push(BASE32_ALPHABET[index as usize] as char);
    }

    out
}
