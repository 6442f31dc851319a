//! Auth chain signature verification
//!
//! Every link after the first is an EIP-191 personal signature by the
//! current authority. `ECDSA_EPHEMERAL` links delegate authority to the
//! ephemeral address they name until their expiration; the final
//! `ECDSA_SIGNED_ENTITY` link must sign the entity id itself.

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Utc};

use crate::domain::value_objects::{AuthChain, AuthLink, AuthLinkType};

const EPHEMERAL_HEADER: &str = "Decentraland Login";
const EPHEMERAL_ADDRESS_PREFIX: &str = "Ephemeral address: ";
const EXPIRATION_PREFIX: &str = "Expiration: ";

/// Fields of an `ECDSA_EPHEMERAL` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralPayload {
    pub address: Address,
    pub expiration: DateTime<Utc>,
}

impl EphemeralPayload {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut lines = payload.lines();
        if lines.next()?.trim() != EPHEMERAL_HEADER {
            return None;
        }
        let address = lines
            .next()?
            .trim()
            .strip_prefix(EPHEMERAL_ADDRESS_PREFIX)?
            .parse::<Address>()
            .ok()?;
        let expiration = lines
            .next()?
            .trim()
            .strip_prefix(EXPIRATION_PREFIX)
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())?
            .with_timezone(&Utc);
        Some(Self {
            address,
            expiration,
        })
    }

    pub fn to_payload(&self) -> String {
        format!(
            "{EPHEMERAL_HEADER}\n{EPHEMERAL_ADDRESS_PREFIX}{}\n{EXPIRATION_PREFIX}{}",
            self.address.to_checksum(None),
            self.expiration.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        )
    }
}

fn link_error(link: &AuthLink, reason: impl std::fmt::Display) -> String {
    format!("ERROR. Link type: {}. {}.", link.link_type, reason)
}

/// Address that produced `signature` (hex, 65 bytes) over `message`
fn recover_signer(message: &str, signature: &str) -> Result<Address, String> {
    let raw = hex::decode(signature.trim_start_matches("0x"))
        .map_err(|e| format!("Invalid signature encoding: {e}"))?;
    let signature =
        Signature::try_from(raw.as_slice()).map_err(|e| format!("Invalid signature: {e}"))?;
    signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| format!("Could not recover signer: {e}"))
}

fn verify_link(link: &AuthLink, authority: Address) -> Result<(), String> {
    let signer = recover_signer(&link.payload, &link.signature).map_err(|e| link_error(link, e))?;
    if signer != authority {
        return Err(link_error(
            link,
            format!(
                "Invalid signer address. Expected: {}. Actual: {}",
                authority.to_checksum(None),
                signer.to_checksum(None)
            ),
        ));
    }
    Ok(())
}

/// Verify that `chain` authenticates `entity_id` at instant `now`
pub fn validate_signature(
    entity_id: &str,
    chain: &AuthChain,
    now: DateTime<Utc>,
) -> Result<(), String> {
    let links = chain.links();
    let Some((first, rest)) = links.split_first() else {
        return Err("Auth chain is empty".to_string());
    };
    if rest.len() + 1 > AuthChain::MAX_LINKS {
        return Err(format!(
            "Auth chain is too long: {} links, at most {} allowed",
            links.len(),
            AuthChain::MAX_LINKS
        ));
    }

    let mut authority = first
        .payload
        .parse::<Address>()
        .map_err(|_| link_error(first, format!("Invalid signer: {}", first.payload)))?;

    for (index, link) in rest.iter().enumerate() {
        let is_last = index + 1 == rest.len();
        match link.link_type {
            AuthLinkType::Signer => {
                return Err(link_error(link, "Only the first link can be a signer"));
            }
            AuthLinkType::EcdsaEphemeral => {
                if is_last {
                    return Err(link_error(link, "The chain must end signing the entity"));
                }
                verify_link(link, authority)?;
                let ephemeral = EphemeralPayload::parse(&link.payload)
                    .ok_or_else(|| link_error(link, "Malformed ephemeral payload"))?;
                if ephemeral.expiration <= now {
                    return Err(link_error(
                        link,
                        format!("Ephemeral key expired at {}", ephemeral.expiration.to_rfc3339()),
                    ));
                }
                authority = ephemeral.address;
            }
            AuthLinkType::EcdsaSignedEntity => {
                if !is_last {
                    return Err(link_error(link, "The entity must be signed by the last link"));
                }
                if link.payload != entity_id {
                    return Err(link_error(
                        link,
                        format!(
                            "Signed payload {} does not match entity id {}",
                            link.payload, entity_id
                        ),
                    ));
                }
                verify_link(link, authority)?;
            }
            AuthLinkType::Eip1654Ephemeral | AuthLinkType::Eip1654SignedEntity => {
                return Err(link_error(
                    link,
                    "Smart contract wallet signatures are not supported",
                ));
            }
        }
    }

    match rest.last() {
        Some(last) if last.link_type == AuthLinkType::EcdsaSignedEntity => Ok(()),
        _ => Err("The auth chain does not sign the entity".to_string()),
    }
}

/// Verify that `chain` signs an arbitrary `payload` (a signed request rather
/// than an entity) and return the lower-cased signer
pub fn verify_signed_payload(
    payload: &str,
    chain: &AuthChain,
    now: DateTime<Utc>,
) -> Result<String, String> {
    validate_signature(payload, chain, now)?;
    chain
        .signer()
        .map(str::to_lowercase)
        .ok_or_else(|| "Auth chain is empty".to_string())
}
