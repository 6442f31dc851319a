//! Signed fetch - requests authenticated by an auth chain in headers
//!
//! The client signs `<method>:<path>:<timestamp>:<metadata>` (lower-cased)
//! and sends the chain as `x-identity-auth-chain-<n>` headers, one JSON link
//! each, next to `x-identity-timestamp` and `x-identity-metadata`.

use axum::http::{HeaderMap, Method};
use chrono::{DateTime, Utc};

use crate::application::services::validation::signature::verify_signed_payload;
use crate::domain::value_objects::{AuthChain, AuthLink};

const AUTH_CHAIN_HEADER_PREFIX: &str = "x-identity-auth-chain-";
const TIMESTAMP_HEADER: &str = "x-identity-timestamp";
const METADATA_HEADER: &str = "x-identity-metadata";
const MAX_AGE_MS: i64 = 60_000;

/// Verified identity of a signed request
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Lower-cased wallet that signed
    pub signer: String,
    pub metadata: serde_json::Value,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn auth_chain(headers: &HeaderMap) -> Result<AuthChain, String> {
    let mut links = Vec::new();
    while let Some(raw) = header(headers, &format!("{AUTH_CHAIN_HEADER_PREFIX}{}", links.len())) {
        let link: AuthLink =
            serde_json::from_str(raw).map_err(|_| "Invalid Auth Chain".to_string())?;
        links.push(link);
        if links.len() > AuthChain::MAX_LINKS {
            return Err("Invalid Auth Chain".to_string());
        }
    }
    if links.is_empty() {
        return Err("Invalid Auth Chain".to_string());
    }
    Ok(AuthChain::new(links))
}

pub fn signed_payload(method: &Method, path: &str, timestamp: i64, metadata: &str) -> String {
    format!("{method}:{path}:{timestamp}:{metadata}").to_lowercase()
}

/// Check the signature headers of a request for `method` on `path`
pub fn verify(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<SignedRequest, String> {
    let chain = auth_chain(headers)?;
    let timestamp: i64 = header(headers, TIMESTAMP_HEADER)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| "Invalid Timestamp".to_string())?;
    if (now.timestamp_millis() - timestamp).abs() > MAX_AGE_MS {
        return Err("Expired signature".to_string());
    }
    let metadata = header(headers, METADATA_HEADER).unwrap_or("{}");

    let signer = verify_signed_payload(
        &signed_payload(method, path, timestamp, metadata),
        &chain,
        now,
    )?;
    let metadata = serde_json::from_str(metadata).map_err(|_| "Invalid metadata".to_string())?;

    Ok(SignedRequest { signer, metadata })
}
