//! Auth chain - ordered identity proof binding a payload to a wallet

use serde::{Deserialize, Serialize};

/// Kind of a link in an auth chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthLinkType {
    #[serde(rename = "SIGNER")]
    Signer,
    #[serde(rename = "ECDSA_EPHEMERAL")]
    EcdsaEphemeral,
    #[serde(rename = "ECDSA_SIGNED_ENTITY")]
    EcdsaSignedEntity,
    #[serde(rename = "ECDSA_EIP_1654_EPHEMERAL")]
    Eip1654Ephemeral,
    #[serde(rename = "ECDSA_EIP_1654_SIGNED_ENTITY")]
    Eip1654SignedEntity,
}

impl AuthLinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthLinkType::Signer => "SIGNER",
            AuthLinkType::EcdsaEphemeral => "ECDSA_EPHEMERAL",
            AuthLinkType::EcdsaSignedEntity => "ECDSA_SIGNED_ENTITY",
            AuthLinkType::Eip1654Ephemeral => "ECDSA_EIP_1654_EPHEMERAL",
            AuthLinkType::Eip1654SignedEntity => "ECDSA_EIP_1654_SIGNED_ENTITY",
        }
    }
}

impl std::fmt::Display for AuthLinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLink {
    #[serde(rename = "type")]
    pub link_type: AuthLinkType,
    pub payload: String,
    #[serde(default)]
    pub signature: String,
}

impl AuthLink {
    pub fn signer(address: impl Into<String>) -> Self {
        Self {
            link_type: AuthLinkType::Signer,
            payload: address.into(),
            signature: String::new(),
        }
    }
}

/// Ordered list of auth links. Link 0 names the signing wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthChain(Vec<AuthLink>);

impl AuthChain {
    pub const MAX_LINKS: usize = 10;

    pub fn new(links: Vec<AuthLink>) -> Self {
        Self(links)
    }

    pub fn links(&self) -> &[AuthLink] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Payload of the first link, the wallet claiming authorship
    pub fn signer(&self) -> Option<&str> {
        self.0.first().map(|link| link.payload.as_str())
    }
}

impl From<Vec<AuthLink>> for AuthChain {
    fn from(links: Vec<AuthLink>) -> Self {
        Self(links)
    }
}
