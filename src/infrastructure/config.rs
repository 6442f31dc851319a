//! Application configuration

use std::env;
use std::str::FromStr;

use alloy::primitives::{address, Address};
use anyhow::{anyhow, bail, Context, Result};

use crate::application::services::name_ownership::EnsContracts;

/// How `.dcl.eth` names are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameValidatorStrategy {
    /// Marketplace subgraph
    Subgraph,
    /// DCL registrar contract
    OnChain,
}

impl FromStr for NameValidatorStrategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "DCL_NAME_CHECKER" => Ok(Self::Subgraph),
            "ON_CHAIN_DCL_NAME_CHECKER" => Ok(Self::OnChain),
            other => Err(anyhow!("Invalid nameValidatorStrategy selected: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthNetwork {
    Mainnet,
}

impl FromStr for EthNetwork {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "mainnet" => Ok(Self::Mainnet),
            other => Err(anyhow!("Invalid ETH_NETWORK: {other}")),
        }
    }
}

impl EthNetwork {
    pub fn ens_contracts(&self) -> EnsContracts {
        match self {
            EthNetwork::Mainnet => EnsContracts {
                base_registrar: address!("57f1887a8bf19b14fc0df6fd9b2acc9af147ea85"),
                name_wrapper: address!("d4416b13d2b3a9abae7acd5d6c2bbdbe25686401"),
            },
        }
    }

    pub fn dcl_registrar(&self) -> Address {
        match self {
            EthNetwork::Mainnet => address!("2a187453064356c898cae034eaed119e1663acb8"),
        }
    }
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    /// Public base URL of this server, announced in deployment notifications
    pub base_url: String,
    pub database_url: String,
    pub storage_folder: String,
    pub deployment_ttl_ms: i64,

    pub name_validator: NameValidatorStrategy,
    pub rpc_url: String,
    pub eth_network: EthNetwork,
    pub allow_ens_domains: bool,
    pub marketplace_subgraph_url: Option<String>,

    pub dcl_lists_url: Option<String>,
    pub notification_url: Option<String>,

    pub max_parcels: usize,
    pub max_size_mb: u64,
    pub allow_sdk6: bool,
    pub validate_sdk_version: bool,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {value:?}: {e}")),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let server_port: u16 = parsed("HTTP_SERVER_PORT", 3000)?;
        let name_validator: NameValidatorStrategy = env::var("NAME_VALIDATOR")
            .context("NAME_VALIDATOR environment variable is required")?
            .parse()?;
        let marketplace_subgraph_url = optional("MARKETPLACE_SUBGRAPH_URL");
        if name_validator == NameValidatorStrategy::Subgraph && marketplace_subgraph_url.is_none() {
            bail!("MARKETPLACE_SUBGRAPH_URL is required when NAME_VALIDATOR=DCL_NAME_CHECKER");
        }

        Ok(Self {
            server_port,
            base_url: optional("HTTP_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{server_port}")),
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:data/worlds.db".to_string()),
            storage_folder: optional("STORAGE_FOLDER").unwrap_or_else(|| "contents".to_string()),
            deployment_ttl_ms: parsed("DEPLOYMENT_TTL", 300_000)?,

            name_validator,
            rpc_url: env::var("RPC_URL").context("RPC_URL environment variable is required")?,
            eth_network: parsed("ETH_NETWORK", EthNetwork::Mainnet)?,
            allow_ens_domains: parsed("ALLOW_ENS_DOMAINS", false)?,
            marketplace_subgraph_url,

            dcl_lists_url: optional("DCL_LISTS_URL"),
            notification_url: optional("NOTIFICATION_URL"),

            max_parcels: parsed("MAX_PARCELS", 4)?,
            max_size_mb: parsed("MAX_SIZE_MB", 100)?,
            allow_sdk6: parsed("ALLOW_SDK6", false)?,
            validate_sdk_version: parsed("VALIDATE_SDK_VERSION", false)?,
        })
    }
}
