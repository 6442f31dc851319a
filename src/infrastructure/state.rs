//! Shared application state

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::application::ports::outbound::{
    BannedNamesPort, ContentStoragePort, DeploymentNotifierPort, EthereumRpcPort,
    NameOwnershipPort,
};
use crate::application::services::name_ownership::{
    CachingNameOwnership, EnsNameOwnership, NameOwnershipRouter, NoopNameOwnership,
    OnChainDclNameOwnership, SubgraphDclNameOwnership,
};
use crate::application::services::{
    DeploymentMetrics, DeploymentService, EntityDeployer, NameDenyList, NamePermissionChecker,
    PermissionsService, Validator, ValidatorConfig, WorldsIndexer, WorldsManager,
};
use crate::infrastructure::config::{AppConfig, NameValidatorStrategy};
use crate::infrastructure::deny_list::HttpBannedNames;
use crate::infrastructure::ethereum::JsonRpcEthereumClient;
use crate::infrastructure::limits::ConfiguredLimits;
use crate::infrastructure::notifications::HttpDeploymentNotifier;
use crate::infrastructure::persistence::SqliteWorldsRepository;
use crate::infrastructure::storage::FolderContentStorage;
use crate::infrastructure::subgraph::SubgraphClient;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub worlds: Arc<WorldsManager>,
    pub indexer: WorldsIndexer,
    pub permissions: PermissionsService,
    pub deployments: DeploymentService,
    pub metrics: Arc<DeploymentMetrics>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let http_client = Client::new();

        let connect_options = SqliteConnectOptions::from_str(&config.database_url)
            .context("DATABASE_URL is not a valid SQLite URL")?
            .create_if_missing(true);
        if let Some(parent) = connect_options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }
        let pool = SqlitePoolOptions::new()
            .connect_with(connect_options)
            .await
            .context("Failed to open SQLite database")?;
        let repository = Arc::new(SqliteWorldsRepository::new(pool).await?);

        let storage: Arc<dyn ContentStoragePort> =
            Arc::new(FolderContentStorage::new(&config.storage_folder).await?);

        let ownership = name_ownership(&config, &http_client)?;

        let banned_names = config.dcl_lists_url.as_deref().map(|url| {
            Arc::new(HttpBannedNames::new(http_client.clone(), url)) as Arc<dyn BannedNamesPort>
        });
        let deny_list = Arc::new(NameDenyList::new(banned_names));

        let worlds = Arc::new(WorldsManager::new(
            repository,
            storage.clone(),
            deny_list.clone(),
            ownership.clone(),
        ));
        let name_checker = Arc::new(NamePermissionChecker::new(ownership));
        let limits = Arc::new(ConfiguredLimits {
            max_parcels: config.max_parcels,
            max_size_mb: config.max_size_mb,
            allow_sdk6: config.allow_sdk6,
        });
        let validator = Arc::new(Validator::new(
            ValidatorConfig {
                deployment_ttl_ms: config.deployment_ttl_ms,
                validate_sdk_version: config.validate_sdk_version,
            },
            worlds.clone(),
            name_checker.clone(),
            deny_list,
            limits,
            storage.clone(),
        ));

        let notifier = config.notification_url.as_deref().map(|url| {
            Arc::new(HttpDeploymentNotifier::new(http_client.clone(), url))
                as Arc<dyn DeploymentNotifierPort>
        });
        let metrics = Arc::new(DeploymentMetrics::new());
        let deployer = Arc::new(EntityDeployer::new(
            storage.clone(),
            worlds.clone(),
            metrics.clone(),
            notifier,
        ));

        Ok(Self {
            indexer: WorldsIndexer::new(worlds.clone()),
            permissions: PermissionsService::new(worlds.clone(), name_checker),
            deployments: DeploymentService::new(storage, validator, deployer),
            worlds,
            metrics,
            config,
        })
    }
}

/// Router over the ENS and DCL resolvers selected by configuration, behind
/// the ownership cache
fn name_ownership(config: &AppConfig, http_client: &Client) -> Result<Arc<dyn NameOwnershipPort>> {
    let rpc: Arc<dyn EthereumRpcPort> =
        Arc::new(JsonRpcEthereumClient::new(http_client.clone(), &config.rpc_url));

    let dcl: Arc<dyn NameOwnershipPort> = match config.name_validator {
        NameValidatorStrategy::Subgraph => {
            let url = config
                .marketplace_subgraph_url
                .as_deref()
                .context("MARKETPLACE_SUBGRAPH_URL is required for the subgraph name checker")?;
            tracing::info!("Using subgraph DCL name checker");
            Arc::new(SubgraphDclNameOwnership::new(Arc::new(SubgraphClient::new(
                http_client.clone(),
                url,
            ))))
        }
        NameValidatorStrategy::OnChain => {
            tracing::info!("Using on-chain DCL name checker");
            Arc::new(OnChainDclNameOwnership::new(
                rpc.clone(),
                config.eth_network.dcl_registrar(),
            ))
        }
    };

    let ens: Arc<dyn NameOwnershipPort> = if config.allow_ens_domains {
        Arc::new(EnsNameOwnership::new(rpc, config.eth_network.ens_contracts()))
    } else {
        Arc::new(NoopNameOwnership)
    };

    Ok(Arc::new(CachingNameOwnership::new(Arc::new(
        NameOwnershipRouter::new(ens, dcl),
    ))))
}
