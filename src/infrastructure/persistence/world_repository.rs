use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{RepositoryError, WorldsRepositoryPort};
use crate::domain::entities::{DeployedWorld, Entity, SceneDeployment, WorldMetadata};
use crate::domain::value_objects::Permissions;

/// World metadata rows in SQLite. JSON-shaped columns hold serde_json text.
pub struct SqliteWorldsRepository {
    pool: SqlitePool,
}

impl SqliteWorldsRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS worlds (
                name TEXT PRIMARY KEY,
                entity_id TEXT,
                deployer TEXT,
                deployment_auth_chain TEXT,
                entity TEXT,
                permissions TEXT,
                runtime_metadata TEXT,
                size INTEGER,
                owner TEXT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            )
        "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(column: Option<String>) -> Result<Option<T>, RepositoryError> {
    column
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl WorldsRepositoryPort for SqliteWorldsRepository {
    async fn get(&self, name: &str) -> Result<Option<WorldMetadata>, RepositoryError> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT entity_id, runtime_metadata, permissions FROM worlds WHERE name = ?",
        )
        .bind(name.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some((entity_id, runtime_metadata, permissions)) = row else {
            return Ok(None);
        };
        Ok(Some(WorldMetadata {
            entity_id,
            runtime_metadata: from_json(runtime_metadata)?,
            permissions: from_json(permissions)?,
        }))
    }

    async fn get_deployed_entity(&self, name: &str) -> Result<Option<Entity>, RepositoryError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT entity FROM worlds WHERE name = ?")
                .bind(name.to_lowercase())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        from_json(row.and_then(|(entity,)| entity))
    }

    async fn upsert_scene(&self, deployment: &SceneDeployment) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO worlds (name, entity_id, deployer, deployment_auth_chain, entity,
                                runtime_metadata, size, owner, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                entity_id = excluded.entity_id,
                deployer = excluded.deployer,
                deployment_auth_chain = excluded.deployment_auth_chain,
                entity = excluded.entity,
                runtime_metadata = excluded.runtime_metadata,
                size = excluded.size,
                owner = excluded.owner,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(deployment.name.to_lowercase())
        .bind(&deployment.entity.id)
        .bind(&deployment.deployer)
        .bind(to_json(&deployment.deployment_auth_chain)?)
        .bind(to_json(&deployment.entity)?)
        .bind(to_json(&deployment.runtime_metadata)?)
        .bind(deployment.size as i64)
        .bind(&deployment.owner)
        .bind(deployment.deployed_at)
        .bind(deployment.deployed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn upsert_permissions(
        &self,
        name: &str,
        permissions: &Permissions,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO worlds (name, permissions, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                permissions = excluded.permissions,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(name.to_lowercase())
        .bind(to_json(permissions)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn list_deployed(&self) -> Result<Vec<DeployedWorld>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, entity FROM worlds WHERE entity IS NOT NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter()
            .map(|(name, entity)| {
                let entity = serde_json::from_str(&entity)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
                Ok(DeployedWorld { name, entity })
            })
            .collect()
    }

    async fn list_deployed_names(&self) -> Result<Vec<String>, RepositoryError> {
        sqlx::query_scalar("SELECT name FROM worlds WHERE entity_id IS NOT NULL ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }
}
