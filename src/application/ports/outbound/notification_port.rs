//! Deployment notification port

use async_trait::async_trait;

use crate::application::dto::DeploymentNotification;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Failed to publish deployment notification: {0}")]
    Publish(String),
}

#[async_trait]
pub trait DeploymentNotifierPort: Send + Sync {
    async fn publish(&self, notification: &DeploymentNotification) -> Result<(), NotificationError>;
}
