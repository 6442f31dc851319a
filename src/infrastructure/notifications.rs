//! Deployment notifications posted to a webhook

use async_trait::async_trait;
use reqwest::Client;
use crate::application::dto::DeploymentNotification;
use crate::application::ports::outbound::{DeploymentNotifierPort, NotificationError};

pub struct HttpDeploymentNotifier {
    client: Client,
    url: String,
}

impl HttpDeploymentNotifier {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl DeploymentNotifierPort for HttpDeploymentNotifier {
    async fn publish(&self, notification: &DeploymentNotification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotificationError::Publish(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotificationError::Publish(format!("{status}: {error_text}")));
        }

        Ok(())
    }
}
