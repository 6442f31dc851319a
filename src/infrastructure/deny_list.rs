//! Banned names fetched from the lists service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::outbound::{BannedNamesPort, DenyListError};

pub struct HttpBannedNames {
    client: Client,
    lists_url: String,
}

impl HttpBannedNames {
    pub fn new(client: Client, lists_url: &str) -> Self {
        Self {
            client,
            lists_url: lists_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BannedNamesResponse {
    data: Vec<String>,
}

#[async_trait]
impl BannedNamesPort for HttpBannedNames {
    async fn fetch_banned_names(&self) -> Result<Vec<String>, DenyListError> {
        let response = self
            .client
            .post(format!("{}/banned-names", self.lists_url))
            .send()
            .await
            .map_err(|e| DenyListError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DenyListError::Fetch(format!(
                "lists service returned {}",
                response.status()
            )));
        }

        let list: BannedNamesResponse = response
            .json()
            .await
            .map_err(|e| DenyListError::Fetch(e.to_string()))?;
        debug!(count = list.data.len(), "Fetched banned names");
        Ok(list.data)
    }
}
