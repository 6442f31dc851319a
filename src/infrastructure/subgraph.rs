//! GraphQL client for subgraph queries

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{SubgraphError, SubgraphPort};

pub struct SubgraphClient {
    client: Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

fn parse_response(body: &str) -> Result<serde_json::Value, SubgraphError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(SubgraphError::Query(messages.join("; ")));
    }
    response
        .data
        .ok_or_else(|| SubgraphError::InvalidResponse("missing data".to_string()))
}

#[async_trait]
impl SubgraphPort for SubgraphClient {
    async fn query(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, SubgraphError> {
        let response = self
            .client
            .post(&self.url)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| SubgraphError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubgraphError::Request(format!("{status}: {error_text}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubgraphError::Request(e.to_string()))?;
        parse_response(&body)
    }
}
