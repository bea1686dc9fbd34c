// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subgraph client: whitelisted assets lookup over GraphQL.

use alloy::primitives::U256;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::types::WhitelistedAsset;

/// Whitelisted assets registered under one ownership.
pub const GET_WHITELISTED_ASSETS: &str = r#"
  query GetWhitelistedAssets($ownershipId: String) {
    whitelistedAssets(where: { ownership: $ownershipId }) {
      id
      address
      ownership {
        id
      }
    }
  }
"#;

#[derive(Debug, thiserror::Error)]
pub enum SubgraphError {
    #[error("Subgraph request failed: {0}")]
    Request(String),

    #[error("Subgraph returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Subgraph response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Subgraph query failed: {0}")]
    GraphQl(String),
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhitelistedAssetsData {
    whitelisted_assets: Vec<WhitelistedAsset>,
}

#[derive(Debug, Clone)]
pub struct SubgraphClient {
    url: String,
    http: Client,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every asset whitelisted for `ownership_id`. The subgraph returns the
    /// full set in one response.
    pub async fn get_whitelisted_assets(
        &self,
        ownership_id: U256,
    ) -> Result<Vec<WhitelistedAsset>, SubgraphError> {
        debug!(%ownership_id, "Querying whitelisted assets");

        let payload = whitelisted_assets_request(ownership_id);

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| SubgraphError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(SubgraphError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphQlResponse<WhitelistedAssetsData> = response
            .json()
            .await
            .map_err(|e| SubgraphError::InvalidResponse(e.to_string()))?;

        into_data(body).map(|data| data.whitelisted_assets)
    }
}

/// Request body for [`GET_WHITELISTED_ASSETS`]. The ownership id travels as
/// its decimal string.
fn whitelisted_assets_request(ownership_id: U256) -> serde_json::Value {
    json!({
        "query": GET_WHITELISTED_ASSETS,
        "variables": { "ownershipId": ownership_id.to_string() },
    })
}

fn into_data<T>(response: GraphQlResponse<T>) -> Result<T, SubgraphError> {
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(SubgraphError::GraphQl(messages.join("; ")));
    }
    response
        .data
        .ok_or_else(|| SubgraphError::InvalidResponse("missing data in response".to_string()))
}
