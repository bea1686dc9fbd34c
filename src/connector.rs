// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connector client: address/token ingestion and transfer queries.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use crate::paging::Page;
use crate::types::{ContractEvent, ContractEventsQuery, Transfer, TransfersQuery};

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Connector request failed: {0}")]
    Request(String),

    #[error("Connector returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connector response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastBlockResponse {
    block_number: u64,
}

/// Client for a Curra connector instance.
#[derive(Debug, Clone)]
pub struct ConnectorClient {
    base_url: String,
    http: Client,
}

impl ConnectorClient {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON-RPC endpoint of the node behind this connector.
    pub fn node_rpc_url(&self) -> String {
        format!("{}/node/rpc", self.base_url)
    }

    /// Start tracking `address`. Importing a known address is a no-op.
    pub async fn import_address(&self, address: &str) -> Result<(), ConnectorError> {
        self.send_ignoring_body(
            self.request(Method::POST, "addresses")
                .json(&json!({ "value": address })),
            "addresses",
        )
        .await
    }

    /// Start tracking transfers of the token at `address`.
    pub async fn import_token(&self, address: &str) -> Result<(), ConnectorError> {
        self.send_ignoring_body(
            self.request(Method::POST, "tokens")
                .json(&json!({ "address": address })),
            "tokens",
        )
        .await
    }

    /// Latest block the connector has processed.
    pub async fn get_last_block(&self) -> Result<u64, ConnectorError> {
        let response: LastBlockResponse = self
            .send(self.request(Method::GET, "blocks/last"), "blocks/last")
            .await?;
        Ok(response.block_number)
    }

    /// Decoded contract events, `data` deserialized into `T`.
    pub async fn get_contract_events<T: DeserializeOwned>(
        &self,
        query: &ContractEventsQuery,
    ) -> Result<Page<ContractEvent<T>>, ConnectorError> {
        self.send(
            self.request(Method::GET, "contract-events").query(query),
            "contract-events",
        )
        .await
    }

    pub async fn get_transfers(
        &self,
        query: &TransfersQuery,
    ) -> Result<Vec<Transfer>, ConnectorError> {
        self.send(
            self.request(Method::GET, "transfers").query(query),
            "transfers",
        )
        .await
    }

    /// Whether the transfer lands on an address the connector tracks.
    pub fn is_incoming_transfer(transfer: &Transfer) -> bool {
        transfer.to_address.owned
    }

    /// Whether the transfer moves a strictly positive amount.
    ///
    /// Malformed values count as zero rather than failing.
    pub fn is_non_zero_transfer(transfer: &Transfer) -> bool {
        is_positive_integer_prefix(&transfer.value)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .header("Content-Type", "application/json")
    }

    async fn checked(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ConnectorError> {
        debug!(path, "Connector request");
        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::Request(format!("{path} failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ConnectorError> {
        self.checked(request, path)
            .await?
            .json()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(format!("{path} invalid JSON: {e}")))
    }

    async fn send_ignoring_body(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<(), ConnectorError> {
        self.checked(request, path).await.map(|_| ())
    }
}

/// Integer-prefix positivity check for server-provided amounts.
///
/// Leading whitespace and an optional sign are accepted, then either a
/// `0x` hex prefix or decimal digits; parsing stops at the first character
/// outside the radix. The value is positive iff the sign is not `-` and at
/// least one parsed digit is non-zero. No digits means "not a number",
/// which is not positive. Amounts of any width are handled since only
/// the digits are inspected.
fn is_positive_integer_prefix(raw: &str) -> bool {
    let s = raw.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (digits, radix) = match s.get(..2) {
        Some("0x") | Some("0X") => (&s[2..], 16),
        _ => (s, 10),
    };

    !negative
        && digits
            .chars()
            .map_while(|c| c.to_digit(radix))
            .any(|d| d != 0)
}
