// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire records exchanged with the coordinator, connector and subgraph.

use serde::{Deserialize, Serialize};

/// All-zero address the coordinator uses for "no token".
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// One coordinator-allocated deposit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forwarder {
    pub address: String,
}

/// Token linked to a parent's sync scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub token: String,
}

impl TokenConfig {
    /// Whether this config carries the zero-address "no token" sentinel.
    pub fn is_zero_token(&self) -> bool {
        self.token.eq_ignore_ascii_case(ZERO_ADDRESS)
    }
}

/// Transfer endpoint as reported by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAddress {
    pub value: String,
    /// Whether the connector tracks this address.
    pub owned: bool,
}

/// An observed on-chain value movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: u64,
    pub from_address: TransferAddress,
    pub to_address: TransferAddress,
    /// Integer amount in the token's smallest unit, as sent by the server.
    pub value: String,
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_metadata: Option<serde_json::Value>,
    pub block: u64,
    pub tx_hash: String,
    pub tx_index: u64,
    pub index: u64,
    pub dropped: bool,
    pub confirmations: u64,
    #[serde(default)]
    pub failed: bool,
}

/// Decoded contract log stored by the connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent<T> {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub topics: Vec<String>,
    pub data: T,
    pub raw_data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub block_hash: String,
    pub log_index: u64,
    pub removed: bool,
}

/// Ownership reference nested in a whitelisted asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRef {
    pub id: String,
}

/// Token approved for tracking under an ownership id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistedAsset {
    pub id: String,
    pub address: String,
    pub ownership: OwnershipRef,
}

/// Result ordering for connector list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sort {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

/// Filters for `GET contract-events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEventsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// Event name, e.g. `Transfer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Filters for `GET transfers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}
