// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::connector::ConnectorError;
use crate::coordinator::CoordinatorError;
use crate::subgraph::SubgraphError;

/// Errors returned by the [`Curra`](crate::Curra) facade.
///
/// Precondition variants are raised before any network call. Remote
/// failures keep the originating client's error so the HTTP status and
/// body stay available to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CurraError {
    #[error("Ownership id should be provided in Curra options or in method argument")]
    MissingOwnershipId,

    #[error("Destination address should be provided in Curra options or in method argument")]
    MissingDestination,

    #[error("Connector url must be provided in Curra options to use {0}")]
    ConnectorNotConfigured(&'static str),

    #[error("Invalid ownership id: {0}")]
    InvalidOwnershipId(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Subgraph(#[from] SubgraphError),

    /// The coordinator allocated `address` but the connector import failed.
    /// The allocation is not rolled back.
    #[error("Address {address} was allocated but could not be imported: {source}")]
    AddressNotImported {
        address: String,
        #[source]
        source: ConnectorError,
    },
}

impl CurraError {
    /// Address the coordinator already allocated, if the failure happened
    /// after allocation.
    pub fn allocated_address(&self) -> Option<&str> {
        match self {
            Self::AddressNotImported { address, .. } => Some(address),
            _ => None,
        }
    }

    /// Whether the error was raised locally before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingOwnershipId
                | Self::MissingDestination
                | Self::ConnectorNotConfigured(_)
                | Self::InvalidOwnershipId(_)
        )
    }
}
