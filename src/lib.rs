// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Curra SDK - deposit addresses and connector synchronization
//!
//! This crate wraps the three remote Curra services behind the [`Curra`]
//! facade: the coordinator derives deposit addresses through signed
//! requests, the connector ingests addresses and tokens for transfer
//! tracking, and the subgraph lists whitelisted assets.
//!
//! ## Modules
//!
//! - `coordinator` - Signed address derivation and forwarder listing
//! - `connector` - Address/token ingestion and transfer queries
//! - `subgraph` - Whitelisted assets over GraphQL
//! - `curra` - Facade and sync orchestration
//! - `paging` - Paged fetch and sequential import loops
//! - `signer` - Challenge signing capability and key loading

pub mod config;
pub mod connector;
pub mod coordinator;
pub mod curra;
pub mod error;
pub mod paging;
pub mod signer;
pub mod subgraph;
pub mod types;

pub use alloy::primitives::{Address, Signature, U256};
pub use alloy::signers::local::PrivateKeySigner;

pub use config::{Blockchain, CurraOptions};
pub use connector::{ConnectorClient, ConnectorError};
pub use coordinator::{CoordinatorClient, CoordinatorError};
pub use curra::{AddressParams, Curra};
pub use error::CurraError;
pub use paging::{IncompletePage, Page};
pub use signer::{ChallengeSigner, SignerError};
pub use subgraph::{SubgraphClient, SubgraphError};
pub use types::*;
