// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Curra Facade
//!
//! [`Curra`] composes the coordinator, connector and subgraph clients for one
//! blockchain and resolves per-instance defaults (ownership id, destination).
//!
//! ## Address derivation
//!
//! Deriving an address is a two-phase operation:
//! 1. The coordinator allocates the address (signed request)
//! 2. If a connector is configured, the address is imported into it
//!
//! Phase 2 failing does not undo phase 1. The caller gets
//! [`CurraError::AddressNotImported`] carrying the allocated address.
//!
//! ## Synchronization
//!
//! `sync_*` methods re-read the complete coordinator/subgraph state and
//! import every entry into the connector, sequentially and in server order.
//! [`Curra::sync`] runs the address and whitelist syncs concurrently and
//! fails if either fails.

use std::str::FromStr;

use alloy::{primitives::U256, signers::local::PrivateKeySigner};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::{normalize_base_url, Blockchain, CurraOptions};
use crate::connector::ConnectorClient;
use crate::coordinator::CoordinatorClient;
use crate::error::CurraError;
use crate::paging::{fetch_all, import_each, PAGE_LIMIT};
use crate::signer::{load_signer, ChallengeSigner};
use crate::subgraph::SubgraphClient;
use crate::types::Transfer;

/// Per-call overrides for address derivation. Unset fields fall back to the
/// instance defaults from [`CurraOptions`].
#[derive(Debug, Clone, Default)]
pub struct AddressParams {
    pub ownership_id: Option<String>,
    pub destination: Option<String>,
}

impl AddressParams {
    pub fn ownership_id(mut self, ownership_id: impl Into<String>) -> Self {
        self.ownership_id = Some(ownership_id.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Entry point of the SDK.
pub struct Curra<S = PrivateKeySigner> {
    blockchain: Blockchain,
    ownership_id: Option<U256>,
    destination: Option<String>,
    coordinator: CoordinatorClient<S>,
    connector: Option<ConnectorClient>,
    subgraph: SubgraphClient,
}

impl Curra<PrivateKeySigner> {
    /// Build a facade signing with the key in `options.private_key`.
    pub fn new(blockchain: Blockchain, options: CurraOptions) -> Result<Self, CurraError> {
        let signer = load_signer(&options.private_key)?;
        Self::with_signer(blockchain, signer, options)
    }
}

impl<S: ChallengeSigner> Curra<S> {
    /// Build a facade around an externally provided signer.
    /// `options.private_key` is ignored.
    pub fn with_signer(
        blockchain: Blockchain,
        signer: S,
        options: CurraOptions,
    ) -> Result<Self, CurraError> {
        let http = Client::new();

        let ownership_id = options
            .ownership_id
            .as_deref()
            .map(parse_ownership_id)
            .transpose()?;

        let coordinator_url = normalize_base_url(
            &options
                .coordinator_url
                .unwrap_or_else(|| blockchain.default_coordinator_url()),
        )?;
        let subgraph_url = normalize_base_url(
            &options
                .subgraph_url
                .unwrap_or_else(|| blockchain.default_subgraph_url()),
        )?;
        let connector = options
            .connector_url
            .as_deref()
            .map(normalize_base_url)
            .transpose()?
            .map(|url| ConnectorClient::new(url, http.clone()));

        debug!(
            %blockchain,
            coordinator = %coordinator_url,
            subgraph = %subgraph_url,
            connector = connector.as_ref().map(ConnectorClient::base_url),
            "Curra client configured"
        );

        Ok(Self {
            blockchain,
            ownership_id,
            destination: options.destination,
            coordinator: CoordinatorClient::new(coordinator_url, signer, http.clone()),
            connector,
            subgraph: SubgraphClient::new(subgraph_url, http),
        })
    }

    pub fn blockchain(&self) -> Blockchain {
        self.blockchain
    }

    pub fn connector(&self) -> Option<&ConnectorClient> {
        self.connector.as_ref()
    }

    pub fn coordinator(&self) -> &CoordinatorClient<S> {
        &self.coordinator
    }

    pub fn subgraph(&self) -> &SubgraphClient {
        &self.subgraph
    }

    /// Resolve the ownership id: the argument wins over the instance default.
    /// A blank argument counts as absent.
    pub fn resolve_ownership_id(&self, ownership_id: Option<&str>) -> Result<U256, CurraError> {
        match ownership_id.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_ownership_id(raw),
            None => self.ownership_id.ok_or(CurraError::MissingOwnershipId),
        }
    }

    /// Resolve the destination: the argument wins over the instance default.
    pub fn resolve_destination<'a>(
        &'a self,
        destination: Option<&'a str>,
    ) -> Result<&'a str, CurraError> {
        destination
            .or(self.destination.as_deref())
            .filter(|d| !d.trim().is_empty())
            .ok_or(CurraError::MissingDestination)
    }

    /// Allocate a new deposit address and import it into the connector.
    pub async fn get_next_address(&self, params: AddressParams) -> Result<String, CurraError> {
        let ownership_id = self.resolve_ownership_id(params.ownership_id.as_deref())?;
        let destination = self.resolve_destination(params.destination.as_deref())?;

        let address = self
            .coordinator
            .get_next_address(ownership_id, destination)
            .await?;
        info!(%ownership_id, %address, "Allocated next deposit address");

        self.import_allocated(address).await
    }

    /// Derive the deposit address for `salt` and import it into the connector.
    pub async fn get_address(&self, salt: u64, params: AddressParams) -> Result<String, CurraError> {
        let ownership_id = self.resolve_ownership_id(params.ownership_id.as_deref())?;
        let destination = self.resolve_destination(params.destination.as_deref())?;

        let address = self
            .coordinator
            .get_address(salt, ownership_id, destination)
            .await?;
        info!(%ownership_id, salt, %address, "Derived deposit address");

        self.import_allocated(address).await
    }

    async fn import_allocated(&self, address: String) -> Result<String, CurraError> {
        let Some(connector) = &self.connector else {
            return Ok(address);
        };
        match connector.import_address(&address).await {
            Ok(()) => Ok(address),
            Err(source) => Err(CurraError::AddressNotImported { address, source }),
        }
    }

    /// Import every forwarder the coordinator allocated for the ownership id.
    pub async fn sync_addresses(&self, ownership_id: Option<&str>) -> Result<(), CurraError> {
        let connector = self.require_connector("sync_addresses")?;
        let ownership_id = self.resolve_ownership_id(ownership_id)?;
        let coordinator = &self.coordinator;

        let forwarders = fetch_all(PAGE_LIMIT, move |limit, skip| {
            coordinator.get_forwarders(ownership_id, limit, skip)
        })
        .await?;

        let imported = import_each(forwarders, |forwarder| async move {
            connector.import_address(&forwarder.address).await
        })
        .await?;

        info!(%ownership_id, count = imported, "Synchronized addresses");
        Ok(())
    }

    /// Import every token linked to this signer on the coordinator, skipping
    /// the zero-address sentinel.
    pub async fn sync_tokens(&self) -> Result<(), CurraError> {
        let connector = self.require_connector("sync_tokens")?;
        let coordinator = &self.coordinator;

        let configs = fetch_all(PAGE_LIMIT, move |limit, skip| {
            coordinator.get_tokens(limit, skip)
        })
        .await?;

        let tokens: Vec<_> = configs
            .into_iter()
            .filter(|config| !config.is_zero_token())
            .collect();

        let imported = import_each(tokens, |config| async move {
            connector.import_token(&config.token).await
        })
        .await?;

        info!(count = imported, "Synchronized tokens");
        Ok(())
    }

    /// Import every asset the subgraph whitelists for the ownership id.
    pub async fn sync_whitelisted_assets(
        &self,
        ownership_id: Option<&str>,
    ) -> Result<(), CurraError> {
        let connector = self.require_connector("sync_whitelisted_assets")?;
        let ownership_id = self.resolve_ownership_id(ownership_id)?;

        let assets = self.subgraph.get_whitelisted_assets(ownership_id).await?;

        let imported = import_each(assets, |asset| async move {
            connector.import_token(&asset.address).await
        })
        .await?;

        info!(%ownership_id, count = imported, "Synchronized whitelisted assets");
        Ok(())
    }

    /// Run the address and whitelisted-asset syncs concurrently for the
    /// default ownership id.
    pub async fn sync(&self) -> Result<(), CurraError> {
        tokio::try_join!(
            self.sync_addresses(None),
            self.sync_whitelisted_assets(None)
        )?;
        Ok(())
    }

    pub fn is_incoming_transfer(&self, transfer: &Transfer) -> Result<bool, CurraError> {
        self.require_connector("is_incoming_transfer")?;
        Ok(ConnectorClient::is_incoming_transfer(transfer))
    }

    pub fn is_non_zero_transfer(&self, transfer: &Transfer) -> Result<bool, CurraError> {
        self.require_connector("is_non_zero_transfer")?;
        Ok(ConnectorClient::is_non_zero_transfer(transfer))
    }

    fn require_connector(&self, operation: &'static str) -> Result<&ConnectorClient, CurraError> {
        self.connector
            .as_ref()
            .ok_or(CurraError::ConnectorNotConfigured(operation))
    }
}

/// Parse an ownership id given as decimal or `0x` hex.
pub fn parse_ownership_id(raw: &str) -> Result<U256, CurraError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CurraError::InvalidOwnershipId("empty value".to_string()));
    }
    U256::from_str(trimmed).map_err(|e| CurraError::InvalidOwnershipId(format!("{trimmed}: {e}")))
}
