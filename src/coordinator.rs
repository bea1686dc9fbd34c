// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coordinator client: signed deposit-address derivation.
//!
//! Every mutating call runs a challenge-response round trip:
//! 1. `GET auth/nonce` returns a fresh server nonce for the ownership id
//! 2. The nonce's decimal string is signed as an EIP-191 personal message
//! 3. The signature travels in the `signature` header of the request that
//!    consumes the nonce
//!
//! Nonces are never cached; each derivation fetches and spends its own.

use alloy::primitives::U256;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::paging::{IncompletePage, Page};
use crate::signer::{signature_to_hex, ChallengeSigner};
use crate::types::{Forwarder, TokenConfig};

/// Header carrying the challenge signature.
pub const SIGNATURE_HEADER: &str = "signature";

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Coordinator request failed: {0}")]
    Request(String),

    #[error("Coordinator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Coordinator response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Coordinator challenge signing failed: {0}")]
    Signing(String),
}

impl From<IncompletePage> for CoordinatorError {
    fn from(e: IncompletePage) -> Self {
        CoordinatorError::InvalidResponse(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressRequest<'a> {
    ownership_id: String,
    destination: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    salt: Option<u64>,
}

/// Message signed for a nonce: the UTF-8 bytes of its decimal form.
pub fn challenge_message(nonce: u64) -> Vec<u8> {
    nonce.to_string().into_bytes()
}

/// `0x`-prefixed hex view of [`challenge_message`].
pub fn challenge_hex(nonce: u64) -> String {
    alloy::hex::encode_prefixed(challenge_message(nonce))
}

/// Client for the Curra coordinator API.
#[derive(Debug, Clone)]
pub struct CoordinatorClient<S> {
    base_url: String,
    signer: S,
    http: Client,
}

impl<S: ChallengeSigner> CoordinatorClient<S> {
    pub fn new(base_url: impl Into<String>, signer: S, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            signer,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Fetch a fresh nonce for `ownership_id`.
    pub async fn get_nonce(&self, ownership_id: U256) -> Result<u64, CoordinatorError> {
        let response: NonceResponse = self
            .send(
                self.request(Method::GET, "auth/nonce")
                    .query(&[("ownershipId", ownership_id.to_string())]),
                "auth/nonce",
            )
            .await?;
        Ok(response.number)
    }

    /// Fetch a nonce and sign it, returning the header-ready signature.
    pub async fn get_signature(&self, ownership_id: U256) -> Result<String, CoordinatorError> {
        let nonce = self.get_nonce(ownership_id).await?;
        debug!(%ownership_id, nonce, "Signing coordinator challenge");

        let signature = self
            .signer
            .sign_message(&challenge_message(nonce))
            .await
            .map_err(|e| CoordinatorError::Signing(e.to_string()))?;

        Ok(signature_to_hex(&signature))
    }

    /// Allocate the next deposit address forwarding to `destination`.
    pub async fn get_next_address(
        &self,
        ownership_id: U256,
        destination: &str,
    ) -> Result<String, CoordinatorError> {
        let body = AddressRequest {
            ownership_id: ownership_id.to_string(),
            destination,
            salt: None,
        };
        self.signed_address_request("forwarders/next", ownership_id, &body)
            .await
    }

    /// Derive the deposit address for a caller-chosen `salt`.
    ///
    /// The same salt, ownership id and destination always yield the same
    /// address, which allows recovering a previously issued address.
    pub async fn get_address(
        &self,
        salt: u64,
        ownership_id: U256,
        destination: &str,
    ) -> Result<String, CoordinatorError> {
        let body = AddressRequest {
            ownership_id: ownership_id.to_string(),
            destination,
            salt: Some(salt),
        };
        self.signed_address_request("forwarders", ownership_id, &body)
            .await
    }

    /// List forwarders allocated for `ownership_id`.
    pub async fn get_forwarders(
        &self,
        ownership_id: U256,
        limit: u64,
        skip: u64,
    ) -> Result<Page<Forwarder>, CoordinatorError> {
        self.send(
            self.request(Method::GET, "forwarders").query(&[
                ("limit", limit.to_string()),
                ("skip", skip.to_string()),
                ("ownershipId", ownership_id.to_string()),
            ]),
            "forwarders",
        )
        .await
    }

    /// List token configs linked to this signer's address.
    pub async fn get_tokens(
        &self,
        limit: u64,
        skip: u64,
    ) -> Result<Page<TokenConfig>, CoordinatorError> {
        let parent = self.signer.address().to_checksum(None);
        self.send(
            self.request(Method::GET, "configs").query(&[
                ("parent", parent),
                ("skip", skip.to_string()),
                ("limit", limit.to_string()),
            ]),
            "configs",
        )
        .await
    }

    async fn signed_address_request(
        &self,
        path: &str,
        ownership_id: U256,
        body: &AddressRequest<'_>,
    ) -> Result<String, CoordinatorError> {
        let signature = self.get_signature(ownership_id).await?;

        let response: AddressResponse = self
            .send(
                self.request(Method::POST, path)
                    .header(SIGNATURE_HEADER, signature)
                    .json(body),
                path,
            )
            .await?;

        if response.address.trim().is_empty() {
            return Err(CoordinatorError::InvalidResponse(format!(
                "POST {path} returned an empty address"
            )));
        }
        Ok(response.address)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, CoordinatorError> {
        debug!(path, "Coordinator request");
        let response = request
            .send()
            .await
            .map_err(|e| CoordinatorError::Request(format!("{path} failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(CoordinatorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CoordinatorError::InvalidResponse(format!("{path} invalid JSON: {e}")))
    }
}
