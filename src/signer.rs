// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge signing for authenticated coordinator requests.
//!
//! The coordinator authenticates mutating calls with an EIP-191 personal
//! signature over a fresh server nonce. [`ChallengeSigner`] is the seam the
//! coordinator client signs through, so a hardware-backed or remote signer
//! can stand in for the local key.

use std::future::Future;

use alloy::{
    primitives::{Address, Signature},
    signers::{local::PrivateKeySigner, SignerSync},
};
use k256::SecretKey;

use crate::error::CurraError;

/// Errors produced while signing a challenge.
#[derive(Debug, thiserror::Error)]
#[error("Signing failed: {0}")]
pub struct SignerError(pub String);

/// A capability able to produce EIP-191 personal-message signatures.
pub trait ChallengeSigner: Send + Sync {
    /// Address of the signing key.
    fn address(&self) -> Address;

    /// Sign `message` with the `"\x19Ethereum Signed Message:\n"` prefix.
    fn sign_message(
        &self,
        message: &[u8],
    ) -> impl Future<Output = Result<Signature, SignerError>> + Send;
}

impl ChallengeSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    fn sign_message(
        &self,
        message: &[u8],
    ) -> impl Future<Output = Result<Signature, SignerError>> + Send {
        let signed = self
            .sign_message_sync(message)
            .map_err(|e| SignerError(e.to_string()));
        std::future::ready(signed)
    }
}

/// Encode a signature the way the coordinator expects it in the
/// `signature` header: `0x`-prefixed `r || s || v` with `v` in `{27, 28}`.
pub fn signature_to_hex(signature: &Signature) -> String {
    alloy::hex::encode_prefixed(signature.as_bytes())
}

/// Create a signer from a hex-encoded private key (with or without `0x`).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, CurraError> {
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| CurraError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| CurraError::InvalidPrivateKey(e.to_string()))
}

/// Parse a PEM private key (SEC1 `EC PRIVATE KEY` or PKCS#8 `PRIVATE KEY`)
/// into a hex string without the `0x` prefix.
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, CurraError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| CurraError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| CurraError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| CurraError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Load a signer from the configured key material, accepting either a PEM
/// document or a hex string.
pub fn load_signer(private_key: &str) -> Result<PrivateKeySigner, CurraError> {
    let trimmed = private_key.trim();
    if trimmed.is_empty() {
        return Err(CurraError::InvalidPrivateKey("private key is empty".to_string()));
    }
    if trimmed.starts_with("-----BEGIN") {
        let hex_key = pem_to_hex(trimmed.as_bytes())?;
        signer_from_hex(&hex_key)
    } else {
        signer_from_hex(trimmed)
    }
}
