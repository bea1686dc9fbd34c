// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Construction-time options for the [`Curra`](crate::Curra) facade and the
//! environment variables the `curra-sync` binary reads them from.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CURRA_BLOCKCHAIN` | Network name used to template default URLs | `ethereum` |
//! | `CURRA_PRIVATE_KEY` | Hex or PEM secp256k1 key used to sign coordinator challenges | Required |
//! | `CURRA_OWNERSHIP_ID` | Default ownership id (decimal or `0x` hex) | Optional |
//! | `CURRA_DESTINATION` | Default forwarding destination address | Optional |
//! | `CURRA_CONNECTOR_URL` | Connector base URL; sync methods need it | Optional |
//! | `CURRA_COORDINATOR_URL` | Coordinator base URL | `https://{blockchain}.coordinator.curra.io` |
//! | `CURRA_SUBGRAPH_URL` | Subgraph GraphQL endpoint | `https://thegraph.{blockchain}.network.curra.io/subgraphs/name/curra` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::str::FromStr;

use crate::error::CurraError;

pub const BLOCKCHAIN_ENV: &str = "CURRA_BLOCKCHAIN";
pub const PRIVATE_KEY_ENV: &str = "CURRA_PRIVATE_KEY";
pub const OWNERSHIP_ID_ENV: &str = "CURRA_OWNERSHIP_ID";
pub const DESTINATION_ENV: &str = "CURRA_DESTINATION";
pub const CONNECTOR_URL_ENV: &str = "CURRA_CONNECTOR_URL";
pub const COORDINATOR_URL_ENV: &str = "CURRA_COORDINATOR_URL";
pub const SUBGRAPH_URL_ENV: &str = "CURRA_SUBGRAPH_URL";

/// Environment variable selecting the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Networks the hosted Curra services are deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blockchain {
    #[default]
    Ethereum,
    Goerli,
    Bsc,
    Polygon,
    Mumbai,
}

impl Blockchain {
    /// Name used in the hosted service hostnames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Goerli => "goerli",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
            Self::Mumbai => "mumbai",
        }
    }

    /// Default coordinator base URL for this network.
    pub fn default_coordinator_url(&self) -> String {
        format!("https://{}.coordinator.curra.io", self.as_str())
    }

    /// Default subgraph endpoint for this network.
    pub fn default_subgraph_url(&self) -> String {
        format!(
            "https://thegraph.{}.network.curra.io/subgraphs/name/curra",
            self.as_str()
        )
    }

    /// Read the network from `CURRA_BLOCKCHAIN`, falling back to Ethereum.
    pub fn from_env() -> Result<Self, CurraError> {
        match env_optional(BLOCKCHAIN_ENV) {
            Some(raw) => raw.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Blockchain {
    type Err = CurraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Self::Ethereum),
            "goerli" => Ok(Self::Goerli),
            "bsc" => Ok(Self::Bsc),
            "polygon" => Ok(Self::Polygon),
            "mumbai" => Ok(Self::Mumbai),
            other => Err(CurraError::InvalidConfig(format!(
                "unsupported blockchain `{other}`"
            ))),
        }
    }
}

/// Options accepted by [`Curra::new`](crate::Curra::new).
///
/// Only `private_key` is mandatory. `ownership_id` and `destination` act as
/// per-instance defaults that individual calls may override; a call that
/// ends up with neither fails with a precondition error before any request
/// is sent.
#[derive(Clone, Default)]
pub struct CurraOptions {
    /// Hex (optionally `0x`-prefixed) or PEM-encoded secp256k1 private key.
    pub private_key: String,
    pub destination: Option<String>,
    /// Decimal or `0x` hex big integer.
    pub ownership_id: Option<String>,
    pub connector_url: Option<String>,
    pub coordinator_url: Option<String>,
    pub subgraph_url: Option<String>,
}

impl CurraOptions {
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            ..Self::default()
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_ownership_id(mut self, ownership_id: impl Into<String>) -> Self {
        self.ownership_id = Some(ownership_id.into());
        self
    }

    pub fn with_connector_url(mut self, url: impl Into<String>) -> Self {
        self.connector_url = Some(url.into());
        self
    }

    pub fn with_coordinator_url(mut self, url: impl Into<String>) -> Self {
        self.coordinator_url = Some(url.into());
        self
    }

    pub fn with_subgraph_url(mut self, url: impl Into<String>) -> Self {
        self.subgraph_url = Some(url.into());
        self
    }

    /// Load options from the `CURRA_*` environment variables.
    pub fn from_env() -> Result<Self, CurraError> {
        let private_key = env_optional(PRIVATE_KEY_ENV)
            .ok_or_else(|| CurraError::InvalidConfig(format!("{PRIVATE_KEY_ENV} is not set")))?;

        Ok(Self {
            // PEM keys passed through env files usually carry escaped newlines
            private_key: private_key.replace("\\n", "\n"),
            destination: env_optional(DESTINATION_ENV),
            ownership_id: env_optional(OWNERSHIP_ID_ENV),
            connector_url: env_optional(CONNECTOR_URL_ENV),
            coordinator_url: env_optional(COORDINATOR_URL_ENV),
            subgraph_url: env_optional(SUBGRAPH_URL_ENV),
        })
    }
}

impl fmt::Debug for CurraOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurraOptions")
            .field("private_key", &"<redacted>")
            .field("destination", &self.destination)
            .field("ownership_id", &self.ownership_id)
            .field("connector_url", &self.connector_url)
            .field("coordinator_url", &self.coordinator_url)
            .field("subgraph_url", &self.subgraph_url)
            .finish()
    }
}

/// Read an env var, treating unset and blank values alike.
fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a base URL and strip any trailing slash so paths can be appended.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, CurraError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| CurraError::InvalidConfig(format!("invalid URL `{raw}`: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CurraError::InvalidConfig(format!(
            "URL `{raw}` must use http or https"
        )));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}
