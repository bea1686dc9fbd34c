// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, process::ExitCode};

use curra_sdk::config::LOG_FORMAT_ENV;
use curra_sdk::{AddressParams, Blockchain, Curra, CurraError, CurraOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: curra-sync [sync | sync-addresses | sync-tokens | sync-whitelist | next-address | address <salt> | last-block]";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("sync");

    match run(command, &args[args.len().min(1)..]).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(address) = e.allocated_address() {
                println!("{address}");
            }
            error!(error = %e, command, "curra-sync failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, rest: &[String]) -> Result<(), CurraError> {
    let blockchain = Blockchain::from_env()?;
    let curra = Curra::new(blockchain, CurraOptions::from_env()?)?;
    info!(%blockchain, command, "Running curra-sync");

    match command {
        "sync" => curra.sync().await,
        "sync-addresses" => curra.sync_addresses(None).await,
        "sync-tokens" => curra.sync_tokens().await,
        "sync-whitelist" => curra.sync_whitelisted_assets(None).await,
        "next-address" => {
            let address = curra.get_next_address(AddressParams::default()).await?;
            println!("{address}");
            Ok(())
        }
        "address" => {
            let salt = rest
                .first()
                .and_then(|raw| raw.parse::<u64>().ok())
                .ok_or_else(|| CurraError::InvalidConfig(format!("missing or invalid salt; {USAGE}")))?;
            let address = curra.get_address(salt, AddressParams::default()).await?;
            println!("{address}");
            Ok(())
        }
        "last-block" => {
            let connector = curra
                .connector()
                .ok_or(CurraError::ConnectorNotConfigured("last-block"))?;
            println!("{}", connector.get_last_block().await?);
            Ok(())
        }
        other => Err(CurraError::InvalidConfig(format!(
            "unknown command `{other}`; {USAGE}"
        ))),
    }
}
