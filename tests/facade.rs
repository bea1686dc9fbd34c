// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use serde_json::json;

use curra_sdk::signer::{load_signer, signature_to_hex};
use curra_sdk::{
    Address, AddressParams, Blockchain, ChallengeSigner, ConnectorError, Curra, CurraError,
    CurraOptions, PrivateKeySigner, Signature, SignerError,
};

const TEST_KEY_HEX: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const ZERO: &str = "0x0000000000000000000000000000000000000000";

/// Signer that records every message it is asked to sign.
#[derive(Clone)]
struct RecordingSigner {
    inner: PrivateKeySigner,
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSigner {
    fn new() -> Self {
        Self {
            inner: load_signer(TEST_KEY_HEX).unwrap(),
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().unwrap().clone()
    }
}

impl ChallengeSigner for RecordingSigner {
    fn address(&self) -> Address {
        ChallengeSigner::address(&self.inner)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        self.messages.lock().unwrap().push(message.to_vec());
        ChallengeSigner::sign_message(&self.inner, message).await
    }
}

struct Services {
    coordinator: MockServer,
    connector: MockServer,
    subgraph: MockServer,
}

impl Services {
    async fn start() -> Self {
        Self {
            coordinator: MockServer::start_async().await,
            connector: MockServer::start_async().await,
            subgraph: MockServer::start_async().await,
        }
    }

    fn options(&self) -> CurraOptions {
        CurraOptions::new(TEST_KEY_HEX)
            .with_ownership_id("1")
            .with_destination("0xdest")
            .with_coordinator_url(self.coordinator.base_url())
            .with_connector_url(self.connector.base_url())
            .with_subgraph_url(self.subgraph.base_url())
    }

    fn curra(&self) -> Curra {
        Curra::new(Blockchain::Ethereum, self.options()).unwrap()
    }
}

async fn expected_signature(message: &[u8]) -> String {
    let signer = load_signer(TEST_KEY_HEX).unwrap();
    signature_to_hex(&ChallengeSigner::sign_message(&signer, message).await.unwrap())
}

/// Address bodies seen by the connector, in arrival order. Only
/// `sync_addresses_pages_and_imports_every_forwarder` records into it.
static IMPORTED_ADDRESSES: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn record_imported_address(req: &HttpMockRequest) -> bool {
    let value = req
        .body
        .as_deref()
        .and_then(|body| serde_json::from_slice::<serde_json::Value>(body).ok())
        .and_then(|body| body["value"].as_str().map(str::to_string));
    if let Some(value) = value {
        IMPORTED_ADDRESSES.lock().unwrap().push(value);
    }
    true
}

#[tokio::test]
async fn next_address_signs_nonce_and_imports() {
    let services = Services::start().await;
    let signature = expected_signature(b"42").await;

    let nonce = services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/nonce")
                .query_param("ownershipId", "1");
            then.status(200).json_body(json!({ "number": 42 }));
        })
        .await;
    let allocate = services
        .coordinator
        .mock_async(|when, then| {
            when.method(POST)
                .path("/forwarders/next")
                .header("signature", signature.as_str())
                .json_body(json!({ "ownershipId": "1", "destination": "0xdest" }));
            then.status(201).json_body(json!({ "address": "0xforwarder" }));
        })
        .await;
    let import = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/addresses")
                .json_body(json!({ "value": "0xforwarder" }));
            then.status(201);
        })
        .await;

    let address = services
        .curra()
        .get_next_address(AddressParams::default())
        .await
        .unwrap();

    assert_eq!(address, "0xforwarder");
    nonce.assert_async().await;
    allocate.assert_async().await;
    import.assert_async().await;
}

#[tokio::test]
async fn each_derivation_fetches_a_fresh_nonce() {
    let services = Services::start().await;
    let signer = RecordingSigner::new();

    let nonce = services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/auth/nonce");
            then.status(200).json_body(json!({ "number": 1234 }));
        })
        .await;
    let derive = services
        .coordinator
        .mock_async(|when, then| {
            when.method(POST)
                .path("/forwarders")
                .header_exists("signature")
                .json_body(json!({ "ownershipId": "7", "destination": "0xother", "salt": 3 }));
            then.status(200).json_body(json!({ "address": "0xsalted" }));
        })
        .await;
    services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/addresses");
            then.status(200);
        })
        .await;

    let curra =
        Curra::with_signer(Blockchain::Ethereum, signer.clone(), services.options()).unwrap();
    let params = AddressParams::default()
        .ownership_id("7")
        .destination("0xother");

    for _ in 0..2 {
        let address = curra.get_address(3, params.clone()).await.unwrap();
        assert_eq!(address, "0xsalted");
    }

    nonce.assert_hits_async(2).await;
    derive.assert_hits_async(2).await;
    assert_eq!(signer.messages(), vec![b"1234".to_vec(), b"1234".to_vec()]);
}

#[tokio::test]
async fn coordinator_rejection_carries_status_and_body() {
    let services = Services::start().await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/auth/nonce");
            then.status(403).body("forbidden ownership");
        })
        .await;

    let err = services
        .curra()
        .get_next_address(AddressParams::default())
        .await
        .unwrap_err();

    match err {
        CurraError::Coordinator(curra_sdk::CoordinatorError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden ownership");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_import_reports_allocated_address() {
    let services = Services::start().await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/auth/nonce");
            then.status(200).json_body(json!({ "number": 9 }));
        })
        .await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(POST).path("/forwarders/next");
            then.status(200).json_body(json!({ "address": "0xallocated" }));
        })
        .await;
    services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/addresses");
            then.status(500).body("connector down");
        })
        .await;

    let err = services
        .curra()
        .get_next_address(AddressParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.allocated_address(), Some("0xallocated"));
    assert!(matches!(
        err,
        CurraError::AddressNotImported {
            source: ConnectorError::Status { status: 500, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn derivation_without_connector_skips_import() {
    let services = Services::start().await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/auth/nonce");
            then.status(200).json_body(json!({ "number": 5 }));
        })
        .await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(POST).path("/forwarders/next");
            then.status(200).json_body(json!({ "address": "0xsolo" }));
        })
        .await;

    let mut options = services.options();
    options.connector_url = None;
    let curra = Curra::new(Blockchain::Ethereum, options).unwrap();

    assert_eq!(
        curra.get_next_address(AddressParams::default()).await.unwrap(),
        "0xsolo"
    );
}

#[tokio::test]
async fn sync_addresses_pages_and_imports_every_forwarder() {
    let services = Services::start().await;

    let first = services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET)
                .path("/forwarders")
                .query_param("ownershipId", "1")
                .query_param("limit", "10")
                .query_param("skip", "0");
            then.status(200)
                .json_body(json!({ "entities": [{ "address": "0xA" }], "count": 2 }));
        })
        .await;
    let second = services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET)
                .path("/forwarders")
                .query_param("ownershipId", "1")
                .query_param("limit", "10")
                .query_param("skip", "1");
            then.status(200)
                .json_body(json!({ "entities": [{ "address": "0xB" }], "count": 2 }));
        })
        .await;
    let imports = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/addresses")
                .matches(record_imported_address);
            then.status(201);
        })
        .await;

    services.curra().sync_addresses(None).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(imports.hits_async().await, 2);
    assert_eq!(*IMPORTED_ADDRESSES.lock().unwrap(), vec!["0xA", "0xB"]);
}

#[tokio::test]
async fn sync_addresses_rejects_short_listing() {
    let services = Services::start().await;

    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders").query_param("skip", "0");
            then.status(200)
                .json_body(json!({ "entities": [{ "address": "0xA" }], "count": 3 }));
        })
        .await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders").query_param("skip", "1");
            then.status(200).json_body(json!({ "entities": [], "count": 3 }));
        })
        .await;
    let imports = services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/addresses");
            then.status(201);
        })
        .await;

    let err = services.curra().sync_addresses(None).await.unwrap_err();

    assert!(matches!(
        err,
        CurraError::Coordinator(curra_sdk::CoordinatorError::InvalidResponse(_))
    ));
    imports.assert_hits_async(0).await;
}

#[tokio::test]
async fn sync_addresses_stops_at_first_failed_import() {
    let services = Services::start().await;
    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders");
            then.status(200).json_body(json!({
                "entities": [{ "address": "0xA" }, { "address": "0xB" }, { "address": "0xC" }],
                "count": 3
            }));
        })
        .await;
    let import_a = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/addresses")
                .json_body(json!({ "value": "0xA" }));
            then.status(200);
        })
        .await;
    let import_b = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/addresses")
                .json_body(json!({ "value": "0xB" }));
            then.status(400).body("bad address");
        })
        .await;
    let import_c = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/addresses")
                .json_body(json!({ "value": "0xC" }));
            then.status(200);
        })
        .await;

    let err = services.curra().sync_addresses(None).await.unwrap_err();

    assert!(matches!(
        err,
        CurraError::Connector(ConnectorError::Status { status: 400, .. })
    ));
    import_a.assert_async().await;
    import_b.assert_async().await;
    import_c.assert_hits_async(0).await;
}

#[tokio::test]
async fn sync_tokens_skips_zero_address() {
    let services = Services::start().await;

    let configs = services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET)
                .path("/configs")
                .query_param("parent", TEST_ADDRESS)
                .query_param("skip", "0")
                .query_param("limit", "10");
            then.status(200).json_body(json!({
                "entities": [{ "token": ZERO }, { "token": "0xusdt" }],
                "count": 2
            }));
        })
        .await;
    let import_zero = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tokens")
                .json_body(json!({ "address": ZERO }));
            then.status(201);
        })
        .await;
    let import_usdt = services
        .connector
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tokens")
                .json_body(json!({ "address": "0xusdt" }));
            then.status(201);
        })
        .await;

    services.curra().sync_tokens().await.unwrap();

    configs.assert_async().await;
    import_zero.assert_hits_async(0).await;
    import_usdt.assert_async().await;
}

#[tokio::test]
async fn sync_whitelisted_assets_imports_subgraph_tokens() {
    let services = Services::start().await;

    let query = services
        .subgraph
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .json_body_partial(r#"{ "variables": { "ownershipId": "1" } }"#);
            then.status(200).json_body(json!({
                "data": {
                    "whitelistedAssets": [
                        { "id": "1-a", "address": "0xaaa", "ownership": { "id": "1" } },
                        { "id": "1-b", "address": "0xbbb", "ownership": { "id": "1" } }
                    ]
                }
            }));
        })
        .await;
    let tokens = services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/tokens");
            then.status(200);
        })
        .await;

    services.curra().sync_whitelisted_assets(None).await.unwrap();

    query.assert_async().await;
    tokens.assert_hits_async(2).await;
}

#[tokio::test]
async fn sync_fails_when_whitelist_branch_fails() {
    let services = Services::start().await;

    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders");
            then.status(200)
                .json_body(json!({ "entities": [{ "address": "0xA" }], "count": 1 }));
        })
        .await;
    services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/addresses");
            then.status(201);
        })
        .await;
    services
        .subgraph
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(502).body("bad gateway");
        })
        .await;

    let err = services.curra().sync().await.unwrap_err();
    assert!(matches!(
        err,
        CurraError::Subgraph(curra_sdk::SubgraphError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn sync_fails_when_address_branch_fails() {
    let services = Services::start().await;

    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders");
            then.status(500).body("coordinator down");
        })
        .await;
    services
        .subgraph
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200).json_body(json!({
                "data": { "whitelistedAssets": [
                    { "id": "1-a", "address": "0xaaa", "ownership": { "id": "1" } }
                ] }
            }));
        })
        .await;
    services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/tokens");
            then.status(201);
        })
        .await;

    let err = services.curra().sync().await.unwrap_err();
    match err {
        CurraError::Coordinator(curra_sdk::CoordinatorError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "coordinator down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn sync_succeeds_when_both_branches_succeed() {
    let services = Services::start().await;

    services
        .coordinator
        .mock_async(|when, then| {
            when.method(GET).path("/forwarders");
            then.status(200)
                .json_body(json!({ "entities": [{ "address": "0xA" }], "count": 1 }));
        })
        .await;
    let addresses = services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/addresses");
            then.status(201);
        })
        .await;
    services
        .subgraph
        .mock_async(|when, then| {
            when.method(POST).path("/");
            then.status(200).json_body(json!({
                "data": { "whitelistedAssets": [
                    { "id": "1-a", "address": "0xaaa", "ownership": { "id": "1" } }
                ] }
            }));
        })
        .await;
    let tokens = services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/tokens");
            then.status(201);
        })
        .await;

    services.curra().sync().await.unwrap();

    addresses.assert_async().await;
    tokens.assert_async().await;
}

#[tokio::test]
async fn connector_only_accepts_200_and_201() {
    let services = Services::start().await;
    services
        .connector
        .mock_async(|when, then| {
            when.method(POST).path("/tokens");
            then.status(204);
        })
        .await;

    let curra = services.curra();
    let connector = curra.connector().unwrap();
    let err = connector.import_token("0xaaa").await.unwrap_err();
    assert!(matches!(err, ConnectorError::Status { status: 204, .. }));
}

#[tokio::test]
async fn connector_queries_pass_filters() {
    let services = Services::start().await;

    services
        .connector
        .mock_async(|when, then| {
            when.method(GET).path("/blocks/last");
            then.status(200).json_body(json!({ "blockNumber": 18_000_000 }));
        })
        .await;
    let events = services
        .connector
        .mock_async(|when, then| {
            when.method(GET)
                .path("/contract-events")
                .query_param("fromBlock", "100")
                .query_param("name", "Transfer")
                .query_param("sort", "ASC");
            then.status(200).json_body(json!({
                "entities": [{
                    "id": 1,
                    "name": "Transfer",
                    "address": "0xtoken",
                    "topics": ["0xddf2"],
                    "data": { "value": "10" },
                    "rawData": "0x0a",
                    "blockNumber": 101,
                    "transactionHash": "0xhash",
                    "transactionIndex": 0,
                    "blockHash": "0xblock",
                    "logIndex": 2,
                    "removed": false
                }],
                "count": 1
            }));
        })
        .await;
    let transfers = services
        .connector
        .mock_async(|when, then| {
            when.method(GET)
                .path("/transfers")
                .query_param("limit", "5")
                .query_param("sort", "DESC");
            then.status(200).json_body(json!([{
                "id": 3,
                "fromAddress": { "value": "0xfrom", "owned": false },
                "toAddress": { "value": "0xto", "owned": true },
                "value": "250",
                "token": "0xtoken",
                "block": 101,
                "txHash": "0xhash",
                "txIndex": 0,
                "index": 0,
                "dropped": false,
                "confirmations": 3
            }]));
        })
        .await;

    let curra = services.curra();
    let connector = curra.connector().unwrap();

    assert_eq!(connector.get_last_block().await.unwrap(), 18_000_000);

    let page = connector
        .get_contract_events::<serde_json::Value>(&curra_sdk::ContractEventsQuery {
            from_block: Some(100),
            name: Some("Transfer".to_string()),
            sort: Some(curra_sdk::Sort::Asc),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.entities[0].data["value"], "10");
    events.assert_async().await;

    let list = connector
        .get_transfers(&curra_sdk::TransfersQuery {
            limit: Some(5),
            sort: Some(curra_sdk::Sort::Desc),
            ..Default::default()
        })
        .await
        .unwrap();
    transfers.assert_async().await;

    assert_eq!(list.len(), 1);
    assert!(curra.is_incoming_transfer(&list[0]).unwrap());
    assert!(curra.is_non_zero_transfer(&list[0]).unwrap());
}

#[tokio::test]
async fn facade_classification_requires_connector() {
    let services = Services::start().await;
    let mut options = services.options();
    options.connector_url = None;
    let curra = Curra::new(Blockchain::Ethereum, options).unwrap();

    let transfer: curra_sdk::Transfer = serde_json::from_value(json!({
        "id": 1,
        "fromAddress": { "value": "0xfrom", "owned": false },
        "toAddress": { "value": "0xto", "owned": true },
        "value": "1",
        "block": 1,
        "txHash": "0xhash",
        "txIndex": 0,
        "index": 0,
        "dropped": false,
        "confirmations": 0
    }))
    .unwrap();

    assert!(matches!(
        curra.is_incoming_transfer(&transfer),
        Err(CurraError::ConnectorNotConfigured(_))
    ));
    assert!(curra.connector().is_none());
}
