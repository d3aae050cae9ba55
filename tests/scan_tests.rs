//! Explorer-surface tests against a mocked StoryScan API: response
//! normalization, overview degradation, and transaction interpretation.

use mockito::mock;
use serde_json::json;

use story_mcp_server::scan::client::ScanClient;
use story_mcp_server::scan::interpret::{interpret_transaction, OperationKind};
use story_mcp_server::scan::overview::build_address_overview;

fn scan_client(prefix: &str) -> ScanClient {
    ScanClient::new(&format!("{}/{}", mockito::server_url(), prefix))
}

#[tokio::test]
async fn address_info_is_normalized() {
    let _m = mock("GET", "/s1/v2/addresses/0xaaa")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "hash": "0xaaa",
                "coin_balance": "2500000000000000000",
                "is_contract": false,
                "has_tokens": true,
                "exchange_rate": "4.20"
            })
            .to_string(),
        )
        .create();

    let info = scan_client("s1").address_info("0xaaa").await.expect("info");
    assert_eq!(info.address, "0xaaa");
    assert_eq!(info.balance.value, "2500000000000000000");
    assert_eq!(info.balance.decimals, 18);
    assert!(info.has_tokens);
    assert!(!info.is_contract);
    assert_eq!(info.exchange_rate.as_deref(), Some("4.20"));
}

#[tokio::test]
async fn missing_balance_field_defaults_to_zero() {
    let _m = mock("GET", "/s2/v2/addresses/0xbbb")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "hash": "0xbbb" }).to_string())
        .create();

    let info = scan_client("s2").address_info("0xbbb").await.expect("info");
    assert_eq!(info.balance.value, "0");
}

#[tokio::test]
async fn transactions_are_truncated_to_the_limit() {
    let item = json!({
        "hash": "0x01",
        "from": { "hash": "0xf1" },
        "to": { "hash": "0xf2" },
        "value": "0",
        "status": "ok"
    });
    let _m = mock("GET", "/s3/v2/addresses/0xccc/transactions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [item, item, item] }).to_string())
        .create();

    let records = scan_client("s3")
        .transactions("0xccc", 2)
        .await
        .expect("transactions");
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn overview_degrades_per_section() {
    let _balance = mock("GET", "/s4/v2/addresses/0xddd")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "hash": "0xddd", "coin_balance": "1" }).to_string())
        .create();
    let _txs = mock("GET", "/s4/v2/addresses/0xddd/transactions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [] }).to_string())
        .create();
    let _tokens = mock("GET", "/s4/v2/addresses/0xddd/tokens")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [] }).to_string())
        .create();
    let _nfts = mock("GET", "/s4/v2/addresses/0xddd/collectibles")
        .with_status(500)
        .create();

    let overview = build_address_overview(&scan_client("s4"), "0xddd").await;
    assert!(overview.partial);
    assert_eq!(overview.missing_sections, vec!["nft_holdings"]);
    assert!(overview.balance.is_some());
    assert!(overview.recent_transactions.is_some());
    assert!(overview.token_holdings.is_some());
    assert!(overview.nft_holdings.is_none());
}

#[tokio::test]
async fn overview_with_all_sections_down_still_returns() {
    let overview = build_address_overview(&scan_client("s5-no-mocks"), "0xeee").await;
    assert!(overview.partial);
    assert_eq!(overview.missing_sections.len(), 4);
}

#[tokio::test]
async fn unrecognized_transaction_interprets_as_unknown() {
    let _tx = mock("GET", "/s6/v2/transactions/0x99")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "hash": "0x99",
                "from": { "hash": "0xf1" },
                "to": { "hash": "0xf2", "is_contract": false },
                "value": "0",
                "status": "ok"
            })
            .to_string(),
        )
        .create();
    let _summary = mock("GET", "/s6/v2/transactions/0x99/summary")
        .with_status(404)
        .create();

    let interpreted = interpret_transaction(&scan_client("s6"), "0x99")
        .await
        .expect("interpretation");
    assert_eq!(interpreted.kind, OperationKind::Unknown);
    assert_eq!(interpreted.summary, "Unrecognized transaction pattern");
    assert!(interpreted.indexer_summary.is_none());
    assert!(interpreted.raw.is_some());
}

#[tokio::test]
async fn native_transfer_interprets_with_formatted_amount() {
    let _tx = mock("GET", "/s7/v2/transactions/0x77")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "hash": "0x77",
                "from": { "hash": "0xf1" },
                "to": { "hash": "0xf2", "is_contract": false },
                "value": "1500000000000000000",
                "status": "ok"
            })
            .to_string(),
        )
        .create();
    let _summary = mock("GET", "/s7/v2/transactions/0x77/summary")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "summaries": [] }).to_string())
        .create();

    let interpreted = interpret_transaction(&scan_client("s7"), "0x77")
        .await
        .expect("interpretation");
    assert_eq!(interpreted.kind, OperationKind::Transfer);
    assert!(interpreted.summary.contains("1.500000000000000000"));
    assert!(interpreted.indexer_summary.is_some());
    assert!(interpreted.raw.is_none());
}

#[tokio::test]
async fn missing_transaction_propagates_the_failure() {
    let _tx = mock("GET", "/s8/v2/transactions/0x55").with_status(404).create();
    let _summary = mock("GET", "/s8/v2/transactions/0x55/summary")
        .with_status(404)
        .create();

    assert!(interpret_transaction(&scan_client("s8"), "0x55").await.is_err());
}

#[tokio::test]
async fn token_holdings_carry_token_metadata() {
    let _m = mock("GET", "/s9/v2/addresses/0xfff/tokens")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [{
                    "token": {
                        "name": "Wrapped IP",
                        "symbol": "WIP",
                        "decimals": "18",
                        "address": "0x1514000000000000000000000000000000000000",
                        "type": "ERC-20"
                    },
                    "value": "7000000000000000000"
                }]
            })
            .to_string(),
        )
        .create();

    let holdings = scan_client("s9")
        .token_holdings("0xfff")
        .await
        .expect("holdings");
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].symbol, "WIP");
    assert_eq!(holdings[0].balance.value, "7000000000000000000");
    assert_eq!(holdings[0].balance.decimals, 18);
}
