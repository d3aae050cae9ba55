//! Tool handlers. Each handler receives the validated argument map from the
//! registry, parses it into domain types, drives the matching capability
//! client, and returns a JSON payload carrying a human-readable `summary`
//! plus the structured result. Upstream failures are classified into the
//! uniform error taxonomy before they leave this module.

use std::str::FromStr;

use ethers_core::types::{Address, H256, U256};
use ethers_core::utils::{format_units, parse_units};
use serde_json::{json, Map, Value};

use crate::blockchain::services::ip_asset::IpMetadata;
use crate::blockchain::services::{collection, ip_asset, license, transfer};
use crate::blockchain::models::{CollectionOptions, RegistrationMetadata};
use crate::error::{classify, ToolError};
use crate::mcp::registry::HandlerFuture;
use crate::scan::{interpret, overview};
use crate::AppState;

fn arg_str<'m>(args: &'m Map<String, Value>, name: &str) -> Result<&'m str, ToolError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::invalid(name, "missing required parameter"))
}

fn arg_u64(args: &Map<String, Value>, name: &str) -> Result<u64, ToolError> {
    args.get(name)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ToolError::invalid(name, "missing required parameter"))
}

fn arg_bool(args: &Map<String, Value>, name: &str) -> Result<bool, ToolError> {
    args.get(name)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| ToolError::invalid(name, "missing required parameter"))
}

fn arg_address(args: &Map<String, Value>, name: &str) -> Result<Address, ToolError> {
    let s = arg_str(args, name)?;
    Address::from_str(s).map_err(|_| ToolError::invalid(name, "malformed address"))
}

fn opt_address(args: &Map<String, Value>, name: &str) -> Result<Option<Address>, ToolError> {
    match args.get(name).and_then(|v| v.as_str()) {
        Some(s) => Ok(Some(
            Address::from_str(s).map_err(|_| ToolError::invalid(name, "malformed address"))?,
        )),
        None => Ok(None),
    }
}

fn parse_hash(name: &str, raw: &str) -> Result<H256, ToolError> {
    H256::from_str(raw)
        .map_err(|_| ToolError::invalid(name, "malformed 32-byte hash: expected 0x + 64 hex chars"))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::UpstreamRejected(format!("unserializable result: {e}")))
}

// Write-capable IP-asset surface.

pub fn get_license_terms(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let id = arg_u64(&args, "license_terms_id")?;
        let terms = license::get_license_terms(&state.chain, id)
            .await
            .map_err(classify)?;
        let mut payload = json!({
            "summary": format!(
                "License terms {}: commercial use {}, derivatives {}, rev share {}",
                id,
                if terms.commercial_use { "enabled" } else { "disabled" },
                if terms.derivatives_allowed { "allowed" } else { "not allowed" },
                terms.commercial_rev_share,
            ),
            "license_terms_id": id,
        });
        payload["terms"] = to_value(&terms)?;
        Ok(payload)
    })
}

pub fn mint_license_tokens(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let ip_id = arg_address(&args, "ip_id")?;
        let license_terms_id = arg_u64(&args, "license_terms_id")?;
        let amount = arg_u64(&args, "amount")?;
        let recipient = opt_address(&args, "recipient")?;
        let max_minting_fee = args
            .get("max_minting_fee")
            .and_then(|v| v.as_u64())
            .map(U256::from)
            .unwrap_or_else(U256::zero);
        // 100% in contract units when the caller does not cap it.
        let max_revenue_share = args
            .get("max_revenue_share")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(100_000_000);

        let result = license::mint_license_tokens(
            &state.chain,
            ip_id,
            license_terms_id,
            amount,
            recipient,
            max_minting_fee,
            max_revenue_share,
        )
        .await
        .map_err(classify)?;

        let mut payload = json!({
            "summary": format!(
                "Minted {} license token(s) under terms {} for IP {:#x}. Transaction: {}",
                amount, license_terms_id, ip_id, result.tx_hash,
            ),
        });
        payload["result"] = to_value(&result)?;
        Ok(payload)
    })
}

pub fn send_ip(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let to_address = arg_address(&args, "to_address")?;
        let amount = arg_str(&args, "amount")?;
        let wei: U256 = parse_units(amount, 18)
            .map_err(|_| {
                ToolError::invalid("amount", "expected a decimal IP amount, e.g. \"1.5\"")
            })?
            .into();
        if wei.is_zero() {
            return Err(ToolError::invalid("amount", "amount must be greater than zero"));
        }

        let amount = amount.to_string();
        let result = transfer::send_ip(&state.chain, to_address, wei)
            .await
            .map_err(classify)?;

        let mut payload = json!({
            "summary": format!(
                "Sent {} IP to {:#x}. Transaction: {}",
                amount, to_address, result.tx_hash,
            ),
            "amount_wei": wei.to_string(),
        });
        payload["result"] = to_value(&result)?;
        Ok(payload)
    })
}

pub fn mint_and_register_ip_with_terms(
    state: &AppState,
    args: Map<String, Value>,
) -> HandlerFuture<'_> {
    Box::pin(async move {
        let commercial_rev_share = arg_u64(&args, "commercial_rev_share")? as u32;
        let derivatives_allowed = arg_bool(&args, "derivatives_allowed")?;
        let recipient = opt_address(&args, "recipient")?;
        let spg_nft_contract = opt_address(&args, "spg_nft_contract")?;

        let metadata = match args.get("registration_metadata") {
            Some(value) => {
                let raw = RegistrationMetadata::from_value(value)?;
                Some(IpMetadata {
                    ip_metadata_uri: raw.ip_metadata_uri,
                    ip_metadata_hash: parse_hash("registration_metadata", &raw.ip_metadata_hash)?,
                    nft_metadata_uri: raw.nft_metadata_uri,
                    nft_metadata_hash: parse_hash("registration_metadata", &raw.nft_metadata_hash)?,
                })
            }
            None => None,
        };

        let result = ip_asset::mint_and_register_ip_with_terms(
            &state.chain,
            commercial_rev_share,
            derivatives_allowed,
            metadata,
            recipient,
            spg_nft_contract,
        )
        .await
        .map_err(classify)?;

        let summary = match &result.ip_id {
            Some(ip_id) => format!(
                "Registered IP asset {} with {}% revenue share. View: {}/ipa/{}",
                ip_id,
                commercial_rev_share,
                state.config.network.explorer_url(),
                ip_id,
            ),
            None => format!(
                "Registration submitted ({}% revenue share). Transaction: {}",
                commercial_rev_share, result.tx_hash,
            ),
        };

        let mut payload = json!({ "summary": summary });
        payload["result"] = to_value(&result)?;
        Ok(payload)
    })
}

pub fn create_spg_nft_collection(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let options = CollectionOptions::from_args(&args, state.chain.sender())?;
        let name = options.name.clone();
        let symbol = options.symbol.clone();

        let result = collection::create_spg_nft_collection(&state.chain, options)
            .await
            .map_err(classify)?;

        let mut payload = json!({
            "summary": format!(
                "Created SPG NFT collection '{}' ({}) at {}. Transaction: {}",
                name, symbol, result.spg_nft_contract, result.tx_hash,
            ),
        });
        payload["result"] = to_value(&result)?;
        Ok(payload)
    })
}

// Read-only explorer surface.

pub fn check_balance(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let address = arg_str(&args, "address")?.to_string();
        let info = state.scan.address_info(&address).await.map_err(classify)?;
        let formatted = U256::from_dec_str(&info.balance.value)
            .ok()
            .and_then(|wei| format_units(wei, 18).ok())
            .unwrap_or_else(|| info.balance.value.clone());

        let mut payload = json!({
            "summary": format!("Balance of {}: {} IP", address, formatted),
            "address": address,
        });
        payload["balance"] = to_value(&info.balance)?;
        Ok(payload)
    })
}

pub fn get_transactions(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let address = arg_str(&args, "address")?.to_string();
        let limit = arg_u64(&args, "limit")? as usize;
        let records = state
            .scan
            .transactions(&address, limit)
            .await
            .map_err(classify)?;

        let mut payload = json!({
            "summary": format!("{} recent transaction(s) for {}", records.len(), address),
            "address": address,
        });
        payload["transactions"] = to_value(&records)?;
        Ok(payload)
    })
}

pub fn get_stats(state: &AppState, _args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let stats = state.scan.stats().await.map_err(classify)?;
        let mut payload = json!({
            "summary": format!(
                "{} blocks, {} transactions, {} addresses; average block time {}ms",
                stats.total_blocks,
                stats.total_transactions,
                stats.total_addresses,
                stats.average_block_time,
            ),
        });
        payload["stats"] = to_value(&stats)?;
        Ok(payload)
    })
}

pub fn get_address_overview(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let address = arg_str(&args, "address")?.to_string();
        let overview = overview::build_address_overview(&state.scan, &address).await;

        let summary = if overview.partial {
            format!(
                "Overview for {} (sections unavailable: {})",
                address,
                overview.missing_sections.join(", "),
            )
        } else {
            format!("Overview for {}", address)
        };

        let mut payload = json!({ "summary": summary });
        payload["overview"] = to_value(&overview)?;
        Ok(payload)
    })
}

pub fn get_token_holdings(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let address = arg_str(&args, "address")?.to_string();
        let holdings = state
            .scan
            .token_holdings(&address)
            .await
            .map_err(classify)?;

        let mut payload = json!({
            "summary": format!("{} token holding(s) for {}", holdings.len(), address),
            "address": address,
        });
        payload["holdings"] = to_value(&holdings)?;
        Ok(payload)
    })
}

pub fn get_nft_holdings(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let address = arg_str(&args, "address")?.to_string();
        let holdings = state.scan.nft_holdings(&address).await.map_err(classify)?;

        let mut payload = json!({
            "summary": format!("{} NFT holding(s) for {}", holdings.len(), address),
            "address": address,
        });
        payload["holdings"] = to_value(&holdings)?;
        Ok(payload)
    })
}

pub fn interpret_transaction(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let hash = arg_str(&args, "transaction_hash")?.to_string();
        let interpreted = interpret::interpret_transaction(&state.scan, &hash)
            .await
            .map_err(classify)?;

        let mut payload = json!({ "summary": interpreted.summary.clone() });
        payload["interpretation"] = to_value(&interpreted)?;
        Ok(payload)
    })
}

// IPFS surface, registered only when a Pinata credential is configured.

fn require_ipfs(state: &AppState) -> Result<&crate::ipfs::PinataClient, ToolError> {
    state
        .ipfs
        .as_ref()
        .ok_or_else(|| ToolError::UpstreamUnavailable("IPFS support is not configured".into()))
}

pub fn upload_image_to_ipfs(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let ipfs = require_ipfs(state)?;
        let image_data = arg_str(&args, "image_data")?;
        let uri = ipfs.upload_image(image_data).await.map_err(classify)?;

        Ok(json!({
            "summary": format!("Image uploaded to IPFS: {}", uri),
            "image_uri": uri,
        }))
    })
}

pub fn create_ip_metadata(state: &AppState, args: Map<String, Value>) -> HandlerFuture<'_> {
    Box::pin(async move {
        let ipfs = require_ipfs(state)?;
        let image_uri = arg_str(&args, "image_uri")?;
        let name = arg_str(&args, "name")?;
        let description = arg_str(&args, "description")?;
        let attributes = args.get("attributes");

        let result = ipfs
            .create_ip_metadata(image_uri, name, description, attributes)
            .await
            .map_err(classify)?;

        let mut payload = json!({
            "summary": format!(
                "Created and pinned metadata for '{}'. Pass registration_metadata to mint_and_register_ip_with_terms.",
                name,
            ),
        });
        payload["metadata"] = result;
        Ok(payload)
    })
}
