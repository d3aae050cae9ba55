// src/scan/client.rs

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::scan::models::{
    AddressInfo, ChainStats, NftHolding, TokenHolding, TransactionRecord,
};

/// Thin HTTP client over the StoryScan (Blockscout v2) REST API. Read-only;
/// every method normalizes the raw response into a canonical model.
#[derive(Debug, Clone)]
pub struct ScanClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ScanClient {
    pub fn new(endpoint: &str) -> Self {
        ScanClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}/v2/{}", self.endpoint, path);
        debug!(%url, "storyscan request");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("storyscan request failed: {path}"))?
            .error_for_status()
            .with_context(|| format!("storyscan rejected request: {path}"))?;
        let body = response
            .json::<Value>()
            .await
            .with_context(|| format!("storyscan returned invalid JSON: {path}"))?;
        Ok(body)
    }

    pub async fn address_info(&self, address: &str) -> Result<AddressInfo> {
        let body = self.get_json(&format!("addresses/{address}")).await?;
        Ok(AddressInfo::from_scan(&body))
    }

    /// Most recent transactions for an address, newest first, truncated to
    /// `limit` entries client-side.
    pub async fn transactions(&self, address: &str, limit: usize) -> Result<Vec<TransactionRecord>> {
        let body = self
            .get_json(&format!("addresses/{address}/transactions"))
            .await?;
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(items
            .iter()
            .take(limit)
            .map(TransactionRecord::from_scan)
            .collect())
    }

    pub async fn stats(&self) -> Result<ChainStats> {
        let body = self.get_json("stats").await?;
        Ok(ChainStats::from_scan(&body))
    }

    pub async fn token_holdings(&self, address: &str) -> Result<Vec<TokenHolding>> {
        let body = self
            .get_json(&format!("addresses/{address}/tokens"))
            .await?;
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(items.iter().map(TokenHolding::from_scan).collect())
    }

    pub async fn nft_holdings(&self, address: &str) -> Result<Vec<NftHolding>> {
        let body = self
            .get_json(&format!("addresses/{address}/collectibles"))
            .await?;
        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(items.iter().map(NftHolding::from_scan).collect())
    }

    /// Fetch a single transaction, returning both the normalized record and
    /// the raw body so callers can surface fields the record drops.
    pub async fn transaction(&self, hash: &str) -> Result<(TransactionRecord, Value)> {
        let body = self.get_json(&format!("transactions/{hash}")).await?;
        Ok((TransactionRecord::from_scan(&body), body))
    }

    /// Indexer-generated human summary for a transaction. Not available for
    /// every transaction; callers treat failure as absence.
    pub async fn transaction_summary(&self, hash: &str) -> Result<Value> {
        self.get_json(&format!("transactions/{hash}/summary")).await
    }
}
