// src/scan/overview.rs

use serde::Serialize;
use tracing::warn;

use crate::scan::client::ScanClient;
use crate::scan::models::{AddressInfo, NftHolding, TokenHolding, TransactionRecord};

const OVERVIEW_TX_LIMIT: usize = 5;

/// Composite view over several explorer endpoints. Sections that could not
/// be fetched are listed in `missing_sections` instead of failing the whole
/// call; `partial` is true whenever at least one section is missing.
#[derive(Debug, Clone, Serialize)]
pub struct AddressOverview {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<AddressInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_transactions: Option<Vec<TransactionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_holdings: Option<Vec<TokenHolding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_holdings: Option<Vec<NftHolding>>,
    pub partial: bool,
    pub missing_sections: Vec<&'static str>,
}

/// Build the overview with all four section fetches running concurrently.
/// Each section degrades independently; this function never fails.
pub async fn build_address_overview(scan: &ScanClient, address: &str) -> AddressOverview {
    let (balance, transactions, tokens, nfts) = futures::join!(
        scan.address_info(address),
        scan.transactions(address, OVERVIEW_TX_LIMIT),
        scan.token_holdings(address),
        scan.nft_holdings(address),
    );

    let mut missing = Vec::new();
    let balance = match balance {
        Ok(info) => Some(info),
        Err(err) => {
            warn!(%address, error = %err, "overview balance section unavailable");
            missing.push("balance");
            None
        }
    };
    let recent_transactions = match transactions {
        Ok(records) => Some(records),
        Err(err) => {
            warn!(%address, error = %err, "overview transactions section unavailable");
            missing.push("recent_transactions");
            None
        }
    };
    let token_holdings = match tokens {
        Ok(holdings) => Some(holdings),
        Err(err) => {
            warn!(%address, error = %err, "overview token holdings section unavailable");
            missing.push("token_holdings");
            None
        }
    };
    let nft_holdings = match nfts {
        Ok(holdings) => Some(holdings),
        Err(err) => {
            warn!(%address, error = %err, "overview NFT holdings section unavailable");
            missing.push("nft_holdings");
            None
        }
    };

    AddressOverview {
        address: address.to_string(),
        balance,
        recent_transactions,
        token_holdings,
        nft_holdings,
        partial: !missing.is_empty(),
        missing_sections: missing,
    }
}
