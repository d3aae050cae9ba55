//! Best-effort transaction interpretation. Classification is heuristic and
//! never fails: a transaction that matches no known pattern comes back as
//! `unknown` with the raw record attached.

use anyhow::Result;
use ethers_core::types::U256;
use ethers_core::utils::format_units;
use serde::Serialize;
use serde_json::Value;

use crate::scan::client::ScanClient;
use crate::scan::models::TransactionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Transfer,
    TokenMint,
    ContractCall,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterpretedTransaction {
    pub hash: String,
    pub kind: OperationKind,
    pub summary: String,
    pub record: TransactionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer_summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Classify a normalized record into a coarse operation kind.
pub fn classify(record: &TransactionRecord) -> OperationKind {
    if let Some(method) = &record.method {
        let lowered = method.to_lowercase();
        if lowered == "transfer" || lowered == "transferfrom" || lowered == "safetransferfrom" {
            return OperationKind::Transfer;
        }
        if lowered.contains("mint") {
            return OperationKind::TokenMint;
        }
        return OperationKind::ContractCall;
    }
    // No decoded method: a plain value movement to an externally owned
    // account is a native transfer, anything aimed at a contract is a call.
    if record.to_is_contract {
        return OperationKind::ContractCall;
    }
    if record.value.value != "0" {
        return OperationKind::Transfer;
    }
    OperationKind::Unknown
}

fn format_native(raw: &str) -> String {
    U256::from_dec_str(raw)
        .ok()
        .and_then(|v| format_units(v, 18).ok())
        .unwrap_or_else(|| raw.to_string())
}

fn summarize(kind: OperationKind, record: &TransactionRecord) -> String {
    match kind {
        OperationKind::Transfer => format!(
            "Transfer of {} IP from {} to {}",
            format_native(&record.value.value),
            record.from,
            record.to
        ),
        OperationKind::TokenMint => format!(
            "Token mint via {} on {}",
            record.method.as_deref().unwrap_or("mint"),
            record.to
        ),
        OperationKind::ContractCall => match &record.method {
            Some(method) => format!("Call to {} on contract {}", method, record.to),
            None => format!("Call to contract {}", record.to),
        },
        OperationKind::Unknown => "Unrecognized transaction pattern".to_string(),
    }
}

/// Fetch a transaction and classify it. The indexer's own summary endpoint
/// is consulted concurrently but its failure is tolerated.
pub async fn interpret_transaction(
    scan: &ScanClient,
    hash: &str,
) -> Result<InterpretedTransaction> {
    let (fetched, summary) = tokio::join!(scan.transaction(hash), scan.transaction_summary(hash));
    let (record, raw) = fetched?;

    let kind = classify(&record);
    let summary_text = summarize(kind, &record);
    let raw = match kind {
        OperationKind::Unknown => Some(raw),
        _ => None,
    };

    Ok(InterpretedTransaction {
        hash: record.hash.clone(),
        kind,
        summary: summary_text,
        record,
        indexer_summary: summary.ok(),
        raw,
    })
}
