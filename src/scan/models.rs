//! Canonical shapes for the StoryScan (Blockscout v2) read surface, plus the
//! normalizers that map raw API responses into them. Normalizers are total:
//! any field the indexer omits maps to an explicit default, never a crash.

use serde::Serialize;
use serde_json::Value;

use crate::blockchain::models::AmountQuantity;

pub const NATIVE_DECIMALS: u32 = 18;

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|s| s.as_str()).map(|s| s.to_string())
}

fn bool_field(v: &Value, key: &str) -> bool {
    v.get(key).and_then(|b| b.as_bool()).unwrap_or(false)
}

fn f64_field(v: &Value, key: &str) -> f64 {
    v.get(key).and_then(|n| n.as_f64()).unwrap_or(0.0)
}

// Blockscout renders numeric totals as either strings or numbers depending
// on the field; normalize both to strings.
fn numeric_string(v: &Value, key: &str) -> String {
    match v.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressInfo {
    pub address: String,
    pub balance: AmountQuantity,
    pub is_contract: bool,
    pub has_tokens: bool,
    pub has_token_transfers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<String>,
}

impl AddressInfo {
    pub fn from_scan(v: &Value) -> Self {
        AddressInfo {
            address: str_field(v, "hash").unwrap_or_default(),
            balance: AmountQuantity::from_raw(
                v.get("coin_balance").and_then(|b| b.as_str()),
                NATIVE_DECIMALS,
            ),
            is_contract: bool_field(v, "is_contract"),
            has_tokens: bool_field(v, "has_tokens"),
            has_token_transfers: bool_field(v, "has_token_transfers"),
            exchange_rate: str_field(v, "exchange_rate"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub to_is_contract: bool,
    pub value: AmountQuantity,
    pub fee: AmountQuantity,
    pub status: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl TransactionRecord {
    pub fn from_scan(v: &Value) -> Self {
        let party_hash = |key: &str| {
            v.get(key)
                .and_then(|p| p.get("hash"))
                .and_then(|h| h.as_str())
                .unwrap_or_default()
                .to_string()
        };
        TransactionRecord {
            hash: str_field(v, "hash").unwrap_or_default(),
            from: party_hash("from"),
            to: party_hash("to"),
            to_is_contract: v
                .get("to")
                .map(|p| bool_field(p, "is_contract"))
                .unwrap_or(false),
            value: AmountQuantity::from_raw(
                v.get("value").and_then(|x| x.as_str()),
                NATIVE_DECIMALS,
            ),
            fee: AmountQuantity::from_raw(
                v.get("fee")
                    .and_then(|f| f.get("value"))
                    .and_then(|x| x.as_str()),
                NATIVE_DECIMALS,
            ),
            status: str_field(v, "status").unwrap_or_else(|| "unknown".to_string()),
            timestamp: str_field(v, "timestamp").unwrap_or_default(),
            block_number: v.get("block_number").and_then(|b| b.as_u64()),
            method: str_field(v, "method").filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GasPrices {
    pub slow: f64,
    pub average: f64,
    pub fast: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainStats {
    pub total_blocks: String,
    pub total_addresses: String,
    pub total_transactions: String,
    pub average_block_time: f64,
    pub transactions_today: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_price: Option<String>,
    pub market_cap: String,
    pub network_utilization_percentage: f64,
    pub gas_prices: GasPrices,
    pub gas_used_today: String,
}

impl ChainStats {
    pub fn from_scan(v: &Value) -> Self {
        let gas = v.get("gas_prices").cloned().unwrap_or(Value::Null);
        ChainStats {
            total_blocks: numeric_string(v, "total_blocks"),
            total_addresses: numeric_string(v, "total_addresses"),
            total_transactions: numeric_string(v, "total_transactions"),
            average_block_time: f64_field(v, "average_block_time"),
            transactions_today: numeric_string(v, "transactions_today"),
            coin_price: str_field(v, "coin_price"),
            market_cap: numeric_string(v, "market_cap"),
            network_utilization_percentage: f64_field(v, "network_utilization_percentage"),
            gas_prices: GasPrices {
                slow: f64_field(&gas, "slow"),
                average: f64_field(&gas, "average"),
                fast: f64_field(&gas, "fast"),
            },
            gas_used_today: numeric_string(v, "gas_used_today"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenHolding {
    pub name: String,
    pub symbol: String,
    pub token_address: String,
    pub token_type: String,
    pub balance: AmountQuantity,
}

impl TokenHolding {
    pub fn from_scan(v: &Value) -> Self {
        let token = v.get("token").cloned().unwrap_or(Value::Null);
        let decimals = token
            .get("decimals")
            .and_then(|d| d.as_str())
            .and_then(|d| d.parse::<u32>().ok())
            .unwrap_or(0);
        TokenHolding {
            name: str_field(&token, "name").unwrap_or_default(),
            symbol: str_field(&token, "symbol").unwrap_or_default(),
            token_address: str_field(&token, "address").unwrap_or_default(),
            token_type: str_field(&token, "type").unwrap_or_default(),
            balance: AmountQuantity::from_raw(v.get("value").and_then(|x| x.as_str()), decimals),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NftHolding {
    pub name: String,
    pub symbol: String,
    pub token_type: String,
    pub token_address: String,
    pub amount: String,
}

impl NftHolding {
    pub fn from_scan(v: &Value) -> Self {
        let token = v.get("token").cloned().unwrap_or(Value::Null);
        NftHolding {
            name: str_field(&token, "name").unwrap_or_default(),
            symbol: str_field(&token, "symbol").unwrap_or_default(),
            token_type: str_field(&token, "type").unwrap_or_default(),
            token_address: str_field(&token, "address").unwrap_or_default(),
            amount: numeric_string(v, "amount"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_record_is_total_over_sparse_input() {
        let record = TransactionRecord::from_scan(&json!({"hash": "0xabc"}));
        assert_eq!(record.hash, "0xabc");
        assert_eq!(record.from, "");
        assert_eq!(record.value.value, "0");
        assert_eq!(record.status, "unknown");
        assert!(record.method.is_none());
    }

    #[test]
    fn transaction_record_extracts_party_hashes() {
        let record = TransactionRecord::from_scan(&json!({
            "hash": "0xabc",
            "from": {"hash": "0x1111", "is_contract": false},
            "to": {"hash": "0x2222", "is_contract": true},
            "value": "1500000000000000000",
            "fee": {"type": "actual", "value": "21000000"},
            "status": "ok",
            "method": "transfer"
        }));
        assert_eq!(record.from, "0x1111");
        assert_eq!(record.to, "0x2222");
        assert!(record.to_is_contract);
        assert_eq!(record.value.value, "1500000000000000000");
        assert_eq!(record.fee.value, "21000000");
        assert_eq!(record.method.as_deref(), Some("transfer"));
    }

    #[test]
    fn chain_stats_accepts_mixed_numeric_encodings() {
        let stats = ChainStats::from_scan(&json!({
            "total_blocks": "123456",
            "total_transactions": 789,
            "average_block_time": 2400.5,
            "gas_prices": {"slow": 1.0, "average": 2.0, "fast": 3.0}
        }));
        assert_eq!(stats.total_blocks, "123456");
        assert_eq!(stats.total_transactions, "789");
        assert_eq!(stats.gas_prices.fast, 3.0);
        assert_eq!(stats.total_addresses, "0");
    }

    #[test]
    fn token_holding_uses_token_decimals() {
        let holding = TokenHolding::from_scan(&json!({
            "token": {"name": "Wrapped IP", "symbol": "WIP", "decimals": "18",
                       "address": "0x1514000000000000000000000000000000000000",
                       "type": "ERC-20"},
            "value": "42000000000000000000"
        }));
        assert_eq!(holding.symbol, "WIP");
        assert_eq!(holding.balance.decimals, 18);
        assert_eq!(holding.balance.value, "42000000000000000000");
    }
}
