// src/blockchain/models.rs

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use ethers_core::abi::Token;
use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// An exact token amount: integer magnitude plus decimal-precision metadata.
/// Never a float internally; the value serializes as a decimal string so no
/// precision is lost on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountQuantity {
    pub value: String,
    pub decimals: u32,
}

impl AmountQuantity {
    pub fn from_u256(value: U256, decimals: u32) -> Self {
        Self {
            value: value.to_string(),
            decimals,
        }
    }

    /// Wrap an upstream decimal string, defaulting absent or malformed input
    /// to zero so normalizers stay total.
    pub fn from_raw(raw: Option<&str>, decimals: u32) -> Self {
        let value = raw
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or("0")
            .to_string();
        Self { value, decimals }
    }
}

/// The full PIL terms tuple as `PILicenseTemplate.getLicenseTerms` returns
/// it. Integer fields are string-typed to preserve exact magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseTerms {
    pub transferable: bool,
    pub royalty_policy: String,
    pub default_minting_fee: String,
    pub expiration: String,
    pub commercial_use: bool,
    pub commercial_attribution: bool,
    pub commercializer_checker: String,
    pub commercializer_checker_data: String,
    pub commercial_rev_share: u32,
    pub commercial_rev_ceiling: String,
    pub derivatives_allowed: bool,
    pub derivatives_attribution: bool,
    pub derivatives_approval: bool,
    pub derivatives_reciprocal: bool,
    pub derivative_rev_ceiling: String,
    pub currency: String,
    pub uri: String,
}

fn take_bool(t: Option<Token>, what: &str) -> Result<bool> {
    match t {
        Some(Token::Bool(b)) => Ok(b),
        other => bail!("expected bool for {}, got {:?}", what, other),
    }
}

fn take_uint(t: Option<Token>, what: &str) -> Result<U256> {
    match t {
        Some(Token::Uint(u)) => Ok(u),
        other => bail!("expected uint for {}, got {:?}", what, other),
    }
}

fn take_address(t: Option<Token>, what: &str) -> Result<String> {
    match t {
        Some(Token::Address(a)) => Ok(to_checksum(&a, None)),
        other => bail!("expected address for {}, got {:?}", what, other),
    }
}

impl LicenseTerms {
    /// Decode the 17-field tuple. Field order is fixed by the contract ABI.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        if tokens.len() != 17 {
            bail!("license terms tuple has {} fields, expected 17", tokens.len());
        }
        let mut it = tokens.into_iter();
        Ok(LicenseTerms {
            transferable: take_bool(it.next(), "transferable")?,
            royalty_policy: take_address(it.next(), "royaltyPolicy")?,
            default_minting_fee: take_uint(it.next(), "defaultMintingFee")?.to_string(),
            expiration: take_uint(it.next(), "expiration")?.to_string(),
            commercial_use: take_bool(it.next(), "commercialUse")?,
            commercial_attribution: take_bool(it.next(), "commercialAttribution")?,
            commercializer_checker: take_address(it.next(), "commercializerChecker")?,
            commercializer_checker_data: match it.next() {
                Some(Token::Bytes(b)) => format!("0x{}", hex::encode(b)),
                other => bail!("expected bytes for commercializerCheckerData, got {:?}", other),
            },
            commercial_rev_share: take_uint(it.next(), "commercialRevShare")?.as_u32(),
            commercial_rev_ceiling: take_uint(it.next(), "commercialRevCeiling")?.to_string(),
            derivatives_allowed: take_bool(it.next(), "derivativesAllowed")?,
            derivatives_attribution: take_bool(it.next(), "derivativesAttribution")?,
            derivatives_approval: take_bool(it.next(), "derivativesApproval")?,
            derivatives_reciprocal: take_bool(it.next(), "derivativesReciprocal")?,
            derivative_rev_ceiling: take_uint(it.next(), "derivativeRevCeiling")?.to_string(),
            currency: take_address(it.next(), "currency")?,
            uri: match it.next() {
                Some(Token::String(s)) => s,
                other => bail!("expected string for uri, got {:?}", other),
            },
        })
    }
}

/// Metadata URIs and hashes handed to registration. The gateway validates
/// presence and type only; semantics belong to the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationMetadata {
    pub ip_metadata_uri: String,
    pub ip_metadata_hash: String,
    pub nft_metadata_uri: String,
    pub nft_metadata_hash: String,
}

impl RegistrationMetadata {
    pub fn from_value(value: &Value) -> Result<Self, ToolError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            ToolError::invalid(
                "registration_metadata",
                format!("expected ip/nft metadata URIs and hashes: {}", e),
            )
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintLicenseResult {
    pub tx_hash: String,
    pub license_token_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub tx_hash: String,
    pub ip_id: Option<String>,
    pub token_id: Option<String>,
    pub license_terms_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TransferResult {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

// The collection result keys mirror the SDK response shape.
#[derive(Debug, Serialize)]
pub struct CollectionResult {
    pub tx_hash: String,
    pub spg_nft_contract: String,
}

/// Resolved SPG collection creation parameters. Defaults follow the SDK:
/// public minting, mint open, zero fee paid to the zero address, unlimited
/// supply, owner = sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
    pub contract_uri: String,
    pub max_supply: u32,
    pub mint_fee: U256,
    pub mint_fee_token: Address,
    pub mint_fee_recipient: Address,
    pub owner: Address,
    pub mint_open: bool,
    pub is_public_minting: bool,
}

fn arg_address(args: &Map<String, Value>, name: &str) -> Result<Option<Address>, ToolError> {
    match args.get(name).and_then(|v| v.as_str()) {
        Some(s) => Address::from_str(s)
            .map(Some)
            .map_err(|_| ToolError::invalid(name, "malformed address")),
        None => Ok(None),
    }
}

impl CollectionOptions {
    /// Resolve validated tool arguments into the full parameter struct,
    /// filling every omitted option with its declared default.
    pub fn from_args(args: &Map<String, Value>, sender: Address) -> Result<Self, ToolError> {
        let str_arg = |name: &str, default: &str| {
            args.get(name)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };
        Ok(CollectionOptions {
            name: str_arg("name", ""),
            symbol: str_arg("symbol", ""),
            base_uri: str_arg("base_uri", ""),
            contract_uri: str_arg("contract_uri", ""),
            // u32::MAX is the SDK's "unlimited" sentinel
            max_supply: args
                .get("max_supply")
                .and_then(|v| v.as_u64())
                .map(|v| v as u32)
                .unwrap_or(u32::MAX),
            mint_fee: U256::from(args.get("mint_fee").and_then(|v| v.as_u64()).unwrap_or(0)),
            mint_fee_token: arg_address(args, "mint_fee_token")?.unwrap_or_else(Address::zero),
            mint_fee_recipient: arg_address(args, "mint_fee_recipient")?
                .unwrap_or_else(Address::zero),
            owner: arg_address(args, "owner")?.unwrap_or(sender),
            mint_open: args
                .get("mint_open")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            is_public_minting: args
                .get("is_public_minting")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
        })
    }

    /// The SPGNFT init-params tuple in contract field order.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::String(self.base_uri.clone()),
            Token::String(self.contract_uri.clone()),
            Token::Uint(U256::from(self.max_supply)),
            Token::Uint(self.mint_fee),
            Token::Address(self.mint_fee_token),
            Token::Address(self.mint_fee_recipient),
            Token::Address(self.owner),
            Token::Bool(self.mint_open),
            Token::Bool(self.is_public_minting),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tokens() -> Vec<Token> {
        vec![
            Token::Bool(true),
            Token::Address(Address::zero()),
            Token::Uint(U256::from_dec_str("123456789012345678901234567890").unwrap()),
            Token::Uint(U256::zero()),
            Token::Bool(true),
            Token::Bool(false),
            Token::Address(Address::zero()),
            Token::Bytes(vec![0u8; 20]),
            Token::Uint(U256::from(5_000_000u64)),
            Token::Uint(U256::zero()),
            Token::Bool(true),
            Token::Bool(true),
            Token::Bool(false),
            Token::Bool(true),
            Token::Uint(U256::zero()),
            Token::Address(Address::from_str(crate::blockchain::contracts::WIP_TOKEN).unwrap()),
            Token::String("".into()),
        ]
    }

    #[test]
    fn license_terms_round_trip_preserves_all_fields() {
        let terms = LicenseTerms::from_tokens(sample_tokens()).unwrap();
        let serialized = serde_json::to_value(&terms).unwrap();
        // All 17 declared fields present, large uints survive as exact strings.
        assert_eq!(serialized.as_object().unwrap().len(), 17);
        assert_eq!(
            serialized["defaultMintingFee"],
            json!("123456789012345678901234567890")
        );
        assert_eq!(serialized["commercialRevShare"], json!(5_000_000));
        let back: LicenseTerms = serde_json::from_value(serialized).unwrap();
        assert_eq!(back, terms);
    }

    #[test]
    fn truncated_tuple_is_an_error() {
        assert!(LicenseTerms::from_tokens(vec![Token::Bool(true)]).is_err());
    }

    #[test]
    fn amount_quantity_defaults_malformed_input_to_zero() {
        assert_eq!(AmountQuantity::from_raw(Some("1000"), 18).value, "1000");
        assert_eq!(AmountQuantity::from_raw(Some("12.5"), 18).value, "0");
        assert_eq!(AmountQuantity::from_raw(None, 18).value, "0");
    }

    #[test]
    fn collection_options_resolve_documented_defaults() {
        let sender = Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        let mut args = Map::new();
        args.insert("name".into(), json!("My Collection"));
        args.insert("symbol".into(), json!("MYCOL"));
        let opts = CollectionOptions::from_args(&args, sender).unwrap();
        assert!(opts.is_public_minting);
        assert!(opts.mint_open);
        assert_eq!(opts.mint_fee, U256::zero());
        assert_eq!(opts.max_supply, u32::MAX);
        assert_eq!(opts.owner, sender);
        assert_eq!(opts.mint_fee_recipient, Address::zero());
        assert_eq!(opts.mint_fee_token, Address::zero());
    }

    #[test]
    fn collection_options_honor_explicit_values() {
        let sender = Address::zero();
        let owner = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        let mut args = Map::new();
        args.insert("name".into(), json!("C"));
        args.insert("symbol".into(), json!("C"));
        args.insert("max_supply".into(), json!(1000));
        args.insert("mint_fee".into(), json!(25));
        args.insert("mint_open".into(), json!(false));
        args.insert("owner".into(), json!(owner));
        let opts = CollectionOptions::from_args(&args, sender).unwrap();
        assert_eq!(opts.max_supply, 1000);
        assert_eq!(opts.mint_fee, U256::from(25u64));
        assert!(!opts.mint_open);
        assert_eq!(opts.owner, Address::from_str(owner).unwrap());
    }

    #[test]
    fn registration_metadata_requires_all_fields() {
        let ok = json!({
            "ip_metadata_uri": "ipfs://Qm1",
            "ip_metadata_hash": "0xaa",
            "nft_metadata_uri": "ipfs://Qm2",
            "nft_metadata_hash": "0xbb"
        });
        assert!(RegistrationMetadata::from_value(&ok).is_ok());
        let missing = json!({"ip_metadata_uri": "ipfs://Qm1"});
        assert!(RegistrationMetadata::from_value(&missing).is_err());
    }
}
