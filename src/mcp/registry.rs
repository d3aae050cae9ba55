//! Tool registry: the startup-time table mapping each tool name to its
//! parameter schema and handler. Dispatch never reaches a handler without the
//! argument bag passing validation here first; declared defaults are applied
//! for omitted optional parameters, and unknown extra fields are ignored for
//! forward-compatibility.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use ethers_core::types::Address;
use ethers_core::utils::to_checksum;
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::mcp::tools;
use crate::AppState;

pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// Handler bound to a tool at startup. Receives the validated, canonicalized
/// argument map (defaults already applied, addresses checksummed).
pub type ToolHandler = for<'a> fn(&'a AppState, Map<String, Value>) -> HandlerFuture<'a>;

/// Semantic parameter types. `Address` and `Hash` are format-checked before
/// anything is sent downstream; `Decimal` keeps exact integer magnitude by
/// staying textual end to end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Address,
    Hash,
    Decimal,
    Object,
    Array,
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    pub range: Option<(i64, i64)>,
    pub description: &'static str,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            range: None,
            description,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_range(mut self, lo: i64, hi: i64) -> Self {
        self.range = Some((lo, hi));
        self
    }
}

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    /// Whether invoking the handler can cause irreversible external state
    /// change. Drives timeout classification: a timed-out mutating call is
    /// `StateUnknown`, never plain `Timeout`.
    pub mutates: bool,
}

pub struct ToolEntry {
    pub def: ToolDefinition,
    pub handler: ToolHandler,
}

pub struct ToolRegistry {
    entries: HashMap<&'static str, ToolEntry>,
}

impl ToolRegistry {
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Definitions sorted by name, for a stable tools/list.
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> = self.entries.values().map(|e| &e.def).collect();
        defs.sort_by_key(|d| d.name);
        defs
    }
}

fn int_value(v: &Value) -> Option<i128> {
    v.as_i64()
        .map(i128::from)
        .or_else(|| v.as_u64().map(i128::from))
}

fn is_decimal_literal(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let mut dots = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1 && s != "."
}

fn check_hash(s: &str) -> bool {
    s.len() == 66
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a raw argument bag against a tool definition, producing the
/// canonical argument map the handler sees. Fails with `InvalidArgument`
/// naming the first offending field; never touches any external capability.
pub fn validate(def: &ToolDefinition, args: &Value) -> Result<Map<String, Value>, ToolError> {
    let empty = Map::new();
    let input = match args {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(ToolError::invalid(
                "arguments",
                "expected a JSON object of tool arguments",
            ))
        }
    };

    let mut out = Map::new();
    for spec in &def.params {
        let raw = input.get(spec.name).filter(|v| !v.is_null());
        let value = match raw {
            Some(v) => v.clone(),
            None => {
                if spec.required {
                    return Err(ToolError::invalid(spec.name, "missing required parameter"));
                }
                match &spec.default {
                    Some(d) => d.clone(),
                    None => continue,
                }
            }
        };

        let canonical = match spec.kind {
            ParamKind::String => {
                if !value.is_string() {
                    return Err(ToolError::invalid(spec.name, "expected a string"));
                }
                value
            }
            ParamKind::Boolean => {
                if !value.is_boolean() {
                    return Err(ToolError::invalid(spec.name, "expected a boolean"));
                }
                value
            }
            ParamKind::Integer => {
                let n = int_value(&value)
                    .ok_or_else(|| ToolError::invalid(spec.name, "expected an integer"))?;
                if let Some((lo, hi)) = spec.range {
                    if n < i128::from(lo) || n > i128::from(hi) {
                        return Err(ToolError::invalid(
                            spec.name,
                            format!("must be between {} and {}", lo, hi),
                        ));
                    }
                }
                value
            }
            ParamKind::Address => {
                let s = value
                    .as_str()
                    .ok_or_else(|| ToolError::invalid(spec.name, "expected a 0x-prefixed address"))?;
                let addr = Address::from_str(s).map_err(|_| {
                    ToolError::invalid(spec.name, "malformed address: expected 0x + 40 hex chars")
                })?;
                Value::String(to_checksum(&addr, None))
            }
            ParamKind::Hash => {
                let s = value
                    .as_str()
                    .ok_or_else(|| ToolError::invalid(spec.name, "expected a 0x-prefixed hash"))?;
                if !check_hash(s) {
                    return Err(ToolError::invalid(
                        spec.name,
                        "malformed hash: expected 0x + 64 hex chars",
                    ));
                }
                Value::String(s.to_lowercase())
            }
            ParamKind::Decimal => match &value {
                Value::String(s) if is_decimal_literal(s) => Value::String(s.clone()),
                Value::Number(n) if !n.to_string().contains('-') => {
                    Value::String(n.to_string())
                }
                _ => {
                    return Err(ToolError::invalid(
                        spec.name,
                        "expected a non-negative decimal amount",
                    ))
                }
            },
            ParamKind::Object => {
                if !value.is_object() {
                    return Err(ToolError::invalid(spec.name, "expected an object"));
                }
                value
            }
            ParamKind::Array => {
                if !value.is_array() {
                    return Err(ToolError::invalid(spec.name, "expected an array"));
                }
                value
            }
        };
        out.insert(spec.name.to_string(), canonical);
    }
    Ok(out)
}

/// JSON Schema for tools/list, generated from the declared parameter specs.
pub fn input_schema(def: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in &def.params {
        let ty = match spec.kind {
            ParamKind::String | ParamKind::Address | ParamKind::Hash | ParamKind::Decimal => {
                "string"
            }
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        };
        let mut prop = Map::new();
        prop.insert("type".into(), json!(ty));
        prop.insert("description".into(), json!(spec.description));
        if let Some(d) = &spec.default {
            prop.insert("default".into(), d.clone());
        }
        properties.insert(spec.name.to_string(), Value::Object(prop));
        if spec.required {
            required.push(json!(spec.name));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Build the process-wide tool table. IPFS upload tools are only registered
/// when a Pinata credential is configured, mirroring how the surfaces are
/// conditionally exposed to the agent.
pub fn build_registry(ipfs_enabled: bool) -> ToolRegistry {
    use ParamKind::*;

    let mut entries: Vec<(ToolDefinition, ToolHandler)> = vec![
        (
            ToolDefinition {
                name: "get_license_terms",
                description: "Get the PIL license terms registered under a specific ID.",
                params: vec![ParamSpec::required(
                    "license_terms_id",
                    Integer,
                    "The license terms ID to look up.",
                )
                .with_range(0, i64::MAX)],
                mutates: false,
            },
            tools::get_license_terms,
        ),
        (
            ToolDefinition {
                name: "mint_license_tokens",
                description: "Mint license tokens for an IP asset under existing license terms.",
                params: vec![
                    ParamSpec::required("ip_id", Address, "The licensor IP ID (IP Account address)."),
                    ParamSpec::required("license_terms_id", Integer, "The license terms ID to mint under.")
                        .with_range(0, i64::MAX),
                    ParamSpec::optional("amount", Integer, "Number of license tokens to mint.")
                        .with_default(json!(1))
                        .with_range(1, i64::MAX),
                    ParamSpec::optional("recipient", Address, "Receiver of the tokens (defaults to the sender)."),
                    ParamSpec::optional("max_minting_fee", Integer, "Maximum minting fee in wei.")
                        .with_range(0, i64::MAX),
                    ParamSpec::optional("max_revenue_share", Integer, "Maximum revenue share (0-100000000).")
                        .with_range(0, 100_000_000),
                ],
                mutates: true,
            },
            tools::mint_license_tokens,
        ),
        (
            ToolDefinition {
                name: "send_ip",
                description: "Send native IP tokens to an address (1 IP = 10^18 wei).",
                params: vec![
                    ParamSpec::required("to_address", Address, "The recipient's 0x... address."),
                    ParamSpec::required("amount", Decimal, "Amount of IP to send, as a decimal string."),
                ],
                mutates: true,
            },
            tools::send_ip,
        ),
        (
            ToolDefinition {
                name: "mint_and_register_ip_with_terms",
                description: "Mint an NFT, register it as an IP asset, and attach PIL terms.",
                params: vec![
                    ParamSpec::required(
                        "commercial_rev_share",
                        Integer,
                        "Commercial revenue share percentage (0-100).",
                    )
                    .with_range(0, 100),
                    ParamSpec::required("derivatives_allowed", Boolean, "Whether derivatives are allowed."),
                    ParamSpec::optional(
                        "registration_metadata",
                        Object,
                        "Metadata URIs and hashes produced by create_ip_metadata.",
                    ),
                    ParamSpec::optional("recipient", Address, "Recipient of the NFT (defaults to the sender)."),
                    ParamSpec::optional(
                        "spg_nft_contract",
                        Address,
                        "SPG NFT collection to mint into (defaults to the network's public collection).",
                    ),
                ],
                mutates: true,
            },
            tools::mint_and_register_ip_with_terms,
        ),
        (
            ToolDefinition {
                name: "create_spg_nft_collection",
                description: "Create a new SPG NFT collection usable for IP asset registration.",
                params: vec![
                    ParamSpec::required("name", String, "Name of the NFT collection."),
                    ParamSpec::required("symbol", String, "Symbol for the NFT collection."),
                    ParamSpec::optional("is_public_minting", Boolean, "Whether anyone can mint from this collection.")
                        .with_default(json!(true)),
                    ParamSpec::optional("mint_open", Boolean, "Whether minting is currently enabled.")
                        .with_default(json!(true)),
                    ParamSpec::optional("mint_fee_recipient", Address, "Address receiving mint fees (defaults to the zero address)."),
                    ParamSpec::optional("contract_uri", String, "Collection metadata URI (ERC-7572).")
                        .with_default(json!("")),
                    ParamSpec::optional("base_uri", String, "Base URI for token metadata.")
                        .with_default(json!("")),
                    ParamSpec::optional("max_supply", Integer, "Maximum supply (defaults to unlimited).")
                        .with_range(0, u32::MAX as i64),
                    ParamSpec::optional("mint_fee", Integer, "Cost to mint a token in wei.")
                        .with_default(json!(0))
                        .with_range(0, i64::MAX),
                    ParamSpec::optional("mint_fee_token", Address, "Fee token address (defaults to the native token)."),
                    ParamSpec::optional("owner", Address, "Collection owner (defaults to the sender)."),
                ],
                mutates: true,
            },
            tools::create_spg_nft_collection,
        ),
        (
            ToolDefinition {
                name: "check_balance",
                description: "Check the native IP balance of an address.",
                params: vec![ParamSpec::required("address", Address, "The 0x... address to check.")],
                mutates: false,
            },
            tools::check_balance,
        ),
        (
            ToolDefinition {
                name: "get_transactions",
                description: "Get recent transactions for an address.",
                params: vec![
                    ParamSpec::required("address", Address, "The 0x... address to query."),
                    ParamSpec::optional("limit", Integer, "Maximum number of transactions to return.")
                        .with_default(json!(10))
                        .with_range(1, 50),
                ],
                mutates: false,
            },
            tools::get_transactions,
        ),
        (
            ToolDefinition {
                name: "get_stats",
                description: "Get current blockchain statistics.",
                params: vec![],
                mutates: false,
            },
            tools::get_stats,
        ),
        (
            ToolDefinition {
                name: "get_address_overview",
                description: "Comprehensive address overview: balance, recent activity, token and NFT holdings. Sections degrade independently.",
                params: vec![ParamSpec::required("address", Address, "The 0x... address to summarize.")],
                mutates: false,
            },
            tools::get_address_overview,
        ),
        (
            ToolDefinition {
                name: "get_token_holdings",
                description: "Get ERC-20 token holdings for an address.",
                params: vec![ParamSpec::required("address", Address, "The 0x... address to query.")],
                mutates: false,
            },
            tools::get_token_holdings,
        ),
        (
            ToolDefinition {
                name: "get_nft_holdings",
                description: "Get NFT collection holdings for an address.",
                params: vec![ParamSpec::required("address", Address, "The 0x... address to query.")],
                mutates: false,
            },
            tools::get_nft_holdings,
        ),
        (
            ToolDefinition {
                name: "interpret_transaction",
                description: "Classify a transaction and produce a human-readable summary.",
                params: vec![ParamSpec::required(
                    "transaction_hash",
                    Hash,
                    "The transaction hash to interpret.",
                )],
                mutates: false,
            },
            tools::interpret_transaction,
        ),
    ];

    if ipfs_enabled {
        entries.push((
            ToolDefinition {
                name: "upload_image_to_ipfs",
                description: "Upload an image to IPFS via Pinata. Accepts an http(s) URL or base64 bytes.",
                params: vec![ParamSpec::required(
                    "image_data",
                    String,
                    "Image URL or base64-encoded image bytes.",
                )],
                mutates: true,
            },
            tools::upload_image_to_ipfs,
        ));
        entries.push((
            ToolDefinition {
                name: "create_ip_metadata",
                description: "Create NFT and IP metadata for an uploaded image and pin both to IPFS.",
                params: vec![
                    ParamSpec::required("image_uri", String, "IPFS URI of the uploaded image."),
                    ParamSpec::required("name", String, "Name of the NFT / IP."),
                    ParamSpec::required("description", String, "Description of the NFT / IP."),
                    ParamSpec::optional("attributes", Array, "Optional list of attribute objects."),
                ],
                mutates: true,
            },
            tools::create_ip_metadata,
        ));
    }

    ToolRegistry {
        entries: entries
            .into_iter()
            .map(|(def, handler)| (def.name, ToolEntry { def, handler }))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def_for(name: &str) -> ToolDefinition {
        build_registry(true).get(name).expect("tool").def.clone()
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let def = def_for("check_balance");
        let err = validate(&def, &json!({})).unwrap_err();
        match err {
            ToolError::InvalidArgument { field, .. } => assert_eq!(field, "address"),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn malformed_address_is_rejected() {
        let def = def_for("check_balance");
        let err = validate(&def, &json!({"address": "0x1234"})).unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn addresses_are_checksummed() {
        let def = def_for("check_balance");
        let out = validate(
            &def,
            &json!({"address": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"}),
        )
        .unwrap();
        assert_eq!(
            out["address"],
            json!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn defaults_are_applied() {
        let def = def_for("get_transactions");
        let out = validate(
            &def,
            &json!({"address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"}),
        )
        .unwrap();
        assert_eq!(out["limit"], json!(10));
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let def = def_for("check_balance");
        let out = validate(
            &def,
            &json!({
                "address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "verbose": true
            }),
        )
        .unwrap();
        assert!(!out.contains_key("verbose"));
    }

    #[test]
    fn rev_share_range_is_enforced() {
        let def = def_for("mint_and_register_ip_with_terms");
        let err = validate(
            &def,
            &json!({"commercial_rev_share": 150, "derivatives_allowed": true}),
        )
        .unwrap_err();
        match err {
            ToolError::InvalidArgument { field, .. } => {
                assert_eq!(field, "commercial_rev_share")
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn float_where_integer_expected_is_rejected() {
        let def = def_for("get_license_terms");
        assert!(validate(&def, &json!({"license_terms_id": 1.5})).is_err());
        assert!(validate(&def, &json!({"license_terms_id": 3})).is_ok());
    }

    #[test]
    fn decimal_amounts_stay_textual() {
        let def = def_for("send_ip");
        let out = validate(
            &def,
            &json!({
                "to_address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "amount": "1.5"
            }),
        )
        .unwrap();
        assert_eq!(out["amount"], json!("1.5"));
        assert!(validate(
            &def,
            &json!({
                "to_address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "amount": "not-a-number"
            }),
        )
        .is_err());
    }

    #[test]
    fn ipfs_tools_follow_the_credential() {
        assert!(build_registry(true).contains("upload_image_to_ipfs"));
        assert!(!build_registry(false).contains("upload_image_to_ipfs"));
        assert!(!build_registry(false).contains("create_ip_metadata"));
    }
}
