//! Story Protocol contract addresses, function selectors, and ABI plumbing.
//! The protocol deploys its core and periphery contracts at the same
//! addresses on Aeneid and mainnet; only the default public SPG collection
//! differs per network.

use std::str::FromStr;

use anyhow::{Context, Result};
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use ethers_core::utils::keccak256;

use crate::config::Network;

/// The WIP (wrapped IP) token used as the default PIL currency.
pub const WIP_TOKEN: &str = "0x1514000000000000000000000000000000000000";

const PIL_LICENSE_TEMPLATE: &str = "0x2E896b0b2Fdb7457499B56AAaA4AE55BCB4Cd316";
const ROYALTY_POLICY_LAP: &str = "0xBe54FB168b3c982b7AcF78a34bb031a5a5d35c73";
const LICENSING_MODULE: &str = "0x04fbd8a2e56dd85CFD5500A4A4DfA955B9f1dE6f";
const REGISTRATION_WORKFLOWS: &str = "0xbe39E1C756e921BD25DF86e7AAa31106d1eb0424";
const LICENSE_ATTACHMENT_WORKFLOWS: &str = "0xcC2E862bCee5B6036Db0de6E06Ae87e524a79fd8";
const DEFAULT_SPG_NFT_AENEID: &str = "0xc32A8a0FF3beDDDa58393d022aF433e78739FAbc";
const DEFAULT_SPG_NFT_MAINNET: &str = "0x98971c660ac20880b60F86Cc3113eBd979eb3aAE";

/// Per-network contract address table, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ContractSet {
    pub pil_license_template: Address,
    pub royalty_policy_lap: Address,
    pub licensing_module: Address,
    pub registration_workflows: Address,
    pub license_attachment_workflows: Address,
    pub default_spg_nft: Address,
    pub wip_token: Address,
}

impl ContractSet {
    pub fn for_network(network: Network) -> Self {
        let addr = |s: &str| Address::from_str(s).expect("static contract address");
        ContractSet {
            pil_license_template: addr(PIL_LICENSE_TEMPLATE),
            royalty_policy_lap: addr(ROYALTY_POLICY_LAP),
            licensing_module: addr(LICENSING_MODULE),
            registration_workflows: addr(REGISTRATION_WORKFLOWS),
            license_attachment_workflows: addr(LICENSE_ATTACHMENT_WORKFLOWS),
            default_spg_nft: addr(match network {
                Network::Aeneid => DEFAULT_SPG_NFT_AENEID,
                Network::Mainnet => DEFAULT_SPG_NFT_MAINNET,
            }),
            wip_token: addr(WIP_TOKEN),
        }
    }
}

/// First four bytes of the keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encoded calldata: selector followed by the encoded arguments.
pub fn call_data(signature: &str, tokens: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend(encode(tokens));
    Bytes::from(data)
}

/// keccak-256 of the event signature, used as topic0 when scanning receipts.
pub fn event_topic(signature: &str) -> H256 {
    H256::from(keccak256(signature.as_bytes()))
}

pub const COLLECTION_CREATED_EVENT: &str = "CollectionCreated(address)";
pub const IP_REGISTERED_EVENT: &str =
    "IPRegistered(address,uint256,address,uint256,string,string,uint256)";
pub const LICENSE_TOKENS_MINTED_EVENT: &str =
    "LicenseTokensMinted(address,address,address,uint256,uint256,address,uint256)";
pub const LICENSE_TERMS_ATTACHED_EVENT: &str =
    "LicenseTermsAttached(address,address,address,uint256)";

fn log_topic0(log: &serde_json::Value) -> Option<H256> {
    let t = log.get("topics")?.as_array()?.first()?.as_str()?;
    H256::from_str(t).ok()
}

fn log_topic(log: &serde_json::Value, index: usize) -> Option<H256> {
    let t = log.get("topics")?.as_array()?.get(index)?.as_str()?;
    H256::from_str(t).ok()
}

fn log_data(log: &serde_json::Value) -> Vec<u8> {
    log.get("data")
        .and_then(|d| d.as_str())
        .and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
        .unwrap_or_default()
}

fn word(data: &[u8], index: usize) -> Option<&[u8]> {
    data.get(index * 32..(index + 1) * 32)
}

/// Pull the created collection address out of a receipt's logs. Best-effort:
/// absent or unrecognized logs yield None rather than an error.
pub fn decode_collection_created(receipt: &serde_json::Value) -> Option<Address> {
    let topic = event_topic(COLLECTION_CREATED_EVENT);
    receipt
        .get("logs")?
        .as_array()?
        .iter()
        .find(|log| log_topic0(log) == Some(topic))
        .and_then(|log| log_topic(log, 1))
        .map(|t| Address::from_slice(&t.as_bytes()[12..]))
}

/// Pull (ipId, tokenId) out of an IPRegistered log. The ipId rides in the
/// data section's first word; the tokenId is the third indexed topic.
pub fn decode_ip_registered(receipt: &serde_json::Value) -> Option<(Address, U256)> {
    let topic = event_topic(IP_REGISTERED_EVENT);
    let log = receipt
        .get("logs")?
        .as_array()?
        .iter()
        .find(|log| log_topic0(log) == Some(topic))?;
    let data = log_data(log);
    let ip_word = word(&data, 0)?;
    let ip_id = Address::from_slice(&ip_word[12..]);
    let token_id = U256::from_big_endian(log_topic(log, 3)?.as_bytes());
    Some((ip_id, token_id))
}

/// Pull the minted license token ID range out of a receipt. Returns the
/// individual token IDs (start..start+amount).
pub fn decode_license_tokens_minted(receipt: &serde_json::Value) -> Vec<U256> {
    let topic = event_topic(LICENSE_TOKENS_MINTED_EVENT);
    let Some(logs) = receipt.get("logs").and_then(|l| l.as_array()) else {
        return Vec::new();
    };
    let Some(log) = logs.iter().find(|log| log_topic0(log) == Some(topic)) else {
        return Vec::new();
    };
    // Non-indexed data words: licenseTemplate, amount, receiver, startLicenseTokenId
    let data = log_data(log);
    let amount = word(&data, 1).map(U256::from_big_endian).unwrap_or_default();
    let Some(start) = word(&data, 3).map(U256::from_big_endian) else {
        return Vec::new();
    };
    // An amount that does not fit in u64 cannot come from an honest mint;
    // treat the log as unrecognized rather than materialize garbage.
    if amount.bits() > 64 {
        return Vec::new();
    }
    (0..amount.as_u64()).map(|i| start + U256::from(i)).collect()
}

/// Collect every license terms ID attached in a receipt. A registration can
/// attach more than one terms set, so all matching logs are read.
/// Non-indexed data words: licenseTemplate, licenseTermsId.
pub fn decode_license_terms_attached(receipt: &serde_json::Value) -> Vec<U256> {
    let topic = event_topic(LICENSE_TERMS_ATTACHED_EVENT);
    let Some(logs) = receipt.get("logs").and_then(|l| l.as_array()) else {
        return Vec::new();
    };
    logs.iter()
        .filter(|log| log_topic0(log) == Some(topic))
        .filter_map(|log| word(&log_data(log), 1).map(U256::from_big_endian))
        .collect()
}

pub fn receipt_tx_hash(receipt: &serde_json::Value) -> Option<String> {
    receipt
        .get("transactionHash")
        .and_then(|h| h.as_str())
        .map(|s| s.to_string())
}

pub fn require_address(s: &str, what: &str) -> Result<Address> {
    Address::from_str(s).with_context(|| format!("malformed {} address: {}", what, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selector_matches_known_vector() {
        // ERC-20 transfer(address,uint256) selector is the canonical test vector.
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn call_data_starts_with_selector() {
        let data = call_data(
            "getLicenseTerms(uint256)",
            &[Token::Uint(U256::from(42u64))],
        );
        assert_eq!(&data[..4], &selector("getLicenseTerms(uint256)"));
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn collection_created_log_decodes_to_address() {
        let collection = "0x00000000000000000000000042424242424242424242424242424242deadbeef";
        let receipt = json!({
            "logs": [{
                "topics": [
                    format!("{:#x}", event_topic(COLLECTION_CREATED_EVENT)),
                    collection,
                ],
                "data": "0x"
            }]
        });
        let addr = decode_collection_created(&receipt).expect("address");
        assert_eq!(
            format!("{:#x}", addr),
            "0x42424242424242424242424242424242deadbeef"
        );
    }

    fn data_words(words: &[U256]) -> String {
        let mut hex_data = "0x".to_string();
        for w in words {
            let mut buf = [0u8; 32];
            w.to_big_endian(&mut buf);
            hex_data.push_str(&hex::encode(buf));
        }
        hex_data
    }

    #[test]
    fn minted_token_ids_cover_the_full_amount() {
        let receipt = json!({
            "logs": [{
                "topics": [format!("{:#x}", event_topic(LICENSE_TOKENS_MINTED_EVENT))],
                // licenseTemplate, amount, receiver, startLicenseTokenId
                "data": data_words(&[
                    U256::zero(),
                    U256::from(100u64),
                    U256::zero(),
                    U256::from(500u64),
                ]),
            }]
        });
        let ids = decode_license_tokens_minted(&receipt);
        assert_eq!(ids.len(), 100);
        assert_eq!(ids[0], U256::from(500u64));
        assert_eq!(ids[99], U256::from(599u64));
    }

    #[test]
    fn attached_terms_ids_are_collected_from_all_logs() {
        let attach_log = |terms_id: u64| {
            json!({
                "topics": [format!("{:#x}", event_topic(LICENSE_TERMS_ATTACHED_EVENT))],
                // licenseTemplate, licenseTermsId
                "data": data_words(&[U256::zero(), U256::from(terms_id)]),
            })
        };
        let receipt = json!({ "logs": [attach_log(7), attach_log(42)] });
        assert_eq!(
            decode_license_terms_attached(&receipt),
            vec![U256::from(7u64), U256::from(42u64)]
        );
    }

    #[test]
    fn unrecognized_logs_decode_to_none() {
        let receipt = json!({"logs": [{"topics": [
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        ], "data": "0x"}]});
        assert!(decode_collection_created(&receipt).is_none());
        assert!(decode_ip_registered(&receipt).is_none());
        assert!(decode_license_tokens_minted(&receipt).is_empty());
        assert!(decode_license_terms_attached(&receipt).is_empty());
    }
}
