// src/blockchain/services/ip_asset.rs

use anyhow::Result;
use ethers_core::abi::Token;
use ethers_core::types::{Address, TransactionRequest, H256, U256};
use tracing::info;

use crate::blockchain::client::StoryClient;
use crate::blockchain::contracts::{
    call_data, decode_ip_registered, decode_license_terms_attached, ContractSet,
};
use crate::blockchain::models::RegistrationResult;

const MINT_AND_REGISTER_SIG: &str = "mintAndRegisterIpAndAttachPILTerms(address,address,(string,bytes32,string,bytes32),((bool,address,uint256,uint256,bool,bool,address,bytes,uint32,uint256,bool,bool,bool,bool,uint256,address,string),(bool,uint256,address,bytes,uint32,bool,uint32,address))[],bool)";

// Contract rev-share units: 100% == 100_000_000.
const REV_SHARE_SCALE: u32 = 1_000_000;

/// Parsed ip/nft metadata pair forwarded to registration. Hash validation
/// happens at the tool boundary; this struct only carries parsed values.
#[derive(Debug, Clone)]
pub struct IpMetadata {
    pub ip_metadata_uri: String,
    pub ip_metadata_hash: H256,
    pub nft_metadata_uri: String,
    pub nft_metadata_hash: H256,
}

fn metadata_token(metadata: Option<&IpMetadata>) -> Token {
    match metadata {
        Some(m) => Token::Tuple(vec![
            Token::String(m.ip_metadata_uri.clone()),
            Token::FixedBytes(m.ip_metadata_hash.as_bytes().to_vec()),
            Token::String(m.nft_metadata_uri.clone()),
            Token::FixedBytes(m.nft_metadata_hash.as_bytes().to_vec()),
        ]),
        None => Token::Tuple(vec![
            Token::String(String::new()),
            Token::FixedBytes(vec![0u8; 32]),
            Token::String(String::new()),
            Token::FixedBytes(vec![0u8; 32]),
        ]),
    }
}

/// Build the PIL terms tuple for a commercial-remix style registration.
/// Commercial use follows from a non-zero revenue share; attribution and
/// reciprocity of derivatives follow the derivatives flag.
pub fn pil_terms_token(
    commercial_rev_share: u32,
    derivatives_allowed: bool,
    contracts: &ContractSet,
) -> Token {
    Token::Tuple(vec![
        Token::Bool(true),                                   // transferable
        Token::Address(contracts.royalty_policy_lap),        // royaltyPolicy
        Token::Uint(U256::zero()),                           // defaultMintingFee
        Token::Uint(U256::zero()),                           // expiration
        Token::Bool(commercial_rev_share > 0),               // commercialUse
        Token::Bool(false),                                  // commercialAttribution
        Token::Address(Address::zero()),                     // commercializerChecker
        Token::Bytes(Vec::new()),                            // commercializerCheckerData
        Token::Uint(U256::from(commercial_rev_share * REV_SHARE_SCALE)), // commercialRevShare
        Token::Uint(U256::zero()),                           // commercialRevCeiling
        Token::Bool(derivatives_allowed),                    // derivativesAllowed
        Token::Bool(derivatives_allowed),                    // derivativesAttribution
        Token::Bool(false),                                  // derivativesApproval
        Token::Bool(derivatives_allowed),                    // derivativesReciprocal
        Token::Uint(U256::zero()),                           // derivativeRevCeiling
        Token::Address(contracts.wip_token),                 // currency
        Token::String(String::new()),                        // uri
    ])
}

fn licensing_config_token(commercial_rev_share: u32) -> Token {
    Token::Tuple(vec![
        Token::Bool(true),                                   // isSet
        Token::Uint(U256::zero()),                           // mintingFee
        Token::Address(Address::zero()),                     // licensingHook
        Token::Bytes(Vec::new()),                            // hookData
        Token::Uint(U256::from(commercial_rev_share * REV_SHARE_SCALE)), // commercialRevShare
        Token::Bool(false),                                  // disabled
        Token::Uint(U256::zero()),                           // expectMinimumGroupRewardShare
        Token::Address(Address::zero()),                     // expectGroupRewardPool
    ])
}

/// Mint an NFT into an SPG collection, register it as an IP asset, and
/// attach PIL terms, all in one transaction.
pub async fn mint_and_register_ip_with_terms(
    client: &StoryClient,
    commercial_rev_share: u32,
    derivatives_allowed: bool,
    metadata: Option<IpMetadata>,
    recipient: Option<Address>,
    spg_nft_contract: Option<Address>,
) -> Result<RegistrationResult> {
    let recipient = recipient.unwrap_or_else(|| client.sender());
    let spg_nft_contract = spg_nft_contract.unwrap_or(client.contracts.default_spg_nft);

    let terms_data = Token::Array(vec![Token::Tuple(vec![
        pil_terms_token(commercial_rev_share, derivatives_allowed, &client.contracts),
        licensing_config_token(commercial_rev_share),
    ])]);

    let data = call_data(
        MINT_AND_REGISTER_SIG,
        &[
            Token::Address(spg_nft_contract),
            Token::Address(recipient),
            metadata_token(metadata.as_ref()),
            terms_data,
            Token::Bool(true), // allowDuplicates
        ],
    );

    let tx = TransactionRequest::new()
        .to(client.contracts.license_attachment_workflows)
        .data(data);
    let tx_hash = client.submit_transaction(tx).await?;
    info!(
        tx_hash = %format!("{:#x}", tx_hash),
        rev_share = commercial_rev_share,
        "mint_and_register_ip_with_terms submitted"
    );

    let receipt = client.wait_for_receipt(tx_hash).await?;
    let registered = decode_ip_registered(&receipt);
    let license_terms_ids = decode_license_terms_attached(&receipt)
        .into_iter()
        .map(|id| id.to_string())
        .collect();

    Ok(RegistrationResult {
        tx_hash: format!("{:#x}", tx_hash),
        ip_id: registered.map(|(ip, _)| ethers_core::utils::to_checksum(&ip, None)),
        token_id: registered.map(|(_, token)| token.to_string()),
        license_terms_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    fn terms_fields(rev_share: u32, derivatives: bool) -> Vec<Token> {
        let contracts = ContractSet::for_network(Network::Aeneid);
        match pil_terms_token(rev_share, derivatives, &contracts) {
            Token::Tuple(fields) => fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn commercial_use_follows_rev_share() {
        let fields = terms_fields(5, true);
        assert_eq!(fields[4], Token::Bool(true)); // commercialUse
        assert_eq!(
            fields[8],
            Token::Uint(U256::from(5u64 * 1_000_000u64)) // scaled rev share
        );

        let fields = terms_fields(0, true);
        assert_eq!(fields[4], Token::Bool(false));
    }

    #[test]
    fn derivative_flags_follow_derivatives_allowed() {
        let fields = terms_fields(5, true);
        assert_eq!(fields[10], Token::Bool(true)); // derivativesAllowed
        assert_eq!(fields[11], Token::Bool(true)); // derivativesAttribution
        assert_eq!(fields[13], Token::Bool(true)); // derivativesReciprocal

        let fields = terms_fields(5, false);
        assert_eq!(fields[10], Token::Bool(false));
        assert_eq!(fields[11], Token::Bool(false));
        assert_eq!(fields[13], Token::Bool(false));
    }

    #[test]
    fn terms_tuple_has_contract_field_count() {
        assert_eq!(terms_fields(1, true).len(), 17);
    }
}
