// src/blockchain/services/license.rs

use anyhow::{Context, Result};
use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::types::{Address, TransactionRequest, U256};
use tracing::info;

use crate::blockchain::client::StoryClient;
use crate::blockchain::contracts::{call_data, decode_license_tokens_minted};
use crate::blockchain::models::{LicenseTerms, MintLicenseResult};

const GET_LICENSE_TERMS_SIG: &str = "getLicenseTerms(uint256)";
const MINT_LICENSE_TOKENS_SIG: &str =
    "mintLicenseTokens(address,address,uint256,uint256,address,bytes,uint256,uint32)";

fn license_terms_param_types() -> Vec<ParamType> {
    vec![
        ParamType::Bool,            // transferable
        ParamType::Address,         // royaltyPolicy
        ParamType::Uint(256),       // defaultMintingFee
        ParamType::Uint(256),       // expiration
        ParamType::Bool,            // commercialUse
        ParamType::Bool,            // commercialAttribution
        ParamType::Address,         // commercializerChecker
        ParamType::Bytes,           // commercializerCheckerData
        ParamType::Uint(32),        // commercialRevShare
        ParamType::Uint(256),       // commercialRevCeiling
        ParamType::Bool,            // derivativesAllowed
        ParamType::Bool,            // derivativesAttribution
        ParamType::Bool,            // derivativesApproval
        ParamType::Bool,            // derivativesReciprocal
        ParamType::Uint(256),       // derivativeRevCeiling
        ParamType::Address,         // currency
        ParamType::String,          // uri
    ]
}

/// Read the PIL terms registered under an ID from the license template.
pub async fn get_license_terms(client: &StoryClient, license_terms_id: u64) -> Result<LicenseTerms> {
    let data = call_data(
        GET_LICENSE_TERMS_SIG,
        &[Token::Uint(U256::from(license_terms_id))],
    );
    let raw = client
        .eth_call(client.contracts.pil_license_template, data)
        .await?;

    let mut decoded = decode(&[ParamType::Tuple(license_terms_param_types())], &raw)
        .context("failed to decode license terms tuple")?;
    match decoded.pop() {
        Some(Token::Tuple(fields)) => LicenseTerms::from_tokens(fields),
        other => anyhow::bail!("unexpected license terms encoding: {:?}", other),
    }
}

/// Mint license tokens for an IP under existing terms. Token IDs are decoded
/// from the receipt logs best-effort; an empty list still carries the hash.
pub async fn mint_license_tokens(
    client: &StoryClient,
    ip_id: Address,
    license_terms_id: u64,
    amount: u64,
    receiver: Option<Address>,
    max_minting_fee: U256,
    max_revenue_share: u32,
) -> Result<MintLicenseResult> {
    let receiver = receiver.unwrap_or_else(|| client.sender());
    let data = call_data(
        MINT_LICENSE_TOKENS_SIG,
        &[
            Token::Address(ip_id),
            Token::Address(client.contracts.pil_license_template),
            Token::Uint(U256::from(license_terms_id)),
            Token::Uint(U256::from(amount)),
            Token::Address(receiver),
            Token::Bytes(Vec::new()), // royaltyContext
            Token::Uint(max_minting_fee),
            Token::Uint(U256::from(max_revenue_share)),
        ],
    );

    let tx = TransactionRequest::new()
        .to(client.contracts.licensing_module)
        .data(data);
    let tx_hash = client.submit_transaction(tx).await?;
    info!(tx_hash = %format!("{:#x}", tx_hash), "mint_license_tokens submitted");

    let receipt = client.wait_for_receipt(tx_hash).await?;
    let license_token_ids = decode_license_tokens_minted(&receipt)
        .into_iter()
        .map(|id| id.to_string())
        .collect();

    Ok(MintLicenseResult {
        tx_hash: format!("{:#x}", tx_hash),
        license_token_ids,
    })
}
