// src/blockchain/services/collection.rs

use anyhow::Result;
use ethers_core::types::TransactionRequest;
use ethers_core::utils::to_checksum;
use tracing::info;

use crate::blockchain::client::StoryClient;
use crate::blockchain::contracts::{call_data, decode_collection_created};
use crate::blockchain::models::{CollectionOptions, CollectionResult};

const CREATE_COLLECTION_SIG: &str =
    "createCollection((string,string,string,string,uint32,uint256,address,address,address,bool,bool))";

/// Deploy a new SPG NFT collection through the registration workflows
/// contract. The created address is decoded from the receipt logs.
pub async fn create_spg_nft_collection(
    client: &StoryClient,
    options: CollectionOptions,
) -> Result<CollectionResult> {
    let data = call_data(CREATE_COLLECTION_SIG, &[options.to_token()]);

    let tx = TransactionRequest::new()
        .to(client.contracts.registration_workflows)
        .data(data);
    let tx_hash = client.submit_transaction(tx).await?;
    info!(
        tx_hash = %format!("{:#x}", tx_hash),
        name = %options.name,
        symbol = %options.symbol,
        "create_spg_nft_collection submitted"
    );

    let receipt = client.wait_for_receipt(tx_hash).await?;
    let spg_nft_contract = decode_collection_created(&receipt)
        .map(|addr| to_checksum(&addr, None))
        .unwrap_or_default();

    Ok(CollectionResult {
        tx_hash: format!("{:#x}", tx_hash),
        spg_nft_contract,
    })
}
