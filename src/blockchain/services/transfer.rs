// src/blockchain/services/transfer.rs

use anyhow::Result;
use ethers_core::types::{Address, TransactionRequest, U256};
use tracing::info;

use crate::blockchain::client::StoryClient;
use crate::blockchain::models::TransferResult;

/// Send native IP tokens (1 IP = 10^18 wei) to an address. The value is an
/// exact wei amount; decimal parsing happens at the tool boundary.
pub async fn send_ip(
    client: &StoryClient,
    to_address: Address,
    amount_wei: U256,
) -> Result<TransferResult> {
    let tx = TransactionRequest::new().to(to_address).value(amount_wei);
    let tx_hash = client.submit_transaction(tx).await?;
    info!(
        tx_hash = %format!("{:#x}", tx_hash),
        to = %format!("{:#x}", to_address),
        "send_ip submitted"
    );
    client.wait_for_receipt(tx_hash).await?;

    Ok(TransferResult {
        tx_hash: format!("{:#x}", tx_hash),
    })
}
