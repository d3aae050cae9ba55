//! Story chain client: one signer, one RPC endpoint, constructed once at
//! startup and shared by reference across concurrent tool calls. Carries no
//! per-call mutable state.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256, U64};
use ethers_core::utils::to_checksum;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::debug;

use crate::blockchain::contracts::ContractSet;
use crate::config::{Config, Network};
use crate::error::RpcRejection;
use ethers_signers::{LocalWallet, Signer};

#[derive(Clone)]
pub struct StoryClient {
    http: reqwest::Client,
    rpc_url: String,
    wallet: LocalWallet,
    pub network: Network,
    pub contracts: ContractSet,
}

impl StoryClient {
    pub fn new(config: &Config) -> Result<Self> {
        let wallet = LocalWallet::from_str(
            config
                .wallet_private_key
                .expose_secret()
                .trim_start_matches("0x"),
        )
        .context("WALLET_PRIVATE_KEY is not a valid secp256k1 private key")?
        .with_chain_id(config.network.chain_id());

        Ok(Self {
            http: reqwest::Client::new(),
            rpc_url: config.rpc_provider_url.clone(),
            wallet,
            network: config.network,
            contracts: ContractSet::for_network(config.network),
        })
    }

    /// The signing address all write operations originate from.
    pub fn sender(&self) -> Address {
        self.wallet.address()
    }

    pub fn sender_checksummed(&self) -> String {
        to_checksum(&self.sender(), None)
    }

    /// Single JSON-RPC round trip. An `error` member in the response body is
    /// surfaced as an `RpcRejection` so classification can tell reverts from
    /// transport failures.
    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        debug!(method, "rpc call");
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let response: Value = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(error) = response.get("error") {
            return Err(RpcRejection(format!("{}: {}", method, error)).into());
        }
        response
            .get("result")
            .cloned()
            .with_context(|| format!("RPC response for {} missing 'result'", method))
    }

    /// Read-only contract call, returning the raw ABI-encoded result bytes.
    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Vec<u8>> {
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": format!("{:#x}", to), "data": format!("0x{}", hex::encode(&data)) }, "latest"]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .context("eth_call result is not a hex string")?;
        hex::decode(hex_str.trim_start_matches("0x")).context("eth_call result is not valid hex")
    }

    async fn rpc_u256(&self, method: &str, params: Value) -> Result<U256> {
        let result = self.rpc_call(method, params).await?;
        let hex_str = result
            .as_str()
            .with_context(|| format!("{} result is not a hex string", method))?;
        U256::from_str_radix(hex_str.trim_start_matches("0x"), 16)
            .with_context(|| format!("{} result is not a hex quantity", method))
    }

    /// Fill, sign, and submit a transaction; returns the transaction hash.
    /// The nonce is fetched per call from the pending pool, so concurrent
    /// tool calls need no shared nonce state.
    pub async fn submit_transaction(&self, tx_request: TransactionRequest) -> Result<H256> {
        let from = self.sender();

        let chain_id = self
            .rpc_u256("eth_chainId", json!([]))
            .await
            .context("failed to get chain id from node")?;
        let nonce = self
            .rpc_u256(
                "eth_getTransactionCount",
                json!([format!("{:#x}", from), "pending"]),
            )
            .await
            .context("failed to get account nonce")?;

        let mut tx = tx_request
            .from(from)
            .nonce(nonce)
            .chain_id(U64::from(chain_id.as_u64()));

        if tx.gas.is_none() {
            let call_obj = serde_json::to_value(&tx)?;
            let gas = self
                .rpc_u256("eth_estimateGas", json!([call_obj]))
                .await
                .context("gas estimation failed")?;
            tx = tx.gas(gas);
        }

        if tx.gas_price.is_none() {
            let gas_price = self
                .rpc_u256("eth_gasPrice", json!([]))
                .await
                .context("failed to get gas price")?;
            tx = tx.gas_price(gas_price);
        }

        let signature = self.wallet.sign_transaction(&tx.clone().into()).await?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = self
            .rpc_call(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw_tx))]),
            )
            .await?;
        let hash_str = result
            .as_str()
            .context("eth_sendRawTransaction did not return a hash")?;
        H256::from_str(hash_str).context("malformed transaction hash from node")
    }

    /// Poll for the receipt of a submitted transaction. A mined-but-reverted
    /// transaction is an `RpcRejection`; the dispatcher's timeout bounds the
    /// overall wait.
    pub async fn wait_for_receipt(&self, tx_hash: H256) -> Result<Value> {
        loop {
            let receipt = self
                .rpc_call(
                    "eth_getTransactionReceipt",
                    json!([format!("{:#x}", tx_hash)]),
                )
                .await?;
            if !receipt.is_null() {
                let status = receipt.get("status").and_then(|s| s.as_str()).unwrap_or("");
                if status == "0x0" {
                    return Err(RpcRejection(format!(
                        "transaction {:#x} reverted",
                        tx_hash
                    ))
                    .into());
                }
                return Ok(receipt);
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }
}
