// src/config.rs

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use secrecy::SecretString;

/// Story Protocol network the server signs for. Contract addresses and the
/// default SPG collection are resolved from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Aeneid,
    Mainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Aeneid => 1315,
            Network::Mainnet => 1514,
        }
    }

    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Aeneid => "https://aeneid.explorer.story.foundation",
            Network::Mainnet => "https://explorer.story.foundation",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "aeneid" | "testnet" => Ok(Network::Aeneid),
            "mainnet" | "main" => Ok(Network::Mainnet),
            other => bail!("unsupported network '{}': must be 'aeneid' or 'mainnet'", other),
        }
    }
}

// A struct to hold all configuration, loaded once at startup from the .env file.
// Everything here is read-only after initialization.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // Story chain settings (write surface)
    pub rpc_provider_url: String,
    pub wallet_private_key: SecretString,
    pub network: Network,

    // StoryScan indexer settings (read surface)
    pub storyscan_api_endpoint: String,

    // IPFS / Pinata settings; upload tools are not registered without a JWT
    pub pinata_jwt: Option<SecretString>,

    // Per-call dispatcher timeout
    pub call_timeout: Duration,
}

impl Config {
    pub fn ipfs_enabled(&self) -> bool {
        self.pinata_jwt.is_some()
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let rpc_provider_url = env::var("RPC_PROVIDER_URL")
            .context("RPC_PROVIDER_URL must be set to a Story Protocol RPC endpoint")?;

        let wallet_private_key: SecretString = env::var("WALLET_PRIVATE_KEY")
            .context("WALLET_PRIVATE_KEY must be set to a hex-encoded signing key")?
            .into();

        let network = env::var("NETWORK")
            .unwrap_or_else(|_| "aeneid".to_string())
            .parse::<Network>()?;

        let storyscan_api_endpoint = env::var("STORYSCAN_API_ENDPOINT")
            .unwrap_or_else(|_| "https://www.storyscan.xyz/api".to_string());

        let pinata_jwt = env::var("PINATA_JWT").ok().map(SecretString::from);

        let call_timeout_secs: u64 = env::var("CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("CALL_TIMEOUT_SECS must be a valid number of seconds")?;

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            rpc_provider_url,
            wallet_private_key,
            network,
            storyscan_api_endpoint,
            pinata_jwt,
            call_timeout: Duration::from_secs(call_timeout_secs),
        })
    }
}
