//! MCP tool-dispatch gateway for the Story network: a read-only explorer
//! surface over StoryScan and a write-capable IP-asset surface over the
//! Story proof-of-creativity contracts, exposed as one validated tool table.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod ipfs;
pub mod mcp;
pub mod scan;

use std::sync::Arc;

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::blockchain::client::StoryClient;
use crate::config::Config;
use crate::ipfs::PinataClient;
use crate::mcp::registry::{build_registry, ToolRegistry};
use crate::scan::client::ScanClient;

pub use ethers_core::types::{Address, H256, U256};

/// Shared application state handed to every tool handler. All fields are
/// immutable after startup; no state is shared across calls beyond these
/// capability handles.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chain: StoryClient,
    pub scan: ScanClient,
    pub ipfs: Option<PinataClient>,
    pub registry: Arc<ToolRegistry>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let chain = StoryClient::new(&config)?;
        let scan = ScanClient::new(&config.storyscan_api_endpoint);
        let ipfs = config
            .pinata_jwt
            .as_ref()
            .map(|jwt| PinataClient::new(SecretString::new(jwt.expose_secret().clone())));
        let registry = Arc::new(build_registry(ipfs.is_some()));
        Ok(AppState {
            config,
            chain,
            scan,
            ipfs,
            registry,
        })
    }
}
