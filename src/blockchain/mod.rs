//! Write-capable Story chain surface: signer, contract table, and the
//! transaction-building services behind the IP-asset tools.

pub mod client;
pub mod contracts;
pub mod models;
pub mod services;
