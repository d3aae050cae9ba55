//! Read-only explorer surface backed by the StoryScan (Blockscout v2) API.

pub mod client;
pub mod interpret;
pub mod models;
pub mod overview;
