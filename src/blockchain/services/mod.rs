pub mod collection;
pub mod ip_asset;
pub mod license;
pub mod transfer;
