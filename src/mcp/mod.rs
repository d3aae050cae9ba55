//! MCP surface: JSON-RPC protocol types, the startup tool registry, the
//! dispatch pipeline, and the tool handlers themselves.

pub mod handler;
pub mod protocol;
pub mod registry;
pub mod tools;
