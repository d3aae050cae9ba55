// src/error.rs

use thiserror::Error;

use crate::mcp::protocol::error_codes;

/// Uniform failure taxonomy for tool calls. Every upstream failure (network,
/// HTTP status, RPC revert, malformed input) is classified into exactly one
/// of these kinds before it reaches the calling agent.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream rejected request: {0}")]
    UpstreamRejected(String),

    #[error("call timed out after {0}s")]
    Timeout(u64),

    #[error(
        "write submitted but unconfirmed after {0}s; query the transaction by hash before retrying"
    )]
    StateUnknown(u64),
}

/// A JSON-RPC level error object returned by the node (revert reasons,
/// execution errors). Kept as its own type so classification can tell it
/// apart from transport failures.
#[derive(Debug, Error)]
#[error("rpc error: {0}")]
pub struct RpcRejection(pub String);

impl ToolError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ToolError::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, surfaced in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::InvalidArgument { .. } => "invalid_argument",
            ToolError::UpstreamUnavailable(_) => "upstream_unavailable",
            ToolError::UpstreamRejected(_) => "upstream_rejected",
            ToolError::Timeout(_) => "timeout",
            ToolError::StateUnknown(_) => "state_unknown",
        }
    }

    /// Whether the caller may safely retry the identical call. A retry after
    /// `StateUnknown` could double-submit, so it is never retryable.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ToolError::UpstreamUnavailable(_) | ToolError::Timeout(_)
        )
    }

    pub fn rpc_code(&self) -> i32 {
        match self {
            ToolError::UnknownTool(_) => error_codes::METHOD_NOT_FOUND,
            ToolError::InvalidArgument { .. } => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

/// Classify a capability-client failure into the taxonomy. Walks the error
/// chain looking for the transport or RPC cause.
pub fn classify(err: anyhow::Error) -> ToolError {
    for cause in err.chain() {
        if let Some(rpc) = cause.downcast_ref::<RpcRejection>() {
            return ToolError::UpstreamRejected(rpc.0.clone());
        }
        if let Some(req) = cause.downcast_ref::<reqwest::Error>() {
            if let Some(status) = req.status() {
                return ToolError::UpstreamRejected(format!("HTTP {}: {}", status, req));
            }
            if req.is_decode() {
                return ToolError::UpstreamRejected(format!("malformed upstream response: {}", req));
            }
            return ToolError::UpstreamUnavailable(req.to_string());
        }
    }
    ToolError::UpstreamRejected(err.to_string())
}
