// src/main.rs

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use story_mcp_server::config::Config;
use story_mcp_server::mcp::handler::handle_mcp_request;
use story_mcp_server::mcp::protocol::{error_codes, Request, Response};
use story_mcp_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the stdio transport keeps stdout clean.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_mcp_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        network = ?config.network,
        storyscan = %config.storyscan_api_endpoint,
        ipfs_enabled = config.ipfs_enabled(),
        "starting story MCP server"
    );
    let state = AppState::from_config(config)?;

    let mcp_mode = std::env::args().any(|a| a == "--mcp")
        || std::env::var("MCP_MODE").map(|v| v == "1" || v == "true").unwrap_or(false);

    if mcp_mode {
        run_stdio(state).await
    } else {
        run_http(state).await
    }
}

/// Line-delimited JSON-RPC over stdio, the standard MCP transport.
async fn run_stdio(state: AppState) -> Result<()> {
    info!("MCP stdio transport ready");
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await.context("stdin read failed")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => handle_mcp_request(&state, request).await,
            Err(err) => Some(Response::error(
                serde_json::Value::Null,
                error_codes::PARSE_ERROR,
                format!("parse error: {}", err),
            )),
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("response serialization failed")?;
            stdout.write_all(serialized.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// HTTP mirror of the stdio transport: the same JSON-RPC envelope POSTed to
/// /api/rpc, for clients that prefer a network socket.
async fn run_http(state: AppState) -> Result<()> {
    let port = state.config.port;
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/rpc", post(rpc))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "HTTP transport listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn rpc(State(state): State<AppState>, body: String) -> axum::response::Response {
    let response = match serde_json::from_str::<Request>(&body) {
        Ok(request) => handle_mcp_request(&state, request).await,
        Err(err) => {
            error!(error = %err, "unparseable rpc body");
            Some(Response::error(
                serde_json::Value::Null,
                error_codes::PARSE_ERROR,
                format!("parse error: {}", err),
            ))
        }
    };
    match response {
        Some(r) => Json(r).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
