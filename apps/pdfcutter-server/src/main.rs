//! PDF Cutter Server
//!
//! A small HTTP service for page-level PDF work. Provides endpoints for:
//!
//! - Splitting a document into single pages (plus a ZIP of all of them)
//! - Merging several documents in upload order
//! - Deleting, extracting and reordering pages
//! - Inspecting a document's page count
//!
//! ## Architecture
//!
//! Request handling lives here; page selection, validation and the PDF
//! operations themselves live in `pdfcutter-core`. Generated files are
//! written to a download directory and served back by name.
//!
//! - Rate limiting via tower-governor
//! - Upload size ceiling via axum's `DefaultBodyLimit`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdfcutter_core::{LopdfCodec, PageEditor};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod error;
mod storage;
mod upload;

use api::{
    handle_delete_pages, handle_download, handle_extract_pages, handle_health, handle_merge,
    handle_pdf_info, handle_reorder, handle_split, AppState,
};
use config::{Args, ServerConfig};
use storage::DownloadStore;

/// Routes and per-request limits, without the network-facing middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_content_length;

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Page operations
        .route("/get_pdf_info", post(handle_pdf_info))
        .route("/split", post(handle_split))
        .route("/merge", post(handle_merge))
        .route("/delete-pages", post(handle_delete_pages))
        .route("/extract-pages", post(handle_extract_pages))
        .route("/reorder", post(handle_reorder))
        // Generated files
        .route("/download/:filename", get(handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_args(&args)?;

    info!("Starting PDF cutter server on {}", config.addr);

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit.into())
            .burst_size(config.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Create shared state
    let state = AppState {
        editor: Arc::new(PageEditor::new(LopdfCodec, config.limits)),
        downloads: DownloadStore::new(config.download_dir.clone())?,
        max_content_length: config.max_content_length,
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    info!("Server listening on http://{}", config.addr);
    info!("Rate limit: {} requests/second per IP", config.rate_limit);
    info!(
        "Limits: {} pages per document, {} files per merge, {} byte uploads",
        config.limits.max_pages_per_pdf,
        config.limits.max_files_per_request,
        config.max_content_length
    );
    info!("Downloads stored in {}", config.download_dir.display());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
