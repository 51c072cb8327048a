//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use pdfcutter_core::Limits;

/// Default upload ceiling (10 MiB)
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Command-line arguments for the PDF cutter server
///
/// Every flag can also be set through a `PDFCUTTER_*` environment variable,
/// including from a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfcutter-server")]
#[command(about = "Split, merge, delete, extract and reorder PDF pages over HTTP")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PDFCUTTER_PORT", default_value = "5000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFCUTTER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Largest accepted request body in bytes
    #[arg(long, env = "PDFCUTTER_MAX_CONTENT_LENGTH", default_value_t = DEFAULT_MAX_CONTENT_LENGTH)]
    pub max_content_length: usize,

    /// Directory generated documents are written to
    #[arg(long, env = "PDFCUTTER_DOWNLOAD_DIR", default_value = "downloads")]
    pub download_dir: PathBuf,

    /// Maximum number of files in one merge
    #[arg(long, env = "PDFCUTTER_MAX_FILES_PER_REQUEST", default_value_t = pdfcutter_core::limits::DEFAULT_MAX_FILES_PER_REQUEST)]
    pub max_files_per_request: usize,

    /// Maximum pages per document (cumulative for merge)
    #[arg(long, env = "PDFCUTTER_MAX_PAGES_PER_PDF", default_value_t = pdfcutter_core::limits::DEFAULT_MAX_PAGES_PER_PDF)]
    pub max_pages_per_pdf: u32,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "PDFCUTTER_RATE_LIMIT", default_value = "5")]
    pub rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long, env = "PDFCUTTER_VERBOSE")]
    pub verbose: bool,
}

/// Resolved server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_content_length: usize,
    pub download_dir: PathBuf,
    pub rate_limit: u32,
    pub limits: Limits,
}

impl ServerConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
        if args.rate_limit == 0 {
            anyhow::bail!("rate limit must be at least 1 request per second");
        }

        Ok(Self {
            addr,
            max_content_length: args.max_content_length,
            download_dir: args.download_dir.clone(),
            rate_limit: args.rate_limit,
            limits: Limits::new(args.max_pages_per_pdf, args.max_files_per_request),
        })
    }
}
