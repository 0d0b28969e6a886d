//! HTTP server binary for pagesaw.
//!
//! A thin shim over the library crate: parse flags, wire the pdfium runner
//! into a job controller, serve the router.

use anyhow::{Context, Result};
use clap::Parser;
use pagesaw::{server, ArtifactStore, JobController, PdfiumSliceRunner};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pagesaw", version, about = "Slice oversized PDF pages into print-ready pages")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "PAGESAW_LISTEN", default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Directory holding the job's input/output artifacts.
    /// Defaults to `pagesaw` under the system temp directory.
    #[arg(long, env = "PAGESAW_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| std::env::temp_dir().join("pagesaw"));

    let store = ArtifactStore::new(&data_dir)
        .with_context(|| format!("failed to prepare data dir '{}'", data_dir.display()))?;
    let controller = Arc::new(JobController::new(Arc::new(PdfiumSliceRunner::new()), store));
    let app = server::router(controller);

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    tracing::info!("listening on http://{} (artifacts in {})", cli.listen, data_dir.display());

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
