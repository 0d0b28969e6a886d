//! # pagesaw
//!
//! Re-slice oversized PDF pages into print-ready fixed-format pages.
//!
//! ## Why this crate?
//!
//! Long single-page PDFs — sewing patterns, receipts, plotter drawings, web
//! pages printed to PDF — don't fit on home printers. pagesaw cuts the first
//! page of such a document into a run of A4 (or A2/A3/A5/Letter) pages, with
//! a configurable strip of content repeated across each cut so nothing is
//! lost at the page break, and serves the whole thing as a small HTTP
//! service: upload, poll progress, cancel, download.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Admit    single-job gate, parameter validation, artifact reset
//!  ├─ 2. Plan     scale factor, overlap in points, slice count (pure math)
//!  ├─ 3. Slice    per-band page composition via pdfium (spawn_blocking)
//!  ├─ 4. Save     serialise the output document, capture size/page count
//!  └─ 5. Download destructive one-shot read, state resets to idle
//! ```
//!
//! Exactly one conversion runs at a time process-wide; a second upload while
//! one is active is refused with HTTP 429. Cancellation is cooperative and
//! observed between slices.
//!
//! ## Quick Start (library)
//!
//! ```rust,no_run
//! use pagesaw::{ArtifactStore, JobController, PdfiumSliceRunner, SliceParameters};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ArtifactStore::new(std::env::temp_dir().join("pagesaw"))?;
//!     let controller = JobController::new(Arc::new(PdfiumSliceRunner::new()), store);
//!
//!     let pdf = std::fs::read("pattern.pdf")?;
//!     controller.admit(&pdf, SliceParameters::default()).await?;
//!
//!     loop {
//!         let state = controller.snapshot();
//!         eprintln!("{:3}% {}", state.percent, state.status);
//!         if !state.is_converting {
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(200)).await;
//!     }
//!
//!     std::fs::write("sliced.pdf", controller.take_output().await?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the HTTP surface and the `pagesaw` binary (axum + clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when embedding only the slicing core:
//! ```toml
//! pagesaw = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod job;
pub mod plan;
#[cfg(feature = "server")]
pub mod server;
pub mod slicer;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SliceParameters, DPI_RANGE, OVERLAP_MM_RANGE};
pub use engine::pdfium::{PdfiumEngine, PdfiumSliceRunner};
pub use engine::{ClipBox, EngineError, PageSize, PdfEngine};
pub use error::{JobError, SliceError};
pub use format::{PaperFormat, UnknownFormat, POINTS_PER_MM};
pub use job::{JobController, JobPhase, JobState, PdfInfo, SliceRunner};
pub use plan::SlicePlan;
pub use slicer::{slice, SliceSummary};
pub use storage::ArtifactStore;
