//! The job controller: single-job lifecycle, progress and cancellation.
//!
//! One [`JobState`] exists per process. It is owned by the [`JobController`]
//! behind a `std::sync::Mutex` whose critical sections are all a handful of
//! field assignments — the guard is never held across an engine call or any
//! I/O. The background unit writes progress into it, any number of pollers
//! read snapshots out of it, and the foreground cancel/admit operations flip
//! its flags.
//!
//! ## Why a semaphore permit as the admission gate?
//!
//! "At most one job" is enforced by a one-permit `tokio::sync::Semaphore`,
//! separate from the state mutex. `try_acquire_owned` gives non-blocking
//! admission (a concurrent admit fails fast with [`JobError::Busy`] instead
//! of queueing), and the `OwnedSemaphorePermit` travels into the supervising
//! task, so the permit is released exactly once when that task ends — on
//! success, failure, cancellation, and also when the blocking worker panics.
//! Cancellation therefore only *requests*: a new job can be admitted once
//! the running worker has observed the flag, which it does within one slice
//! iteration.
//!
//! ## Propagation policy
//!
//! Nothing thrown by the background unit crosses back to the foreground.
//! [`JobController::admit`] returns synchronous refusals only; everything
//! after admission lands in [`JobState::error`]/[`JobState::status`] and is
//! observed by polling [`JobController::snapshot`], which always succeeds.

use crate::config::SliceParameters;
use crate::error::{JobError, SliceError};
use crate::slicer::SliceSummary;
use crate::storage::ArtifactStore;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Metadata served by the stateless estimate endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfInfo {
    pub page_count: usize,
}

/// The seam between the job controller and the slicing side.
///
/// Production uses [`crate::engine::pdfium::PdfiumSliceRunner`]; tests drive
/// the controller with scripted runners. `run` executes on a blocking thread
/// — implementations are free to block, and must poll `should_cancel`
/// between units of work.
pub trait SliceRunner: Send + Sync + 'static {
    /// Convert `input` into `output`, reporting progress and polling for
    /// cancellation between slices.
    fn run(
        &self,
        input: &Path,
        output: &Path,
        params: &SliceParameters,
        on_progress: &mut dyn FnMut(u8, &str),
        should_cancel: &dyn Fn() -> bool,
    ) -> Result<SliceSummary, SliceError>;

    /// Open `path` and report its page count without converting anything.
    fn inspect(&self, path: &Path) -> Result<PdfInfo, SliceError>;
}

/// Machine-readable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Starting,
    Running,
    Cancelling,
    Cancelled,
    Ready,
    Error,
}

/// The process-wide job state, exactly as pollers see it.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    /// Lifecycle phase; everything else is commentary on it.
    pub phase: JobPhase,
    /// 0–100, monotonically non-decreasing within one job. Reaches 100 only
    /// on success; forced back to 0 on cancellation.
    pub percent: u8,
    /// Human-readable phase label ("Processing page 3/5", "Cancelled", …).
    pub status: String,
    /// Failure message, set only when `phase` is `Error`.
    pub error: Option<String>,
    /// Set by a cancel request; cleared only when a new job starts.
    pub cancel_requested: bool,
    /// True strictly while a background job is active.
    pub is_converting: bool,
    /// Output file size ("1.23 MB"), present only when `phase` is `Ready`.
    pub output_size: Option<String>,
    /// Output page count, present only when `phase` is `Ready`.
    pub output_pages: Option<usize>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            phase: JobPhase::Idle,
            percent: 0,
            status: "Idle".to_string(),
            error: None,
            cancel_requested: false,
            is_converting: false,
            output_size: None,
            output_pages: None,
        }
    }
}

impl JobState {
    fn reset_for_start(&mut self) {
        *self = JobState {
            phase: JobPhase::Starting,
            status: "Starting...".to_string(),
            is_converting: true,
            ..JobState::default()
        };
    }

    fn mark_cancelled(&mut self) {
        self.phase = JobPhase::Cancelled;
        self.status = "Cancelled".to_string();
        self.percent = 0;
        self.error = None;
        self.output_size = None;
        self.output_pages = None;
    }

    fn mark_error(&mut self, status: String, detail: String) {
        self.phase = JobPhase::Error;
        self.status = status;
        self.error = Some(detail);
        self.output_size = None;
        self.output_pages = None;
    }
}

/// Owns the single job: admission, progress relay, cancellation, download.
pub struct JobController {
    state: Arc<Mutex<JobState>>,
    gate: Arc<Semaphore>,
    store: ArtifactStore,
    runner: Arc<dyn SliceRunner>,
}

impl JobController {
    pub fn new(runner: Arc<dyn SliceRunner>, store: ArtifactStore) -> Self {
        Self {
            state: Arc::new(Mutex::new(JobState::default())),
            gate: Arc::new(Semaphore::new(1)),
            store,
            runner,
        }
    }

    /// Admit a job: acquire the gate, validate, persist the upload and spawn
    /// the background unit. Fails fast with [`JobError::Busy`] while another
    /// job holds the gate; validation failures release the gate untouched.
    pub async fn admit(&self, pdf_bytes: &[u8], params: SliceParameters) -> Result<(), JobError> {
        let permit = Arc::clone(&self.gate)
            .try_acquire_owned()
            .map_err(|_| JobError::Busy)?;

        params.validate()?;
        if !pdf_bytes.starts_with(b"%PDF") {
            return Err(JobError::InvalidInput(
                "uploaded file is not a PDF".to_string(),
            ));
        }

        lock(&self.state).reset_for_start();

        self.store.clean().await;
        if let Err(e) = self.store.write_input(pdf_bytes).await {
            let mut s = lock(&self.state);
            s.mark_error(
                "Error: failed to store upload".to_string(),
                e.to_string(),
            );
            s.is_converting = false;
            return Err(JobError::io(self.store.input_path(), e));
        }

        info!(
            "job admitted: {} bytes, overlap {}mm, {} dpi, {}",
            pdf_bytes.len(),
            params.overlap_mm,
            params.dpi,
            params.format
        );

        let state = Arc::clone(&self.state);
        let runner = Arc::clone(&self.runner);
        let store = self.store.clone();

        tokio::spawn(async move {
            let worker_state = Arc::clone(&state);
            let input = store.input_path();
            let output = store.output_path();

            let result = tokio::task::spawn_blocking(move || {
                lock(&worker_state).phase = JobPhase::Running;

                let progress_state = Arc::clone(&worker_state);
                let mut on_progress = move |percent: u8, message: &str| {
                    let mut s = lock(&progress_state);
                    s.percent = percent;
                    s.status = message.to_string();
                };

                let cancel_state = Arc::clone(&worker_state);
                let should_cancel = move || lock(&cancel_state).cancel_requested;

                runner.run(&input, &output, &params, &mut on_progress, &should_cancel)
            })
            .await;

            finalize(&state, &store, result).await;
            drop(permit);
        });

        Ok(())
    }

    /// Request cooperative cancellation. Idempotent; a no-op when nothing is
    /// converting beyond latching the flag (it is reset at the next admit).
    pub fn request_cancel(&self) {
        let mut s = lock(&self.state);
        s.cancel_requested = true;
        if s.is_converting {
            s.phase = JobPhase::Cancelling;
            s.status = "Cancelling...".to_string();
            info!("cancellation requested");
        }
    }

    /// Snapshot the current state. Never blocks on the background unit.
    pub fn snapshot(&self) -> JobState {
        lock(&self.state).clone()
    }

    /// Take the finished document. Destructive: the state is reset to idle
    /// and both artifacts are deleted as part of the read. The Ready check
    /// and the reset happen atomically under the state guard, so concurrent
    /// callers get the bytes at most once.
    pub async fn take_output(&self) -> Result<Vec<u8>, JobError> {
        {
            let mut s = lock(&self.state);
            if s.phase != JobPhase::Ready {
                return Err(JobError::NotReady);
            }
            *s = JobState::default();
        }

        let path = self.store.output_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| JobError::io(&path, e))?;
        self.store.clean().await;
        info!("output taken ({} bytes); job reset", bytes.len());
        Ok(bytes)
    }

    /// The runner this controller was built with (shared with the stateless
    /// estimate path).
    pub fn runner(&self) -> Arc<dyn SliceRunner> {
        Arc::clone(&self.runner)
    }
}

/// Lock the state, recovering from poisoning: a panicked worker must never
/// wedge progress polling.
fn lock(state: &Mutex<JobState>) -> MutexGuard<'_, JobState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolve the finished background unit into a terminal state.
///
/// The cancel flag wins over a successful run: if cancellation arrived after
/// the slicer's last poll, the job still ends `Cancelled` and its output is
/// discarded.
async fn finalize(
    state: &Mutex<JobState>,
    store: &ArtifactStore,
    result: Result<Result<SliceSummary, SliceError>, tokio::task::JoinError>,
) {
    let output_len = tokio::fs::metadata(store.output_path())
        .await
        .ok()
        .map(|m| m.len());

    let ready = {
        let mut s = lock(state);
        s.is_converting = false;
        match result {
            Err(join_error) => {
                error!("conversion task fault: {join_error}");
                s.mark_error(
                    "Error: conversion task failed".to_string(),
                    join_error.to_string(),
                );
                false
            }
            Ok(_) if s.cancel_requested => {
                info!("conversion cancelled");
                s.mark_cancelled();
                false
            }
            Ok(Ok(summary)) => {
                s.phase = JobPhase::Ready;
                s.status = "Ready for download".to_string();
                s.percent = 100;
                s.output_pages = Some(summary.pages);
                s.output_size = output_len.map(format_megabytes);
                info!("conversion ready: {} page(s)", summary.pages);
                true
            }
            Ok(Err(SliceError::Cancelled)) => {
                // Reached only if the flag was somehow cleared mid-run;
                // resolve it the same way as a flagged cancellation.
                s.mark_cancelled();
                false
            }
            Ok(Err(e)) => {
                warn!("conversion failed: {e}");
                s.mark_error(format!("Error: {e}"), e.to_string());
                false
            }
        }
    };

    if !ready {
        store.discard_output().await;
    }
}

fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let s = JobState::default();
        assert_eq!(s.phase, JobPhase::Idle);
        assert_eq!(s.status, "Idle");
        assert_eq!(s.percent, 0);
        assert!(!s.is_converting);
    }

    #[test]
    fn reset_for_start_clears_previous_results() {
        let mut s = JobState::default();
        s.output_pages = Some(7);
        s.output_size = Some("1.00 MB".into());
        s.cancel_requested = true;
        s.percent = 100;

        s.reset_for_start();
        assert_eq!(s.phase, JobPhase::Starting);
        assert!(s.is_converting);
        assert!(!s.cancel_requested);
        assert_eq!(s.percent, 0);
        assert!(s.output_pages.is_none());
        assert!(s.output_size.is_none());
    }

    #[test]
    fn cancelled_forces_percent_to_zero() {
        let mut s = JobState::default();
        s.percent = 63;
        s.mark_cancelled();
        assert_eq!(s.percent, 0);
        assert_eq!(s.phase, JobPhase::Cancelled);
        assert!(s.error.is_none());
    }

    #[test]
    fn megabyte_formatting_rounds_to_two_decimals() {
        assert_eq!(format_megabytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_megabytes(1_300_000), "1.24 MB");
    }

    #[test]
    fn snapshot_serialises_flat() {
        let s = JobState::default();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["percent"], 0);
        assert_eq!(json["status"], "Idle");
        assert_eq!(json["cancel_requested"], false);
        assert!(json["error"].is_null());
    }
}
