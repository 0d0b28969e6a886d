//! pdfium-backed implementation of [`PdfEngine`].
//!
//! ## Why construct `Pdfium` per job?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! internal state per binding and is CPU-bound throughout. Every job builds
//! its own [`PdfiumEngine`] inside the blocking task that runs it (the OS
//! caches the dynamic library, so repeat binding is cheap), which keeps the
//! engine's lifetime strictly inside one job and lets `Drop` release every
//! document handle no matter how the job ends.
//!
//! ## How the region copy works
//!
//! pdfium exposes a page as an X-Object form that can be placed on another
//! page under an affine matrix. The slicer's clip windows are constructed so
//! their height equals exactly `target_height / scale` (clamping at the
//! document edges only removes space that holds no content), so placing the
//! scaled source with the window's top edge pinned to the destination page's
//! top edge shows precisely the requested band — the page boundary performs
//! the clip, and the content sits flush top-left as required.

use super::{ClipBox, EngineError, PageSize, PdfEngine};
use crate::config::SliceParameters;
use crate::error::SliceError;
use crate::job::{PdfInfo, SliceRunner};
use crate::slicer::{self, SliceSummary};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Production engine bound to the pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to pdfium (bundled library first, then the system library).
    pub fn new() -> Self {
        Self {
            pdfium: Pdfium::default(),
        }
    }
}

impl Default for PdfiumEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfEngine for PdfiumEngine {
    type Doc<'a> = PdfDocument<'a>;

    fn open<'a>(&'a self, path: &Path) -> Result<Self::Doc<'a>, EngineError> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| EngineError::new(format!("failed to open '{}': {:?}", path.display(), e)))
    }

    fn create<'a>(&'a self) -> Result<Self::Doc<'a>, EngineError> {
        self.pdfium
            .create_new_pdf()
            .map_err(|e| EngineError::new(format!("failed to create document: {:?}", e)))
    }

    fn page_count(&self, doc: &Self::Doc<'_>) -> usize {
        doc.pages().len() as usize
    }

    fn page_size(&self, doc: &Self::Doc<'_>, index: usize) -> Result<PageSize, EngineError> {
        let page = doc
            .pages()
            .get(index as u16)
            .map_err(|e| EngineError::new(format!("failed to read page {}: {:?}", index + 1, e)))?;
        Ok(PageSize {
            width: page.width().value as f64,
            height: page.height().value as f64,
        })
    }

    fn add_page(&self, doc: &mut Self::Doc<'_>, size: PageSize) -> Result<(), EngineError> {
        doc.pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(size.width as f32),
                PdfPoints::new(size.height as f32),
            ))
            .map(|_| ())
            .map_err(|e| EngineError::new(format!("failed to append page: {:?}", e)))
    }

    fn copy_scaled_region<'a>(
        &'a self,
        dest: &mut Self::Doc<'a>,
        dest_index: usize,
        source: &Self::Doc<'a>,
        source_index: usize,
        clip: ClipBox,
        scale: f64,
    ) -> Result<(), EngineError> {
        let source_height = self.page_size(source, source_index)?.height;

        let source_page = source.pages().get(source_index as u16).map_err(|e| {
            EngineError::new(format!(
                "failed to access source page {}: {:?}",
                source_index + 1,
                e
            ))
        })?;
        let form = source_page
            .objects()
            .copy_into_x_object_form_object(dest)
            .map_err(|e| EngineError::new(format!("failed to embed source page: {:?}", e)))?;

        let mut page = dest.pages().get(dest_index as u16).map_err(|e| {
            EngineError::new(format!(
                "failed to access output page {}: {:?}",
                dest_index + 1,
                e
            ))
        })?;
        let target_height = page.height().value as f64;

        let mut object = page
            .objects_mut()
            .add_object(form)
            .map_err(|e| EngineError::new(format!("failed to place source page: {:?}", e)))?;

        // pdfium places the form in bottom-up user space. Pin the clip
        // window's top edge (bottom-up y = source_height - clip.y0, scaled)
        // to the destination page's top edge.
        let dy = target_height - scale * (source_height - clip.y0);
        object
            .transform(scale as f32, 0.0, 0.0, scale as f32, 0.0, dy as f32)
            .map_err(|e| EngineError::new(format!("failed to place source page: {:?}", e)))?;

        debug!(
            "placed band y=[{:.2}, {:.2}] on output page {} (scale {:.4})",
            clip.y0,
            clip.y1,
            dest_index + 1,
            scale
        );

        Ok(())
    }

    fn save(&self, doc: &Self::Doc<'_>, path: &Path) -> Result<(), EngineError> {
        doc.save_to_file(path)
            .map_err(|e| EngineError::new(format!("failed to save '{}': {:?}", path.display(), e)))
    }
}

/// The production [`SliceRunner`]: pdfium engine plus the slicing algorithm.
///
/// Stateless — the engine is constructed anew inside each call, which runs
/// on a blocking thread owned by the job controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumSliceRunner;

impl PdfiumSliceRunner {
    pub fn new() -> Self {
        Self
    }
}

impl SliceRunner for PdfiumSliceRunner {
    fn run(
        &self,
        input: &Path,
        output: &Path,
        params: &SliceParameters,
        on_progress: &mut dyn FnMut(u8, &str),
        should_cancel: &dyn Fn() -> bool,
    ) -> Result<SliceSummary, SliceError> {
        let engine = PdfiumEngine::new();
        let source = engine.open(input).map_err(SliceError::from)?;
        slicer::slice(&engine, &source, output, params, on_progress, should_cancel)
    }

    fn inspect(&self, path: &Path) -> Result<PdfInfo, SliceError> {
        let engine = PdfiumEngine::new();
        let doc = engine.open(path).map_err(SliceError::from)?;
        Ok(PdfInfo {
            page_count: engine.page_count(&doc),
        })
    }
}
