//! The PDF engine collaborator interface.
//!
//! The slicer does no PDF parsing or drawing of its own: opening documents,
//! reading page geometry, composing scaled page regions and serialising the
//! result are all delegated to an engine behind this trait. Keeping the seam
//! here lets the slicing algorithm and the job controller be tested against
//! an in-memory double while production uses pdfium (see [`pdfium`]).
//!
//! ## Coordinate conventions
//!
//! All geometry is in PDF points (1/72 inch). [`ClipBox`] uses *top-down*
//! y-coordinates — `y0` is the distance from the top edge of the source page
//! to the top of the band, which is how the slicing arithmetic naturally
//! reads. Implementations working in PDF's bottom-up user space (pdfium
//! does) convert at the boundary.
//!
//! ## Resource lifetimes
//!
//! Document handles own their engine-side resources and release them on
//! `Drop`, so every exit path out of the slicer — success, failure or
//! cancellation — closes whatever it opened.

pub mod pdfium;

use std::path::Path;
use thiserror::Error;

/// Width/height of a page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// A rectangular region of a source page, in points, top-down.
///
/// `x0..x1` spans horizontally from the left edge; `y0..y1` spans vertically
/// from the top edge. Invariant: `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl ClipBox {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// An opaque failure inside the engine. The message is preserved verbatim
/// for display in the job's error field.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError(message.into())
    }
}

/// Capabilities the slicer requires from a PDF engine.
///
/// The document handle is a generic associated type so implementations may
/// borrow from the engine instance (pdfium documents borrow their library
/// binding) while test doubles use plain owned values.
pub trait PdfEngine {
    /// Handle to an open (or under-construction) document.
    type Doc<'a>
    where
        Self: 'a;

    /// Open an existing PDF from disk.
    fn open<'a>(&'a self, path: &Path) -> Result<Self::Doc<'a>, EngineError>;

    /// Create a new, empty document.
    fn create<'a>(&'a self) -> Result<Self::Doc<'a>, EngineError>;

    /// Number of pages in the document.
    fn page_count(&self, doc: &Self::Doc<'_>) -> usize;

    /// Size of page `index` (0-based), in points.
    fn page_size(&self, doc: &Self::Doc<'_>, index: usize) -> Result<PageSize, EngineError>;

    /// Append a blank page of exactly `size` to the document.
    fn add_page(&self, doc: &mut Self::Doc<'_>, size: PageSize) -> Result<(), EngineError>;

    /// Draw the `clip` region of `source` page `source_index` onto page
    /// `dest_index` of `dest`, scaled uniformly by `scale` and anchored at
    /// the destination page's top-left corner. Content is never centred;
    /// when the scaled region is shorter than the page, the space below it
    /// stays blank.
    fn copy_scaled_region<'a>(
        &'a self,
        dest: &mut Self::Doc<'a>,
        dest_index: usize,
        source: &Self::Doc<'a>,
        source_index: usize,
        clip: ClipBox,
        scale: f64,
    ) -> Result<(), EngineError>;

    /// Serialise the document to `path`.
    fn save(&self, doc: &Self::Doc<'_>, path: &Path) -> Result<(), EngineError>;
}
