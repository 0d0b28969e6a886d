//! Slice geometry: how many output pages a source page needs and which
//! vertical band of the source each of them shows.
//!
//! Everything here is pure arithmetic over points. The width of the source
//! page is mapped onto the full width of the target format (`scale`), the
//! same factor is applied vertically so content is never distorted, and the
//! source page is walked top to bottom in steps of `slice_height` with
//! `overlap_pt` of content repeated across each cut.

use crate::engine::{ClipBox, PageSize};
use crate::format::POINTS_PER_MM;

/// The derived geometry for slicing one source page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePlan {
    /// Source page size, points.
    pub source: PageSize,
    /// Target page size, points.
    pub target: PageSize,
    /// target width / source width; applied uniformly to both axes.
    pub scale: f64,
    /// Overlap converted to points (target space).
    pub overlap_pt: f64,
    /// Vertical step between slices, in source-page units.
    pub slice_height: f64,
    /// Number of output pages. Always >= 1.
    pub slice_count: usize,
}

impl SlicePlan {
    /// Compute the plan for a source page, a target format and an overlap.
    pub fn compute(source: PageSize, target: PageSize, overlap_mm: f64) -> Self {
        let scale = target.width / source.width;
        let overlap_pt = overlap_mm * POINTS_PER_MM;

        // Vertical span of source content each target page advances by,
        // after reserving overlap_pt of target space for repeated content.
        let slice_height = (target.height - overlap_pt) / scale;

        let slice_count = ((source.height - overlap_pt) / slice_height).ceil();
        let slice_count = if slice_count >= 1.0 {
            slice_count as usize
        } else {
            // Source shorter than (or equal to) the overlap still yields one
            // page covering whatever content exists.
            1
        };

        SlicePlan {
            source,
            target,
            scale,
            overlap_pt,
            slice_height,
            slice_count,
        }
    }

    /// The source-space band shown by slice `index` (0-based), clamped to
    /// the page: slice tops never rise above 0, slice bottoms never extend
    /// past the source height.
    pub fn window(&self, index: usize) -> ClipBox {
        let reach = self.overlap_pt / self.scale;
        let y0 = (index as f64 * self.slice_height - reach).max(0.0);
        let y1 = (y0 + self.slice_height + reach).min(self.source.height);
        ClipBox {
            x0: 0.0,
            y0,
            x1: self.source.width,
            y1,
        }
    }
}
