//! The slicer: turn one oversized source page into a run of fixed-format
//! output pages.
//!
//! ## Contract
//!
//! [`slice`] takes an already-opened source document, validated parameters,
//! a progress sink and a cancellation predicate, and writes the finished
//! document to `output_path`. Progress percentages 0–90 are reserved for
//! per-slice work; 90–100 for serialisation. The cancellation predicate is
//! polled exactly once per slice, before any work for that slice happens, so
//! worst-case cancellation latency is the cost of composing one slice — and
//! a cancelled run never saves a partial file.
//!
//! ## Known limitation
//!
//! Only the first page of the source document is sliced; any further source
//! pages are ignored.

use crate::config::SliceParameters;
use crate::engine::PdfEngine;
use crate::error::SliceError;
use crate::plan::SlicePlan;
use std::path::Path;
use tracing::info;

/// What a successful run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSummary {
    /// Number of pages in the output document.
    pub pages: usize,
}

/// Slice the first page of `source` into `plan.slice_count` pages of the
/// target format and save the result to `output_path`.
pub fn slice<'a, E: PdfEngine>(
    engine: &'a E,
    source: &E::Doc<'a>,
    output_path: &Path,
    params: &SliceParameters,
    on_progress: &mut dyn FnMut(u8, &str),
    should_cancel: &dyn Fn() -> bool,
) -> Result<SliceSummary, SliceError> {
    if engine.page_count(source) == 0 {
        return Err(SliceError::EmptySource);
    }

    let source_size = engine.page_size(source, 0)?;
    let target_size = params.format.dimensions();
    let plan = SlicePlan::compute(source_size, target_size, params.overlap_mm);

    info!(
        "slicing {:.0}x{:.0}pt page into {} {} page(s), overlap {}mm",
        source_size.width, source_size.height, plan.slice_count, params.format, params.overlap_mm
    );

    let mut output = engine.create()?;

    for i in 0..plan.slice_count {
        if should_cancel() {
            info!("conversion cancelled after {} of {} slices", i, plan.slice_count);
            return Err(SliceError::Cancelled);
        }

        let percent = (i * 90 / plan.slice_count) as u8;
        on_progress(
            percent,
            &format!("Processing page {}/{}", i + 1, plan.slice_count),
        );

        engine.add_page(&mut output, target_size)?;
        engine.copy_scaled_region(&mut output, i, source, 0, plan.window(i), plan.scale)?;
    }

    on_progress(95, "Saving PDF...");
    engine.save(&output, output_path)?;
    on_progress(100, "Completed");

    info!(
        "created {} page(s) at '{}'",
        plan.slice_count,
        output_path.display()
    );

    Ok(SliceSummary {
        pages: plan.slice_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClipBox, EngineError, PageSize};
    use crate::format::{PaperFormat, POINTS_PER_MM};
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    /// In-memory engine double that records every composition call.
    #[derive(Default)]
    struct MockEngine {
        source_pages: Vec<PageSize>,
        fail_save: bool,
        fail_copy_at: Option<usize>,
        log: RefCell<MockLog>,
    }

    #[derive(Default)]
    struct MockLog {
        pages_added: Vec<PageSize>,
        copies: Vec<(usize, ClipBox, f64)>,
        saved: Option<(PathBuf, usize)>,
    }

    struct MockDoc {
        pages: Vec<PageSize>,
    }

    impl MockEngine {
        fn with_source(pages: Vec<PageSize>) -> Self {
            Self {
                source_pages: pages,
                ..Self::default()
            }
        }
    }

    impl PdfEngine for MockEngine {
        type Doc<'a> = MockDoc;

        fn open<'a>(&'a self, _path: &std::path::Path) -> Result<MockDoc, EngineError> {
            Ok(MockDoc {
                pages: self.source_pages.clone(),
            })
        }

        fn create<'a>(&'a self) -> Result<MockDoc, EngineError> {
            Ok(MockDoc { pages: Vec::new() })
        }

        fn page_count(&self, doc: &MockDoc) -> usize {
            doc.pages.len()
        }

        fn page_size(&self, doc: &MockDoc, index: usize) -> Result<PageSize, EngineError> {
            doc.pages
                .get(index)
                .copied()
                .ok_or_else(|| EngineError::new(format!("no page {index}")))
        }

        fn add_page(&self, doc: &mut MockDoc, size: PageSize) -> Result<(), EngineError> {
            doc.pages.push(size);
            self.log.borrow_mut().pages_added.push(size);
            Ok(())
        }

        fn copy_scaled_region<'a>(
            &'a self,
            _dest: &mut MockDoc,
            dest_index: usize,
            _source: &MockDoc,
            _source_index: usize,
            clip: ClipBox,
            scale: f64,
        ) -> Result<(), EngineError> {
            if self.fail_copy_at == Some(dest_index) {
                return Err(EngineError::new("composition failed"));
            }
            self.log.borrow_mut().copies.push((dest_index, clip, scale));
            Ok(())
        }

        fn save(&self, doc: &MockDoc, path: &std::path::Path) -> Result<(), EngineError> {
            if self.fail_save {
                return Err(EngineError::new("disk full"));
            }
            self.log.borrow_mut().saved = Some((path.to_path_buf(), doc.pages.len()));
            Ok(())
        }
    }

    fn tall_source() -> Vec<PageSize> {
        vec![PageSize {
            width: 595.0,
            height: 4000.0,
        }]
    }

    fn params() -> SliceParameters {
        SliceParameters::default()
    }

    fn never_cancel() -> impl Fn() -> bool {
        || false
    }

    fn run(
        engine: &MockEngine,
        params: &SliceParameters,
        should_cancel: &dyn Fn() -> bool,
    ) -> Result<SliceSummary, SliceError> {
        let source = engine.open(std::path::Path::new("input.pdf")).unwrap();
        let mut sink = |_: u8, _: &str| {};
        slice(
            engine,
            &source,
            std::path::Path::new("output.pdf"),
            params,
            &mut sink,
            should_cancel,
        )
    }

    #[test]
    fn produces_one_page_per_planned_slice() {
        let engine = MockEngine::with_source(tall_source());
        let summary = run(&engine, &params(), &never_cancel()).unwrap();
        assert_eq!(summary.pages, 5);

        let log = engine.log.borrow();
        assert_eq!(log.pages_added.len(), 5);
        assert_eq!(log.copies.len(), 5);
        assert_eq!(log.saved.as_ref().unwrap().1, 5);
        for page in &log.pages_added {
            assert_eq!(*page, PaperFormat::A4.dimensions());
        }
    }

    #[test]
    fn copies_the_planned_windows_in_order() {
        let engine = MockEngine::with_source(tall_source());
        run(&engine, &params(), &never_cancel()).unwrap();

        let log = engine.log.borrow();
        let overlap_pt = 8.0 * POINTS_PER_MM;
        for (i, (dest, clip, scale)) in log.copies.iter().enumerate() {
            assert_eq!(*dest, i);
            assert_eq!(*scale, 1.0);
            assert_eq!(clip.x0, 0.0);
            assert_eq!(clip.x1, 595.0);
            assert!(clip.y0 >= 0.0 && clip.y1 <= 4000.0);
            if i > 0 {
                // Every slice after the first starts overlap_pt above where a
                // gapless cut would have put it.
                let prev = log.copies[i - 1].1;
                assert!(clip.y0 < prev.y1);
            }
        }
        // Last slice is clipped to the bottom of the source and carries less
        // than a full page worth of content (blank space stays below it).
        let last = log.copies.last().unwrap().1;
        assert_eq!(last.y1, 4000.0);
        assert!(last.height() < 842.0);
        let expected_last_top = 4.0 * (842.0 - overlap_pt) - overlap_pt;
        assert!((last.y0 - expected_last_top).abs() < 1e-9);
    }

    #[test]
    fn empty_source_is_rejected() {
        let engine = MockEngine::with_source(Vec::new());
        let err = run(&engine, &params(), &never_cancel()).unwrap_err();
        assert!(matches!(err, SliceError::EmptySource));
        assert!(engine.log.borrow().saved.is_none());
    }

    #[test]
    fn cancellation_stops_before_the_next_slice_and_saves_nothing() {
        let engine = MockEngine::with_source(tall_source());
        let polls = Cell::new(0usize);
        let cancel_after_two = || {
            polls.set(polls.get() + 1);
            polls.get() > 2
        };
        let err = run(&engine, &params(), &cancel_after_two).unwrap_err();
        assert!(matches!(err, SliceError::Cancelled));

        let log = engine.log.borrow();
        assert_eq!(log.pages_added.len(), 2);
        assert!(log.saved.is_none());
    }

    #[test]
    fn progress_runs_zero_to_ninety_then_save_band() {
        let engine = MockEngine::with_source(tall_source());
        let source = engine.open(std::path::Path::new("input.pdf")).unwrap();
        let events = RefCell::new(Vec::<(u8, String)>::new());
        let mut sink = |pct: u8, msg: &str| events.borrow_mut().push((pct, msg.to_string()));
        slice(
            &engine,
            &source,
            std::path::Path::new("output.pdf"),
            &params(),
            &mut sink,
            &never_cancel(),
        )
        .unwrap();

        let events = events.into_inner();
        assert_eq!(events.first().unwrap().0, 0);
        assert_eq!(events.first().unwrap().1, "Processing page 1/5");
        let n = events.len();
        assert_eq!(events[n - 2], (95, "Saving PDF...".to_string()));
        assert_eq!(events[n - 1], (100, "Completed".to_string()));
        for window in events.windows(2) {
            assert!(window[0].0 <= window[1].0, "progress went backwards");
        }
        for (pct, msg) in &events[..n - 2] {
            assert!(*pct <= 90, "slice work reported {pct}% ({msg})");
        }
    }

    #[test]
    fn engine_failure_during_composition_surfaces_as_engine_error() {
        let engine = MockEngine {
            fail_copy_at: Some(1),
            ..MockEngine::with_source(tall_source())
        };
        let err = run(&engine, &params(), &never_cancel()).unwrap_err();
        assert!(matches!(err, SliceError::Engine(_)));
        assert!(engine.log.borrow().saved.is_none());
    }

    #[test]
    fn engine_failure_during_save_surfaces_as_engine_error() {
        let engine = MockEngine {
            fail_save: true,
            ..MockEngine::with_source(tall_source())
        };
        let err = run(&engine, &params(), &never_cancel()).unwrap_err();
        assert!(matches!(err, SliceError::Engine(_)));
    }

    #[test]
    fn source_shorter_than_target_yields_a_single_top_anchored_slice() {
        let engine = MockEngine::with_source(vec![PageSize {
            width: 595.0,
            height: 400.0,
        }]);
        let summary = run(&engine, &params(), &never_cancel()).unwrap();
        assert_eq!(summary.pages, 1);

        let log = engine.log.borrow();
        let (_, clip, scale) = log.copies[0];
        assert_eq!(clip.y0, 0.0);
        assert_eq!(clip.y1, 400.0);
        // Scaled content height is well short of the page; the slicer still
        // emits a full-size A4 page with the content at the top.
        assert!(clip.height() * scale < 842.0);
        assert_eq!(log.pages_added[0], PaperFormat::A4.dimensions());
    }

    #[test]
    fn extra_source_pages_are_ignored() {
        let mut pages = tall_source();
        pages.push(PageSize {
            width: 100.0,
            height: 100.0,
        });
        let engine = MockEngine::with_source(pages);
        let summary = run(&engine, &params(), &never_cancel()).unwrap();
        // Geometry identical to the single-page case: only page 0 counts.
        assert_eq!(summary.pages, 5);
    }
}
