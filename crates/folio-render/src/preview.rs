//! Preview engine: the orchestrator binding content, geometry,
//! measurement, pagination, and the viewport into one document view.
//!
//! All state is owned exclusively by the engine instance bound to one
//! document view; nothing is shared across instances. The engine is
//! driven by its host on the UI thread: edits invalidate, `poll`/`pump`
//! fire debounced measurement passes, completions apply only when still
//! current, and `snapshot` yields the page stack plus toolbar state for
//! the next render pass.

use std::sync::{Arc, Mutex};

use folio::error::MarkupError;
use folio::geometry::{MarginsMm, PageGeometryConfig, ResolvedPageGeometry};
use folio::paper::PaperPreset;
use folio::tags::{self, TaggedSpan};
use serde::Serialize;

use crate::measure::{
    CancelToken, MeasureRequest, MeasureScheduler, MeasuredBlock, MeasurementService, NeverCancel,
    MEASURE_DEBOUNCE_MS,
};
use crate::page_stack::{build_page_stack, PageStack, PageStackOptions};
use crate::paginate::{compute_page_breaks, PageBreakList};
use crate::viewport::ZoomController;

/// Readiness of the preview for the toolbar and render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PreviewStatus {
    /// A measurement pass is pending or in flight; hosts render a
    /// transient placeholder instead of stale pages.
    Processing,
    /// Pages reflect the latest content and geometry.
    Ready,
    /// The content area is degenerate (margins consume the paper);
    /// a single forced page is shown and the toolbar warns.
    MeasurementsUnavailable,
}

/// Runtime diagnostics emitted by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewDiagnostic {
    MeasurementScheduled {
        generation: u64,
    },
    /// A measurement completed for a superseded generation and was
    /// discarded.
    MeasurementSuperseded {
        completed: u64,
        current: u64,
    },
    RepaginationApplied {
        generation: u64,
        block_count: usize,
        page_count: usize,
    },
    DegenerateContentArea,
    Cancelled,
}

type DiagnosticCallback = Arc<Mutex<Box<dyn FnMut(PreviewDiagnostic) + Send + 'static>>>;
type DiagnosticSink = Option<DiagnosticCallback>;

/// Toolbar-facing view of the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolbarState {
    pub scale: f32,
    pub current_page: usize,
    pub total_pages: usize,
    pub status: PreviewStatus,
}

/// Snapshot handed to the host's render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSnapshot {
    pub toolbar: ToolbarState,
    /// Present once the first measurement has been applied; `None` while
    /// the processing placeholder should show.
    pub stack: Option<PageStack>,
}

/// Engine construction options.
#[derive(Clone, Debug)]
pub struct PreviewOptions {
    /// Scale applied at creation and on reset; auto-fit never exceeds it.
    pub initial_scale: f32,
    /// Quiet period before a scheduled measurement fires.
    pub debounce_ms: u64,
    /// Initial page geometry.
    pub geometry: PageGeometryConfig,
    /// Page-stack construction options.
    pub stack: PageStackOptions,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            initial_scale: 1.0,
            debounce_ms: MEASURE_DEBOUNCE_MS,
            geometry: PageGeometryConfig::default(),
            stack: PageStackOptions::default(),
        }
    }
}

/// Pagination and viewport engine for one document view.
pub struct PreviewEngine {
    options: PreviewOptions,
    content: String,
    geometry_cfg: PageGeometryConfig,
    resolved: ResolvedPageGeometry,
    zoom: ZoomController,
    scheduler: MeasureScheduler,
    measurer: Option<Arc<dyn MeasurementService>>,
    breaks: PageBreakList,
    total_height_px: f32,
    measured_once: bool,
    container_width_px: Option<f32>,
    status: PreviewStatus,
    diagnostic_sink: DiagnosticSink,
    closed: bool,
}

impl core::fmt::Debug for PreviewEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PreviewEngine")
            .field("status", &self.status)
            .field("page_count", &self.breaks.page_count())
            .field("generation", &self.scheduler.generation())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl PreviewEngine {
    /// Create an engine with the given options and empty content.
    pub fn new(options: PreviewOptions) -> Self {
        let resolved = options.geometry.resolve();
        Self {
            zoom: ZoomController::new(options.initial_scale),
            scheduler: MeasureScheduler::with_debounce(options.debounce_ms),
            geometry_cfg: options.geometry,
            resolved,
            options,
            content: String::new(),
            measurer: None,
            breaks: PageBreakList::single_page(),
            total_height_px: 0.0,
            measured_once: false,
            container_width_px: None,
            status: PreviewStatus::Processing,
            diagnostic_sink: None,
            closed: false,
        }
    }

    /// Attach a measurement backend used by [`pump`](Self::pump).
    pub fn with_measurer(mut self, measurer: Arc<dyn MeasurementService>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Register or replace the diagnostics sink.
    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(PreviewDiagnostic) + Send + 'static,
    {
        self.diagnostic_sink = Some(Arc::new(Mutex::new(Box::new(sink)))); // allow: once, diagnostic setup
    }

    fn emit_diagnostic(&self, diagnostic: PreviewDiagnostic) {
        let Some(sink) = &self.diagnostic_sink else {
            return;
        };
        if let Ok(mut sink) = sink.lock() {
            sink(diagnostic);
        }
    }

    /// Current content string.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current resolved geometry snapshot.
    pub fn geometry(&self) -> ResolvedPageGeometry {
        self.resolved
    }

    /// Current readiness.
    pub fn status(&self) -> PreviewStatus {
        self.status
    }

    /// Replace the document content.
    pub fn set_content(&mut self, html: impl Into<String>, now_ms: u64) {
        self.content = html.into();
        self.zoom.content_invalidated();
        self.invalidate(now_ms);
    }

    /// Replace the margins, keeping the paper size.
    pub fn set_margins(&mut self, margins: MarginsMm, now_ms: u64) {
        self.geometry_cfg.margins = margins;
        self.apply_geometry(now_ms);
    }

    /// Replace the paper size in millimeters, keeping the margins.
    pub fn set_paper_size(&mut self, width_mm: f32, height_mm: f32, now_ms: u64) {
        self.geometry_cfg.paper_width_mm = width_mm;
        self.geometry_cfg.paper_height_mm = height_mm;
        self.apply_geometry(now_ms);
    }

    /// Replace the paper size from a catalog preset.
    pub fn set_paper_preset(&mut self, preset: &PaperPreset, now_ms: u64) {
        self.set_paper_size(preset.width_mm, preset.height_mm, now_ms);
    }

    fn apply_geometry(&mut self, now_ms: u64) {
        self.resolved = self.geometry_cfg.resolve();
        self.zoom.content_invalidated();
        if let Some(width) = self.container_width_px {
            self.zoom.auto_fit(width, self.resolved.page_width_px);
        }
        self.invalidate(now_ms);
    }

    /// Record the hosting container's available width.
    ///
    /// Re-fits the zoom (unless manual zoom is engaged) and schedules a
    /// re-measurement; it does not re-enable auto-fit by itself.
    pub fn set_container_width(&mut self, width_px: f32, now_ms: u64) {
        self.container_width_px = Some(width_px);
        self.zoom.auto_fit(width_px, self.resolved.page_width_px);
        self.invalidate(now_ms);
    }

    fn invalidate(&mut self, now_ms: u64) {
        if self.closed {
            return;
        }
        self.status = PreviewStatus::Processing;
        let generation = self.scheduler.invalidate(now_ms);
        log::debug!("measurement pass {} scheduled", generation);
        self.emit_diagnostic(PreviewDiagnostic::MeasurementScheduled { generation });
    }

    /// Hand out the pending measurement request once its quiet period has
    /// elapsed. Hosts running their own measurement surface render the
    /// request's content off-screen and call
    /// [`complete_measure`](Self::complete_measure) with the result.
    pub fn poll(&mut self, now_ms: u64) -> Option<MeasureRequest> {
        if self.closed {
            return None;
        }
        let generation = self.scheduler.poll(now_ms)?;
        Some(MeasureRequest {
            generation,
            html: self.content.clone(),
            content_width_px: self.resolved.content_width_px,
        })
    }

    /// Apply a completed measurement pass.
    ///
    /// Returns `false` when the pass was superseded by a newer change and
    /// discarded; applying it would flash a stale layout.
    pub fn complete_measure(&mut self, generation: u64, blocks: &[MeasuredBlock]) -> bool {
        if self.closed {
            return false;
        }
        if !self.scheduler.accepts(generation) {
            log::debug!(
                "discarding stale measurement pass {} (current {})",
                generation,
                self.scheduler.generation()
            );
            self.emit_diagnostic(PreviewDiagnostic::MeasurementSuperseded {
                completed: generation,
                current: self.scheduler.generation(),
            });
            return false;
        }

        self.total_height_px = blocks.last().map(|b| b.bottom_px).unwrap_or(0.0);
        if self.resolved.is_degenerate() {
            self.breaks = PageBreakList::single_page();
            self.status = PreviewStatus::MeasurementsUnavailable;
            self.emit_diagnostic(PreviewDiagnostic::DegenerateContentArea);
        } else {
            self.breaks =
                compute_page_breaks(blocks, self.resolved.content_height_px, self.total_height_px);
            self.status = PreviewStatus::Ready;
        }
        self.measured_once = true;
        self.zoom.set_page_count(self.breaks.page_count());
        self.emit_diagnostic(PreviewDiagnostic::RepaginationApplied {
            generation,
            block_count: blocks.len(),
            page_count: self.breaks.page_count(),
        });
        true
    }

    /// Run a due measurement pass on the attached backend and apply it.
    pub fn pump(&mut self, now_ms: u64) -> bool {
        self.pump_with_cancel(now_ms, &NeverCancel)
    }

    /// [`pump`](Self::pump) with a cancellation hook checked before the
    /// pass runs; a cancelled engine drops its pending pass.
    pub fn pump_with_cancel(&mut self, now_ms: u64, cancel: &dyn CancelToken) -> bool {
        if cancel.is_cancelled() {
            self.scheduler.cancel();
            self.emit_diagnostic(PreviewDiagnostic::Cancelled);
            return false;
        }
        let Some(measurer) = self.measurer.clone() else {
            return false;
        };
        let Some(request) = self.poll(now_ms) else {
            return false;
        };
        let blocks = measurer.measure(&request.html, request.content_width_px);
        self.complete_measure(request.generation, &blocks)
    }

    /// Placeholder markers currently present in the content.
    pub fn placeholders(&self) -> Result<Vec<TaggedSpan>, MarkupError> {
        tags::scan_placeholders(&self.content)
    }

    /// Resolve a placeholder: replace every marker sharing `code` with
    /// the literal `value` and invalidate the layout when anything
    /// changed. Returns the number of markers replaced.
    pub fn establish_tag_value(
        &mut self,
        code: &str,
        value: &str,
        now_ms: u64,
    ) -> Result<usize, MarkupError> {
        let rewrite = tags::establish_value(&self.content, code, value)?;
        if rewrite.replaced > 0 {
            self.content = rewrite.html;
            self.zoom.content_invalidated();
            self.invalidate(now_ms);
        }
        Ok(rewrite.replaced)
    }

    /// Set zoom explicitly; engages manual mode.
    pub fn set_zoom(&mut self, scale: f32) {
        self.zoom.set_zoom(scale);
    }

    /// Navigate to a 1-based page; returns the clamped target page whose
    /// surface the host should scroll into view.
    pub fn navigate_to(&mut self, page_number: usize) -> usize {
        self.zoom.navigate_to(page_number)
    }

    /// Record the page in view reported by the host's scroll tracking.
    pub fn scroll_observed_page(&mut self, visible_page: usize) {
        self.zoom.scroll_observed(visible_page);
    }

    /// Record a scroll position as an unscaled content offset; the
    /// containing page becomes current.
    pub fn scroll_observed_offset(&mut self, content_offset_px: f32) {
        let page_index = self.breaks.page_at_offset(content_offset_px);
        self.zoom.scroll_observed(page_index + 1);
    }

    /// Reset zoom to the configured initial scale.
    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    /// Toolbar-facing view of the current state.
    pub fn toolbar(&self) -> ToolbarState {
        ToolbarState {
            scale: self.zoom.scale(),
            current_page: self.zoom.current_page(),
            total_pages: self.breaks.page_count(),
            status: self.status,
        }
    }

    /// Snapshot for the host's render pass.
    ///
    /// While a pass is pending the stack is withheld so hosts show the
    /// processing placeholder instead of a stale layout.
    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            toolbar: self.toolbar(),
            stack: self.pages(),
        }
    }

    /// Current page stack, or `None` while no up-to-date layout exists.
    pub fn pages(&self) -> Option<PageStack> {
        if !self.measured_once || self.status == PreviewStatus::Processing {
            return None;
        }
        Some(build_page_stack(
            &self.breaks,
            self.total_height_px,
            self.resolved,
            self.zoom.state(),
            &self.options.stack,
        ))
    }

    /// Tear down: cancel any pending measurement so nothing writes into a
    /// closed view.
    pub fn close(&mut self) {
        self.scheduler.cancel();
        self.closed = true;
    }

    /// True once the view has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::OutlineMeasurer;

    fn engine_with_measurer() -> PreviewEngine {
        PreviewEngine::new(PreviewOptions::default()).with_measurer(OutlineMeasurer::shared())
    }

    #[test]
    fn fresh_engine_reports_processing_without_pages() {
        let engine = PreviewEngine::new(PreviewOptions::default());
        assert_eq!(engine.status(), PreviewStatus::Processing);
        assert!(engine.pages().is_none());
    }

    #[test]
    fn pump_measures_and_paginates_after_the_debounce() {
        let mut engine = engine_with_measurer();
        engine.set_content("<p>hola</p>", 0);
        assert!(!engine.pump(50), "quiet period has not elapsed");
        assert!(engine.pump(150));
        assert_eq!(engine.status(), PreviewStatus::Ready);
        let stack = engine.pages().expect("pages after measurement");
        assert_eq!(stack.page_count(), 1);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut engine = PreviewEngine::new(PreviewOptions::default());
        engine.set_content("<p>first</p>", 0);
        let request = engine.poll(200).expect("due request");

        // Content changes while the pass is in flight.
        engine.set_content("<p>second edit</p>", 210);
        assert!(!engine.complete_measure(request.generation, &[]));
        assert_eq!(engine.status(), PreviewStatus::Processing);
        assert!(engine.pages().is_none());
    }

    #[test]
    fn degenerate_margins_warn_instead_of_looping() {
        let mut engine = engine_with_measurer();
        engine.set_content("<p>texto</p>", 0);
        engine.set_margins(MarginsMm::uniform(400.0), 10);
        assert!(engine.pump(200));
        assert_eq!(engine.status(), PreviewStatus::MeasurementsUnavailable);
        assert_eq!(engine.toolbar().total_pages, 1);
    }

    #[test]
    fn closed_engine_ignores_polls_and_completions() {
        let mut engine = engine_with_measurer();
        engine.set_content("<p>texto</p>", 0);
        engine.close();
        assert!(engine.poll(500).is_none());
        assert!(!engine.pump(500));
        assert!(engine.is_closed());
    }

    #[test]
    fn diagnostics_report_supersede_events() {
        let seen: Arc<Mutex<Vec<PreviewDiagnostic>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut engine = PreviewEngine::new(PreviewOptions::default());
        engine.set_diagnostic_sink(move |d| sink.lock().expect("sink lock").push(d));
        engine.set_content("<p>uno</p>", 0);
        let request = engine.poll(200).expect("due request");
        engine.set_content("<p>dos</p>", 210);
        engine.complete_measure(request.generation, &[]);

        let seen = seen.lock().expect("seen lock");
        assert!(seen
            .iter()
            .any(|d| matches!(d, PreviewDiagnostic::MeasurementSuperseded { .. })));
    }
}
