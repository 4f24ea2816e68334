//! Pagination, viewport control, and page-stack construction for `folio`.
//!
//! The pipeline: resolved page geometry + measured block geometry go into
//! the pagination calculator, which produces the page-break list; the
//! page-stack builder turns breaks plus the current viewport state into
//! fixed-size page surfaces; [`PreviewEngine`] orchestrates the whole loop
//! including debounced, supersede-on-change re-measurement.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod measure;
mod page_stack;
mod paginate;
mod preview;
mod viewport;

pub use folio::geometry::{PageGeometryConfig, ResolvedPageGeometry};
pub use measure::{
    CancelToken, MeasureRequest, MeasureScheduler, MeasureTypography, MeasuredBlock,
    MeasurementService, NeverCancel, OutlineMeasurer, MEASURE_DEBOUNCE_MS,
};
pub use page_stack::{
    build_page_stack, MarginFrame, PageStack, PageStackOptions, PageSurface, RectPx,
};
pub use paginate::{compute_page_breaks, PageBreakList};
pub use preview::{
    PreviewDiagnostic, PreviewEngine, PreviewOptions, PreviewSnapshot, PreviewStatus, ToolbarState,
};
pub use viewport::{ViewportState, ZoomController, FIT_PADDING_PX, MAX_SCALE, MIN_SCALE};
