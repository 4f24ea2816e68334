//! Page-stack construction: breaks + geometry + viewport -> surfaces.
//!
//! A pure function of its inputs; no measurement, no pagination logic.
//! Each page is a fixed-size surface at the current scale whose inner
//! content window is clipped to the content area and whose content is
//! shifted upward by the page's break offset, so only that page's slice
//! shows. The IR is serde-serializable so PDF-export tooling can consume
//! one surface per computed break.

use serde::Serialize;

use folio::geometry::ResolvedPageGeometry;

use crate::paginate::PageBreakList;
use crate::viewport::ViewportState;

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RectPx {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Dashed margin-boundary overlay drawn at the content-area bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MarginFrame {
    /// Frame rectangle in scaled surface coordinates.
    pub rect: RectPx,
    /// Dash length in scaled pixels.
    pub dash_px: f32,
}

/// One fixed-size page surface of the visible stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageSurface {
    /// 1-based page number.
    pub page_number: usize,
    /// Outer surface width at the current scale.
    pub width_px: f32,
    /// Outer surface height at the current scale.
    pub height_px: f32,
    /// Content clip window in scaled surface coordinates.
    pub content_clip: RectPx,
    /// Upward shift of the full content flow, in scaled pixels, so this
    /// page's slice lands inside the clip window.
    pub content_offset_px: f32,
    /// This page's content slice start, in unscaled design pixels.
    pub slice_start_px: f32,
    /// This page's content slice end, in unscaled design pixels.
    pub slice_end_px: f32,
    /// Margin overlay, present when margin visualization is on.
    pub margin_frame: Option<MarginFrame>,
    /// Footer label, present when the footer is enabled.
    pub footer: Option<String>,
}

/// Page-stack construction options.
#[derive(Clone, Debug, PartialEq)]
pub struct PageStackOptions {
    /// Draw the dashed margin frame at the content-area bounds.
    pub show_margin_frame: bool,
    /// Dash length for the margin frame, in design pixels.
    pub margin_dash_px: f32,
    /// Emit a per-page footer label.
    pub footer_enabled: bool,
    /// Footer template; `{page}` and `{total}` are substituted.
    pub footer_template: String,
}

impl Default for PageStackOptions {
    fn default() -> Self {
        Self {
            show_margin_frame: false,
            margin_dash_px: 4.0,
            footer_enabled: true,
            footer_template: "{page} / {total}".to_string(),
        }
    }
}

/// The visible stack: every page surface at one scale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageStack {
    /// Scale the surfaces were built at.
    pub scale: f32,
    /// Surfaces in page order.
    pub surfaces: Vec<PageSurface>,
}

impl PageStack {
    /// Number of pages in the stack.
    pub fn page_count(&self) -> usize {
        self.surfaces.len()
    }
}

/// Build the page stack for the current breaks, geometry, and viewport.
pub fn build_page_stack(
    breaks: &PageBreakList,
    total_height_px: f32,
    geometry: ResolvedPageGeometry,
    viewport: ViewportState,
    options: &PageStackOptions,
) -> PageStack {
    let scale = viewport.scale;
    let total = breaks.page_count();
    let mut surfaces = Vec::with_capacity(total);

    for page_index in 0..total {
        let Some((slice_start, slice_end)) = breaks.slice(page_index, total_height_px) else {
            break;
        };
        let content_clip = RectPx {
            x: geometry.padding.left * scale,
            y: geometry.padding.top * scale,
            width: geometry.content_width_px * scale,
            height: geometry.content_height_px * scale,
        };
        let margin_frame = options.show_margin_frame.then(|| MarginFrame {
            rect: content_clip,
            dash_px: options.margin_dash_px * scale,
        });
        let footer = options.footer_enabled.then(|| {
            options
                .footer_template
                .replace("{page}", &(page_index + 1).to_string())
                .replace("{total}", &total.to_string())
        });
        surfaces.push(PageSurface {
            page_number: page_index + 1,
            width_px: geometry.page_width_px * scale,
            height_px: geometry.page_height_px * scale,
            content_clip,
            content_offset_px: slice_start * scale,
            slice_start_px: slice_start,
            slice_end_px: slice_end,
            margin_frame,
            footer,
        });
    }

    PageStack { scale, surfaces }
}
