//! Block measurement: the injected measurement surface and its scheduler.
//!
//! The engine never measures text itself. A host supplies a
//! [`MeasurementService`], typically a bridge to the surface that renders
//! the content off-screen at the target content width, and the engine
//! consumes the block geometry it reports. The built-in
//! [`OutlineMeasurer`] is a deterministic estimator over the markup
//! outline, used by tests and headless hosts.
//!
//! Measurement is asynchronous from the host's point of view: content is
//! written off-screen and geometry can only be read back after layout
//! settles. [`MeasureScheduler`] models that as a debounced request pump
//! with a generation counter: a pass completing for a stale generation is
//! discarded, never applied. Failing to discard stale measurements shows
//! up as pages flickering back to a previous layout.

use std::sync::Arc;

use folio::markup::{scan_blocks, BlockOutline, BlockRole, MarkupLimits};

/// Default quiet period before a scheduled measurement fires.
pub const MEASURE_DEBOUNCE_MS: u64 = 100;

/// Bounding geometry of one block-level element, in design pixels,
/// relative to the top of the full unpaginated content flow.
///
/// Produced fresh on every measurement pass and never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeasuredBlock {
    /// Top offset from the start of the content flow.
    pub top_px: f32,
    /// Bottom offset from the start of the content flow.
    pub bottom_px: f32,
    /// Element height (`bottom_px - top_px`).
    pub height_px: f32,
}

impl MeasuredBlock {
    /// Build a block from a top offset and height.
    pub fn from_span(top_px: f32, height_px: f32) -> Self {
        Self {
            top_px,
            bottom_px: top_px + height_px,
            height_px,
        }
    }
}

/// Measurement surface contract.
///
/// Implementations render `html` off-screen at exactly `content_width_px`,
/// with the same font family, size, line-height, letter-spacing, and
/// ligature settings as the editing surface that authored the content, and
/// report every block-level element in document order. The pagination
/// calculator never assumes a specific backing implementation.
pub trait MeasurementService: Send + Sync {
    /// Measure block geometry for the content at the given width.
    fn measure(&self, html: &str, content_width_px: f32) -> Vec<MeasuredBlock>;
}

/// Cancellation hook for pending measurement work.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Never-cancel token for default call paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Typography settings for the reference measurer.
///
/// These must be pixel-identical to the editing surface that produced the
/// content; a mismatch here is the primary source of pagination drift
/// between editor and preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureTypography {
    /// Base font size in pixels.
    pub font_size_px: f32,
    /// Line-height multiplier.
    pub line_height: f32,
    /// Average glyph advance as a fraction of the font size.
    pub char_width_ratio: f32,
    /// Extra letter spacing per character in pixels.
    pub letter_spacing_px: f32,
    /// Gap after paragraph and quote blocks.
    pub paragraph_gap_px: f32,
    /// Gap after heading blocks.
    pub heading_gap_px: f32,
    /// Heading size multipliers for levels 1-3.
    pub heading_scale: [f32; 3],
    /// Vertical padding added inside each table row.
    pub row_padding_px: f32,
    /// Left indent applied to list items.
    pub list_indent_px: f32,
}

impl Default for MeasureTypography {
    fn default() -> Self {
        Self {
            font_size_px: 16.0,
            line_height: 1.4,
            char_width_ratio: 0.52,
            letter_spacing_px: 0.0,
            paragraph_gap_px: 8.0,
            heading_gap_px: 10.0,
            heading_scale: [1.6, 1.4, 1.2],
            row_padding_px: 6.0,
            list_indent_px: 24.0,
        }
    }
}

/// Deterministic measurement backend over the markup outline.
///
/// Estimates block heights from character counts and the typography
/// settings: lines per block from characters-per-line at the content
/// width, container blocks spanning the sum of their children. Good
/// enough for headless hosts and exact enough for tests; interactive
/// hosts should bridge their real layout surface instead.
#[derive(Clone, Debug)]
pub struct OutlineMeasurer {
    typography: MeasureTypography,
    limits: MarkupLimits,
}

impl OutlineMeasurer {
    /// Measurer with default typography and limits.
    pub fn new() -> Self {
        Self {
            typography: MeasureTypography::default(),
            limits: MarkupLimits::default(),
        }
    }

    /// Measurer with explicit typography.
    pub fn with_typography(typography: MeasureTypography) -> Self {
        Self {
            typography,
            limits: MarkupLimits::default(),
        }
    }

    /// Create a shared measurer trait object for engine wiring.
    pub fn shared() -> Arc<dyn MeasurementService> {
        Arc::new(Self::new())
    }

    fn chars_per_line(&self, content_width_px: f32, role: BlockRole) -> f32 {
        let advance =
            self.typography.font_size_px * self.typography.char_width_ratio * self.role_scale(role)
                + self.typography.letter_spacing_px;
        let width = match role {
            BlockRole::ListItem => (content_width_px - self.typography.list_indent_px).max(1.0),
            _ => content_width_px.max(1.0),
        };
        (width / advance.max(1.0)).floor().max(8.0)
    }

    fn role_scale(&self, role: BlockRole) -> f32 {
        match role {
            BlockRole::Heading(level) => {
                let idx = usize::from(level.clamp(1, 3)) - 1;
                self.typography.heading_scale[idx]
            }
            _ => 1.0,
        }
    }

    fn line_height_px(&self, role: BlockRole) -> f32 {
        self.typography.font_size_px * self.role_scale(role) * self.typography.line_height
    }

    fn gap_after(&self, role: BlockRole) -> f32 {
        match role {
            BlockRole::Heading(_) => self.typography.heading_gap_px,
            BlockRole::Paragraph | BlockRole::Quote => self.typography.paragraph_gap_px,
            BlockRole::TableRow => self.typography.row_padding_px,
            _ => 0.0,
        }
    }

    fn leaf_height(&self, block: &BlockOutline, content_width_px: f32) -> f32 {
        let chars_per_line = self.chars_per_line(content_width_px, block.role);
        let lines = ((block.text_len as f32) / chars_per_line).ceil().max(1.0);
        lines * self.line_height_px(block.role) + self.gap_after(block.role)
    }
}

impl Default for OutlineMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementService for OutlineMeasurer {
    fn measure(&self, html: &str, content_width_px: f32) -> Vec<MeasuredBlock> {
        let Ok(outline) = scan_blocks(html, &self.limits) else {
            log::warn!("outline scan failed during measurement; reporting no blocks");
            return Vec::new();
        };
        if outline.is_empty() {
            return Vec::new();
        }

        let mut out = vec![MeasuredBlock::default(); outline.len()];
        let mut cursor = 0.0f32;
        let mut index = 0usize;
        layout_run(
            self,
            &outline,
            &mut out,
            &mut index,
            &mut cursor,
            0,
            content_width_px,
        );
        out
    }
}

/// Lay out consecutive outline entries at `depth`, advancing the flow
/// cursor. Containers recurse over their children and span the result.
fn layout_run(
    measurer: &OutlineMeasurer,
    outline: &[BlockOutline],
    out: &mut [MeasuredBlock],
    index: &mut usize,
    cursor: &mut f32,
    depth: usize,
    content_width_px: f32,
) {
    while *index < outline.len() {
        let block = outline[*index];
        if block.depth < depth {
            return;
        }
        let slot = *index;
        *index += 1;

        let has_children = outline.get(*index).is_some_and(|next| next.depth > block.depth);
        if has_children {
            let top = *cursor;
            layout_run(
                measurer,
                outline,
                out,
                index,
                cursor,
                block.depth + 1,
                content_width_px,
            );
            // A container with measurable text of its own still occupies
            // at least its own leaf height.
            if block.text_len > 0 {
                let own = measurer.leaf_height(&block, content_width_px);
                *cursor = (top + own).max(*cursor);
            }
            out[slot] = MeasuredBlock {
                top_px: top,
                bottom_px: *cursor,
                height_px: *cursor - top,
            };
        } else {
            let height = measurer.leaf_height(&block, content_width_px);
            out[slot] = MeasuredBlock::from_span(*cursor, height);
            *cursor += height;
        }
    }
}

/// Request handed to the host when a measurement pass is due.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureRequest {
    /// Generation this request belongs to. Completions carrying an older
    /// generation are discarded.
    pub generation: u64,
    /// Content to render off-screen, post tag substitution.
    pub html: String,
    /// Exact content-area width to render at.
    pub content_width_px: f32,
}

/// Debounce-and-supersede scheduler for measurement passes.
///
/// Driven by a host-supplied monotonic millisecond clock; holds no timers
/// and spawns nothing. `invalidate` records a change, `poll` reports when
/// the quiet period has elapsed, and `accepts` gates completions so only
/// the measurement taken after the most recent change is ever applied.
#[derive(Clone, Debug)]
pub struct MeasureScheduler {
    generation: u64,
    dirty_since_ms: Option<u64>,
    debounce_ms: u64,
}

impl MeasureScheduler {
    /// Scheduler with the default quiet period.
    pub fn new() -> Self {
        Self::with_debounce(MEASURE_DEBOUNCE_MS)
    }

    /// Scheduler with an explicit quiet period.
    pub fn with_debounce(debounce_ms: u64) -> Self {
        Self {
            generation: 0,
            dirty_since_ms: None,
            debounce_ms,
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a measurement pass is scheduled or overdue.
    pub fn is_pending(&self) -> bool {
        self.dirty_since_ms.is_some()
    }

    /// Record a content/geometry change at `now_ms`.
    ///
    /// Bumps the generation so any in-flight pass becomes stale.
    pub fn invalidate(&mut self, now_ms: u64) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.dirty_since_ms = Some(now_ms);
        self.generation
    }

    /// Report whether the quiet period has elapsed; clears the pending
    /// mark when it fires.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let since = self.dirty_since_ms?;
        if now_ms.saturating_sub(since) < self.debounce_ms {
            return None;
        }
        self.dirty_since_ms = None;
        Some(self.generation)
    }

    /// True when a completed pass for `generation` is still current.
    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.generation && self.dirty_since_ms.is_none()
    }

    /// Drop any scheduled pass without bumping the generation.
    pub fn cancel(&mut self) {
        self.dirty_since_ms = None;
    }
}

impl Default for MeasureScheduler {
    fn default() -> Self {
        Self::new()
    }
}
