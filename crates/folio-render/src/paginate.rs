//! Page-break computation over measured block geometry.
//!
//! Greedy single pass in document order: a block that would straddle the
//! bottom of the current page moves whole to the next page when it fits
//! one page (block atomicity, the way word processors avoid cutting a
//! paragraph or table row mid-line), and is force-split at fixed
//! page-height intervals when it alone exceeds a page. The forced split is
//! a named trade-off for oversized content, not a bug; no attempt is
//! made to find a softer cut inside the block.

use smallvec::SmallVec;

use crate::measure::MeasuredBlock;

/// Ordered page-break offsets, in design pixels from the top of the full
/// unpaginated content flow.
///
/// Always non-empty and strictly increasing; the first entry is `0`. Two
/// adjacent breaks delimit a page's content slice, the last page running
/// to the end of the content.
#[derive(Clone, Debug, PartialEq)]
pub struct PageBreakList {
    breaks: SmallVec<[f32; 8]>,
}

impl PageBreakList {
    /// Single page starting at the top of the content.
    pub fn single_page() -> Self {
        let mut breaks = SmallVec::new();
        breaks.push(0.0);
        Self { breaks }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.breaks.len()
    }

    /// Break offsets, starting with `0.0`.
    pub fn offsets(&self) -> &[f32] {
        &self.breaks
    }

    /// Content slice `[start, end)` for a zero-based page index.
    ///
    /// The last page's end is clamped to `total_height_px`, or to its
    /// start offset when the content ends above it.
    pub fn slice(&self, page_index: usize, total_height_px: f32) -> Option<(f32, f32)> {
        let start = *self.breaks.get(page_index)?;
        let end = self
            .breaks
            .get(page_index + 1)
            .copied()
            .unwrap_or_else(|| total_height_px.max(start));
        Some((start, end))
    }

    /// Zero-based index of the page containing the given content offset.
    ///
    /// Used to track which page is in view from a scroll position.
    pub fn page_at_offset(&self, offset_px: f32) -> usize {
        match self
            .breaks
            .iter()
            .rposition(|&brk| brk <= offset_px.max(0.0))
        {
            Some(idx) => idx,
            None => 0,
        }
    }

    /// Append a break, ignoring offsets at or before the current last.
    fn push_forward(&mut self, offset_px: f32) -> bool {
        let accepted = match self.breaks.last() {
            Some(&last) => offset_px > last,
            None => offset_px == 0.0,
        };
        if accepted {
            self.breaks.push(offset_px);
        }
        accepted
    }
}

impl Default for PageBreakList {
    fn default() -> Self {
        Self::single_page()
    }
}

/// Compute page breaks for measured blocks against a content-area height.
///
/// `total_height_px` is the full scroll height of the content flow; it
/// drives the blockless fallback and final-page clamping. A degenerate
/// content area (`content_height_px <= 0`) short-circuits to a single
/// page rather than looping.
pub fn compute_page_breaks(
    blocks: &[MeasuredBlock],
    content_height_px: f32,
    total_height_px: f32,
) -> PageBreakList {
    if content_height_px <= 0.0 {
        log::warn!("degenerate content area; forcing a single page");
        return PageBreakList::single_page();
    }

    if blocks.is_empty() {
        return slice_evenly(content_height_px, total_height_px);
    }

    let mut breaks = PageBreakList::single_page();
    let mut page_top = 0.0f32;

    for block in blocks {
        if block.bottom_px - page_top <= content_height_px {
            continue;
        }
        if block.height_px <= content_height_px {
            // The block fits a page on its own: break at its top so it
            // moves whole to the next page.
            if breaks.push_forward(block.top_px) {
                page_top = block.top_px;
            }
        } else {
            // Oversized block: force fixed-height cuts until the
            // remainder fits the page budget.
            let mut cut = page_top + content_height_px;
            while block.bottom_px - cut > 0.0 {
                if !breaks.push_forward(cut) {
                    break;
                }
                page_top = cut;
                if block.bottom_px - page_top <= content_height_px {
                    break;
                }
                cut = page_top + content_height_px;
            }
        }
    }

    breaks
}

/// Naive equal-height slicing for content with no block-level elements.
fn slice_evenly(content_height_px: f32, total_height_px: f32) -> PageBreakList {
    let mut breaks = PageBreakList::single_page();
    if total_height_px <= content_height_px {
        return breaks;
    }
    log::debug!(
        "no block elements found; slicing {}px evenly into {}px pages",
        total_height_px,
        content_height_px
    );
    let mut cut = content_height_px;
    while cut < total_height_px {
        if !breaks.push_forward(cut) {
            break;
        }
        cut += content_height_px;
    }
    breaks
}
