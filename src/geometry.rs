//! Page geometry: millimeter configuration resolved to pixel snapshots.
//!
//! Conversion uses the fixed design resolution of 96 px/inch
//! (`px = mm / 25.4 * 96`). Resolution happens in whole pixels so every
//! consumer of a [`ResolvedPageGeometry`] sees the same integral frame:
//! the content area is the page minus the four rounded paddings, clamped
//! to zero.
//!
//! Resolution is pure and never fails. Negative dimensions and margins
//! that exceed the paper are clamped silently; margin inputs arrive from
//! live UI sliders and pass through invalid intermediate values routinely.

use serde::{Deserialize, Serialize};

use crate::paper::PaperPreset;

/// Pixels per millimeter at the fixed 96 dpi design resolution.
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// Convert millimeters to whole design pixels.
pub fn mm_to_px(mm: f32) -> f32 {
    (mm * PX_PER_MM).round()
}

/// Four page margins in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarginsMm {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl MarginsMm {
    /// Uniform margins on all four sides.
    pub fn uniform(mm: f32) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }
}

impl Default for MarginsMm {
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

/// Paper size plus margins, all in millimeters.
///
/// The unvalidated input side of geometry. Call [`resolve`](Self::resolve)
/// to obtain the clamped pixel-space snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometryConfig {
    /// Paper width in millimeters.
    pub paper_width_mm: f32,
    /// Paper height in millimeters.
    pub paper_height_mm: f32,
    /// Margins in millimeters.
    pub margins: MarginsMm,
}

impl Default for PageGeometryConfig {
    fn default() -> Self {
        // A4 portrait.
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            margins: MarginsMm::default(),
        }
    }
}

impl PageGeometryConfig {
    /// Build a config from a catalog preset and explicit margins.
    pub fn from_preset(preset: &PaperPreset, margins: MarginsMm) -> Self {
        Self {
            paper_width_mm: preset.width_mm,
            paper_height_mm: preset.height_mm,
            margins,
        }
    }

    /// Copy of this config with every value forced into range.
    ///
    /// Negative dimensions clamp to zero. Opposing margins that together
    /// exceed the paper dimension are reduced trailing-side first, so the
    /// content area never goes negative.
    pub fn clamped(&self) -> Self {
        let paper_width_mm = self.paper_width_mm.max(0.0);
        let paper_height_mm = self.paper_height_mm.max(0.0);

        let top = self.margins.top.clamp(0.0, paper_height_mm);
        let bottom = self.margins.bottom.clamp(0.0, (paper_height_mm - top).max(0.0));
        let left = self.margins.left.clamp(0.0, paper_width_mm);
        let right = self.margins.right.clamp(0.0, (paper_width_mm - left).max(0.0));

        Self {
            paper_width_mm,
            paper_height_mm,
            margins: MarginsMm {
                top,
                right,
                bottom,
                left,
            },
        }
    }

    /// Resolve this config into an immutable pixel-space snapshot.
    pub fn resolve(&self) -> ResolvedPageGeometry {
        let cfg = self.clamped();
        let page_width_px = mm_to_px(cfg.paper_width_mm);
        let page_height_px = mm_to_px(cfg.paper_height_mm);
        let padding = PageMarginsPx {
            top: mm_to_px(cfg.margins.top),
            right: mm_to_px(cfg.margins.right),
            bottom: mm_to_px(cfg.margins.bottom),
            left: mm_to_px(cfg.margins.left),
        };
        ResolvedPageGeometry {
            page_width_px,
            page_height_px,
            content_width_px: (page_width_px - padding.left - padding.right).max(0.0),
            content_height_px: (page_height_px - padding.top - padding.bottom).max(0.0),
            padding,
        }
    }
}

/// Four page paddings in whole design pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMarginsPx {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Pixel-space page frame derived from a [`PageGeometryConfig`].
///
/// Treated as an immutable snapshot: recomputed whole whenever the config
/// changes and passed by value, never mutated in place. A renderer can
/// therefore never observe a half-updated frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPageGeometry {
    /// Full page width in design pixels.
    pub page_width_px: f32,
    /// Full page height in design pixels.
    pub page_height_px: f32,
    /// Content-area width in design pixels (page minus side paddings).
    pub content_width_px: f32,
    /// Content-area height in design pixels (page minus vertical paddings).
    pub content_height_px: f32,
    /// The four paddings in design pixels.
    pub padding: PageMarginsPx,
}

impl ResolvedPageGeometry {
    /// True when the content area cannot hold any content.
    pub fn is_degenerate(&self) -> bool {
        self.content_width_px <= 0.0 || self.content_height_px <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_area_is_page_minus_paddings() {
        let resolved = PageGeometryConfig {
            paper_width_mm: 216.0,
            paper_height_mm: 279.0,
            margins: MarginsMm::uniform(20.0),
        }
        .resolve();

        assert_eq!(
            resolved.content_width_px,
            resolved.page_width_px - resolved.padding.left - resolved.padding.right
        );
        assert_eq!(
            resolved.content_height_px,
            resolved.page_height_px - resolved.padding.top - resolved.padding.bottom
        );
        assert!(resolved.content_width_px >= 0.0);
        assert!(resolved.content_height_px >= 0.0);
        // 239mm of writable height at 96dpi, within one pixel of rounding.
        assert!((resolved.content_height_px - 903.0).abs() <= 1.0);
    }

    #[test]
    fn resolve_is_idempotent() {
        let cfg = PageGeometryConfig::default();
        assert_eq!(cfg.resolve(), cfg.resolve());
    }

    #[test]
    fn negative_dimensions_clamp_to_zero() {
        let resolved = PageGeometryConfig {
            paper_width_mm: -210.0,
            paper_height_mm: 297.0,
            margins: MarginsMm {
                top: -5.0,
                right: 10.0,
                bottom: 10.0,
                left: 10.0,
            },
        }
        .resolve();
        assert_eq!(resolved.page_width_px, 0.0);
        assert_eq!(resolved.padding.top, 0.0);
        assert_eq!(resolved.content_width_px, 0.0);
    }

    #[test]
    fn oversized_margins_never_produce_negative_content() {
        let resolved = PageGeometryConfig {
            paper_width_mm: 100.0,
            paper_height_mm: 100.0,
            margins: MarginsMm::uniform(80.0),
        }
        .resolve();
        assert!(resolved.content_width_px >= 0.0);
        assert!(resolved.content_height_px >= 0.0);
        assert!(resolved.is_degenerate());
    }

    #[test]
    fn preset_feeds_paper_dimensions() {
        let preset = PaperPreset {
            name: "carta".to_string(),
            width_mm: 216.0,
            height_mm: 279.0,
            description: String::new(),
            protected: true,
        };
        let cfg = PageGeometryConfig::from_preset(&preset, MarginsMm::uniform(20.0));
        assert_eq!(cfg.paper_width_mm, 216.0);
        assert_eq!(cfg.paper_height_mm, 279.0);
    }
}
