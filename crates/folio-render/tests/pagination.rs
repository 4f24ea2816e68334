//! Pagination scenarios against real page geometry.

use folio::geometry::{MarginsMm, PageGeometryConfig, ResolvedPageGeometry};
use folio_render::{compute_page_breaks, MeasuredBlock, MeasurementService, OutlineMeasurer};

/// Letter paper (216 x 279 mm) with uniform 20 mm margins.
fn letter_geometry() -> ResolvedPageGeometry {
    PageGeometryConfig {
        paper_width_mm: 216.0,
        paper_height_mm: 279.0,
        margins: MarginsMm::uniform(20.0),
    }
    .resolve()
}

fn paragraph_flow(count: usize, height: f32) -> Vec<MeasuredBlock> {
    (0..count)
        .map(|i| MeasuredBlock::from_span(i as f32 * height, height))
        .collect()
}

#[test]
fn letter_content_height_is_903px_within_rounding() {
    let geometry = letter_geometry();
    // 239mm of writable height at the fixed 96dpi design resolution.
    assert!((geometry.content_height_px - 903.0).abs() <= 1.0);
    assert_eq!(
        geometry.content_height_px,
        geometry.page_height_px - geometry.padding.top - geometry.padding.bottom
    );
}

#[test]
fn eight_150px_paragraphs_fill_exactly_two_pages() {
    let geometry = letter_geometry();
    let blocks = paragraph_flow(8, 150.0);
    let breaks = compute_page_breaks(&blocks, geometry.content_height_px, 1200.0);

    // Six paragraphs consume 900px; the seventh would straddle the page
    // bottom, so the break lands on its boundary.
    assert_eq!(breaks.page_count(), 2);
    assert_eq!(breaks.offsets(), &[0.0, 900.0]);
}

#[test]
fn oversized_table_is_cut_once_at_the_page_boundary() {
    let geometry = letter_geometry();
    let table = [MeasuredBlock::from_span(0.0, 1200.0)];
    let breaks = compute_page_breaks(&table, geometry.content_height_px, 1200.0);

    assert_eq!(breaks.page_count(), 2);
    let cut = breaks.offsets()[1];
    assert!((cut - 903.0).abs() <= 1.0, "cut at {}", cut);
    // The remainder fits the following page, so there is no second cut.
    assert!(1200.0 - cut <= geometry.content_height_px);
}

#[test]
fn breaks_start_at_zero_and_strictly_increase_for_any_flow() {
    let geometry = letter_geometry();
    for (count, height) in [(1usize, 10.0f32), (13, 247.0), (60, 91.5), (4, 902.0)] {
        let blocks = paragraph_flow(count, height);
        let total = count as f32 * height;
        let breaks = compute_page_breaks(&blocks, geometry.content_height_px, total);
        let offsets = breaks.offsets();
        assert_eq!(offsets[0], 0.0);
        for pair in offsets.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(breaks.page_count(), offsets.len());
    }
}

#[test]
fn measured_markup_paginates_deterministically() {
    let geometry = letter_geometry();
    let mut html = String::from("<h1>Informe periodontal</h1>");
    for _ in 0..30 {
        html.push_str("<p>");
        html.push_str(&"pieza 1.6 con movilidad grado dos. ".repeat(6));
        html.push_str("</p>");
    }

    let measurer = OutlineMeasurer::new();
    let blocks = measurer.measure(&html, geometry.content_width_px);
    assert!(!blocks.is_empty());
    let total = blocks.last().map(|b| b.bottom_px).unwrap_or(0.0);

    let first = compute_page_breaks(&blocks, geometry.content_height_px, total);
    let second = compute_page_breaks(&blocks, geometry.content_height_px, total);
    assert_eq!(first, second);
    assert!(first.page_count() > 1);

    // Block atomicity: no break lands inside a block that fits a page.
    for &brk in &first.offsets()[1..] {
        let interior = blocks.iter().any(|b| {
            b.height_px <= geometry.content_height_px && brk > b.top_px && brk < b.bottom_px
        });
        assert!(!interior, "break {} cuts a fitting block", brk);
    }
}

#[test]
fn short_measured_content_stays_on_one_page() {
    let geometry = letter_geometry();
    let measurer = OutlineMeasurer::new();
    let blocks = measurer.measure("<p>breve</p>", geometry.content_width_px);
    let total = blocks.last().map(|b| b.bottom_px).unwrap_or(0.0);
    assert!(total <= geometry.content_height_px);

    let breaks = compute_page_breaks(&blocks, geometry.content_height_px, total);
    assert_eq!(breaks.offsets(), &[0.0]);
}
