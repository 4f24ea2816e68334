//! Document content model, paper catalog, and page geometry for
//! print-preview pagination.
//!
//! This crate owns the content-facing half of the preview pipeline:
//!
//! - [`markup`]: bounded scanning of the supported markup subset into a
//!   document-order block outline,
//! - [`tags`]: read/rewrite of inline placeholder spans used by templated
//!   documents,
//! - [`paper`]: the paper-size preset catalog with protected entries,
//! - [`geometry`]: millimeter page configuration resolved into immutable
//!   pixel-space snapshots.
//!
//! Pagination, zoom, and page-stack construction live in the companion
//! `folio-render` crate, which consumes the types defined here.

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

pub mod error;
pub mod geometry;
pub mod markup;
pub mod paper;
pub mod tags;

pub use error::{CatalogError, LimitContext, MarkupError, MarkupPhase};
pub use geometry::{
    mm_to_px, MarginsMm, PageGeometryConfig, PageMarginsPx, ResolvedPageGeometry, PX_PER_MM,
};
pub use markup::{scan_blocks, BlockOutline, BlockRole, MarkupLimits};
pub use paper::{CatalogLimits, PaperCatalog, PaperPreset};
pub use tags::{
    establish_value, scan_placeholders, set_removed, TagRewrite, TaggedSpan, TAG_ATTR_CODE,
    TAG_ATTR_LABEL, TAG_ATTR_REMOVED,
};
