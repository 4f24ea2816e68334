//! Structured errors for markup scanning and catalog management.
//!
//! Geometry and pagination never error: invalid values clamp and degenerate
//! layouts fall back to a single page. The types here cover the two places
//! a caller-visible failure is meaningful: markup that exceeds hard parse
//! limits, and catalog operations rejected by policy or persistence.

use core::fmt;

/// Processing phase where a markup error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupPhase {
    /// Block-outline scanning.
    Scan,
    /// Placeholder rewrite.
    Rewrite,
}

impl fmt::Display for MarkupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Rewrite => write!(f, "rewrite"),
        }
    }
}

/// Typed actual-vs-limit context attached to limit violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitContext {
    /// Limit kind identifier.
    pub kind: &'static str,
    /// Observed value.
    pub actual: usize,
    /// Configured bound.
    pub limit: usize,
}

impl LimitContext {
    pub(crate) fn new(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self {
            kind,
            actual,
            limit,
        }
    }
}

/// Structured error for markup scanning and rewriting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupError {
    /// Processing phase where this error originated.
    pub phase: MarkupPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional typed actual-vs-limit context.
    pub limit: Option<LimitContext>,
}

impl MarkupError {
    pub(crate) fn new(phase: MarkupPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            limit: None,
        }
    }

    pub(crate) fn with_limit(mut self, kind: &'static str, actual: usize, limit: usize) -> Self {
        self.limit = Some(LimitContext::new(kind, actual, limit));
        self
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(limit) = &self.limit {
            write!(
                f,
                " [limit_kind={} actual={} limit={}]",
                limit.kind, limit.actual, limit.limit
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for MarkupError {}

/// Errors raised by paper-catalog operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Mutation or deletion attempted on a protected preset.
    ProtectedPreset {
        /// Catalog identifier of the preset.
        id: Box<str>,
    },
    /// Lookup or mutation targeted an identifier the catalog does not hold.
    UnknownPreset {
        /// Catalog identifier that failed to resolve.
        id: Box<str>,
    },
    /// Preset payload exceeded a catalog limit.
    LimitExceeded {
        kind: &'static str,
        actual: usize,
        limit: usize,
    },
    /// Catalog (de)serialization failed.
    Persistence {
        /// Human-readable cause.
        message: Box<str>,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedPreset { id } => {
                write!(f, "preset '{}' is protected and cannot be modified", id)
            }
            Self::UnknownPreset { id } => write!(f, "unknown paper preset '{}'", id),
            Self::LimitExceeded {
                kind,
                actual,
                limit,
            } => write!(
                f,
                "catalog limit exceeded: {} (actual={} limit={})",
                kind, actual, limit
            ),
            Self::Persistence { message } => write!(f, "catalog persistence failed: {}", message),
        }
    }
}

impl std::error::Error for CatalogError {}
