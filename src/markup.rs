//! Block-outline scanning for the supported markup subset.
//!
//! Documents arrive as an HTML-like marked-up string using a fixed subset
//! of block tags (`p`, `h1`-`h3`, `ul`/`ol`/`li`, `blockquote`,
//! `table`/`tr`) plus inline spans. The scanner walks the content once and
//! returns every block-level element in document order with its nesting
//! depth and accumulated text length. Unsupported tags degrade to inline
//! flow: their text is credited to the nearest enclosing block and no
//! outline entry is produced.
//!
//! The outline feeds the reference measurer in `folio-render` and is also
//! useful for diagnostics (block counts, structure dumps). It carries no
//! pixel geometry; measurement is a separate concern.

use smallvec::SmallVec;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{MarkupError, MarkupPhase};

/// Role of a block-level element in the supported subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRole {
    Paragraph,
    /// Heading level 1-3.
    Heading(u8),
    List,
    ListItem,
    Table,
    TableRow,
    Quote,
}

impl BlockRole {
    /// Map a lowercase local tag name to a block role.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::Paragraph),
            "h1" => Some(Self::Heading(1)),
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "ul" | "ol" => Some(Self::List),
            "li" => Some(Self::ListItem),
            "table" => Some(Self::Table),
            "tr" => Some(Self::TableRow),
            "blockquote" => Some(Self::Quote),
            _ => None,
        }
    }

    /// True for roles whose vertical extent is the sum of their children.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Table)
    }
}

/// One block-level element found in the content, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockOutline {
    /// Element role.
    pub role: BlockRole,
    /// Nesting depth counted in enclosing block elements.
    pub depth: usize,
    /// Characters of text content attributed to this block.
    ///
    /// Text inside nested blocks is credited to the innermost block only.
    pub text_len: usize,
}

/// Hard bounds for outline scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupLimits {
    /// Maximum content size in bytes.
    pub max_bytes: usize,
    /// Maximum block nesting depth; deeper blocks flatten with a warning.
    pub max_depth: usize,
    /// Maximum number of outline entries.
    pub max_blocks: usize,
}

impl Default for MarkupLimits {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_depth: 32,
            max_blocks: 4096,
        }
    }
}

/// Scan content into a document-order block outline.
pub fn scan_blocks(html: &str, limits: &MarkupLimits) -> Result<Vec<BlockOutline>, MarkupError> {
    if html.len() > limits.max_bytes {
        return Err(MarkupError::new(
            MarkupPhase::Scan,
            "markup_too_large",
            "content exceeds the configured byte limit",
        )
        .with_limit("markup_bytes", html.len(), limits.max_bytes));
    }

    let mut reader = Reader::from_reader(html.as_bytes());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::with_capacity(8);

    let mut out: Vec<BlockOutline> = Vec::with_capacity(16);
    // Every open block element; flattened ones carry no outline index so
    // end tags stay symmetric with starts.
    let mut open: SmallVec<[OpenBlock; 8]> = SmallVec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref())?;
                let Some(role) = BlockRole::from_tag(&tag) else {
                    buf.clear();
                    continue;
                };
                let emitted_depth = open
                    .iter()
                    .filter(|block| block.outline_index.is_some())
                    .count();
                if emitted_depth >= limits.max_depth {
                    log::warn!(
                        "block nesting depth {} exceeds max_depth ({}); treating <{}> as inline",
                        open.len() + 1,
                        limits.max_depth,
                        tag
                    );
                    open.push(OpenBlock {
                        role,
                        outline_index: None,
                    });
                    buf.clear();
                    continue;
                }
                if out.len() >= limits.max_blocks {
                    return Err(MarkupError::new(
                        MarkupPhase::Scan,
                        "too_many_blocks",
                        "content exceeds the configured block limit",
                    )
                    .with_limit("markup_blocks", out.len() + 1, limits.max_blocks));
                }
                out.push(BlockOutline {
                    role,
                    depth: emitted_depth,
                    text_len: 0,
                });
                open.push(OpenBlock {
                    role,
                    outline_index: Some(out.len() - 1),
                });
            }
            Ok(Event::End(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref())?;
                let Some(role) = BlockRole::from_tag(&tag) else {
                    buf.clear();
                    continue;
                };
                if open.last().is_some_and(|block| block.role == role) {
                    open.pop();
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|err| {
                    MarkupError::new(
                        MarkupPhase::Scan,
                        "tokenize_error",
                        format!("text decode error: {:?}", err),
                    )
                })?;
                credit_text(&mut out, &open, text.chars().filter(|c| !c.is_control()).count());
            }
            Ok(Event::GeneralRef(_)) => {
                // One resolved entity counts as one character of flow.
                credit_text(&mut out, &open, 1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(MarkupError::new(
                    MarkupPhase::Scan,
                    "tokenize_error",
                    format!("markup tokenize error: {:?}", err),
                ));
            }
        }
        buf.clear();
    }

    Ok(out)
}

/// One open block element during the scan.
#[derive(Clone, Copy, Debug)]
struct OpenBlock {
    role: BlockRole,
    /// Index into the outline, absent for depth-flattened blocks.
    outline_index: Option<usize>,
}

fn credit_text(out: &mut [BlockOutline], open: &[OpenBlock], chars: usize) {
    if chars == 0 {
        return;
    }
    let innermost = open.iter().rev().find_map(|block| block.outline_index);
    if let Some(index) = innermost {
        out[index].text_len += chars;
    }
}

fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, MarkupError> {
    let decoded = reader.decoder().decode(raw).map_err(|err| {
        MarkupError::new(
            MarkupPhase::Scan,
            "tokenize_error",
            format!("tag name decode error: {:?}", err),
        )
    })?;
    let local_name = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    Ok(local_name.to_ascii_lowercase())
}
