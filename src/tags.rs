//! Inline placeholder (tagged span) reading and rewriting.
//!
//! Templated documents carry template variables as inline markers:
//!
//! ```text
//! <span data-etiqueta="Nombre del paciente" data-codigo="PAC_NOMBRE">...</span>
//! ```
//!
//! The marker attributes are the data model; there is no separate store.
//! This module only reads and rewrites the content string: scanning
//! returns the markers in document order, and `establish_value` replaces
//! every marker sharing a code with its resolved literal text. The caller
//! decides what the resolved value is; this module performs the
//! find/replace and reports whether anything changed (a change invalidates
//! the current pagination).
//!
//! Rewrites splice byte ranges of the original string, so all content
//! outside the affected markers survives byte-for-byte. Pagination always
//! runs on the post-substitution string.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{MarkupError, MarkupPhase};

/// Marker attribute holding the display label.
pub const TAG_ATTR_LABEL: &str = "data-etiqueta";
/// Marker attribute holding the stable placeholder code.
pub const TAG_ATTR_CODE: &str = "data-codigo";
/// Marker attribute flagging a placeholder removed by the editor.
pub const TAG_ATTR_REMOVED: &str = "data-eliminada";

/// One inline placeholder marker read from the content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedSpan {
    /// Stable identifier shared by all markers of the same variable.
    pub code: String,
    /// Display label, if the marker carries one.
    pub label: Option<String>,
    /// Current literal text between the marker tags.
    pub current_text: String,
    /// True when the editor flagged this placeholder as removed.
    pub removed: bool,
}

/// Result of a content rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRewrite {
    /// Rewritten content.
    pub html: String,
    /// Number of markers affected.
    pub replaced: usize,
}

struct Marker {
    code: String,
    label: Option<String>,
    removed: bool,
    text: String,
    /// Byte range of the whole marker element in the source string.
    span: core::ops::Range<usize>,
    /// Byte range of the start (or empty) tag only.
    start_tag: core::ops::Range<usize>,
    /// True when the marker was a self-closing empty element.
    empty: bool,
}

/// Scan content for placeholder markers, in document order.
pub fn scan_placeholders(html: &str) -> Result<Vec<TaggedSpan>, MarkupError> {
    let markers = collect_markers(html)?;
    Ok(markers
        .into_iter()
        .map(|m| TaggedSpan {
            code: m.code,
            label: m.label,
            current_text: m.text,
            removed: m.removed,
        })
        .collect())
}

/// Replace every marker sharing `code` with the literal `value`.
///
/// The markers disappear from the markup entirely; `value` is escaped and
/// inserted as plain text flow. Content outside the affected markers is
/// preserved byte-for-byte.
pub fn establish_value(html: &str, code: &str, value: &str) -> Result<TagRewrite, MarkupError> {
    let escaped = quick_xml::escape::escape(value);
    splice_markers(html, code, |_marker| escaped.to_string())
}

/// Set or clear the removed flag on every marker sharing `code`.
///
/// Only the matching start tags are rewritten; marker text and all other
/// content are untouched.
pub fn set_removed(html: &str, code: &str, removed: bool) -> Result<TagRewrite, MarkupError> {
    let markers = collect_markers(html)?;
    let mut out = String::with_capacity(html.len() + 32);
    let mut cursor = 0usize;
    let mut replaced = 0usize;

    for marker in &markers {
        if marker.code != code || marker.removed == removed {
            continue;
        }
        out.push_str(&html[cursor..marker.start_tag.start]);
        out.push_str(&rebuild_start_tag(
            &html[marker.start_tag.clone()],
            removed,
            marker.empty,
        )?);
        cursor = marker.start_tag.end;
        replaced += 1;
    }
    out.push_str(&html[cursor..]);
    Ok(TagRewrite { html: out, replaced })
}

fn splice_markers<F>(html: &str, code: &str, mut replacement: F) -> Result<TagRewrite, MarkupError>
where
    F: FnMut(&Marker) -> String,
{
    let markers = collect_markers(html)?;
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0usize;
    let mut replaced = 0usize;

    for marker in &markers {
        if marker.code != code {
            continue;
        }
        out.push_str(&html[cursor..marker.span.start]);
        out.push_str(&replacement(marker));
        cursor = marker.span.end;
        replaced += 1;
    }
    out.push_str(&html[cursor..]);
    Ok(TagRewrite { html: out, replaced })
}

fn collect_markers(html: &str) -> Result<Vec<Marker>, MarkupError> {
    let mut reader = Reader::from_reader(html.as_bytes());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::with_capacity(8);

    let mut out = Vec::new();
    // In-progress marker: (marker, nested span depth).
    let mut pending: Option<(Marker, usize)> = None;
    let mut last_pos = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf);
        let event_end = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        match event {
            Ok(Event::Start(e)) => {
                let is_span = is_span_tag(&reader, &e)?;
                if let Some((_, depth)) = pending.as_mut() {
                    if is_span {
                        *depth += 1;
                    }
                } else if is_span {
                    if let Some(code) = marker_attr(&reader, &e, TAG_ATTR_CODE)? {
                        pending = Some((
                            Marker {
                                code,
                                label: marker_attr(&reader, &e, TAG_ATTR_LABEL)?,
                                removed: marker_attr(&reader, &e, TAG_ATTR_REMOVED)?
                                    .is_some_and(|v| v == "true"),
                                text: String::new(),
                                span: last_pos..last_pos,
                                start_tag: last_pos..event_end,
                                empty: false,
                            },
                            0,
                        ));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if pending.is_none() && is_span_tag(&reader, &e)? {
                    if let Some(code) = marker_attr(&reader, &e, TAG_ATTR_CODE)? {
                        out.push(Marker {
                            code,
                            label: marker_attr(&reader, &e, TAG_ATTR_LABEL)?,
                            removed: marker_attr(&reader, &e, TAG_ATTR_REMOVED)?
                                .is_some_and(|v| v == "true"),
                            text: String::new(),
                            span: last_pos..event_end,
                            start_tag: last_pos..event_end,
                            empty: true,
                        });
                    }
                }
            }
            Ok(Event::End(e)) => {
                let tag = reader
                    .decoder()
                    .decode(e.name().as_ref())
                    .map(|t| t.to_ascii_lowercase())
                    .unwrap_or_default();
                if tag == "span" {
                    if let Some((mut marker, depth)) = pending.take() {
                        if depth == 0 {
                            marker.span = marker.span.start..event_end;
                            out.push(marker);
                        } else {
                            pending = Some((marker, depth - 1));
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some((marker, _)) = pending.as_mut() {
                    let text = e.decode().map_err(|err| {
                        MarkupError::new(
                            MarkupPhase::Rewrite,
                            "tokenize_error",
                            format!("text decode error: {:?}", err),
                        )
                    })?;
                    marker.text.push_str(text.as_ref());
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some((marker, _)) = pending.as_mut() {
                    if let Ok(name) = e.decode() {
                        let entity = format!("&{};", name);
                        match quick_xml::escape::unescape(&entity) {
                            Ok(resolved) => marker.text.push_str(resolved.as_ref()),
                            Err(_) => marker.text.push_str(&entity),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(MarkupError::new(
                    MarkupPhase::Rewrite,
                    "tokenize_error",
                    format!("markup tokenize error: {:?}", err),
                ));
            }
        }
        last_pos = event_end;
        buf.clear();
    }

    Ok(out)
}

fn is_span_tag(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<bool, MarkupError> {
    let name = e.name();
    let decoded = reader.decoder().decode(name.as_ref()).map_err(|err| {
        MarkupError::new(
            MarkupPhase::Rewrite,
            "tokenize_error",
            format!("tag name decode error: {:?}", err),
        )
    })?;
    Ok(decoded.eq_ignore_ascii_case("span"))
}

fn marker_attr(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, MarkupError> {
    for attr in e.attributes().flatten() {
        let key = match reader.decoder().decode(attr.key.as_ref()) {
            Ok(v) => v.to_ascii_lowercase(),
            Err(_) => continue,
        };
        if key != name {
            continue;
        }
        let raw = reader.decoder().decode(&attr.value).map_err(|err| {
            MarkupError::new(
                MarkupPhase::Rewrite,
                "tokenize_error",
                format!("attribute decode error: {:?}", err),
            )
        })?;
        let value = match quick_xml::escape::unescape(raw.as_ref()) {
            Ok(v) => v.to_string(),
            Err(_) => raw.to_string(),
        };
        return Ok(Some(value));
    }
    Ok(None)
}

fn rebuild_start_tag(raw: &str, removed: bool, empty: bool) -> Result<String, MarkupError> {
    let mut reader = Reader::from_reader(raw.as_bytes());
    let mut buf = Vec::with_capacity(8);
    let start = loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => break e.into_owned(),
            Ok(Event::Empty(e)) => break e.into_owned(),
            Ok(Event::Eof) => {
                return Err(MarkupError::new(
                    MarkupPhase::Rewrite,
                    "tokenize_error",
                    "start tag vanished during rewrite",
                ));
            }
            Ok(_) => {}
            Err(err) => {
                return Err(MarkupError::new(
                    MarkupPhase::Rewrite,
                    "tokenize_error",
                    format!("start tag reparse error: {:?}", err),
                ));
            }
        }
        // Keep scanning prolog noise (comments/PIs) preceding the tag.
    };

    let mut tag = String::with_capacity(raw.len() + TAG_ATTR_REMOVED.len() + 8);
    tag.push_str("<span");
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if key.eq_ignore_ascii_case(TAG_ATTR_REMOVED) {
            continue;
        }
        let value = String::from_utf8_lossy(&attr.value).to_string();
        tag.push(' ');
        tag.push_str(&key);
        tag.push_str("=\"");
        tag.push_str(&value);
        tag.push('"');
    }
    if removed {
        tag.push(' ');
        tag.push_str(TAG_ATTR_REMOVED);
        tag.push_str("=\"true\"");
    }
    tag.push_str(if empty { "/>" } else { ">" });
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        "<p>Estimado <span data-etiqueta=\"Nombre\" data-codigo=\"PAC_NOMBRE\">(nombre)</span>,</p>",
        "<p>Su saldo es <span data-etiqueta=\"Saldo\" data-codigo=\"CTA_SALDO\">(saldo)</span> ",
        "al dia <span data-etiqueta=\"Fecha\" data-codigo=\"DOC_FECHA\">(fecha)</span>.</p>",
    );

    #[test]
    fn scan_finds_markers_in_document_order() {
        let spans = scan_placeholders(DOC).expect("scan");
        let codes: Vec<&str> = spans.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["PAC_NOMBRE", "CTA_SALDO", "DOC_FECHA"]);
        assert_eq!(spans[0].current_text, "(nombre)");
        assert_eq!(spans[0].label.as_deref(), Some("Nombre"));
        assert!(!spans[0].removed);
    }

    #[test]
    fn establish_value_replaces_every_marker_with_that_code() {
        let doc = concat!(
            "<p><span data-codigo=\"X\">(x)</span> and ",
            "<span data-codigo=\"X\">(x)</span></p>",
        );
        let rewrite = establish_value(doc, "X", "47").expect("rewrite");
        assert_eq!(rewrite.replaced, 2);
        assert_eq!(rewrite.html, "<p>47 and 47</p>");
    }

    #[test]
    fn establish_value_preserves_unaffected_content_byte_for_byte() {
        let rewrite = establish_value(DOC, "CTA_SALDO", "$ 1.250").expect("rewrite");
        assert_eq!(rewrite.replaced, 1);
        // The other two markers and all surrounding markup are untouched.
        assert!(rewrite
            .html
            .contains("<span data-etiqueta=\"Nombre\" data-codigo=\"PAC_NOMBRE\">(nombre)</span>"));
        assert!(rewrite
            .html
            .contains("<span data-etiqueta=\"Fecha\" data-codigo=\"DOC_FECHA\">(fecha)</span>"));
        assert!(rewrite.html.contains("Su saldo es $ 1.250 al dia"));
    }

    #[test]
    fn establish_value_escapes_the_literal() {
        let doc = "<p><span data-codigo=\"X\">(x)</span></p>";
        let rewrite = establish_value(doc, "X", "a < b & c").expect("rewrite");
        assert!(rewrite.html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn unknown_code_rewrites_nothing() {
        let rewrite = establish_value(DOC, "NO_SUCH", "value").expect("rewrite");
        assert_eq!(rewrite.replaced, 0);
        assert_eq!(rewrite.html, DOC);
    }

    #[test]
    fn set_removed_round_trips() {
        let marked = set_removed(DOC, "DOC_FECHA", true).expect("mark");
        assert_eq!(marked.replaced, 1);
        let spans = scan_placeholders(&marked.html).expect("scan");
        assert!(spans.iter().any(|s| s.code == "DOC_FECHA" && s.removed));

        let restored = set_removed(&marked.html, "DOC_FECHA", false).expect("unmark");
        assert_eq!(restored.replaced, 1);
        assert_eq!(restored.html, DOC);
    }

    #[test]
    fn self_closing_markers_are_supported() {
        let doc = "<p>firma: <span data-codigo=\"DOC_FIRMA\"/></p>";
        let spans = scan_placeholders(doc).expect("scan");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].current_text, "");
        let rewrite = establish_value(doc, "DOC_FIRMA", "Dra. Soto").expect("rewrite");
        assert_eq!(rewrite.html, "<p>firma: Dra. Soto</p>");
    }

    #[test]
    fn nested_inline_spans_inside_a_marker_stay_inside_it() {
        let doc = "<p><span data-codigo=\"X\">a <span style=\"color:red\">b</span> c</span></p>";
        let spans = scan_placeholders(doc).expect("scan");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].current_text, "a b c");
        let rewrite = establish_value(doc, "X", "done").expect("rewrite");
        assert_eq!(rewrite.html, "<p>done</p>");
    }
}
