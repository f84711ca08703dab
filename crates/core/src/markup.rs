//! Rich-text markup editing.
//!
//! Slot text is stored as small HTML fragments (`<p style="..."><span>..</span></p>`).
//! Binding only ever needs three operations on them, captured by
//! [`MarkupEditor`]. [`HtmlMarkup`] implements them with a streaming
//! quick-xml pass that writes every untouched event back verbatim.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Parser/serializer capability used by the text-fit engine.
pub trait MarkupEditor {
    /// Replace the first non-blank text run with `text`.
    ///
    /// With `digit_padding`, a one-character `text` replacing a
    /// two-character run is zero-padded (`"3"` over `"01"` gives `"03"`).
    fn replace_first_run(&self, markup: &str, text: &str, digit_padding: bool) -> Result<String>;

    /// Add a `font-size` declaration to the first paragraph when the fragment
    /// has none anywhere.
    fn ensure_font_size(&self, markup: &str, size: f64) -> Result<String>;

    /// Concatenated text content, tags removed and entities decoded.
    fn plain_text(&self, markup: &str) -> String;
}

/// quick-xml based editor for HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMarkup;

impl HtmlMarkup {
    pub fn new() -> Self {
        Self
    }
}

impl MarkupEditor for HtmlMarkup {
    fn replace_first_run(&self, markup: &str, text: &str, digit_padding: bool) -> Result<String> {
        let mut reader = html_reader(markup);
        let mut writer = Writer::new(Vec::with_capacity(markup.len() + text.len()));
        let mut replaced = false;
        let mut last_was_start = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::MarkupError(format!(
                    "Error parsing markup at {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Eof => break,
                Event::Text(ref run) if !replaced => {
                    let value = padded(&decode_text(run), text, digit_padding);
                    write(&mut writer, Event::Text(BytesText::new(&value)))?;
                    replaced = true;
                    last_was_start = false;
                }
                Event::End(end) => {
                    // Empty innermost element, e.g. `<p><span></span></p>`.
                    if !replaced && last_was_start {
                        write(&mut writer, Event::Text(BytesText::new(text)))?;
                        replaced = true;
                    }
                    write(&mut writer, Event::End(end))?;
                    last_was_start = false;
                }
                Event::Start(start) => {
                    write(&mut writer, Event::Start(start))?;
                    last_was_start = true;
                }
                other => {
                    write(&mut writer, other)?;
                    last_was_start = false;
                }
            }
        }

        let mut out = into_string(writer)?;
        if !replaced {
            out.push_str(&format!("<p>{}</p>", escape(text)));
        }
        Ok(out)
    }

    fn ensure_font_size(&self, markup: &str, size: f64) -> Result<String> {
        if markup.contains("font-size") {
            return Ok(markup.to_string());
        }

        let mut reader = html_reader(markup);
        let mut writer = Writer::new(Vec::with_capacity(markup.len() + 32));
        let mut done = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::MarkupError(format!("Error parsing markup: {}", e)))?;

            match event {
                Event::Eof => break,
                Event::Start(ref start) if !done && is_paragraph(start) => {
                    write(&mut writer, Event::Start(with_font_size(start, size)?))?;
                    done = true;
                }
                Event::Empty(ref start) if !done && is_paragraph(start) => {
                    write(&mut writer, Event::Empty(with_font_size(start, size)?))?;
                    done = true;
                }
                other => write(&mut writer, other)?,
            }
        }

        into_string(writer)
    }

    fn plain_text(&self, markup: &str) -> String {
        let mut reader = html_reader(markup);
        let mut text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Text(run)) => text.push_str(&decode_text(&run)),
                Ok(Event::CData(data)) => text.push_str(&String::from_utf8_lossy(&data)),
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("Markup parsing error (keeping text read so far): {}", e);
                    break;
                }
                _ => {}
            }
        }

        text
    }
}

/// A standalone paragraph holding `text` at `size`, used when a slot's own
/// markup cannot be edited.
pub fn fallback_paragraph(text: &str, size: f64) -> String {
    format!("<p style=\"font-size: {}px;\">{}</p>", size, escape(text))
}

fn html_reader(markup: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(false);
    // HTML void elements (`<br>`) never close.
    reader.check_end_names(false);
    reader
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::MarkupError(format!("Error writing markup: {}", e)))
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::MarkupError(format!("Markup is not valid UTF-8: {}", e)))
}

fn decode_text(run: &BytesText<'_>) -> String {
    match run.unescape() {
        Ok(text) => text.into_owned(),
        // HTML entities such as `&nbsp;` are unknown to XML.
        Err(_) => String::from_utf8_lossy(run).into_owned(),
    }
}

fn padded(current: &str, text: &str, digit_padding: bool) -> String {
    if digit_padding && current.chars().count() == 2 && text.chars().count() == 1 {
        format!("0{}", text)
    } else {
        text.to_string()
    }
}

fn is_paragraph(start: &BytesStart<'_>) -> bool {
    local_name(start.name().as_ref()).eq_ignore_ascii_case(b"p")
}

/// Copy of `start` with `font-size: {size}px` appended to its style.
fn with_font_size(start: &BytesStart<'_>, size: f64) -> Result<BytesStart<'static>> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    let mut style = String::new();

    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::MarkupError(format!("Bad attribute: {}", e)))?;
        if attr.key.as_ref() == b"style" {
            style = attr
                .unescape_value()
                .map_err(|e| Error::MarkupError(format!("Bad style attribute: {}", e)))?
                .into_owned();
        } else {
            rebuilt.push_attribute(attr);
        }
    }

    let style = style.trim().trim_end_matches(';').trim();
    let style = if style.is_empty() {
        format!("font-size: {}px;", size)
    } else {
        format!("{}; font-size: {}px;", style, size)
    };
    rebuilt.push_attribute(("style", style.as_str()));

    Ok(rebuilt)
}

/// Extract the local name from a potentially namespaced element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
