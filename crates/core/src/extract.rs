//! Pulling structured content out of model output.
//!
//! Content services answer with fenced blocks (```` ```json ... ``` ````) and
//! stream slide descriptors as back-to-back JSON objects (`{...}{...}`).

use crate::content::AiSlide;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static MARKDOWN_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```markdown([^`]*)```").unwrap());

static JSON_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json([^`]*)```").unwrap());

/// Body of the first ```` ```markdown ```` block, or `content` with the fence
/// markers removed when no complete block exists.
pub fn extract_markdown(content: &str) -> String {
    extract_fenced(content, &MARKDOWN_FENCE_REGEX, "```markdown")
}

/// Body of the first ```` ```json ```` block, or `content` with the fence
/// markers removed when no complete block exists.
pub fn extract_json(content: &str) -> String {
    extract_fenced(content, &JSON_FENCE_REGEX, "```json")
}

fn extract_fenced(content: &str, regex: &Regex, opening: &str) -> String {
    match regex.captures(content) {
        Some(caps) => caps[1].trim().to_string(),
        None => content.replacen(opening, "", 1).replacen("```", "", 1),
    }
}

/// Parse a complete response into slide descriptors.
///
/// Accepts a JSON array or concatenated JSON objects, optionally inside a
/// json fence.
pub fn parse_ai_slides(text: &str) -> Result<Vec<AiSlide>> {
    let body = extract_json(text);
    let body = body.trim();

    if body.starts_with('[') {
        return Ok(serde_json::from_str(body)?);
    }

    serde_json::Deserializer::from_str(body)
        .into_iter::<AiSlide>()
        .collect::<serde_json::Result<Vec<_>>>()
        .map_err(Error::from)
}

/// Incremental parser for a streamed response.
///
/// Feed chunks as they arrive; every descriptor completed by a chunk is
/// returned. Fence markers, array brackets and commas between objects are
/// skipped. An object that is valid JSON but not a slide descriptor is
/// logged and dropped.
#[derive(Debug, Default)]
pub struct SlideStream {
    buffer: String,
}

impl SlideStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the descriptors it completes.
    ///
    /// A JSON syntax error discards the buffered text and is returned.
    pub fn push(&mut self, chunk: &str) -> Result<Vec<AiSlide>> {
        self.buffer.push_str(chunk);

        let mut slides = Vec::new();
        let mut consumed = 0;

        loop {
            let start = consumed + separator_len(&self.buffer[consumed..]);
            if start >= self.buffer.len() {
                consumed = start;
                break;
            }
            // A fence tag split across chunks.
            if "json".starts_with(&self.buffer[start..]) {
                consumed = start;
                break;
            }

            let mut stream =
                serde_json::Deserializer::from_str(&self.buffer[start..]).into_iter::<Value>();
            match stream.next() {
                Some(Ok(value)) => {
                    consumed = start + stream.byte_offset();
                    match serde_json::from_value::<AiSlide>(value) {
                        Ok(slide) => slides.push(slide),
                        Err(e) => log::warn!("Dropping streamed object that is not a slide: {}", e),
                    }
                }
                Some(Err(e)) if e.is_eof() => {
                    consumed = start;
                    break;
                }
                Some(Err(e)) => {
                    self.buffer.clear();
                    return Err(e.into());
                }
                None => {
                    consumed = start;
                    break;
                }
            }
        }

        self.buffer.drain(..consumed);
        Ok(slides)
    }

    /// Text received but not yet parsed.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// End the stream, failing if an object was left incomplete.
    pub fn finish(self) -> Result<()> {
        let rest = &self.buffer[separator_len(&self.buffer)..];
        if rest.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "stream ended inside a slide descriptor: {:.40}",
                rest
            )))
        }
    }
}

/// Length of the leading run of whitespace, commas, brackets, backticks and
/// `json` fence tags.
fn separator_len(text: &str) -> usize {
    let mut rest = text;
    loop {
        let trimmed = rest
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '`'));
        let trimmed = trimmed.strip_prefix("json").unwrap_or(trimmed);
        if trimmed.len() == rest.len() {
            return text.len() - rest.len();
        }
        rest = trimmed;
    }
}
