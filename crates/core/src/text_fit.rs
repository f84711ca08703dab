//! Text-fit engine: shrink slot text until it fits a line budget, then write
//! the new text and size into the slot's markup.

use crate::config::FitOptions;
use crate::error::Result;
use crate::markup::{fallback_paragraph, MarkupEditor};
use crate::measure::TextMeasure;
use crate::types::Element;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// First `font-size` declaration, for reading the authored size.
static FONT_SIZE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-size:\s*(\d+(?:\.\d+)?)\s*px").unwrap());

/// First `font-family` declaration, surrounding quote optional.
static FONT_FAMILY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)font-family:\s*['"]?([^'";>]+)"#).unwrap());

/// Every `font-size` declaration, for rewriting.
static FONT_SIZE_DECL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-size:(.+?)px").unwrap());

/// Font size and family declared by a slot's markup.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    pub size: f64,
    pub family: String,
}

/// Read the first declared font size and family, substituting the configured
/// defaults for anything missing or unparseable.
pub fn font_info(markup: &str, options: &FitOptions) -> FontInfo {
    let size = FONT_SIZE_REGEX
        .captures(markup)
        .and_then(|caps| caps[1].trim().parse::<f64>().ok())
        .unwrap_or(options.default_font_size);

    let family = FONT_FAMILY_REGEX
        .captures(markup)
        .map(|caps| caps[1].trim().to_string())
        .filter(|family| !family.is_empty())
        .unwrap_or_else(|| options.default_font_family.clone());

    FontInfo { size, family }
}

/// Rewrite every `font-size` declaration in `markup` to `size` pixels.
pub fn rewrite_font_sizes(markup: &str, size: f64) -> String {
    let replacement = format!("font-size: {}px", size);
    FONT_SIZE_DECL_REGEX
        .replace_all(markup, NoExpand(&replacement))
        .into_owned()
}

/// Largest font size, starting at `font_size` and shrinking, at which `text`
/// wraps into at most `max_line` lines of `width` pixels.
///
/// Shrinks by `coarse_step` above `coarse_step_above` and by `fine_step` at
/// or below it. Returns `min_font_size` when nothing down to it fits; this
/// never fails.
pub fn adapted_font_size(
    measure: &dyn TextMeasure,
    text: &str,
    font_size: f64,
    font_family: &str,
    width: f64,
    max_line: usize,
    options: &FitOptions,
) -> f64 {
    let mut size = font_size;

    while size >= options.min_font_size {
        let measured = measure.measure(text, size, font_family);
        let lines = if measured <= 0.0 { 0.0 } else { (measured / width).ceil() };
        if lines <= max_line as f64 {
            return size;
        }

        let step = if size <= options.coarse_step_above {
            options.fine_step
        } else {
            options.coarse_step
        };
        size -= step.max(0.5);
    }

    options.min_font_size
}

/// One text binding: the value to write and how much room it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRequest<'t> {
    pub text: &'t str,
    pub max_line: usize,
    /// Size against this string instead of `text`, so sibling slots match.
    pub longest: Option<&'t str>,
    /// Zero-pad a single digit written over a two-character number.
    pub digit_padding: bool,
}

impl<'t> FitRequest<'t> {
    pub fn new(text: &'t str, max_line: usize) -> Self {
        Self {
            text,
            max_line,
            longest: None,
            digit_padding: false,
        }
    }

    pub fn sized_by(mut self, longest: &'t str) -> Self {
        self.longest = Some(longest);
        self
    }

    pub fn padded(mut self) -> Self {
        self.digit_padding = true;
        self
    }

    fn sizing_text(&self) -> &'t str {
        self.longest.filter(|longest| !longest.is_empty()).unwrap_or(self.text)
    }
}

/// Binds text into text slots, fitting the font size on the way.
#[derive(Clone, Copy)]
pub struct TextFitter<'a> {
    measure: &'a dyn TextMeasure,
    markup: &'a dyn MarkupEditor,
    options: &'a FitOptions,
}

impl<'a> TextFitter<'a> {
    pub fn new(
        measure: &'a dyn TextMeasure,
        markup: &'a dyn MarkupEditor,
        options: &'a FitOptions,
    ) -> Self {
        Self {
            measure,
            markup,
            options,
        }
    }

    pub fn markup(&self) -> &'a dyn MarkupEditor {
        self.markup
    }

    /// Copy of `element` with `request.text` written into its slot at the
    /// fitted size. Elements without a text slot come back unchanged.
    pub fn fit(&self, element: &Element, request: &FitRequest<'_>) -> Element {
        let mut element = element.clone();
        let width = self.options.usable_width(element.width);
        let Some(slot) = element.text_slot_mut() else {
            return element;
        };

        let info = font_info(slot.markup(), self.options);
        let size = adapted_font_size(
            self.measure,
            request.sizing_text(),
            info.size,
            &info.family,
            width,
            request.max_line,
            self.options,
        );

        let markup = match self.rewrite(slot.markup(), request, size) {
            Ok(markup) => markup,
            Err(e) => {
                log::warn!("Replacing unreadable slot markup with a plain paragraph: {}", e);
                fallback_paragraph(request.text, size)
            }
        };

        slot.set_markup(markup);
        slot.apply_font_size(size, self.options);
        element
    }

    fn rewrite(&self, markup: &str, request: &FitRequest<'_>, size: f64) -> Result<String> {
        let replaced = self
            .markup
            .replace_first_run(markup, request.text, request.digit_padding)?;
        let sized = self
            .markup
            .ensure_font_size(&replaced, self.options.default_font_size)?;
        Ok(rewrite_font_sizes(&sized, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::HtmlMarkup;
    use crate::slot::SlotTag;
    use crate::types::{ElementBody, ShapeBody, ShapeText, TextBody};
    use proptest::prelude::*;

    /// Every character is half an em wide.
    fn half_em(text: &str, size: f64, _family: &str) -> f64 {
        text.chars().count() as f64 * size * 0.5
    }

    fn text_element(content: &str, width: f64) -> Element {
        Element::new(
            "t",
            [0.0, 0.0, width, 40.0],
            ElementBody::Text(TextBody {
                content: content.to_string(),
                text_type: Some(SlotTag::Title),
                line_height: Some(1.5),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_font_info_reads_markup() {
        let options = FitOptions::default();
        let info = font_info(
            r#"<p style="font-family: 'Source Han Sans'; font-size: 28.5px;">x</p>"#,
            &options,
        );
        assert_eq!(info.size, 28.5);
        assert_eq!(info.family, "Source Han Sans");
    }

    #[test]
    fn test_font_info_defaults() {
        let options = FitOptions::default();
        let info = font_info("<p>x</p>", &options);
        assert_eq!(info.size, 16.0);
        assert_eq!(info.family, "Microsoft Yahei");
    }

    #[test]
    fn test_rewrite_font_sizes() {
        let out = rewrite_font_sizes(
            r#"<p style="font-size:20px"><span style="font-size: 18.5px">a</span></p>"#,
            14.0,
        );
        assert_eq!(
            out,
            r#"<p style="font-size: 14px"><span style="font-size: 14px">a</span></p>"#
        );
    }

    #[test]
    fn test_fitting_text_keeps_size() {
        let options = FitOptions::default();
        // 10 chars * 12px = 120px on a 200px line.
        let size = adapted_font_size(&half_em, "abcdefghij", 24.0, "x", 200.0, 1, &options);
        assert_eq!(size, 24.0);
    }

    #[test]
    fn test_step_sizes() {
        let options = FitOptions::default();
        // 20 chars need size <= 20 on a 200px line: 28 -> 26 -> 24 -> 22 -> 21 -> 20.
        let size = adapted_font_size(&half_em, &"a".repeat(20), 28.0, "x", 200.0, 1, &options);
        assert_eq!(size, 20.0);

        // Odd start stays on the coarse grid above 22: 27 -> 25 -> 23 -> 21.
        let size = adapted_font_size(&half_em, &"a".repeat(18), 27.0, "x", 200.0, 1, &options);
        assert_eq!(size, 21.0);
    }

    #[test]
    fn test_floor_when_nothing_fits() {
        let options = FitOptions::default();
        let size = adapted_font_size(&half_em, &"a".repeat(500), 30.0, "x", 100.0, 2, &options);
        assert_eq!(size, 10.0);
    }

    #[test]
    fn test_more_lines_allow_larger_text() {
        let options = FitOptions::default();
        let text = "a".repeat(40);
        let one = adapted_font_size(&half_em, &text, 32.0, "x", 300.0, 1, &options);
        let three = adapted_font_size(&half_em, &text, 32.0, "x", 300.0, 3, &options);
        assert!(three > one);
    }

    #[test]
    fn test_fit_rewrites_text_element() {
        let options = FitOptions::default();
        let markup = HtmlMarkup::new();
        let fitter = TextFitter::new(&half_em, &markup, &options);

        // Usable width 178px; 30 chars fit one line at 11px.
        let element = text_element(r#"<p style="font-size: 32px;">Placeholder</p>"#, 200.0);
        let fitted = fitter.fit(&element, &FitRequest::new(&"a".repeat(30), 1));

        let ElementBody::Text(body) = &fitted.body else {
            panic!("expected text body");
        };
        assert_eq!(body.content, format!(r#"<p style="font-size: 11px;">{}</p>"#, "a".repeat(30)));
        assert_eq!(body.line_height, Some(1.2));
    }

    #[test]
    fn test_fit_keeps_line_height_for_large_text() {
        let options = FitOptions::default();
        let markup = HtmlMarkup::new();
        let fitter = TextFitter::new(&half_em, &markup, &options);

        let element = text_element("<p>Old</p>", 400.0);
        let fitted = fitter.fit(&element, &FitRequest::new("New", 1));

        let ElementBody::Text(body) = &fitted.body else {
            panic!("expected text body");
        };
        assert_eq!(body.content, r#"<p style="font-size: 16px;">New</p>"#);
        assert_eq!(body.line_height, Some(1.5));
    }

    #[test]
    fn test_longest_text_drives_size() {
        let options = FitOptions::default();
        let markup = HtmlMarkup::new();
        let fitter = TextFitter::new(&half_em, &markup, &options);

        let element = text_element(r#"<p style="font-size: 24px;">x</p>"#, 200.0);
        let short = fitter.fit(&element, &FitRequest::new("ab", 1));
        let sized = fitter.fit(&element, &FitRequest::new("ab", 1).sized_by(&"a".repeat(30)));

        let (ElementBody::Text(short), ElementBody::Text(sized)) = (&short.body, &sized.body) else {
            panic!("expected text bodies");
        };
        assert!(short.content.contains("font-size: 24px"));
        assert!(sized.content.contains("font-size: 11px"));
        assert!(sized.content.contains(">ab<"));
    }

    #[test]
    fn test_fit_shape_text() {
        let options = FitOptions::default();
        let markup = HtmlMarkup::new();
        let fitter = TextFitter::new(&half_em, &markup, &options);

        let element = Element::new(
            "s",
            [0.0, 0.0, 80.0, 80.0],
            ElementBody::Shape(ShapeBody {
                text: Some(ShapeText {
                    content: r#"<p style="font-size: 20px;">01</p>"#.to_string(),
                    text_type: Some(SlotTag::PartNumber),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        );

        let fitted = fitter.fit(&element, &FitRequest::new("2", 1).padded());
        assert_eq!(
            fitted.text_slot().unwrap().markup(),
            r#"<p style="font-size: 20px;">02</p>"#
        );
    }

    proptest! {
        #[test]
        fn prop_fit_is_bounded_and_fits_unless_floored(
            len in 0usize..400,
            start in 10.0f64..72.0,
            width in 20.0f64..1200.0,
            max_line in 1usize..8,
        ) {
            let options = FitOptions::default();
            let text = "a".repeat(len);
            let size = adapted_font_size(&half_em, &text, start, "x", width, max_line, &options);

            prop_assert!(size <= start);
            prop_assert!(size >= options.min_font_size);

            let lines = (half_em(&text, size, "x") / width).ceil();
            prop_assert!(lines <= max_line as f64 || size == options.min_font_size);
        }
    }
}
