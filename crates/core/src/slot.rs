//! Slot tags, the text-slot capability shared by text boxes and shapes, and
//! the canonical reading order used to bind content to slots positionally.

use crate::config::FitOptions;
use crate::markup::MarkupEditor;
use crate::types::{Element, ShapeText, TextBody};
use serde::{Deserialize, Serialize};

/// Groups larger than this try numeric ordering before positional order.
pub const NUMERIC_ORDER_THRESHOLD: usize = 6;

/// Semantic role attached to a text-bearing template element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotTag {
    Title,
    Subtitle,
    Content,
    Item,
    ItemTitle,
    ItemNumber,
    PartNumber,
    ReferenceNumber,
    Pmid,
    Url,
    Doi,
    Notes,
    Header,
    Footer,
    /// A tag this engine does not bind; kept so it round-trips.
    Other(String),
}

impl SlotTag {
    /// The wire name of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            SlotTag::Title => "title",
            SlotTag::Subtitle => "subtitle",
            SlotTag::Content => "content",
            SlotTag::Item => "item",
            SlotTag::ItemTitle => "itemTitle",
            SlotTag::ItemNumber => "itemNumber",
            SlotTag::PartNumber => "partNumber",
            SlotTag::ReferenceNumber => "referenceNumber",
            SlotTag::Pmid => "pmid",
            SlotTag::Url => "url",
            SlotTag::Doi => "doi",
            SlotTag::Notes => "notes",
            SlotTag::Header => "header",
            SlotTag::Footer => "footer",
            SlotTag::Other(name) => name,
        }
    }
}

impl From<String> for SlotTag {
    fn from(name: String) -> Self {
        match name.as_str() {
            "title" => SlotTag::Title,
            "subtitle" => SlotTag::Subtitle,
            "content" => SlotTag::Content,
            "item" => SlotTag::Item,
            "itemTitle" => SlotTag::ItemTitle,
            "itemNumber" => SlotTag::ItemNumber,
            "partNumber" => SlotTag::PartNumber,
            "referenceNumber" => SlotTag::ReferenceNumber,
            "pmid" => SlotTag::Pmid,
            "url" => SlotTag::Url,
            "doi" => SlotTag::Doi,
            "notes" => SlotTag::Notes,
            "header" => SlotTag::Header,
            "footer" => SlotTag::Footer,
            _ => SlotTag::Other(name),
        }
    }
}

impl From<SlotTag> for String {
    fn from(tag: SlotTag) -> Self {
        match tag {
            SlotTag::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// A text-bearing view over an element: text boxes and shapes with a text
/// frame both expose their tag and rich-text markup through this.
pub trait TextSlot {
    fn slot_tag(&self) -> Option<&SlotTag>;

    /// The rich-text HTML fragment.
    fn markup(&self) -> &str;

    fn set_markup(&mut self, markup: String);

    /// Adjust non-markup properties after the text was fitted at `size`.
    fn apply_font_size(&mut self, _size: f64, _options: &FitOptions) {}
}

impl TextSlot for TextBody {
    fn slot_tag(&self) -> Option<&SlotTag> {
        self.text_type.as_ref()
    }

    fn markup(&self) -> &str {
        &self.content
    }

    fn set_markup(&mut self, markup: String) {
        self.content = markup;
    }

    fn apply_font_size(&mut self, size: f64, options: &FitOptions) {
        if size < options.tight_line_height_below {
            self.line_height = Some(options.tight_line_height);
        }
    }
}

impl TextSlot for ShapeText {
    fn slot_tag(&self) -> Option<&SlotTag> {
        self.text_type.as_ref()
    }

    fn markup(&self) -> &str {
        &self.content
    }

    fn set_markup(&mut self, markup: String) {
        self.content = markup;
    }
}

/// Element ids in binding order.
///
/// Binding is positional: the n-th id in the order receives the n-th piece
/// of content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotOrder {
    ids: Vec<String>,
}

impl SlotOrder {
    /// Order the elements matching `predicate` by reading position.
    pub fn positional<F>(elements: &[Element], predicate: F) -> Self
    where
        F: Fn(&Element) -> bool,
    {
        let mut slots: Vec<&Element> = elements.iter().filter(|el| predicate(el)).collect();
        slots.sort_by(|a, b| a.reading_key().total_cmp(&b.reading_key()));
        Self::from_elements(&slots)
    }

    /// Order the slots tagged `tag` by reading position.
    pub fn by_tag(elements: &[Element], tag: &SlotTag) -> Self {
        Self::positional(elements, |el| el.is_slot(tag))
    }

    /// Order the chart slots that take content-item charts: the charts marked
    /// as chart items when the slide has any, otherwise every chart.
    pub fn charts(elements: &[Element]) -> Self {
        if elements.iter().any(Element::is_marked_chart_item) {
            Self::positional(elements, Element::is_marked_chart_item)
        } else {
            Self::positional(elements, Element::is_chart)
        }
    }

    /// Order the slots tagged `tag`, preferring printed numbering for large
    /// groups.
    ///
    /// When more than [`NUMERIC_ORDER_THRESHOLD`] slots carry the tag, each
    /// slot is keyed by the leading integer of its number text: its own text
    /// for `itemNumber` slots, otherwise the text of the `itemNumber` slot in
    /// the same group. If any slot has no such number the whole group falls
    /// back to reading order, so a partially numbered template never mixes the
    /// two orderings.
    pub fn numbered(elements: &[Element], tag: &SlotTag, markup: &dyn MarkupEditor) -> Self {
        let mut slots: Vec<&Element> = elements.iter().filter(|el| el.is_slot(tag)).collect();
        slots.sort_by(|a, b| a.reading_key().total_cmp(&b.reading_key()));

        if slots.len() <= NUMERIC_ORDER_THRESHOLD {
            return Self::from_elements(&slots);
        }

        let keys: Option<Vec<i64>> = slots
            .iter()
            .map(|el| printed_number(el, elements, tag, markup))
            .collect();

        match keys {
            Some(keys) => {
                let mut keyed: Vec<(i64, &Element)> = keys.into_iter().zip(slots).collect();
                // Stable: equal numbers keep reading order.
                keyed.sort_by_key(|(key, _)| *key);
                let ordered: Vec<&Element> = keyed.into_iter().map(|(_, el)| el).collect();
                Self::from_elements(&ordered)
            }
            None => {
                log::debug!(
                    "{} slots tagged '{}' lack numeric labels, using reading order",
                    slots.len(),
                    tag.as_str()
                );
                Self::from_elements(&slots)
            }
        }
    }

    fn from_elements(elements: &[&Element]) -> Self {
        Self {
            ids: elements.iter().map(|el| el.id.clone()).collect(),
        }
    }

    /// Binding index of the element with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|slot| slot == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// The number printed on a slot, or on its `itemNumber` companion.
fn printed_number(
    element: &Element,
    elements: &[Element],
    tag: &SlotTag,
    markup: &dyn MarkupEditor,
) -> Option<i64> {
    let source = if *tag == SlotTag::ItemNumber {
        element
    } else {
        let group = element.group_id.as_deref()?;
        elements
            .iter()
            .find(|el| el.is_slot(&SlotTag::ItemNumber) && el.group_id.as_deref() == Some(group))?
    };

    let text = markup.plain_text(source.text_slot()?.markup());
    parse_leading_int(&text)
}

/// Parse the integer at the start of `text`, ignoring leading whitespace and
/// anything after the digits. `"07."` is 7, `"No. 3"` is `None`.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
