//! Domain types for template slides and their elements.
//!
//! Templates arrive as slide JSON. Only the fields the engine reads or rewrites
//! are modelled; everything else on a document, slide or element is kept in an
//! `extra` map and written back untouched.

use crate::error::{Error, Result};
use crate::slot::{SlotTag, TextSlot};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// The role a slide plays in a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Cover,
    Contents,
    Transition,
    Content,
    Reference,
    End,
}

impl SlideType {
    /// The wire name of this slide type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Cover => "cover",
            SlideType::Contents => "contents",
            SlideType::Transition => "transition",
            SlideType::Content => "content",
            SlideType::Reference => "reference",
            SlideType::End => "end",
        }
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template document: the slide list plus whatever deck-level fields
/// (theme, viewport size, title) the authoring tool stored alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    #[serde(default)]
    pub slides: Vec<Slide>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateDocument {
    /// Parse a template document.
    ///
    /// Accepts either a `{ "slides": [...] }` document or a bare slide array.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Array(_) => Ok(Self {
                slides: serde_json::from_value(value)?,
                extra: Map::new(),
            }),
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(Error::InvalidInput(format!(
                "template document must be an object or an array, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// A slide: either an immutable template or a finished, bound copy of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub slide_type: Option<SlideType>,

    #[serde(default)]
    pub elements: Vec<Element>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slide {
    /// Create an empty slide of the given type.
    pub fn new(id: impl Into<String>, slide_type: SlideType) -> Self {
        Self {
            id: id.into(),
            slide_type: Some(slide_type),
            elements: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add an element, builder style.
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Number of text-bearing elements tagged with `tag`.
    pub fn count_slots(&self, tag: &SlotTag) -> usize {
        self.elements.iter().filter(|el| el.is_slot(tag)).count()
    }
}

/// A positioned element on a slide.
///
/// Geometry, identity and grouping are shared by every element kind; the
/// kind-specific payload lives in [`ElementBody`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Co-visibility group. Elements sharing a group are removed together.
    pub group_id: Option<String>,
    pub body: ElementBody,
}

/// Kind-specific element payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    Text(TextBody),
    Shape(ShapeBody),
    Image(ImageBody),
    Chart(ChartBody),
    /// Any element kind the engine does not bind (lines, tables, video...).
    Other(OtherBody),
}

impl Element {
    /// Create an element at `[left, top, width, height]`.
    pub fn new(id: impl Into<String>, frame: [f64; 4], body: ElementBody) -> Self {
        let [left, top, width, height] = frame;
        Self {
            id: id.into(),
            left,
            top,
            width,
            height,
            group_id: None,
            body,
        }
    }

    /// Put the element in a co-visibility group, builder style.
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// The wire `type` of this element.
    pub fn kind(&self) -> &str {
        match &self.body {
            ElementBody::Text(_) => "text",
            ElementBody::Shape(_) => "shape",
            ElementBody::Image(_) => "image",
            ElementBody::Chart(_) => "chart",
            ElementBody::Other(other) => &other.kind,
        }
    }

    /// The text-slot view of a text element, or of a shape carrying text.
    pub fn text_slot(&self) -> Option<&dyn TextSlot> {
        match &self.body {
            ElementBody::Text(text) => Some(text),
            ElementBody::Shape(shape) => shape.text.as_ref().map(|t| t as &dyn TextSlot),
            _ => None,
        }
    }

    /// Mutable text-slot view, see [`Element::text_slot`].
    pub fn text_slot_mut(&mut self) -> Option<&mut dyn TextSlot> {
        match &mut self.body {
            ElementBody::Text(text) => Some(text),
            ElementBody::Shape(shape) => shape.text.as_mut().map(|t| t as &mut dyn TextSlot),
            _ => None,
        }
    }

    /// The slot tag of a text-bearing element.
    pub fn slot_tag(&self) -> Option<&SlotTag> {
        self.text_slot().and_then(|slot| slot.slot_tag())
    }

    /// Whether this element is a text slot tagged with `tag`.
    pub fn is_slot(&self, tag: &SlotTag) -> bool {
        self.slot_tag() == Some(tag)
    }

    /// Row-major, top-weighted reading position used for positional binding.
    pub fn reading_key(&self) -> f64 {
        self.left + self.top * 2.0
    }

    pub fn is_chart(&self) -> bool {
        matches!(self.body, ElementBody::Chart(_))
    }

    /// Whether this is a chart explicitly marked as a content-item chart slot.
    pub fn is_marked_chart_item(&self) -> bool {
        match &self.body {
            ElementBody::Chart(chart) => chart.chart_mark.as_deref() == Some(CHART_ITEM_MARK),
            _ => false,
        }
    }

    /// Whether this is an image the template author marked as replaceable.
    pub fn is_image_placeholder(&self) -> bool {
        match &self.body {
            ElementBody::Image(image) => image.image_type.as_deref().is_some_and(|t| !t.is_empty()),
            _ => false,
        }
    }
}

/// Marker value on chart elements that take content-item charts.
pub const CHART_ITEM_MARK: &str = "chartItem";

/// A plain text box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    /// Rich-text HTML fragment.
    #[serde(default)]
    pub content: String,

    #[serde(rename = "textType", default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<SlotTag>,

    #[serde(rename = "lineHeight", default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A vector shape, optionally carrying a text frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<ShapeText>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text frame inside a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeText {
    #[serde(default)]
    pub content: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<SlotTag>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Crop rectangle as two percentage-space corners `[[x1, y1], [x2, y2]]`.
pub type ClipRange = [[f64; 2]; 2];

/// Visible region of an image inside its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageClip {
    pub range: ClipRange,

    #[serde(default = "default_clip_shape")]
    pub shape: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Clip shape used when a placeholder has none.
pub const DEFAULT_CLIP_SHAPE: &str = "rect";

fn default_clip_shape() -> String {
    DEFAULT_CLIP_SHAPE.to_string()
}

/// A bitmap image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBody {
    #[serde(default)]
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ImageClip>,

    /// Set by template authors on images that may be swapped for pool images.
    #[serde(rename = "imageType", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chart series data as stored on a chart element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub legends: Vec<String>,

    #[serde(default)]
    pub series: Vec<Vec<f64>>,
}

/// A chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartBody {
    #[serde(rename = "chartType", default)]
    pub chart_type: String,

    #[serde(default)]
    pub data: ChartData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,

    #[serde(rename = "themeColors", default, skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<Vec<String>>,

    #[serde(rename = "textColor", default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,

    #[serde(rename = "chartMark", default, skip_serializing_if = "Option::is_none")]
    pub chart_mark: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An element kind passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OtherBody {
    pub kind: String,
    pub extra: Map<String, Value>,
}

/// Wire shape shared by every element kind.
#[derive(Serialize, Deserialize)]
struct ElementFrame {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    left: f64,
    #[serde(default)]
    top: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let frame = ElementFrame::deserialize(deserializer)?;
        let kind = frame.kind;
        let rest = frame.rest;

        let body = match kind.as_str() {
            "text" => ElementBody::Text(body_from(rest).map_err(D::Error::custom)?),
            "shape" => ElementBody::Shape(body_from(rest).map_err(D::Error::custom)?),
            "image" => ElementBody::Image(body_from(rest).map_err(D::Error::custom)?),
            "chart" => ElementBody::Chart(body_from(rest).map_err(D::Error::custom)?),
            _ => ElementBody::Other(OtherBody {
                kind: kind.clone(),
                extra: rest,
            }),
        };

        Ok(Element {
            id: frame.id,
            left: frame.left,
            top: frame.top,
            width: frame.width,
            height: frame.height,
            group_id: frame.group_id,
            body,
        })
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let rest = match &self.body {
            ElementBody::Text(body) => serde_json::to_value(body),
            ElementBody::Shape(body) => serde_json::to_value(body),
            ElementBody::Image(body) => serde_json::to_value(body),
            ElementBody::Chart(body) => serde_json::to_value(body),
            ElementBody::Other(body) => Ok(Value::Object(body.extra.clone())),
        }
        .map_err(S::Error::custom)?;

        let rest = match rest {
            Value::Object(map) => map,
            other => {
                return Err(S::Error::custom(format!(
                    "element body serialized to {}, expected an object",
                    json_kind(&other)
                )))
            }
        };

        ElementFrame {
            kind: self.kind().to_string(),
            id: self.id.clone(),
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            group_id: self.group_id.clone(),
            rest,
        }
        .serialize(serializer)
    }
}

fn body_from<T: serde::de::DeserializeOwned>(rest: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(rest))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_round_trip_keeps_unknown_fields() {
        let raw = json!({
            "type": "text",
            "id": "t1",
            "left": 10.0,
            "top": 20.0,
            "width": 300.0,
            "height": 40.0,
            "groupId": "g1",
            "content": "<p>Title</p>",
            "textType": "title",
            "rotate": 0,
            "defaultColor": "#333"
        });

        let element: Element = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(element.kind(), "text");
        assert_eq!(element.group_id.as_deref(), Some("g1"));
        assert!(element.is_slot(&SlotTag::Title));

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["rotate"], json!(0));
        assert_eq!(back["defaultColor"], json!("#333"));
        assert_eq!(back["textType"], json!("title"));
        assert_eq!(back["type"], json!("text"));
    }

    #[test]
    fn test_unknown_element_kind_passes_through() {
        let raw = json!({
            "type": "line",
            "id": "l1",
            "left": 0,
            "top": 0,
            "width": 100,
            "height": 0,
            "start": [0, 0],
            "end": [100, 0]
        });

        let element: Element = serde_json::from_value(raw).unwrap();
        assert_eq!(element.kind(), "line");
        assert!(element.text_slot().is_none());

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], json!("line"));
        assert_eq!(back["end"], json!([100, 0]));
    }

    #[test]
    fn test_shape_text_is_a_slot() {
        let raw = json!({
            "type": "shape",
            "id": "s1",
            "left": 0, "top": 0, "width": 50, "height": 50,
            "path": "M 0 0 L 1 1",
            "text": { "content": "<p>01</p>", "type": "itemNumber", "align": "middle" }
        });

        let element: Element = serde_json::from_value(raw).unwrap();
        assert!(element.is_slot(&SlotTag::ItemNumber));
        assert_eq!(element.text_slot().unwrap().markup(), "<p>01</p>");

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["text"]["align"], json!("middle"));
        assert_eq!(back["path"], json!("M 0 0 L 1 1"));
    }

    #[test]
    fn test_template_document_accepts_array_or_object() {
        let doc =
            TemplateDocument::from_json(r#"[{"id":"a","type":"cover","elements":[]}]"#).unwrap();
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.slides[0].slide_type, Some(SlideType::Cover));

        let doc = TemplateDocument::from_json(
            r#"{"title":"Blue","width":1000,"slides":[{"id":"b","type":"end","elements":[]}]}"#,
        )
        .unwrap();
        assert_eq!(doc.slides[0].slide_type, Some(SlideType::End));
        assert_eq!(doc.extra["title"], json!("Blue"));

        assert!(TemplateDocument::from_json("42").is_err());
    }

    #[test]
    fn test_reading_key_weights_top() {
        let a = Element::new("a", [100.0, 0.0, 10.0, 10.0], ElementBody::Text(TextBody::default()));
        let b = Element::new("b", [0.0, 60.0, 10.0, 10.0], ElementBody::Text(TextBody::default()));
        assert!(a.reading_key() < b.reading_key());
    }

    #[test]
    fn test_image_placeholder_requires_marker() {
        let plain =
            Element::new("i", [0.0, 0.0, 10.0, 10.0], ElementBody::Image(ImageBody::default()));
        assert!(!plain.is_image_placeholder());

        let marked = Element::new(
            "i",
            [0.0, 0.0, 10.0, 10.0],
            ElementBody::Image(ImageBody {
                image_type: Some("pageFigure".to_string()),
                ..Default::default()
            }),
        );
        assert!(marked.is_image_placeholder());
    }
}
