//! AI-produced slide content.
//!
//! Each [`AiSlide`] describes one logical slide of the generated deck. Its
//! payload is bound onto a template of the same [`SlideType`].

use crate::types::SlideType;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One AI slide descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AiSlide {
    Cover {
        data: TitledData,
    },
    Contents {
        data: ContentsData,
        /// Number of items shown on earlier pages of the same list.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<usize>,
    },
    Transition {
        data: TitledData,
    },
    Content {
        data: ContentData,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<usize>,
    },
    Reference {
        data: ReferenceData,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<usize>,
    },
    End {
        #[serde(default)]
        data: TitledData,
    },
}

impl AiSlide {
    pub fn slide_type(&self) -> SlideType {
        match self {
            AiSlide::Cover { .. } => SlideType::Cover,
            AiSlide::Contents { .. } => SlideType::Contents,
            AiSlide::Transition { .. } => SlideType::Transition,
            AiSlide::Content { .. } => SlideType::Content,
            AiSlide::Reference { .. } => SlideType::Reference,
            AiSlide::End { .. } => SlideType::End,
        }
    }

    /// Continuation offset, zero when the descriptor is not a later page.
    pub fn offset(&self) -> usize {
        match self {
            AiSlide::Contents { offset, .. }
            | AiSlide::Content { offset, .. }
            | AiSlide::Reference { offset, .. } => offset.unwrap_or(0),
            _ => 0,
        }
    }
}

/// Title and body text of cover, transition and end slides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitledData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Table of contents entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentsData {
    #[serde(default)]
    pub items: Vec<String>,
}

/// A content slide: page title plus text and chart items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

/// A reference list page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// One unit of content on a content slide.
///
/// On the wire text items carry `"kind": "text"`, chart items `"kind": "chart"`
/// plus `labels` and `series` arrays, and legacy text items have no `kind` at
/// all. Anything else is kept as [`ContentItem::Unrecognized`]: it occupies a
/// position but binds nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(TextItem),
    LegacyText(TextItem),
    Chart(ChartItem),
    Unrecognized(Value),
}

impl ContentItem {
    /// Classify a raw JSON item.
    pub fn from_value(value: Value) -> Self {
        let kind = value.get("kind");
        let is_str = |field: &str| value.get(field).is_some_and(Value::is_string);
        let is_array = |field: &str| value.get(field).is_some_and(Value::is_array);

        match kind {
            Some(Value::String(kind))
                if kind == "chart" && is_array("labels") && is_array("series") =>
            {
                match serde_json::from_value::<ChartItem>(value.clone()) {
                    Ok(chart) => ContentItem::Chart(chart),
                    Err(e) => {
                        log::warn!("Ignoring malformed chart item: {}", e);
                        ContentItem::Unrecognized(value)
                    }
                }
            }
            Some(Value::String(kind)) if kind == "text" && is_str("title") && is_str("text") => {
                ContentItem::Text(TextItem::from_fields(&value))
            }
            None if is_str("title") && is_str("text") => {
                ContentItem::LegacyText(TextItem::from_fields(&value))
            }
            _ => ContentItem::Unrecognized(value),
        }
    }

    /// The text pair of a text or legacy text item.
    pub fn as_text(&self) -> Option<&TextItem> {
        match self {
            ContentItem::Text(item) | ContentItem::LegacyText(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartItem> {
        match self {
            ContentItem::Chart(item) => Some(item),
            _ => None,
        }
    }

    /// The heading shown in an `itemTitle` slot.
    pub fn title(&self) -> Option<&str> {
        match self {
            ContentItem::Text(item) | ContentItem::LegacyText(item) => Some(item.title.as_str()),
            ContentItem::Chart(item) => item.title.as_deref(),
            ContentItem::Unrecognized(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for ContentItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ContentItem::from_value)
    }
}

impl Serialize for ContentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = match self {
            ContentItem::Text(item) => {
                let mut map = Map::new();
                map.insert("kind".to_string(), Value::from("text"));
                map.insert("title".to_string(), Value::from(item.title.as_str()));
                map.insert("text".to_string(), Value::from(item.text.as_str()));
                Value::Object(map)
            }
            ContentItem::LegacyText(item) => serde_json::to_value(item).map_err(S::Error::custom)?,
            ContentItem::Chart(item) => {
                let mut value = serde_json::to_value(item).map_err(S::Error::custom)?;
                if let Value::Object(map) = &mut value {
                    map.insert("kind".to_string(), Value::from("chart"));
                }
                value
            }
            ContentItem::Unrecognized(value) => value.clone(),
        };
        value.serialize(serializer)
    }
}

/// A heading and body text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub title: String,
    pub text: String,
}

impl TextItem {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    fn from_fields(value: &Value) -> Self {
        let field =
            |name: &str| value.get(name).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            title: field("title"),
            text: field("text"),
        }
    }
}

/// A chart to place in a chart slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub chart_type: String,

    /// Category labels; numeric labels are kept as their JSON text.
    #[serde(deserialize_with = "labels_as_strings")]
    pub labels: Vec<String>,

    pub series: Vec<ChartSeries>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// One named data series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub data: Vec<f64>,
}

/// One entry of a reference list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<ReferenceNumber>,

    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,

    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// Explicit numbering of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceNumber {
    /// Numbered within its page; the page offset is added.
    Index(i64),
    /// Printed as given.
    Label(String),
}

impl ReferenceNumber {
    /// The printed number on a page continuing from `offset`.
    pub fn render(&self, offset: usize) -> String {
        match self {
            ReferenceNumber::Index(n) => (n + offset as i64).to_string(),
            ReferenceNumber::Label(label) => label.clone(),
        }
    }
}

/// A candidate image for placeholder binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePoolItem {
    pub id: String,
    pub src: String,
    pub width: f64,
    pub height: f64,
}

fn labels_as_strings<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(D::Error::custom(format!("unsupported chart label: {}", other))),
        })
        .collect()
}

/// Accept identifiers written either as strings or as bare numbers; blank
/// strings count as absent.
fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a string or number, found {}",
                other
            )))
        }
    };
    Ok(text.filter(|s| !s.trim().is_empty()))
}
