//! Deterministic layout engine that binds AI-generated slide content onto
//! pre-authored slide templates: pagination, template selection, slot
//! binding, text fitting and image cropping.

pub mod bind;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod image_fit;
pub mod markup;
pub mod measure;
pub mod paginate;
pub mod pipeline;
pub mod random;
pub mod select;
pub mod slot;
pub mod store;
pub mod text_fit;
pub mod types;

pub use config::{FitOptions, GenerationOptions, MissingTemplatePolicy};
pub use content::{AiSlide, ContentItem, ImagePoolItem};
pub use error::{Error, Result};
pub use extract::{extract_json, extract_markdown, parse_ai_slides, SlideStream};
pub use markup::{HtmlMarkup, MarkupEditor};
pub use measure::{EmMetrics, TextMeasure};
pub use pipeline::{Engine, Generator, Session, TemplateLibrary};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use store::{insert_slides, PresentationStore};
pub use types::{Element, Slide, SlideType, TemplateDocument};
