//! WASM-compatible wrapper for slide deck generation.
//!
//! This crate exposes deck generation and AI output parsing to JavaScript
//! for use in browsers and Cloudflare Workers. Hosts with a canvas can pass
//! their own text measuring function for exact font fitting.

use deckbind_core::{
    parse_ai_slides, AiSlide, EmMetrics, Engine, GenerationOptions, ImagePoolItem, RandomSource,
    SeededRandom, Session, Slide, SlideStream, TemplateDocument, TemplateLibrary, TextMeasure,
    ThreadRandom,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of generating a deck.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Finished slides, in deck order.
    pub slides: Vec<Slide>,
    /// One message per descriptor that produced no slide.
    pub errors: Vec<String>,
    /// Images left in the pool after generation.
    pub remaining_images: usize,
}

/// Text measurement backed by a JavaScript `(text, fontSize, fontFamily) => width`
/// function. Falls back to [`EmMetrics`] when the call throws or returns a
/// non-number.
struct JsMeasure {
    function: js_sys::Function,
}

impl TextMeasure for JsMeasure {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64 {
        let width = self.function.call3(
            &JsValue::NULL,
            &JsValue::from_str(text),
            &JsValue::from_f64(font_size),
            &JsValue::from_str(font_family),
        );
        match width.ok().and_then(|value| value.as_f64()) {
            Some(width) => width,
            None => EmMetrics::new().measure(text, font_size, font_family),
        }
    }
}

/// Generate slides from templates and AI output.
///
/// # Arguments
/// * `templates` - Template document JSON (`{ "slides": [...] }` or a bare array)
/// * `slides` - AI output with slide descriptors (array, concatenated objects, or fenced)
/// * `images` - Optional image pool: `[{ id, src, width, height }]`
/// * `options` - Optional generation options (camelCase keys)
/// * `seed` - Optional seed for reproducible template and image choice
/// * `measure` - Optional `(text, fontSize, fontFamily) => width` function
///
/// # Returns
/// A JavaScript object with the generation result, or throws on error.
#[wasm_bindgen]
pub fn generate_deck(
    templates: &str,
    slides: &str,
    images: JsValue,
    options: JsValue,
    seed: Option<u32>,
    measure: Option<js_sys::Function>,
) -> Result<JsValue, JsValue> {
    let images: Option<Vec<ImagePoolItem>> = if images.is_null() || images.is_undefined() {
        None
    } else {
        Some(
            serde_wasm_bindgen::from_value(images)
                .map_err(|e| JsValue::from_str(&format!("Invalid image pool: {}", e)))?,
        )
    };

    let options: GenerationOptions = if options.is_null() || options.is_undefined() {
        GenerationOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
    };

    let seed = seed.map(u64::from);
    let result = match measure {
        Some(function) => {
            generate_deck_impl(templates, slides, images, options, seed, JsMeasure { function })
        }
        None => generate_deck_impl(templates, slides, images, options, seed, EmMetrics::new()),
    }
    .map_err(|e| JsValue::from_str(&e))?;

    to_js(&result)
}

fn generate_deck_impl(
    templates: &str,
    slides: &str,
    images: Option<Vec<ImagePoolItem>>,
    options: GenerationOptions,
    seed: Option<u64>,
    measure: impl TextMeasure + 'static,
) -> Result<GenerationResult, String> {
    let document = TemplateDocument::from_json(templates)
        .map_err(|e| format!("Template parsing error: {}", e))?;
    let library = TemplateLibrary::from_document(document);
    let descriptors = parse_ai_slides(slides).map_err(|e| format!("Slide parsing error: {}", e))?;

    let engine = Engine::new(measure).with_options(options);
    let mut session = Session::new();
    let mut rng: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };

    let mut generated = Vec::new();
    let mut errors = Vec::new();
    for result in engine.generate(&library, descriptors, images, &mut session, rng.as_mut()) {
        match result {
            Ok(slide) => generated.push(slide),
            Err(e) => errors.push(e.to_string()),
        }
    }

    Ok(GenerationResult {
        slides: generated,
        errors,
        remaining_images: session.pool().len(),
    })
}

/// Parse AI output into slide descriptors.
#[wasm_bindgen]
pub fn parse_slides(text: &str) -> Result<JsValue, JsValue> {
    let slides = parse_ai_slides(text)
        .map_err(|e| JsValue::from_str(&format!("Slide parsing error: {}", e)))?;
    to_js(&slides)
}

/// Incremental parser for streamed AI output.
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct SlideStreamParser {
    inner: SlideStream,
}

#[wasm_bindgen]
impl SlideStreamParser {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the descriptors it completes.
    pub fn push(&mut self, chunk: &str) -> Result<JsValue, JsValue> {
        let slides = self.push_impl(chunk).map_err(|e| JsValue::from_str(&e))?;
        to_js(&slides)
    }

    /// Text received but not yet parsed.
    pub fn pending(&self) -> String {
        self.inner.pending().to_string()
    }
}

impl SlideStreamParser {
    fn push_impl(&mut self, chunk: &str) -> Result<Vec<AiSlide>, String> {
        self.inner.push(chunk).map_err(|e| format!("Stream parsing error: {}", e))
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
