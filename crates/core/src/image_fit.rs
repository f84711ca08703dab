//! Image crop-fit: swap template image placeholders for pooled images,
//! cropped to the placeholder's aspect ratio.

use crate::content::ImagePoolItem;
use crate::random::{choose, RandomSource};
use crate::types::{ClipRange, Element, ElementBody, ImageClip, DEFAULT_CLIP_SHAPE};
use serde_json::Map;

/// Crop showing the whole image.
pub const FULL_RANGE: ClipRange = [[0.0, 0.0], [100.0, 100.0]];

/// Images available to one generation run. Every image is used at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePool {
    items: Vec<ImagePoolItem>,
}

impl ImagePool {
    pub fn new(items: Vec<ImagePoolItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Images not yet used.
    pub fn items(&self) -> &[ImagePoolItem] {
        &self.items
    }

    /// Replace the whole pool.
    pub fn replace(&mut self, items: Vec<ImagePoolItem>) {
        self.items = items;
    }

    /// Remove and return an image for a `width` x `height` placeholder.
    ///
    /// Images of the same orientation (square, landscape, otherwise portrait)
    /// are preferred; any image is taken when none match. Every pool entry
    /// sharing the chosen id is removed.
    pub fn take_for(
        &mut self,
        width: f64,
        height: f64,
        rng: &mut dyn RandomSource,
    ) -> Option<ImagePoolItem> {
        let same_shape: Vec<&ImagePoolItem> = self
            .items
            .iter()
            .filter(|img| {
                if width == height {
                    img.width == img.height
                } else if width > height {
                    img.width > img.height
                } else {
                    img.width <= img.height
                }
            })
            .collect();

        let picked = if same_shape.is_empty() {
            choose(rng, &self.items).cloned()
        } else {
            choose(rng, &same_shape).map(|img| (*img).clone())
        }?;

        self.items.retain(|img| img.id != picked.id);
        log::debug!("Took image '{}' from pool, {} left", picked.id, self.items.len());
        Some(picked)
    }

    /// Bind a pooled image into an image element.
    ///
    /// Non-image elements, and any element once the pool is exhausted, come
    /// back unchanged.
    pub fn fill(&mut self, element: &Element, rng: &mut dyn RandomSource) -> Element {
        if !matches!(element.body, ElementBody::Image(_)) {
            return element.clone();
        }
        match self.take_for(element.width, element.height, rng) {
            Some(image) => fit_image(element, &image),
            None => element.clone(),
        }
    }
}

/// Percentage-space crop that fills a `frame_w` x `frame_h` frame with an
/// `image_w` x `image_h` image, trimming the overflow symmetrically.
pub fn crop_range(image_w: f64, image_h: f64, frame_w: f64, frame_h: f64) -> ClipRange {
    if image_w <= 0.0 || image_h <= 0.0 || frame_w <= 0.0 || frame_h <= 0.0 {
        return FULL_RANGE;
    }

    let frame_ratio = frame_w / frame_h;
    if image_w / image_h >= frame_ratio {
        // Wider: scale to the frame height, trim left and right.
        let scaled_w = image_w / (image_h / frame_h);
        let diff = (scaled_w - frame_w) / 2.0 / scaled_w * 100.0;
        [[diff, 0.0], [100.0 - diff, 100.0]]
    } else {
        // Taller: scale to the frame width, trim top and bottom.
        let scaled_h = image_h / (image_w / frame_w);
        let diff = (scaled_h - frame_h) / 2.0 / scaled_h * 100.0;
        [[0.0, diff], [100.0, 100.0 - diff]]
    }
}

/// Copy of an image element showing `image`, cropped to the element's frame.
/// The element's clip shape is kept when it has one.
pub fn fit_image(element: &Element, image: &ImagePoolItem) -> Element {
    let mut element = element.clone();
    let range = crop_range(image.width, image.height, element.width, element.height);

    if let ElementBody::Image(body) = &mut element.body {
        body.src = image.src.clone();
        body.clip = Some(match body.clip.take() {
            Some(mut clip) => {
                clip.range = range;
                if clip.shape.is_empty() {
                    clip.shape = DEFAULT_CLIP_SHAPE.to_string();
                }
                clip
            }
            None => ImageClip {
                range,
                shape: DEFAULT_CLIP_SHAPE.to_string(),
                extra: Map::new(),
            },
        });
    }

    element
}
