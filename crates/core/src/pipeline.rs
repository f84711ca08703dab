//! Generation pipeline: descriptors in, finished slides out, one at a time.

use crate::bind::SlotBinder;
use crate::config::{GenerationOptions, MissingTemplatePolicy};
use crate::content::{AiSlide, ImagePoolItem};
use crate::error::{Error, Result};
use crate::image_fit::ImagePool;
use crate::markup::{HtmlMarkup, MarkupEditor};
use crate::measure::TextMeasure;
use crate::paginate::paginate;
use crate::random::{choose, slide_id, RandomSource};
use crate::select::{usable_content_templates, usable_reference_templates, usable_templates};
use crate::slot::SlotTag;
use crate::text_fit::TextFitter;
use crate::types::{Element, Slide, SlideType, TemplateDocument};
use std::collections::HashMap;

/// Template slides partitioned by slide type.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    by_type: HashMap<SlideType, Vec<Slide>>,
}

impl TemplateLibrary {
    /// Partition `slides` by type. Slides without a type are not templates
    /// for anything and are dropped.
    pub fn new(slides: Vec<Slide>) -> Self {
        let mut by_type: HashMap<SlideType, Vec<Slide>> = HashMap::new();
        let mut untyped = 0;

        for slide in slides {
            match slide.slide_type {
                Some(slide_type) => by_type.entry(slide_type).or_default().push(slide),
                None => untyped += 1,
            }
        }

        if untyped > 0 {
            log::debug!("Ignoring {} template slides without a type", untyped);
        }
        Self { by_type }
    }

    pub fn from_document(document: TemplateDocument) -> Self {
        Self::new(document.slides)
    }

    /// Templates of one type, in document order.
    pub fn templates(&self, slide_type: SlideType) -> &[Slide] {
        self.by_type.get(&slide_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State carried across the slides of one generation run.
///
/// Holds the image pool, the transition template chosen on first use and the
/// transition counter. Use one session per run, or [`Session::reset`] between
/// runs.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pool: ImagePool,
    transition_template: Option<Slide>,
    transition_index: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session whose pool holds `images`.
    pub fn with_images(images: Vec<ImagePoolItem>) -> Self {
        Self {
            pool: ImagePool::new(images),
            ..Self::default()
        }
    }

    /// Replace the image pool.
    pub fn preset_images(&mut self, images: Vec<ImagePoolItem>) {
        self.pool.replace(images);
    }

    /// Forget the pool, the transition template and the transition count.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pool(&self) -> &ImagePool {
        &self.pool
    }

    pub fn transition_template(&self) -> Option<&Slide> {
        self.transition_template.as_ref()
    }

    /// Number of transition descriptors handled so far.
    pub fn transition_index(&self) -> usize {
        self.transition_index
    }
}

/// Text measurement, markup editing and options shared by every run.
pub struct Engine {
    measure: Box<dyn TextMeasure>,
    markup: Box<dyn MarkupEditor>,
    options: GenerationOptions,
}

impl Engine {
    /// Create an engine measuring text with `measure`, editing markup with
    /// [`HtmlMarkup`] and using default options.
    pub fn new(measure: impl TextMeasure + 'static) -> Self {
        Self {
            measure: Box::new(measure),
            markup: Box::new(HtmlMarkup::new()),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_markup(mut self, markup: impl MarkupEditor + 'static) -> Self {
        self.markup = Box::new(markup);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Lazily generate the slides for `slides`.
    ///
    /// Descriptors are paginated first. When `images` is given it replaces
    /// the session's pool. Slides are produced as the returned iterator is
    /// pulled; images consumed by slides already produced stay consumed if
    /// the caller stops early.
    pub fn generate<'a>(
        &'a self,
        library: &'a TemplateLibrary,
        slides: Vec<AiSlide>,
        images: Option<Vec<ImagePoolItem>>,
        session: &'a mut Session,
        rng: &'a mut dyn RandomSource,
    ) -> Generator<'a> {
        if let Some(images) = images {
            session.preset_images(images);
        }

        let pending = paginate(slides);
        log::debug!("Generating {} slides from {} templates", pending.len(), library.len());

        Generator {
            engine: self,
            library,
            pending: pending.into_iter(),
            session,
            rng,
        }
    }

    /// Generate every slide, stopping at the first error.
    pub fn generate_all(
        &self,
        library: &TemplateLibrary,
        slides: Vec<AiSlide>,
        images: Option<Vec<ImagePoolItem>>,
        session: &mut Session,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<Slide>> {
        self.generate(library, slides, images, session, rng).collect()
    }
}

/// Iterator over the finished slides of one run.
pub struct Generator<'a> {
    engine: &'a Engine,
    library: &'a TemplateLibrary,
    pending: std::vec::IntoIter<AiSlide>,
    session: &'a mut Session,
    rng: &'a mut dyn RandomSource,
}

impl Generator<'_> {
    /// Descriptors not yet turned into slides.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn produce(&mut self, descriptor: &AiSlide) -> Result<Option<Slide>> {
        let engine = self.engine;
        let binder = SlotBinder::new(TextFitter::new(
            engine.measure.as_ref(),
            engine.markup.as_ref(),
            &engine.options.fit,
        ));
        let policy = engine.options.missing_template;
        let slide_type = descriptor.slide_type();
        let templates = self.library.templates(slide_type);
        let session = &mut *self.session;
        let rng: &mut dyn RandomSource = &mut *self.rng;

        let slide = match descriptor {
            AiSlide::Cover { data } | AiSlide::End { data } => {
                let Some(template) = choose(rng, templates) else {
                    return missing_template(policy, slide_type);
                };
                finish(template, binder.bind_titled(template, data, None, &mut session.pool, rng))
            }
            AiSlide::Transition { data } => {
                session.transition_index += 1;
                if session.transition_template.is_none() {
                    session.transition_template = choose(rng, templates).cloned();
                    if let Some(template) = &session.transition_template {
                        log::debug!("Transition template for this run: '{}'", template.id);
                    }
                }
                let Some(template) = session.transition_template.as_ref() else {
                    return missing_template(policy, slide_type);
                };
                let part_number = Some(session.transition_index);
                let elements =
                    binder.bind_titled(template, data, part_number, &mut session.pool, rng);
                finish(template, elements)
            }
            AiSlide::Contents { data, offset } => {
                let candidates = usable_templates(templates, data.items.len(), &SlotTag::Item);
                let Some(template) = choose(rng, &candidates).copied() else {
                    return missing_template(policy, slide_type);
                };
                let offset = offset.unwrap_or(0);
                let elements =
                    binder.bind_contents(template, &data.items, offset, &mut session.pool, rng);
                finish(template, elements)
            }
            AiSlide::Content { data, offset } => {
                let candidates = usable_content_templates(templates, &data.items);
                let Some(template) = choose(rng, &candidates).copied() else {
                    return missing_template(policy, slide_type);
                };
                let offset = offset.unwrap_or(0);
                let elements = binder.bind_content(template, data, offset, &mut session.pool, rng);
                finish(template, elements)
            }
            AiSlide::Reference { data, offset } => {
                let candidates = usable_reference_templates(templates, data.references.len());
                let Some(template) = choose(rng, &candidates).copied() else {
                    return missing_template(policy, slide_type);
                };
                let offset = offset.unwrap_or(0);
                let elements =
                    binder.bind_reference(template, data, offset, &mut session.pool, rng);
                finish(template, elements)
            }
        };

        Ok(Some(slide))
    }
}

impl Iterator for Generator<'_> {
    type Item = Result<Slide>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let descriptor = self.pending.next()?;
            match self.produce(&descriptor) {
                Ok(Some(slide)) => return Some(Ok(slide)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn missing_template(policy: MissingTemplatePolicy, slide_type: SlideType) -> Result<Option<Slide>> {
    match policy {
        MissingTemplatePolicy::Fail => Err(Error::NoTemplate { slide_type }),
        MissingTemplatePolicy::Skip => {
            log::warn!("No '{}' template available, skipping slide", slide_type);
            Ok(None)
        }
    }
}

/// A finished slide: the template's slide-level fields, a fresh id and the
/// bound elements.
fn finish(template: &Slide, elements: Vec<Element>) -> Slide {
    log::debug!("Bound slide on template '{}'", template.id);
    Slide {
        id: slide_id(),
        slide_type: template.slide_type,
        elements,
        extra: template.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{
        ContentData, ContentItem, ContentsData, Reference, ReferenceData, TextItem, TitledData,
    };
    use crate::measure::EmMetrics;
    use crate::random::FirstChoice;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    /// Picks candidates in turn.
    struct Cycle(usize);

    impl RandomSource for Cycle {
        fn below(&mut self, len: usize) -> usize {
            self.0 += 1;
            (self.0 - 1) % len
        }
    }

    fn text(id: &str, tag: &str, top: f64, group: Option<&str>) -> Value {
        json!({
            "type": "text",
            "id": id,
            "left": 0,
            "top": top,
            "width": 600,
            "height": 40,
            "groupId": group,
            "textType": tag,
            "content": "<p style=\"font-size: 24px;\">00</p>"
        })
    }

    fn placeholder(id: &str) -> Value {
        json!({
            "type": "image",
            "id": id,
            "left": 600, "top": 0, "width": 200, "height": 200,
            "src": "placeholder.png",
            "imageType": "pageFigure"
        })
    }

    fn library() -> TemplateLibrary {
        let numbered = |prefix: &str, tags: &[&str], n: usize| -> Vec<Value> {
            (0..n)
                .flat_map(|i| {
                    let group = format!("{prefix}{i}");
                    tags.iter()
                        .enumerate()
                        .map(|(k, tag)| {
                            let top = 100.0 + i as f64 * 100.0 + k as f64 * 10.0;
                            text(&format!("{tag}{i}"), tag, top, Some(group.as_str()))
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        let mut content_elements = vec![text("title", "title", 0.0, None)];
        content_elements.extend(numbered("c", &["itemNumber", "itemTitle", "item"], 4));

        let mut contents_elements = numbered("t", &["itemNumber", "item"], 4);
        contents_elements.push(text("heading", "title", 0.0, None));

        let cover_elements = [
            text("title", "title", 0.0, None),
            text("sub", "content", 100.0, None),
            placeholder("hero"),
        ];
        let transition_elements = [
            text("title", "title", 0.0, None),
            text("part", "partNumber", 100.0, None),
        ];

        let slides = json!([
            { "id": "cover", "type": "cover", "background": { "color": "#fff" },
              "elements": cover_elements },
            { "id": "toc", "type": "contents", "elements": contents_elements },
            { "id": "part-a", "type": "transition", "variant": "a",
              "elements": transition_elements },
            { "id": "part-b", "type": "transition", "variant": "b",
              "elements": transition_elements },
            { "id": "body", "type": "content", "elements": content_elements },
            { "id": "refs", "type": "reference", "elements": [
                text("title", "title", 0.0, None),
                text("r0", "referenceNumber", 100.0, None),
                text("r1", "referenceNumber", 200.0, None),
                text("r2", "referenceNumber", 300.0, None)
            ] },
            { "id": "thanks", "type": "end", "elements": [placeholder("bg")] },
            { "id": "loose", "elements": [] }
        ]);

        TemplateLibrary::new(serde_json::from_value(slides).unwrap())
    }

    fn titled(title: &str) -> TitledData {
        TitledData {
            title: title.to_string(),
            text: String::new(),
        }
    }

    fn deck() -> Vec<AiSlide> {
        vec![
            AiSlide::Cover { data: titled("Annual review") },
            AiSlide::Contents {
                data: ContentsData {
                    items: vec!["Results".to_string(), "Outlook".to_string()],
                },
                offset: None,
            },
            AiSlide::Transition { data: titled("Results") },
            AiSlide::Content {
                data: ContentData {
                    title: "Highlights".to_string(),
                    items: (0..7)
                        .map(|i| {
                            let item = TextItem::new(format!("Point {i}"), format!("Detail {i}"));
                            ContentItem::Text(item)
                        })
                        .collect(),
                },
                offset: None,
            },
            AiSlide::Transition { data: titled("Outlook") },
            AiSlide::Reference {
                data: ReferenceData {
                    title: "Sources".to_string(),
                    references: vec![Reference::default(), Reference::default()],
                },
                offset: None,
            },
            AiSlide::End { data: TitledData::default() },
        ]
    }

    fn slot_text(slide: &Slide, id: &str) -> Option<String> {
        let markup = HtmlMarkup::new();
        slide
            .elements
            .iter()
            .find(|el| el.id == id)
            .and_then(|el| el.text_slot())
            .map(|slot| markup.plain_text(slot.markup()))
    }

    #[test]
    fn test_library_partitions_by_type() {
        let library = library();
        assert_eq!(library.len(), 7);
        assert_eq!(library.templates(SlideType::Transition).len(), 2);
        assert!(TemplateLibrary::default().templates(SlideType::Cover).is_empty());
    }

    #[test]
    fn test_generates_full_deck() {
        let engine = Engine::new(EmMetrics::new());
        let library = library();
        let mut session = Session::new();
        let mut rng = Cycle(0);

        let slides = engine
            .generate_all(&library, deck(), None, &mut session, &mut rng)
            .unwrap();

        let types: Vec<SlideType> = slides.iter().filter_map(|s| s.slide_type).collect();
        assert_eq!(
            types,
            [
                SlideType::Cover,
                SlideType::Contents,
                SlideType::Transition,
                SlideType::Content,
                SlideType::Content,
                SlideType::Transition,
                SlideType::Reference,
                SlideType::End,
            ]
        );

        let ids: HashSet<&str> = slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), slides.len());

        // Slide-level template fields survive.
        assert_eq!(slides[0].extra["background"], json!({ "color": "#fff" }));
        assert_eq!(slot_text(&slides[0], "title").as_deref(), Some("Annual review"));

        // Two of four contents groups are used.
        assert_eq!(slot_text(&slides[1], "item1").as_deref(), Some("Outlook"));
        assert_eq!(slot_text(&slides[1], "itemNumber1").as_deref(), Some("02"));
        assert!(slot_text(&slides[1], "item2").is_none());

        // The transition template is chosen once and numbered per transition.
        assert_eq!(slot_text(&slides[2], "part").as_deref(), Some("01"));
        assert_eq!(slot_text(&slides[5], "part").as_deref(), Some("02"));
        assert_eq!(slot_text(&slides[5], "title").as_deref(), Some("Outlook"));
        assert_eq!(slides[2].extra["variant"], json!("a"));
        assert_eq!(slides[5].extra["variant"], json!("a"));
        assert_eq!(session.transition_template().map(|t| t.id.as_str()), Some("part-a"));
        assert_eq!(session.transition_index(), 2);

        // Seven content items: pages of four and three, numbered on.
        assert_eq!(slot_text(&slides[3], "itemNumber3").as_deref(), Some("04"));
        assert_eq!(slot_text(&slides[4], "itemNumber0").as_deref(), Some("05"));
        assert_eq!(slot_text(&slides[4], "item2").as_deref(), Some("Detail 6"));
        assert!(slot_text(&slides[4], "item3").is_none());

        assert_eq!(slot_text(&slides[6], "r1").as_deref(), Some("[2]"));
        assert!(slot_text(&slides[6], "r2").is_none());
    }

    #[test]
    fn test_missing_template_fails_that_slide_only() {
        let engine = Engine::new(EmMetrics::new());
        let library = library();
        let mut session = Session::new();
        let mut rng = FirstChoice;

        let cover_only = TemplateLibrary::new(library.templates(SlideType::Cover).to_vec());
        let slides = vec![
            AiSlide::Transition { data: titled("Part") },
            AiSlide::Cover { data: titled("Deck") },
        ];

        let results: Vec<Result<Slide>> = engine
            .generate(&cover_only, slides, None, &mut session, &mut rng)
            .collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(Error::NoTemplate {
                slide_type: SlideType::Transition
            })
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_missing_template_skip_policy() {
        let engine = Engine::new(EmMetrics::new())
            .with_options(
                GenerationOptions::new().with_missing_template(MissingTemplatePolicy::Skip),
            );
        let library = TemplateLibrary::new(library().templates(SlideType::End).to_vec());
        let mut session = Session::new();
        let mut rng = FirstChoice;

        let slides = engine
            .generate_all(
                &library,
                vec![
                    AiSlide::Cover {
                        data: titled("Deck"),
                    },
                    AiSlide::End {
                        data: TitledData::default(),
                    },
                ],
                None,
                &mut session,
                &mut rng,
            )
            .unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].slide_type, Some(SlideType::End));
    }

    #[test]
    fn test_early_stop_keeps_consumed_images() {
        let engine = Engine::new(EmMetrics::new());
        let library = library();
        let mut session = Session::new();
        let mut rng = FirstChoice;
        let images: Vec<ImagePoolItem> = (0..3)
            .map(|i| ImagePoolItem {
                id: format!("img{i}"),
                src: format!("img{i}.jpg"),
                width: 400.0,
                height: 400.0,
            })
            .collect();

        let covers = vec![
            AiSlide::Cover { data: titled("One") },
            AiSlide::Cover { data: titled("Two") },
            AiSlide::Cover { data: titled("Three") },
        ];

        let mut generator = engine.generate(&library, covers, Some(images), &mut session, &mut rng);
        let first = generator.next().unwrap().unwrap();
        assert_eq!(generator.remaining(), 2);
        drop(generator);

        let hero = first.elements.iter().find(|el| el.id == "hero").unwrap();
        assert!(matches!(
            &hero.body,
            crate::types::ElementBody::Image(image) if image.src == "img0.jpg"
        ));
        assert_eq!(session.pool().len(), 2);
    }

    #[test]
    fn test_session_reset() {
        let mut session = Session::with_images(vec![ImagePoolItem::default()]);
        let engine = Engine::new(EmMetrics::new());
        let library = library();
        engine
            .generate_all(
                &library,
                vec![AiSlide::Transition { data: titled("Part") }],
                None,
                &mut session,
                &mut FirstChoice,
            )
            .unwrap();
        assert_eq!(session.transition_index(), 1);

        session.reset();
        assert_eq!(session.transition_index(), 0);
        assert!(session.transition_template().is_none());
        assert!(session.pool().is_empty());
    }
}
