//! Slot binding: write a descriptor's content into a copy of its template.
//!
//! Slots of one tag are ordered (see [`SlotOrder`]) and the n-th slot takes
//! the n-th piece of content. A slot with nothing at its position is dropped
//! from the finished slide together with every element of its group, so a
//! number and its label vanish as a pair. Image placeholders on the surviving
//! elements are filled from the run's image pool.

use crate::content::{ChartItem, ContentData, ContentItem, Reference, ReferenceData, TitledData};
use crate::image_fit::ImagePool;
use crate::random::RandomSource;
use crate::slot::{SlotOrder, SlotTag};
use crate::text_fit::{FitRequest, TextFitter};
use crate::types::{ChartData, Element, ElementBody, Slide};
use std::collections::HashSet;

/// Line budgets per slot role.
pub mod lines {
    pub const TITLE: usize = 1;
    /// Body text of cover and transition slides.
    pub const BODY: usize = 3;
    /// The lone `content` slot of a single-item content slide.
    pub const SINGLE_ITEM: usize = 6;
    pub const ITEM_TITLE: usize = 1;
    pub const ITEM: usize = 4;
    pub const CONTENTS_ITEM: usize = 1;
    pub const NUMBER: usize = 1;
    pub const URL: usize = 2;
    pub const REFERENCE_TEXT: usize = 2;
}

/// What happens to one template element.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Copied as is (image placeholders may still take a pool image).
    Keep,
    /// Replaced by a bound copy.
    Replace(Element),
    /// Dropped, along with its group.
    Unused,
}

/// Binds descriptor payloads onto templates.
#[derive(Clone, Copy)]
pub struct SlotBinder<'a> {
    fitter: TextFitter<'a>,
}

impl<'a> SlotBinder<'a> {
    pub fn new(fitter: TextFitter<'a>) -> Self {
        Self { fitter }
    }

    /// Cover, transition and end slides: one title, one body text and, on
    /// transitions, the part number.
    pub fn bind_titled(
        &self,
        template: &Slide,
        data: &TitledData,
        part_number: Option<usize>,
        pool: &mut ImagePool,
        rng: &mut dyn RandomSource,
    ) -> Vec<Element> {
        let part_number = part_number.map(|n| n.to_string());

        self.rewrite(template, pool, rng, |el| match el.slot_tag() {
            Some(SlotTag::Title) if !data.title.is_empty() => {
                self.text(el, FitRequest::new(&data.title, lines::TITLE))
            }
            Some(SlotTag::Content) if !data.text.is_empty() => {
                self.text(el, FitRequest::new(&data.text, lines::BODY))
            }
            Some(SlotTag::PartNumber) => match &part_number {
                Some(number) => self.text(el, FitRequest::new(number, lines::NUMBER).padded()),
                None => Binding::Keep,
            },
            _ => Binding::Keep,
        })
    }

    /// Table of contents: entries into `item` slots, all sized like the
    /// longest entry, and running numbers into `itemNumber` slots.
    pub fn bind_contents(
        &self,
        template: &Slide,
        items: &[String],
        offset: usize,
        pool: &mut ImagePool,
        rng: &mut dyn RandomSource,
    ) -> Vec<Element> {
        let markup = self.fitter.markup();
        let item_order = SlotOrder::numbered(&template.elements, &SlotTag::Item, markup);
        let number_order = SlotOrder::numbered(&template.elements, &SlotTag::ItemNumber, markup);
        let longest_item = longest(items.iter().map(String::as_str));

        self.rewrite(template, pool, rng, |el| match el.slot_tag() {
            Some(SlotTag::Item) => {
                let entry = item_order
                    .position(&el.id)
                    .and_then(|i| items.get(i))
                    .filter(|entry| !entry.is_empty());
                match entry {
                    Some(entry) => self.text(
                        el,
                        FitRequest::new(entry, lines::CONTENTS_ITEM).sized_by(longest_item),
                    ),
                    None => Binding::Unused,
                }
            }
            Some(SlotTag::ItemNumber) => self.number(el, &number_order, items.len(), offset),
            _ => Binding::Keep,
        })
    }

    /// Content slides.
    ///
    /// A single text item goes straight into the `content` slot. Otherwise
    /// items bind by position: titles into `itemTitle`, bodies of text items
    /// into `item`, running numbers into `itemNumber`. Chart items fill the
    /// chart slots in order either way. Only slots past the last item are
    /// unused; a slot whose item has no matching field keeps its authored text.
    pub fn bind_content(
        &self,
        template: &Slide,
        data: &ContentData,
        offset: usize,
        pool: &mut ImagePool,
        rng: &mut dyn RandomSource,
    ) -> Vec<Element> {
        let items = &data.items;
        let single = items.len() == 1;
        let markup = self.fitter.markup();

        let chart_order = SlotOrder::charts(&template.elements);
        let title_order = SlotOrder::numbered(&template.elements, &SlotTag::ItemTitle, markup);
        let item_order = SlotOrder::numbered(&template.elements, &SlotTag::Item, markup);
        let number_order = SlotOrder::numbered(&template.elements, &SlotTag::ItemNumber, markup);

        let charts: Vec<&ChartItem> = items.iter().filter_map(ContentItem::as_chart).collect();
        let text_items = || items.iter().filter_map(ContentItem::as_text);
        let longest_title = longest(text_items().map(|t| t.title.as_str()));
        let longest_text = longest(text_items().map(|t| t.text.as_str()));

        self.rewrite(template, pool, rng, |el| {
            if let Some(i) = chart_order.position(&el.id) {
                return match charts.get(i) {
                    Some(chart) => Binding::Replace(bind_chart(el, chart)),
                    None => Binding::Unused,
                };
            }

            match el.slot_tag() {
                Some(SlotTag::Title) if !data.title.is_empty() => {
                    self.text(el, FitRequest::new(&data.title, lines::TITLE))
                }
                Some(SlotTag::Content) if single => {
                    match items.first().and_then(ContentItem::as_text) {
                        Some(item) if !item.text.is_empty() => {
                            self.text(el, FitRequest::new(&item.text, lines::SINGLE_ITEM))
                        }
                        _ => Binding::Keep,
                    }
                }
                _ if single => Binding::Keep,
                Some(SlotTag::ItemTitle) => {
                    let Some(item) = title_order.position(&el.id).and_then(|i| items.get(i)) else {
                        return Binding::Unused;
                    };
                    match item.title().filter(|title| !title.is_empty()) {
                        Some(title) => self.text(
                            el,
                            FitRequest::new(title, lines::ITEM_TITLE).sized_by(longest_title),
                        ),
                        None => Binding::Keep,
                    }
                }
                Some(SlotTag::Item) => {
                    let Some(item) = item_order.position(&el.id).and_then(|i| items.get(i)) else {
                        return Binding::Unused;
                    };
                    match item.as_text().filter(|item| !item.text.is_empty()) {
                        Some(item) => self.text(
                            el,
                            FitRequest::new(&item.text, lines::ITEM).sized_by(longest_text),
                        ),
                        None => Binding::Keep,
                    }
                }
                Some(SlotTag::ItemNumber) => self.number(el, &number_order, items.len(), offset),
                _ => Binding::Keep,
            }
        })
    }

    /// Reference pages. Numbers, PMIDs, URLs, DOIs and citation texts are
    /// ordered separately and each binds to the reference at its position.
    pub fn bind_reference(
        &self,
        template: &Slide,
        data: &ReferenceData,
        offset: usize,
        pool: &mut ImagePool,
        rng: &mut dyn RandomSource,
    ) -> Vec<Element> {
        let markup = self.fitter.markup();
        let refs = &data.references;
        let numbers = SlotOrder::numbered(&template.elements, &SlotTag::ReferenceNumber, markup);
        let pmids = SlotOrder::by_tag(&template.elements, &SlotTag::Pmid);
        let urls = SlotOrder::by_tag(&template.elements, &SlotTag::Url);
        let dois = SlotOrder::by_tag(&template.elements, &SlotTag::Doi);
        let texts = SlotOrder::numbered(&template.elements, &SlotTag::Item, markup);

        self.rewrite(template, pool, rng, |el| {
            let Some(tag) = el.slot_tag() else {
                return Binding::Keep;
            };

            let bound = match tag {
                SlotTag::Title if !data.title.is_empty() => {
                    return self.text(el, FitRequest::new(&data.title, lines::TITLE));
                }
                SlotTag::ReferenceNumber => nth(&numbers, el, refs).map(|(i, reference)| {
                    let number = match &reference.number {
                        Some(number) => number.render(offset),
                        None => (i + offset + 1).to_string(),
                    };
                    (format!("[{}]", number), lines::NUMBER)
                }),
                SlotTag::Pmid => nth(&pmids, el, refs)
                    .and_then(|(_, r)| r.pmid.as_deref())
                    .map(|pmid| (format!("PMID: {}", pmid), lines::NUMBER)),
                SlotTag::Url => nth(&urls, el, refs)
                    .and_then(|(_, r)| r.url.clone())
                    .map(|url| (url, lines::URL)),
                SlotTag::Doi => nth(&dois, el, refs)
                    .and_then(|(_, r)| r.doi.as_deref())
                    .map(|doi| (format!("DOI: {}", doi), lines::NUMBER)),
                SlotTag::Item => nth(&texts, el, refs)
                    .map(|(_, r)| r.text.clone())
                    .filter(|text| !text.is_empty())
                    .map(|text| (text, lines::REFERENCE_TEXT)),
                _ => return Binding::Keep,
            };

            match bound {
                Some((text, max_line)) => self.text(el, FitRequest::new(&text, max_line)),
                None => Binding::Unused,
            }
        })
    }

    fn text(&self, element: &Element, request: FitRequest<'_>) -> Binding {
        Binding::Replace(self.fitter.fit(element, &request))
    }

    /// `index + offset + 1` for the first `count` number slots.
    fn number(&self, element: &Element, order: &SlotOrder, count: usize, offset: usize) -> Binding {
        match order.position(&element.id).filter(|&i| i < count) {
            Some(i) => {
                let number = (i + offset + 1).to_string();
                self.text(element, FitRequest::new(&number, lines::NUMBER).padded())
            }
            None => Binding::Unused,
        }
    }

    /// Apply `bind` to every template element, drop unused slots and their
    /// groups, then fill image placeholders on what is left.
    fn rewrite<F>(
        &self,
        template: &Slide,
        pool: &mut ImagePool,
        rng: &mut dyn RandomSource,
        mut bind: F,
    ) -> Vec<Element>
    where
        F: FnMut(&Element) -> Binding,
    {
        let bindings: Vec<Binding> = template.elements.iter().map(&mut bind).collect();

        let mut unused_ids = HashSet::new();
        let mut unused_groups = HashSet::new();
        for (el, binding) in template.elements.iter().zip(&bindings) {
            if *binding == Binding::Unused {
                unused_ids.insert(el.id.as_str());
                if let Some(group) = el.group_id.as_deref() {
                    unused_groups.insert(group);
                }
            }
        }
        if !unused_ids.is_empty() {
            log::debug!(
                "Template '{}': dropping {} unused slots, {} groups",
                template.id,
                unused_ids.len(),
                unused_groups.len()
            );
        }

        template
            .elements
            .iter()
            .zip(bindings)
            .filter(|(el, _)| {
                !unused_ids.contains(el.id.as_str())
                    && !el.group_id.as_deref().is_some_and(|group| unused_groups.contains(group))
            })
            .map(|(el, binding)| match binding {
                Binding::Replace(bound) => bound,
                _ if el.is_image_placeholder() && !pool.is_empty() => pool.fill(el, &mut *rng),
                _ => el.clone(),
            })
            .collect()
    }
}

/// Copy of a chart element showing `item`.
///
/// The item's options are merged over the element's; theme colors and text
/// color are replaced only when the item supplies them.
pub fn bind_chart(element: &Element, item: &ChartItem) -> Element {
    let mut element = element.clone();

    if let ElementBody::Chart(chart) = &mut element.body {
        if !item.chart_type.is_empty() {
            chart.chart_type = item.chart_type.clone();
        }
        chart.data = ChartData {
            labels: item.labels.clone(),
            legends: item
                .series
                .iter()
                .map(|series| series.name.clone().unwrap_or_default())
                .collect(),
            series: item.series.iter().map(|series| series.data.clone()).collect(),
        };

        if let Some(overrides) = &item.options {
            let options = chart.options.get_or_insert_with(Default::default);
            for (key, value) in overrides {
                options.insert(key.clone(), value.clone());
            }
        }
        if let Some(colors) = &item.theme_colors {
            chart.theme_colors = Some(colors.clone());
        }
        if let Some(color) = item.text_color.as_ref().filter(|color| !color.is_empty()) {
            chart.text_color = Some(color.clone());
        }
    }

    element
}

/// The reference bound to `element`'s position in `order`.
fn nth<'r>(
    order: &SlotOrder,
    element: &Element,
    refs: &'r [Reference],
) -> Option<(usize, &'r Reference)> {
    let i = order.position(&element.id)?;
    refs.get(i).map(|reference| (i, reference))
}

/// Longest string by character count; the first one wins ties.
fn longest<'s>(texts: impl IntoIterator<Item = &'s str>) -> &'s str {
    texts.into_iter().fold("", |longest, text| {
        if text.chars().count() > longest.chars().count() {
            text
        } else {
            longest
        }
    })
}
