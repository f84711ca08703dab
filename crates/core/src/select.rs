//! Template selection.
//!
//! Every strategy returns a tie set: all templates that match the content
//! equally well, in library order. The pipeline draws one at random.

use crate::content::ContentItem;
use crate::slot::{SlotOrder, SlotTag};
use crate::types::Slide;

/// Most reference slots a reference page is laid out for.
pub const MAX_REFERENCE_SLOTS: usize = 10;

/// Templates best suited to `n` items bound to `tag` slots.
///
/// For a single item, layouts with exactly one `title`, one `content` and no
/// `tag` slot win outright. Otherwise the smallest slot count that still
/// holds `n` items wins; when no template holds `n`, the largest count does.
pub fn usable_templates<'t>(templates: &'t [Slide], n: usize, tag: &SlotTag) -> Vec<&'t Slide> {
    if n == 1 {
        let single: Vec<&Slide> = templates
            .iter()
            .filter(|slide| {
                slide.count_slots(tag) == 0
                    && slide.count_slots(&SlotTag::Title) == 1
                    && slide.count_slots(&SlotTag::Content) == 1
            })
            .collect();
        if !single.is_empty() {
            return single;
        }
    }

    let counts: Vec<usize> = templates.iter().map(|slide| slide.count_slots(tag)).collect();
    let target = counts
        .iter()
        .copied()
        .filter(|&count| count >= n)
        .min()
        .or_else(|| counts.iter().copied().max());

    let Some(target) = target else {
        return Vec::new();
    };

    log::debug!("Selecting templates with {} '{}' slots for {} items", target, tag.as_str(), n);
    templates
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count == target)
        .map(|(slide, _)| slide)
        .collect()
}

/// Number of chart slots on a template, see [`SlotOrder::charts`].
pub fn chart_slot_count(slide: &Slide) -> usize {
    SlotOrder::charts(&slide.elements).len()
}

/// Number of `item` text slots on a template.
pub fn text_item_slot_count(slide: &Slide) -> usize {
    slide.count_slots(&SlotTag::Item)
}

/// Templates best suited to a content slide's mix of text and chart items.
///
/// Templates with enough chart and text slots are preferred. Failing that,
/// when charts are needed, any template with a chart slot is considered;
/// when they are not, selection falls back to [`usable_templates`] on `item`
/// slots. Candidates are then scored by `100 * spare chart slots + spare text
/// slots` and the lowest score wins.
pub fn usable_content_templates<'t>(
    templates: &'t [Slide],
    items: &[ContentItem],
) -> Vec<&'t Slide> {
    let need_chart = items.iter().filter(|item| item.as_chart().is_some()).count();
    let need_text = items.iter().filter(|item| item.as_text().is_some()).count();

    let mut candidates: Vec<&Slide> = templates
        .iter()
        .filter(|slide| {
            chart_slot_count(slide) >= need_chart && text_item_slot_count(slide) >= need_text
        })
        .collect();

    if candidates.is_empty() {
        if need_chart == 0 {
            return usable_templates(templates, need_text, &SlotTag::Item);
        }

        candidates = templates.iter().filter(|slide| chart_slot_count(slide) > 0).collect();
        candidates.sort_by(|a, b| {
            chart_slot_count(b)
                .cmp(&chart_slot_count(a))
                .then_with(|| text_item_slot_count(b).cmp(&text_item_slot_count(a)))
        });

        if candidates.is_empty() {
            log::warn!(
                "No content template has a chart slot for {} chart items, selecting on text slots",
                need_chart
            );
            return usable_templates(templates, need_text, &SlotTag::Item);
        }
    }

    let score = |slide: &Slide| {
        chart_slot_count(slide).saturating_sub(need_chart) * 100
            + text_item_slot_count(slide).saturating_sub(need_text)
    };
    let best = candidates.iter().map(|slide| score(slide)).min().unwrap_or(0);

    log::debug!(
        "Content template score {} for {} chart and {} text items",
        best,
        need_chart,
        need_text
    );
    candidates.into_iter().filter(|slide| score(slide) == best).collect()
}

/// Templates for a reference page of `n` entries.
///
/// Layouts with between `n` and [`MAX_REFERENCE_SLOTS`] reference-number
/// slots are all acceptable; otherwise [`usable_templates`] decides.
pub fn usable_reference_templates<'t>(templates: &'t [Slide], n: usize) -> Vec<&'t Slide> {
    let fitting: Vec<&Slide> = templates
        .iter()
        .filter(|slide| {
            let count = slide.count_slots(&SlotTag::ReferenceNumber);
            count >= n && count <= MAX_REFERENCE_SLOTS
        })
        .collect();

    if fitting.is_empty() {
        usable_templates(templates, n, &SlotTag::ReferenceNumber)
    } else {
        fitting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ChartItem, TextItem};
    use crate::types::{ChartBody, Element, ElementBody, SlideType, TextBody};

    fn text(id: &str, tag: SlotTag) -> Element {
        Element::new(
            id,
            [0.0, 0.0, 100.0, 20.0],
            ElementBody::Text(TextBody {
                content: "<p>x</p>".to_string(),
                text_type: Some(tag),
                ..Default::default()
            }),
        )
    }

    fn chart(id: &str, marked: bool) -> Element {
        Element::new(
            id,
            [0.0, 0.0, 100.0, 100.0],
            ElementBody::Chart(ChartBody {
                chart_mark: marked.then(|| "chartItem".to_string()),
                ..Default::default()
            }),
        )
    }

    /// A content template with `items` item slots, `charts` chart elements
    /// and optionally a single content slot.
    fn template(id: &str, items: usize, charts: usize, content: bool) -> Slide {
        let mut slide =
            Slide::new(id, SlideType::Content).with_element(text("title", SlotTag::Title));
        for i in 0..items {
            slide = slide.with_element(text(&format!("item{i}"), SlotTag::Item));
        }
        for i in 0..charts {
            slide = slide.with_element(chart(&format!("chart{i}"), false));
        }
        if content {
            slide = slide.with_element(text("content", SlotTag::Content));
        }
        slide
    }

    fn ids(slides: &[&Slide]) -> Vec<String> {
        slides.iter().map(|s| s.id.clone()).collect()
    }

    fn text_items(n: usize) -> Vec<ContentItem> {
        (0..n).map(|i| ContentItem::Text(TextItem::new(format!("t{i}"), "body"))).collect()
    }

    #[test]
    fn test_single_item_prefers_title_and_content_layout() {
        let templates = vec![template("one-item", 1, 0, false), template("single", 0, 0, true)];
        assert_eq!(ids(&usable_templates(&templates, 1, &SlotTag::Item)), ["single"]);
    }

    #[test]
    fn test_closest_count_from_above() {
        let templates = vec![
            template("two", 2, 0, false),
            template("four-a", 4, 0, false),
            template("six", 6, 0, false),
            template("four-b", 4, 0, false),
        ];
        assert_eq!(ids(&usable_templates(&templates, 3, &SlotTag::Item)), ["four-a", "four-b"]);
        assert_eq!(ids(&usable_templates(&templates, 2, &SlotTag::Item)), ["two"]);
    }

    #[test]
    fn test_falls_back_to_largest_count() {
        let templates = vec![template("two", 2, 0, false), template("three", 3, 0, false)];
        assert_eq!(ids(&usable_templates(&templates, 8, &SlotTag::Item)), ["three"]);
        assert!(usable_templates(&[], 2, &SlotTag::Item).is_empty());
    }

    #[test]
    fn test_content_templates_score_overflow() {
        let templates = vec![
            template("3t", 3, 0, false),
            template("2t1c", 2, 1, false),
            template("4t1c", 4, 1, false),
            template("2t2c", 2, 2, false),
        ];
        let mut items = text_items(2);
        items.push(ContentItem::Chart(ChartItem::default()));

        // Scores: 2t1c = 0, 4t1c = 2, 2t2c = 100.
        assert_eq!(ids(&usable_content_templates(&templates, &items)), ["2t1c"]);
    }

    #[test]
    fn test_content_templates_relax_chart_requirement() {
        let templates = vec![template("1t1c", 1, 1, false), template("3t", 3, 0, false)];
        let mut items = text_items(2);
        items.push(ContentItem::Chart(ChartItem::default()));
        items.push(ContentItem::Chart(ChartItem::default()));

        assert_eq!(ids(&usable_content_templates(&templates, &items)), ["1t1c"]);
    }

    #[test]
    fn test_content_templates_text_only_delegates() {
        let templates = vec![template("2t", 2, 0, false), template("3t", 3, 0, false)];
        assert_eq!(ids(&usable_content_templates(&templates, &text_items(5))), ["3t"]);
    }

    #[test]
    fn test_content_templates_without_any_chart_slot() {
        let templates = vec![template("2t", 2, 0, false), template("4t", 4, 0, false)];
        let items = vec![
            ContentItem::Chart(ChartItem::default()),
            ContentItem::Chart(ChartItem::default()),
        ];
        // No chart slot anywhere: select on text slots for zero text items.
        assert_eq!(ids(&usable_content_templates(&templates, &items)), ["2t"]);
    }

    #[test]
    fn test_marked_charts_limit_chart_slots() {
        let slide = Slide::new("s", SlideType::Content)
            .with_element(chart("deco", false))
            .with_element(chart("slot", true));
        assert_eq!(chart_slot_count(&slide), 1);
    }

    #[test]
    fn test_reference_templates_accept_range() {
        let reference = |id: &str, n: usize| {
            let mut slide = Slide::new(id, SlideType::Reference);
            for i in 0..n {
                slide = slide.with_element(text(&format!("n{i}"), SlotTag::ReferenceNumber));
            }
            slide
        };
        let templates = vec![
            reference("r3", 3),
            reference("r6", 6),
            reference("r10", 10),
            reference("r12", 12),
        ];

        assert_eq!(ids(&usable_reference_templates(&templates, 5)), ["r6", "r10"]);
        assert_eq!(ids(&usable_reference_templates(&templates, 11)), ["r12"]);
    }
}
