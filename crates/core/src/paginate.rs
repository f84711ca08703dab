//! Pagination: split descriptors whose item lists would overflow one slide.
//!
//! | Payload   | Items  | Pages                    |
//! |-----------|--------|--------------------------|
//! | content   | 5-6    | 3 + rest                 |
//! | content   | 7-8    | 4 + rest                 |
//! | content   | 9-10   | 3 + 3 + rest             |
//! | content   | >10    | 4 + 4 + rest             |
//! | contents  | 11     | 6 + 5                    |
//! | contents  | >11    | 10 + rest                |
//! | reference | 11-20  | ceil(n/2) + rest         |
//! | reference | 21-30  | 10 + 10 + rest           |
//! | reference | >30    | chunks of 10             |
//!
//! Every other descriptor passes through unchanged.

use crate::content::{AiSlide, ContentData, ContentsData, ReferenceData};

/// Paginate a whole descriptor list, keeping descriptor order.
pub fn paginate(slides: Vec<AiSlide>) -> Vec<AiSlide> {
    slides.into_iter().flat_map(split).collect()
}

/// Split one descriptor into pages.
///
/// Each page's `offset` is the number of items on earlier pages, added to the
/// descriptor's own offset.
pub fn split(slide: AiSlide) -> Vec<AiSlide> {
    match slide {
        AiSlide::Content { data, offset } => match content_pages(data.items.len()) {
            Some(sizes) => {
                let ContentData { title, items } = data;
                log::debug!("Splitting {} content items into pages {:?}", items.len(), sizes);
                pages(items, &sizes, offset)
                    .into_iter()
                    .map(|(items, offset)| AiSlide::Content {
                        data: ContentData {
                            title: title.clone(),
                            items,
                        },
                        offset: Some(offset),
                    })
                    .collect()
            }
            None => vec![AiSlide::Content { data, offset }],
        },
        AiSlide::Contents { data, offset } => match contents_pages(data.items.len()) {
            Some(sizes) => {
                log::debug!(
                    "Splitting {} contents entries into pages {:?}",
                    data.items.len(),
                    sizes
                );
                pages(data.items, &sizes, offset)
                    .into_iter()
                    .map(|(items, offset)| AiSlide::Contents {
                        data: ContentsData { items },
                        offset: Some(offset),
                    })
                    .collect()
            }
            None => vec![AiSlide::Contents { data, offset }],
        },
        AiSlide::Reference { data, offset } => match reference_pages(data.references.len()) {
            Some(sizes) => {
                let ReferenceData { title, references } = data;
                log::debug!("Splitting {} references into pages {:?}", references.len(), sizes);
                pages(references, &sizes, offset)
                    .into_iter()
                    .map(|(references, offset)| AiSlide::Reference {
                        data: ReferenceData {
                            title: title.clone(),
                            references,
                        },
                        offset: Some(offset),
                    })
                    .collect()
            }
            None => vec![AiSlide::Reference { data, offset }],
        },
        other => vec![other],
    }
}

/// Page sizes for a content slide with `n` items.
pub fn content_pages(n: usize) -> Option<Vec<usize>> {
    match n {
        5 | 6 => Some(vec![3, n - 3]),
        7 | 8 => Some(vec![4, n - 4]),
        9 | 10 => Some(vec![3, 3, n - 6]),
        n if n > 10 => Some(vec![4, 4, n - 8]),
        _ => None,
    }
}

/// Page sizes for a table of contents with `n` entries.
pub fn contents_pages(n: usize) -> Option<Vec<usize>> {
    match n {
        11 => Some(vec![6, 5]),
        n if n > 11 => Some(vec![10, n - 10]),
        _ => None,
    }
}

/// Page sizes for a reference list of `n` entries.
pub fn reference_pages(n: usize) -> Option<Vec<usize>> {
    match n {
        0..=10 => None,
        11..=20 => {
            let first = n.div_ceil(2);
            Some(vec![first, n - first])
        }
        21..=30 => Some(vec![10, 10, n - 20]),
        _ => Some((0..n).step_by(10).map(|start| (n - start).min(10)).collect()),
    }
}

/// Cut `items` into consecutive pages of the given sizes, pairing each page
/// with its offset.
fn pages<T>(items: Vec<T>, sizes: &[usize], base: Option<usize>) -> Vec<(Vec<T>, usize)> {
    let base = base.unwrap_or(0);
    let mut rest = items.into_iter();
    let mut offset = 0;

    sizes
        .iter()
        .map(move |&size| {
            let page: Vec<T> = rest.by_ref().take(size).collect();
            let page_offset = base + offset;
            offset += page.len();
            (page, page_offset)
        })
        .collect()
}
