//! Where generated slides go: the first batch replaces an empty
//! presentation, later batches are appended.

use crate::error::Result;
use crate::types::Slide;

/// Destination for generated slides.
pub trait PresentationStore {
    fn slide_count(&self) -> usize;

    fn replace_slides(&mut self, slides: Vec<Slide>) -> Result<()>;

    fn append_slides(&mut self, slides: Vec<Slide>) -> Result<()>;
}

/// Insert a batch of generated slides: an empty presentation is replaced
/// wholesale, anything else is appended to.
pub fn insert_slides(store: &mut dyn PresentationStore, slides: Vec<Slide>) -> Result<()> {
    if slides.is_empty() {
        return Ok(());
    }

    if store.slide_count() == 0 {
        log::debug!("Replacing empty presentation with {} slides", slides.len());
        store.replace_slides(slides)
    } else {
        log::debug!("Appending {} slides after {}", slides.len(), store.slide_count());
        store.append_slides(slides)
    }
}

impl PresentationStore for Vec<Slide> {
    fn slide_count(&self) -> usize {
        self.len()
    }

    fn replace_slides(&mut self, slides: Vec<Slide>) -> Result<()> {
        *self = slides;
        Ok(())
    }

    fn append_slides(&mut self, slides: Vec<Slide>) -> Result<()> {
        self.extend(slides);
        Ok(())
    }
}
