//! Random choice among equally good candidates, and slide ids.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform choices for template and image selection.
pub trait RandomSource {
    /// A uniformly chosen index in `0..len`. `len` is never zero.
    fn below(&mut self, len: usize) -> usize;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Reproducible choices from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Always picks the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl RandomSource for FirstChoice {
    fn below(&mut self, _len: usize) -> usize {
        0
    }
}

/// Pick one element of `items`, or `None` when there is nothing to pick.
pub fn choose<'t, T>(rng: &mut dyn RandomSource, items: &'t [T]) -> Option<&'t T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.below(items.len()).min(items.len() - 1);
    items.get(index)
}

const ID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";
const ID_LEN: usize = 10;

/// A fresh 10-character URL-safe slide id.
pub fn slide_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_choose_empty() {
        let empty: [u8; 0] = [];
        assert_eq!(choose(&mut FirstChoice, &empty), None);
    }

    #[test]
    fn test_first_choice() {
        assert_eq!(choose(&mut FirstChoice, &["a", "b", "c"]), Some(&"a"));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let items: Vec<u32> = (0..50).collect();
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        let picks_a: Vec<u32> = (0..20).map(|_| *choose(&mut a, &items).unwrap()).collect();
        let picks_b: Vec<u32> = (0..20).map(|_| *choose(&mut b, &items).unwrap()).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_thread_random_in_range() {
        let mut rng = ThreadRandom;
        for len in 1..20 {
            assert!(rng.below(len) < len);
        }
    }

    #[test]
    fn test_slide_ids() {
        let ids: HashSet<String> = (0..200).map(|_| slide_id()).collect();
        assert_eq!(ids.len(), 200);
        for id in &ids {
            assert_eq!(id.len(), 10);
            assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        }
    }
}
