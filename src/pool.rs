//! Color pools
//!
//! A pool is a non-empty list of colors from which targets are drawn at
//! random, never repeating the immediately previous pick.

use rand::Rng;
use thiserror::Error;

use crate::color::Color;

/// Attempt to build a pool without colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a color pool needs at least one color")]
pub struct EmptyPool;

/// Colors to draw from, along with the previous draw
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPool {
    colors: Vec<Color>,
    last: Option<usize>,
}

impl ColorPool {
    /// Fails if `colors` is empty
    pub fn new(colors: Vec<Color>) -> Result<Self, EmptyPool> {
        if colors.is_empty() {
            return Err(EmptyPool);
        }

        Ok(Self { colors, last: None })
    }

    /// Colors of the pool, in configuration order
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`, pools are never empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index returned by the previous call to [`ColorPool::select`]
    pub fn last_index(&self) -> Option<usize> {
        self.last
    }

    /// Pick the next color
    ///
    /// An index is drawn uniformly from every slot but the last one. If it
    /// matches the previous pick, the last slot is used instead. This is a
    /// cheap substitution rather than a resample, so consecutive picks differ
    /// whenever the pool holds two colors or more.
    pub fn select<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Color {
        let index = self.select_index(rng);
        self.colors[index]
    }

    fn select_index<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let last_slot = self.colors.len() - 1;

        let index = if last_slot == 0 {
            0
        } else {
            let sampled = rng.random_range(0..last_slot);
            if Some(sampled) == self.last {
                last_slot
            } else {
                sampled
            }
        };

        self.last = Some(index);
        index
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn pool(size: usize) -> ColorPool {
        ColorPool::new(
            (0..size)
                .map(|i| Color::new(0.5, 0.1, i as f64 * 30.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_eq!(ColorPool::new(vec![]), Err(EmptyPool));
    }

    #[test]
    fn single_color_repeats() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = pool(1);

        for _ in 0..10 {
            assert_eq!(pool.select(&mut rng), pool.colors()[0]);
            assert_eq!(pool.last_index(), Some(0));
        }
    }

    #[test]
    fn never_repeats_previous_pick() {
        let mut rng = StdRng::seed_from_u64(42);

        for size in 2..6 {
            let mut pool = pool(size);
            let mut previous = None;

            for _ in 0..500 {
                pool.select(&mut rng);
                let current = pool.last_index();
                assert_ne!(current, previous, "pool of {} repeated", size);
                previous = current;
            }
        }
    }

    #[test]
    fn every_color_is_reachable() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = pool(4);
        let mut seen = [false; 4];

        for _ in 0..200 {
            pool.select(&mut rng);
            seen[pool.last_index().unwrap()] = true;
        }

        assert!(seen.iter().all(|&s| s));
    }
}
