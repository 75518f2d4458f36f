//! Random hold durations for the two unpredictable waits: the pause before
//! race lights out and the length of the formation-lap red phase.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use std::collections::VecDeque;

/// Source of hold durations in whole milliseconds.
pub trait DelaySource {
    /// Draw a value from `[min_ms, max_ms)`. Returns `min_ms` when the range
    /// is empty.
    fn hold_ms(&mut self, min_ms: u32, max_ms: u32) -> u32;
}

/// Uniform delays from any `rand` generator.
pub struct RandomDelays<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomDelays<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDelays<StdRng> {
    /// Reproducible sequence of holds for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_rng(&mut rand::rng()))
    }
}

impl<R: Rng> DelaySource for RandomDelays<R> {
    fn hold_ms(&mut self, min_ms: u32, max_ms: u32) -> u32 {
        let Ok(dist) = Uniform::new(f64::from(min_ms), f64::from(max_ms)) else {
            return min_ms;
        };
        let sample: f64 = dist.sample(&mut self.rng);
        // floor keeps the result inside the half-open range
        (sample.floor() as u32).clamp(min_ms, max_ms.saturating_sub(1))
    }
}

/// Replays a scripted list of holds, clamped into each requested range.
/// Once the script runs dry every request gets its lower bound.
#[derive(Debug, Default, Clone)]
pub struct FixedDelays {
    script: VecDeque<u32>,
}

impl FixedDelays {
    pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl DelaySource for FixedDelays {
    fn hold_ms(&mut self, min_ms: u32, max_ms: u32) -> u32 {
        match self.script.pop_front() {
            Some(value) if max_ms > min_ms => value.clamp(min_ms, max_ms - 1),
            Some(_) => min_ms,
            None => {
                debug!("Delay script exhausted, using lower bound {} ms", min_ms);
                min_ms
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_holds_stay_in_half_open_range() {
        let mut delays = RandomDelays::seeded(7);
        for _ in 0..2_000 {
            let v = delays.hold_ms(1_000, 5_000);
            assert!((1_000..5_000).contains(&v), "{v}");
        }
    }

    #[test]
    fn same_seed_same_holds() {
        let mut a = RandomDelays::seeded(42);
        let mut b = RandomDelays::seeded(42);
        let xs: Vec<u32> = (0..16).map(|_| a.hold_ms(2_000, 5_000)).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.hold_ms(2_000, 5_000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn empty_range_returns_lower_bound() {
        let mut delays = RandomDelays::seeded(1);
        assert_eq!(delays.hold_ms(3_000, 3_000), 3_000);
        assert_eq!(delays.hold_ms(3_000, 1_000), 3_000);
    }

    #[test]
    fn fixed_delays_clamp_and_fall_back() {
        let mut delays = FixedDelays::new([2_500, 100, 9_000]);
        assert_eq!(delays.hold_ms(1_000, 5_000), 2_500);
        assert_eq!(delays.hold_ms(1_000, 5_000), 1_000);
        assert_eq!(delays.hold_ms(1_000, 5_000), 4_999);
        assert_eq!(delays.hold_ms(1_000, 5_000), 1_000);
    }
}
