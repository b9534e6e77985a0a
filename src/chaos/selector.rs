//! Victim selection
//!
//! Picks the pods to kill from a workload's pod set. Randomness goes through
//! [`RandomSource`] so runs can be replayed with a seeded source.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::types::*;

/// Source of random victim indices
pub trait RandomSource {
    /// Return `amount` distinct indices in `0..population`.
    ///
    /// Callers guarantee `amount <= population`.
    fn sample(&mut self, population: usize, amount: usize) -> Vec<usize>;
}

/// [`RandomSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    /// Production source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn sample(&mut self, population: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.0, population, amount).into_vec()
    }
}

/// Choose `count` pods uniformly at random without replacement.
///
/// `count` is clamped to the number of pods.
pub fn select_victims<S>(pods: &[PodRef], count: usize, random: &mut S) -> Vec<PodRef>
where
    S: RandomSource + ?Sized,
{
    let amount = count.min(pods.len());
    if amount == 0 {
        return Vec::new();
    }

    let mut indices = random.sample(pods.len(), amount);
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .filter_map(|i| pods.get(i).cloned())
        .collect()
}

/// Number of pods to kill for a workload, from `fault_injection.max_to_delete`.
///
/// Missing or unparsable values fall back to [`DEFAULT_DELETION_COUNT`].
pub fn deletion_count(annotations: &BTreeMap<String, String>) -> usize {
    match annotations.get(MAX_TO_DELETE_ANNOTATION) {
        None => DEFAULT_DELETION_COUNT,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    value = %raw,
                    error = %e,
                    "Invalid {} annotation, using {}",
                    MAX_TO_DELETE_ANNOTATION,
                    DEFAULT_DELETION_COUNT
                );
                DEFAULT_DELETION_COUNT
            }
        },
    }
}
