//! Bounded per-step residual reservoirs

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Residuals per step, at most `cap` values each
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualStore {
    cap: usize,
    residuals: BTreeMap<usize, Vec<f64>>,
}

/// Uniform sample of `cap` values without replacement, or all of them
fn subsample(values: Vec<f64>, cap: usize, seed: u64) -> Vec<f64> {
    if values.len() <= cap {
        return values;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    sample(&mut rng, values.len(), cap)
        .into_iter()
        .map(|i| values[i])
        .collect()
}

impl ResidualStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            residuals: BTreeMap::new(),
        }
    }

    /// Maximum values kept per step
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Residuals of `step`, if any were stored
    pub fn get(&self, step: usize) -> Option<&[f64]> {
        self.residuals.get(&step).map(Vec::as_slice)
    }

    /// Number of residuals stored for `step`
    pub fn count(&self, step: usize) -> usize {
        self.residuals.get(&step).map_or(0, Vec::len)
    }

    /// Steps with stored residuals
    pub fn steps(&self) -> Vec<usize> {
        self.residuals.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.residuals.values().all(Vec::is_empty)
    }

    /// Replace the residuals of `step`, subsampling (seeded) down to the cap
    pub fn store_sampled(&mut self, step: usize, values: Vec<f64>, seed: u64) {
        if values.len() > self.cap {
            debug!(step, n = values.len(), cap = self.cap, "subsampling residuals");
        }
        self.residuals.insert(step, subsample(values, self.cap, seed));
    }

    /// Add residuals of `step`.
    ///
    /// The incoming batch is first subsampled to the cap. With `append` and
    /// existing values, only as many new values as fit are kept (the stored
    /// ones stay); otherwise the reservoir is replaced.
    pub fn update(&mut self, step: usize, values: Vec<f64>, append: bool, seed: u64) {
        let values = subsample(values, self.cap, seed);
        match self.residuals.get_mut(&step) {
            Some(existing) if append && !existing.is_empty() => {
                let free = self.cap.saturating_sub(existing.len());
                existing.extend(values.into_iter().take(free));
            }
            _ => {
                self.residuals.insert(step, values);
            }
        }
    }
}
