//! Layer-step inference
//!
//! Sorts layer heights, buckets the positive differences between neighbours
//! at a fixed decimal precision, and picks the most frequent bucket as the
//! nominal layer height.

use super::model::Layer;
use printview_core::constants::{DEFAULT_LAYER_STEP, DEFAULT_STEP_PRECISION_DIGITS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters for step inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInference {
    /// Fractional digits kept when bucketing differences
    pub precision_digits: u32,
    /// Step used when no positive difference exists
    pub fallback_step: f64,
}

impl Default for StepInference {
    fn default() -> Self {
        Self {
            precision_digits: DEFAULT_STEP_PRECISION_DIGITS,
            fallback_step: DEFAULT_LAYER_STEP,
        }
    }
}

impl StepInference {
    /// Infer the nominal step for a layer sequence
    pub fn infer(&self, layers: &[Layer]) -> f64 {
        LayerStepHistogram::from_layers(layers, self.precision_digits).step_or(self.fallback_step)
    }
}

/// Frequency count of rounded Z differences
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStepHistogram {
    scale: f64,
    /// (rounded difference in 1/scale units, count), in first-seen order
    buckets: Vec<(i64, usize)>,
}

impl LayerStepHistogram {
    pub fn from_layers(layers: &[Layer], precision_digits: u32) -> Self {
        Self::from_heights(layers.iter().map(Layer::z), precision_digits)
    }

    pub fn from_heights(heights: impl IntoIterator<Item = f64>, precision_digits: u32) -> Self {
        let scale = 10f64.powi(precision_digits as i32);
        let mut zs: Vec<f64> = heights.into_iter().filter(|z| z.is_finite()).collect();
        zs.sort_by(f64::total_cmp);

        let mut buckets: Vec<(i64, usize)> = Vec::new();
        for pair in zs.windows(2) {
            let diff = ((pair[1] - pair[0]) * scale).round() as i64;
            if diff <= 0 {
                continue;
            }
            match buckets.iter_mut().find(|(key, _)| *key == diff) {
                Some((_, count)) => *count += 1,
                None => buckets.push((diff, 1)),
            }
        }

        Self { scale, buckets }
    }

    /// Buckets as (step, count) in first-seen order
    pub fn buckets(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.buckets
            .iter()
            .map(move |(key, count)| (*key as f64 / self.scale, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Most frequent step; ties go to the first bucket seen
    pub fn modal_step(&self) -> Option<f64> {
        let mut best: Option<(i64, usize)> = None;
        for (key, count) in &self.buckets {
            if best.map_or(true, |(_, best_count)| *count > best_count) {
                best = Some((*key, *count));
            }
        }
        best.map(|(key, _)| key as f64 / self.scale)
    }

    pub fn step_or(&self, fallback: f64) -> f64 {
        match self.modal_step() {
            Some(step) => step,
            None => {
                debug!("No positive layer step found, using fallback {}", fallback);
                fallback
            }
        }
    }
}
