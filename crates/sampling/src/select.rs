//! Terminal selectors that turn a filtered vector into one token id.

use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::error::{Result, SampleError};
use crate::logits::Logits;
use crate::softmax::softmax;

/// Random draw weighted by the softmax of the surviving scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Weighted;

impl Weighted {
    pub fn select(&self, logits: &Logits, rng: &mut dyn RngCore) -> Result<usize> {
        // compact to the active positions, remembering where each came from
        let (indices, scores): (Vec<usize>, Vec<f64>) = logits.active().unzip();
        if indices.is_empty() {
            return Err(SampleError::NoValidTokens);
        }

        let weights: Vec<f64> = softmax(&Logits::new(scores))
            .iter()
            .map(|w| w.unwrap_or(0.0))
            .collect();

        let dist = WeightedIndex::new(&weights)
            .map_err(|e| SampleError::SelectionFailed(e.to_string()))?;

        Ok(indices[dist.sample(rng)])
    }
}

/// Pick the highest score, lowest index on ties.
///
/// Fails with [`SampleError::NoValidTokens`] when no position is active,
/// which covers an empty vector and one where every position is excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Greedy;

impl Greedy {
    pub fn select(&self, logits: &Logits) -> Result<usize> {
        logits.argmax().ok_or(SampleError::NoValidTokens)
    }
}
