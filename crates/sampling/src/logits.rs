//! Score vector with per-position exclusion.

use serde::{Deserialize, Serialize};

/// One score per vocabulary token, indexed by token id.
///
/// A position is either active (`Some(score)`) or excluded (`None`). Once
/// excluded, a position stays excluded for the rest of the pipeline run:
/// nothing in this type writes a value back into an excluded slot.
///
/// Serializes as a flat array with `null` for excluded positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Logits {
    scores: Vec<Option<f64>>,
}

impl Logits {
    /// Build from raw scores. NaN entries are taken as already excluded.
    ///
    /// Active scores are expected to be finite; `+inf` makes the max-shift
    /// in later stages undefined.
    pub fn new(scores: Vec<f64>) -> Self {
        scores.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score at `index`, or `None` if excluded or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.scores.get(index).copied().flatten()
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        matches!(self.scores.get(index), Some(None))
    }

    /// Permanently remove `index` from consideration.
    pub fn exclude(&mut self, index: usize) {
        if let Some(slot) = self.scores.get_mut(index) {
            *slot = None;
        }
    }

    /// Active positions as `(index, score)` pairs, in index order.
    pub fn active(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
    }

    pub fn active_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }

    /// Largest active score.
    pub fn max(&self) -> Option<f64> {
        self.active().map(|(_, s)| s).reduce(f64::max)
    }

    /// Index of the largest active score, first occurrence on ties.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, s) in self.active() {
            match best {
                Some((_, b)) if s <= b => {}
                _ => best = Some((i, s)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Active indices ordered by descending score.
    ///
    /// The sort is stable, so equal scores keep index order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<(usize, f64)> = self.active().collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1));
        order.into_iter().map(|(i, _)| i).collect()
    }

    /// Apply `f` to every active score in place. A NaN result excludes
    /// the position.
    pub(crate) fn map_active(&mut self, f: impl Fn(f64) -> f64) {
        for slot in self.scores.iter_mut() {
            if let Some(s) = *slot {
                let next = f(s);
                *slot = if next.is_nan() { None } else { Some(next) };
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.scores.iter().copied()
    }

    /// Flatten back to raw scores, writing excluded positions as NaN.
    pub fn to_vec(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.unwrap_or(f64::NAN)).collect()
    }
}

impl From<Vec<f64>> for Logits {
    fn from(scores: Vec<f64>) -> Self {
        Self::new(scores)
    }
}

impl From<&[f64]> for Logits {
    fn from(scores: &[f64]) -> Self {
        scores.iter().copied().collect()
    }
}

impl FromIterator<f64> for Logits {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            scores: iter
                .into_iter()
                .map(|s| if s.is_nan() { None } else { Some(s) })
                .collect(),
        }
    }
}
