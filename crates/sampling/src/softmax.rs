//! Softmax over active positions.

use crate::logits::Logits;

/// Convert scores into probabilities without touching the input.
///
/// Excluded positions stay excluded in the output and the active
/// positions sum to one. The largest active score is subtracted first,
/// which leaves the distribution unchanged but keeps `exp` finite.
pub fn softmax(logits: &Logits) -> Logits {
    let mut probs = logits.clone();
    let Some(max) = probs.max() else {
        return probs;
    };

    probs.map_active(|s| (s - max).exp());
    let sum: f64 = probs.active().map(|(_, p)| p).sum();
    probs.map_active(|p| p / sum);
    probs
}
