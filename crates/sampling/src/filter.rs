//! Filtering stages: temperature, top-k, top-p and min-p.
//!
//! Each stage validates its parameter before touching the vector, then
//! rescales scores or marks positions as excluded. None of them restores
//! a position another stage excluded.

use crate::error::{Result, SampleError};
use crate::logits::Logits;
use crate::softmax::softmax;

/// Lower bound on the divisor so temperatures just above zero stay finite.
pub const TEMPERATURE_FLOOR: f64 = 1e-7;

/// Rescale scores by `1 / temperature` after shifting the maximum to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(pub f64);

impl Temperature {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.0) {
            return Err(SampleError::InvalidTemperature(self.0));
        }
        Ok(())
    }

    pub fn apply(&self, mut logits: Logits) -> Result<Logits> {
        self.validate()?;

        // subtracting the max score avoids overflow in later softmax calls
        let Some(max) = logits.max() else {
            return Ok(logits);
        };
        let temp = self.0.max(TEMPERATURE_FLOOR);
        logits.map_active(|s| (s - max) / temp);

        Ok(logits)
    }
}

/// Keep the `k` highest scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK(pub i64);

impl TopK {
    pub fn validate(&self) -> Result<()> {
        if self.0 <= 0 {
            return Err(SampleError::InvalidTopK(self.0));
        }
        Ok(())
    }

    pub fn apply(&self, mut logits: Logits) -> Result<Logits> {
        self.validate()?;

        let k = usize::try_from(self.0).unwrap_or(usize::MAX);
        if k >= logits.len() {
            return Ok(logits);
        }

        for idx in logits.ranked().into_iter().skip(k) {
            logits.exclude(idx);
        }

        Ok(logits)
    }
}

/// Nucleus filtering: keep the smallest set of most likely tokens whose
/// cumulative probability exceeds `p`.
///
/// Ranking uses probabilities, but the surviving positions keep their
/// original scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopP(pub f64);

impl TopP {
    pub fn validate(&self) -> Result<()> {
        if !(self.0 > 0.0 && self.0 < 1.0) {
            return Err(SampleError::InvalidTopP(self.0));
        }
        Ok(())
    }

    pub fn apply(&self, mut logits: Logits) -> Result<Logits> {
        self.validate()?;

        let probs = softmax(&logits);
        exclude_outside_nucleus(&mut logits, &probs, self.0);

        Ok(logits)
    }
}

fn exclude_outside_nucleus(logits: &mut Logits, probs: &Logits, p: f64) {
    let order = probs.ranked();

    let mut cum_sum = 0.0;
    for (i, &idx) in order.iter().enumerate() {
        cum_sum += probs.get(idx).unwrap_or(0.0);
        if cum_sum > p {
            for &rest in &order[i + 1..] {
                logits.exclude(rest);
            }
            break;
        }
    }
}

/// Keep tokens whose probability is at least `p` times the best token's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinP(pub f64);

impl MinP {
    pub fn validate(&self) -> Result<()> {
        if !(self.0 > 0.0 && self.0 < 1.0) {
            return Err(SampleError::InvalidMinP(self.0));
        }
        Ok(())
    }

    pub fn apply(&self, mut logits: Logits) -> Result<Logits> {
        self.validate()?;

        let probs = softmax(&logits);
        exclude_below_min_p(&mut logits, &probs, self.0);

        Ok(logits)
    }
}

fn exclude_below_min_p(logits: &mut Logits, probs: &Logits, p: f64) {
    let Some(max_prob) = probs.max() else {
        return;
    };
    let threshold = p * max_prob;

    for (idx, prob) in probs.active() {
        if prob < threshold {
            logits.exclude(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs_of(logits: &Logits) -> Vec<f64> {
        softmax(logits).iter().map(|p| p.unwrap_or(0.0)).collect()
    }

    #[test]
    fn temperature_rejects_out_of_range() {
        let logits = Logits::new(vec![1.0, 2.0]);
        assert_eq!(
            Temperature(2.5).apply(logits.clone()),
            Err(SampleError::InvalidTemperature(2.5))
        );
        assert_eq!(
            Temperature(-0.1).apply(logits),
            Err(SampleError::InvalidTemperature(-0.1))
        );
    }

    #[test]
    fn temperature_shifts_max_to_zero() {
        let out = Temperature(0.5).apply(Logits::new(vec![1.0, 3.0, 2.0])).unwrap();
        assert_eq!(out.to_vec(), vec![-4.0, 0.0, -2.0]);
    }

    #[test]
    fn temperature_invariant_to_additive_shift() {
        let a = Temperature(0.8).apply(Logits::new(vec![0.1, 1.2, -3.0])).unwrap();
        let b = Temperature(0.8).apply(Logits::new(vec![10.1, 11.2, 7.0])).unwrap();
        for (x, y) in probs_of(&a).iter().zip(probs_of(&b).iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn temperature_near_zero_stays_finite() {
        let out = Temperature(1e-12).apply(Logits::new(vec![1.0, 2.0])).unwrap();
        assert!(out.active().all(|(_, s)| !s.is_nan()));
        assert_eq!(out.get(1), Some(0.0));
    }

    #[test]
    fn temperature_leaves_excluded_alone() {
        let mut logits = Logits::new(vec![1.0, 2.0, 3.0]);
        logits.exclude(2);
        let out = Temperature(1.0).apply(logits).unwrap();
        assert!(out.is_excluded(2));
        assert_eq!(out.get(1), Some(0.0));
    }

    #[test]
    fn temperature_never_stores_nan() {
        let out = Temperature(1.0)
            .apply(Logits::new(vec![f64::INFINITY, 2.0]))
            .unwrap();
        assert!(out.iter().flatten().all(|s| !s.is_nan()));
        assert!(out.is_excluded(0));
    }

    #[test]
    fn top_k_rejects_non_positive() {
        let logits = Logits::new(vec![1.0]);
        assert_eq!(TopK(0).apply(logits.clone()), Err(SampleError::InvalidTopK(0)));
        assert_eq!(TopK(-3).apply(logits), Err(SampleError::InvalidTopK(-3)));
    }

    #[test]
    fn top_k_at_or_above_len_is_identity() {
        let logits = Logits::new(vec![0.3, 0.1, 0.2]);
        assert_eq!(TopK(3).apply(logits.clone()).unwrap(), logits);
        assert_eq!(TopK(10).apply(logits.clone()).unwrap(), logits);
    }

    #[test]
    fn top_k_keeps_largest() {
        let out = TopK(2).apply(Logits::new(vec![0.3, 0.9, 0.1, 0.5])).unwrap();
        assert_eq!(out.active_count(), 2);
        assert_eq!(out.get(1), Some(0.9));
        assert_eq!(out.get(3), Some(0.5));
        assert!(out.is_excluded(0));
        assert!(out.is_excluded(2));
    }

    #[test]
    fn top_p_rejects_bounds() {
        let logits = Logits::new(vec![1.0]);
        assert_eq!(TopP(0.0).apply(logits.clone()), Err(SampleError::InvalidTopP(0.0)));
        assert_eq!(TopP(1.0).apply(logits), Err(SampleError::InvalidTopP(1.0)));
    }

    #[test]
    fn top_p_keeps_minimal_prefix() {
        let probs = Logits::new(vec![0.5, 0.3, 0.15, 0.05]);
        let mut logits = Logits::new(vec![4.0, 3.0, 2.0, 1.0]);
        exclude_outside_nucleus(&mut logits, &probs, 0.6);
        assert_eq!(logits.to_vec()[..2], [4.0, 3.0]);
        assert!(logits.is_excluded(2));
        assert!(logits.is_excluded(3));
    }

    #[test]
    fn top_p_from_log_probabilities() {
        let logits: Logits = [0.5f64, 0.3, 0.15, 0.05].iter().map(|p| p.ln()).collect();
        let out = TopP(0.6).apply(logits.clone()).unwrap();
        assert_eq!(out.active_count(), 2);
        assert_eq!(out.get(0), logits.get(0));
        assert_eq!(out.get(1), logits.get(1));
    }

    #[test]
    fn top_p_dominant_token_survives_alone() {
        let out = TopP(0.5).apply(Logits::new(vec![0.0, 10.0, 1.0])).unwrap();
        assert_eq!(out.active().collect::<Vec<_>>(), vec![(1, 10.0)]);
    }

    #[test]
    fn min_p_rejects_bounds() {
        let logits = Logits::new(vec![1.0]);
        assert_eq!(MinP(0.0).apply(logits.clone()), Err(SampleError::InvalidMinP(0.0)));
        assert_eq!(MinP(1.5).apply(logits), Err(SampleError::InvalidMinP(1.5)));
    }

    #[test]
    fn min_p_keeps_exact_threshold() {
        let probs = Logits::new(vec![0.5, 0.25, 0.125, 0.125]);
        let mut logits = Logits::new(vec![3.0, 2.0, 1.0, 1.0]);
        exclude_below_min_p(&mut logits, &probs, 0.5);
        assert_eq!(logits.get(0), Some(3.0));
        assert_eq!(logits.get(1), Some(2.0));
        assert!(logits.is_excluded(2));
        assert!(logits.is_excluded(3));
    }

    #[test]
    fn min_p_keeps_original_scores() {
        let out = MinP(0.1).apply(Logits::new(vec![5.0, 4.5, -5.0])).unwrap();
        assert_eq!(out.get(0), Some(5.0));
        assert_eq!(out.get(1), Some(4.5));
        assert!(out.is_excluded(2));
    }
}
