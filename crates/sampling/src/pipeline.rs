//! Sequential driver that threads a score vector through strategies.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logits::Logits;
use crate::select::Greedy;
use crate::strategy::{Sampled, Sampler, Strategy};

/// An ordered list of strategies.
///
/// The pipeline holds no state between calls. Stages run in the order they
/// were added; nothing is reordered or enforced beyond each stage's own
/// parameter checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    strategies: Vec<Strategy>,
}

impl Pipeline {
    /// Accepts [`Strategy`] values or the stage structs ([`crate::TopK`], ...).
    pub fn new<S: Into<Strategy>>(strategies: impl IntoIterator<Item = S>) -> Self {
        Self {
            strategies: strategies.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, strategy: impl Into<Strategy>) -> &mut Self {
        self.strategies.push(strategy.into());
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Check every stage's parameter up front.
    pub fn validate(&self) -> Result<()> {
        self.strategies.iter().try_for_each(Strategy::validate)
    }

    /// Run every stage in order.
    ///
    /// The first failing stage aborts the run. A zero temperature stops the
    /// run immediately with an argmax over the current vector, and a
    /// terminal stage ends it with the token it picked.
    pub fn sample(&self, logits: impl Into<Logits>, rng: &mut dyn RngCore) -> Result<Sampled> {
        let mut logits = logits.into();

        for (stage, strategy) in self.strategies.iter().enumerate() {
            if strategy.is_zero_temperature() {
                tracing::debug!(stage, "temperature is zero, selecting greedily");
                return Greedy.select(&logits).map(Sampled::Token);
            }

            tracing::trace!(stage, strategy = %strategy, "applying strategy");
            match strategy.sample(logits, rng)? {
                Sampled::Logits(next) => logits = next,
                token @ Sampled::Token(_) => {
                    let skipped = self.strategies.len() - stage - 1;
                    if skipped > 0 {
                        tracing::warn!(
                            skipped,
                            "{} stopped the pipeline, later strategies were not run",
                            strategy.kind()
                        );
                    }
                    return Ok(token);
                }
            }
        }

        Ok(Sampled::Logits(logits))
    }

    /// Like [`Pipeline::sample`], but only reports the token if one was chosen.
    pub fn sample_token(
        &self,
        logits: impl Into<Logits>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<usize>> {
        self.sample(logits, rng).map(|s| s.token())
    }

    /// Run with a fresh generator seeded from `seed`, for reproducible draws.
    pub fn sample_seeded(&self, logits: impl Into<Logits>, seed: u64) -> Result<Sampled> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.sample(logits, &mut rng)
    }
}

impl From<Vec<Strategy>> for Pipeline {
    fn from(strategies: Vec<Strategy>) -> Self {
        Self::new(strategies)
    }
}

impl FromIterator<Strategy> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Strategy>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Run `strategies` over `logits` in order.
pub fn sample(
    logits: impl Into<Logits>,
    strategies: &[Strategy],
    rng: &mut dyn RngCore,
) -> Result<Sampled> {
    Pipeline::new(strategies.iter().copied()).sample(logits, rng)
}
