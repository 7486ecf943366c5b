//! The closed set of pipeline stages and the trait they share.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::filter::{MinP, Temperature, TopK, TopP};
use crate::logits::Logits;
use crate::select::{Greedy, Weighted};

/// Output of a stage: either a (possibly filtered) vector, or a chosen token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampled {
    Logits(Logits),
    Token(usize),
}

impl Sampled {
    pub fn token(&self) -> Option<usize> {
        match self {
            Sampled::Token(t) => Some(*t),
            Sampled::Logits(_) => None,
        }
    }

    pub fn logits(&self) -> Option<&Logits> {
        match self {
            Sampled::Logits(l) => Some(l),
            Sampled::Token(_) => None,
        }
    }

    /// Flat form: the full vector with NaN for excluded positions, or a
    /// single element holding the token id.
    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Sampled::Logits(l) => l.to_vec(),
            Sampled::Token(t) => vec![t as f64],
        }
    }
}

/// A single pipeline stage.
pub trait Sampler {
    /// Transform `logits`, possibly ending the run with a token.
    fn sample(&self, logits: Logits, rng: &mut dyn RngCore) -> Result<Sampled>;
}

impl Sampler for Temperature {
    fn sample(&self, logits: Logits, _rng: &mut dyn RngCore) -> Result<Sampled> {
        self.apply(logits).map(Sampled::Logits)
    }
}

impl Sampler for TopK {
    fn sample(&self, logits: Logits, _rng: &mut dyn RngCore) -> Result<Sampled> {
        self.apply(logits).map(Sampled::Logits)
    }
}

impl Sampler for TopP {
    fn sample(&self, logits: Logits, _rng: &mut dyn RngCore) -> Result<Sampled> {
        self.apply(logits).map(Sampled::Logits)
    }
}

impl Sampler for MinP {
    fn sample(&self, logits: Logits, _rng: &mut dyn RngCore) -> Result<Sampled> {
        self.apply(logits).map(Sampled::Logits)
    }
}

impl Sampler for Weighted {
    fn sample(&self, logits: Logits, rng: &mut dyn RngCore) -> Result<Sampled> {
        self.select(&logits, rng).map(Sampled::Token)
    }
}

impl Sampler for Greedy {
    fn sample(&self, logits: Logits, _rng: &mut dyn RngCore) -> Result<Sampled> {
        self.select(&logits).map(Sampled::Token)
    }
}

/// Configured strategy, serialized as `{"kind": "top_k", "value": 40}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Strategy {
    Temperature(f64),
    TopK(i64),
    TopP(f64),
    MinP(f64),
    Weighted,
    Greedy,
}

impl Strategy {
    /// Check the configured parameter without running the stage.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Strategy::Temperature(t) => Temperature(t).validate(),
            Strategy::TopK(k) => TopK(k).validate(),
            Strategy::TopP(p) => TopP(p).validate(),
            Strategy::MinP(p) => MinP(p).validate(),
            Strategy::Weighted | Strategy::Greedy => Ok(()),
        }
    }

    /// Whether this stage picks a token rather than filtering.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Strategy::Weighted | Strategy::Greedy)
    }

    /// Temperature zero requests a deterministic argmax.
    pub fn is_zero_temperature(&self) -> bool {
        matches!(self, Strategy::Temperature(t) if *t == 0.0)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Temperature(_) => "temperature",
            Strategy::TopK(_) => "top_k",
            Strategy::TopP(_) => "top_p",
            Strategy::MinP(_) => "min_p",
            Strategy::Weighted => "weighted",
            Strategy::Greedy => "greedy",
        }
    }
}

impl From<Temperature> for Strategy {
    fn from(t: Temperature) -> Self {
        Strategy::Temperature(t.0)
    }
}

impl From<TopK> for Strategy {
    fn from(k: TopK) -> Self {
        Strategy::TopK(k.0)
    }
}

impl From<TopP> for Strategy {
    fn from(p: TopP) -> Self {
        Strategy::TopP(p.0)
    }
}

impl From<MinP> for Strategy {
    fn from(p: MinP) -> Self {
        Strategy::MinP(p.0)
    }
}

impl From<Weighted> for Strategy {
    fn from(_: Weighted) -> Self {
        Strategy::Weighted
    }
}

impl From<Greedy> for Strategy {
    fn from(_: Greedy) -> Self {
        Strategy::Greedy
    }
}

impl Sampler for Strategy {
    fn sample(&self, logits: Logits, rng: &mut dyn RngCore) -> Result<Sampled> {
        match *self {
            Strategy::Temperature(t) => Temperature(t).sample(logits, rng),
            Strategy::TopK(k) => TopK(k).sample(logits, rng),
            Strategy::TopP(p) => TopP(p).sample(logits, rng),
            Strategy::MinP(p) => MinP(p).sample(logits, rng),
            Strategy::Weighted => Weighted.sample(logits, rng),
            Strategy::Greedy => Greedy.sample(logits, rng),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Temperature(v) | Strategy::TopP(v) | Strategy::MinP(v) => {
                write!(f, "{}={}", self.kind(), v)
            }
            Strategy::TopK(k) => write!(f, "{}={}", self.kind(), k),
            Strategy::Weighted | Strategy::Greedy => f.write_str(self.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStrategyError {
    #[error("unknown strategy kind: {0}")]
    UnknownKind(String),

    #[error("strategy '{0}' requires a value, e.g. {0}=0.9")]
    MissingValue(String),

    #[error("strategy '{0}' takes no value")]
    UnexpectedValue(String),

    #[error("invalid value '{value}' for strategy '{kind}'")]
    InvalidValue { kind: String, value: String },
}

/// Parses `kind=value` (or a bare `weighted` / `greedy`).
///
/// Only the syntax is checked here; ranges are checked by [`Strategy::validate`].
impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, value) = match s.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (s.trim(), None),
        };
        let kind = kind.to_ascii_lowercase().replace('-', "_");

        let invalid = |value: &str| ParseStrategyError::InvalidValue {
            kind: kind.clone(),
            value: value.to_string(),
        };
        let float = |value: Option<&str>| -> std::result::Result<f64, ParseStrategyError> {
            let value = value.ok_or_else(|| ParseStrategyError::MissingValue(kind.clone()))?;
            value.parse().map_err(|_| invalid(value))
        };

        match kind.as_str() {
            "temperature" | "temp" => Ok(Strategy::Temperature(float(value)?)),
            "top_p" => Ok(Strategy::TopP(float(value)?)),
            "min_p" => Ok(Strategy::MinP(float(value)?)),
            "top_k" => {
                let value = value.ok_or_else(|| ParseStrategyError::MissingValue(kind.clone()))?;
                Ok(Strategy::TopK(value.parse().map_err(|_| invalid(value))?))
            }
            "weighted" | "greedy" => {
                if value.is_some() {
                    return Err(ParseStrategyError::UnexpectedValue(kind.clone()));
                }
                Ok(if kind == "weighted" {
                    Strategy::Weighted
                } else {
                    Strategy::Greedy
                })
            }
            _ => Err(ParseStrategyError::UnknownKind(kind.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SampleError;

    #[test]
    fn parses_kind_value_pairs() {
        assert_eq!("temperature=0.7".parse::<Strategy>(), Ok(Strategy::Temperature(0.7)));
        assert_eq!("top-k=40".parse::<Strategy>(), Ok(Strategy::TopK(40)));
        assert_eq!("top_p = 0.9".parse::<Strategy>(), Ok(Strategy::TopP(0.9)));
        assert_eq!("MIN_P=0.05".parse::<Strategy>(), Ok(Strategy::MinP(0.05)));
        assert_eq!("greedy".parse::<Strategy>(), Ok(Strategy::Greedy));
        assert_eq!("weighted".parse::<Strategy>(), Ok(Strategy::Weighted));
    }

    #[test]
    fn rejects_malformed_strategies() {
        assert_eq!(
            "top_p".parse::<Strategy>(),
            Err(ParseStrategyError::MissingValue("top_p".into()))
        );
        assert_eq!(
            "greedy=1".parse::<Strategy>(),
            Err(ParseStrategyError::UnexpectedValue("greedy".into()))
        );
        assert!(matches!(
            "top_k=1.5".parse::<Strategy>(),
            Err(ParseStrategyError::InvalidValue { .. })
        ));
        assert!(matches!(
            "beam=4".parse::<Strategy>(),
            Err(ParseStrategyError::UnknownKind(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in [
            Strategy::Temperature(0.25),
            Strategy::TopK(3),
            Strategy::MinP(0.1),
            Strategy::Weighted,
        ] {
            assert_eq!(s.to_string().parse::<Strategy>(), Ok(s));
        }
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&Strategy::TopK(40)).unwrap();
        assert_eq!(json, r#"{"kind":"top_k","value":40}"#);
        let s: Strategy = serde_json::from_str(r#"{"kind":"greedy"}"#).unwrap();
        assert_eq!(s, Strategy::Greedy);
    }

    #[test]
    fn validate_matches_stage_checks() {
        assert_eq!(
            Strategy::Temperature(3.0).validate(),
            Err(SampleError::InvalidTemperature(3.0))
        );
        assert_eq!(Strategy::TopK(0).validate(), Err(SampleError::InvalidTopK(0)));
        assert!(Strategy::Temperature(0.0).validate().is_ok());
        assert!(Strategy::Greedy.validate().is_ok());
    }

    #[test]
    fn zero_temperature_detection() {
        assert!(Strategy::Temperature(0.0).is_zero_temperature());
        assert!(!Strategy::Temperature(0.1).is_zero_temperature());
        assert!(!Strategy::TopK(0).is_zero_temperature());
    }

    #[test]
    fn flat_output_shapes() {
        assert_eq!(Sampled::Token(4).into_vec(), vec![4.0]);
        let v = Sampled::Logits(Logits::new(vec![1.0, f64::NAN])).into_vec();
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan());
    }
}
