//! logitkit_sampling - Composable logit filters and token selectors
//!
//! This crate turns one vector of model scores into either a filtered
//! vector or a single chosen token id:
//! - Temperature, top-k, top-p and min-p filtering
//! - Weighted random and greedy selection
//! - A pipeline that runs strategies in order, with a temperature-zero
//!   shortcut to greedy selection
//!
//! ```
//! use logitkit_sampling::{Pipeline, Sampled, Strategy};
//!
//! let pipeline = Pipeline::new(vec![
//!     Strategy::Temperature(0.0),
//!     Strategy::TopK(1),
//! ]);
//! let out = pipeline.sample_seeded(vec![2.0, 9.0, 4.0], 42).unwrap();
//! assert_eq!(out, Sampled::Token(1));
//! ```

pub mod error;
pub mod filter;
pub mod logits;
pub mod pipeline;
pub mod select;
pub mod softmax;
pub mod strategy;

pub use error::{Result, SampleError};
pub use filter::{MinP, Temperature, TopK, TopP};
pub use logits::Logits;
pub use pipeline::{sample, Pipeline};
pub use select::{Greedy, Weighted};
pub use softmax::softmax;
pub use strategy::{ParseStrategyError, Sampled, Sampler, Strategy};
