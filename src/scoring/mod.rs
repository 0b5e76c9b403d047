//! Scoring: turns issues and block metrics into a bounded efficiency score
//!
//! The engine is stateless per call; all tuning lives in an immutable
//! [`EngineConfig`] handed in at construction.

mod engine;

pub use engine::{EngineConfig, ScoringEngine};
