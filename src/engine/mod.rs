//! Match outcome probability engine.
//!
//! A Dixon-Coles-adjusted bivariate Poisson scoreline matrix drives every
//! derived market; the value layer compares the model's 1X2 probabilities
//! to quoted odds and the orchestrator gates picks on edge.

pub mod analyze;
pub mod error;
pub mod expected_goals;
pub mod markets;
pub mod scoreline;
pub mod value;

pub use analyze::{analyze, AnalysisResult, AnalyzeRequest, EngineParams};
pub use error::EngineError;
pub use expected_goals::ContextFlags;
pub use markets::OutcomeProbs;
pub use scoreline::ScorelineMatrix;
pub use value::MarketOdds;
