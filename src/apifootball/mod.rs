pub mod client;
pub mod source;

pub use client::{ApiFootballClient, PREFERRED_BOOKMAKERS};
pub use source::{FixtureOdds, FixtureQuery, FixtureSummary, OddsSource};
