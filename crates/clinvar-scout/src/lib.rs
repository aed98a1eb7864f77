//! ClinVar Scout: adaptive extraction of ClinVar variant pages into a
//! fixed-schema record.
//!
//! A page is acquired either through a headless browser (heavy) or a plain
//! HTTP GET (light), picked from host resource pressure, with one fallback
//! from heavy to light. The resulting DOM is walked into a [`RawRecord`]
//! and normalized into a [`NormalizedRecord`].

pub mod config;
pub mod dispatcher;
pub mod dom;
pub mod error;
pub mod extraction;
pub mod fetcher;
pub mod monitor;
pub mod normalize;
pub mod renderer;
pub mod types;

pub use config::{ExtractorConfig, StrategyOverride};
pub use dispatcher::Extractor;
pub use error::{ExtractError, ExtractResult};
pub use normalize::normalize;
pub use types::*;
