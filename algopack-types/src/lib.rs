//! algopack-types
//!
//! Foundational types shared across the algopack workspace.
//!
//! - `error`: the unified [`AlgopackError`] taxonomy.
//! - `record`: the [`Value`] scalar and ordered [`Record`] produced by the
//!   wire deserializer.
//! - `period`: candle period vocabulary and resampling period tokens.
//! - `family`: metric family tags used by the resampler.
#![warn(missing_docs)]

/// Unified error type for the algopack workspace.
pub mod error;
/// Metric family tags and structural detection.
pub mod family;
/// Candle and resampling period vocabulary.
pub mod period;
/// Scalar values and ordered records.
pub mod record;

pub use error::AlgopackError;
pub use family::MetricFamily;
pub use period::{CandlePeriod, PeriodSpec, ResamplePeriod};
pub use record::{Record, Value};
