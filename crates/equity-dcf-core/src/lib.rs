pub mod error;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::EquityDcfError;
pub use types::*;

/// Standard result type for all engine operations
pub type EquityDcfResult<T> = Result<T, EquityDcfError>;
