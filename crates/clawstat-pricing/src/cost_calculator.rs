//! Cost calculator module for computing usage costs
//!
//! The estimate is linear in the token total: `cost = tokens * rate`. The
//! rate is a flat currency amount per token, independent of model.
//!
//! # Examples
//!
//! ```
//! use clawstat_pricing::{CostCalculator, TokenRate};
//!
//! let calculator = CostCalculator::new(TokenRate::new(0.00001).unwrap());
//! let cost = calculator.calculate_cost(150);
//! assert!((cost - 0.0015).abs() < 1e-12);
//! ```

use clawstat_core::error::{ClawstatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Rate applied when none is configured, in currency units per token
pub const DEFAULT_TOKEN_RATE: f64 = 0.00001;

/// A validated per-token rate: finite and non-negative
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TokenRate(f64);

impl TokenRate {
    /// Create a rate, rejecting negative, NaN, and infinite values
    pub fn new(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ClawstatError::InvalidArgument(format!(
                "token rate must be a finite, non-negative number, got {rate}"
            )));
        }
        Ok(Self(rate))
    }

    /// Get the raw rate
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for TokenRate {
    fn default() -> Self {
        Self(DEFAULT_TOKEN_RATE)
    }
}

impl fmt::Display for TokenRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenRate {
    type Err = ClawstatError;

    fn from_str(s: &str) -> Result<Self> {
        let rate = s.trim().parse::<f64>().map_err(|_| {
            ClawstatError::InvalidArgument(format!("invalid token rate: {s}"))
        })?;
        Self::new(rate)
    }
}

impl TryFrom<f64> for TokenRate {
    type Error = ClawstatError;

    fn try_from(rate: f64) -> Result<Self> {
        Self::new(rate)
    }
}

impl From<TokenRate> for f64 {
    fn from(rate: TokenRate) -> Self {
        rate.0
    }
}

/// Calculates estimated cost from token totals
#[derive(Debug, Clone, Copy, Default)]
pub struct CostCalculator {
    rate: TokenRate,
}

impl CostCalculator {
    /// Create a new CostCalculator with the given rate
    pub fn new(rate: TokenRate) -> Self {
        Self { rate }
    }

    /// The configured rate
    pub fn rate(&self) -> TokenRate {
        self.rate
    }

    /// Estimated cost for a number of tokens
    pub fn calculate_cost(&self, tokens: u64) -> f64 {
        let cost = tokens as f64 * self.rate.value();
        debug!("Calculated cost: {:.6} for {} total tokens", cost, tokens);
        cost
    }
}
