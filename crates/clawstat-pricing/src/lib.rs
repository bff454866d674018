//! Token cost estimation for clawstat
//!
//! This crate turns token totals into estimated spend using a single
//! configurable per-token rate.

pub mod cost_calculator;

pub use cost_calculator::{CostCalculator, DEFAULT_TOKEN_RATE, TokenRate};
