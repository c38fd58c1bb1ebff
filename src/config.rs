//! Configuration for the computational-spot engine.
//!
//! Mirrors the nested-section, `Default`-impl-with-literal-constants style
//! used for `SidecarConfig` in the teacher crate: every numeric constant the
//! spec pins down lives here, not scattered across the modules that use it.

use serde::{Deserialize, Serialize};

/// Tunable constants for utility computation and the pricing outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Ceiling utility value (`U_max` in spec §4.7).
    pub u_max: f64,
    /// Per-iteration price decrement applied on a no-progress round (spec §4.8).
    pub price_decrement: f64,
    /// Capacity-cost offset subtracted from price in the objective (`phi`).
    pub phi: f64,
    /// Starting bid ceiling for every service before the outer loop runs.
    pub initial_price: f64,
    /// Hard cap on outer-loop iterations (spec §9 Open Question, resolved).
    pub max_iterations: u32,
    /// Threshold below which an LP subproblem result is treated as zero.
    pub lp_epsilon: f64,
    /// Threshold below which the outer-loop objective is treated as zero.
    pub objective_epsilon: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            u_max: 100.0,
            price_decrement: 0.5,
            phi: 0.2,
            initial_price: 100.0,
            max_iterations: 10_000,
            lp_epsilon: 1e-5,
            objective_epsilon: 1e-3,
        }
    }
}

/// Top-level configuration for a [`crate::spot::ComputationalSpot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotConfig {
    pub pricing: PricingConfig,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
        }
    }
}

impl SpotConfig {
    /// Parse a [`SpotConfig`] from TOML text, falling back to field defaults
    /// for anything the document omits.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
