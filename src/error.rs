//! Error taxonomy for the computational-spot engine.
//!
//! Follows spec §7: logical misuse is fatal (`Err`), business rejections are
//! ordinary return values (`AdmissionOutcome`, not `Result`), and numeric
//! non-convergence is bounded rather than propagated as a hard failure.

use thiserror::Error;

/// Result alias for [`crate::spot::ComputationalSpot`] operations.
pub type SpotResult<T> = Result<T, SpotError>;

/// Result alias for [`crate::pricing::PricingEngine`] operations.
pub type PricingResult<T> = Result<T, PricingError>;

/// Logical-misuse errors: programmer errors that abort the call, never a
/// silently-tolerated business rejection.
#[derive(Debug, Error, PartialEq)]
pub enum SpotError {
    #[error("unknown scheduling policy: {0:?}")]
    InvalidPolicy(String),

    #[error("reassign_vm: service {service} has zero instances to give up")]
    ReassignFromEmpty { service: usize },

    #[error("assign: core {core} is still busy past the requested finish time")]
    CoreBusy { core: usize },

    #[error("core index {core} out of range (spot has {num_cores} cores)")]
    CoreOutOfRange { core: usize, num_cores: usize },
}

/// Errors raised by the iterative market-clearing price computation.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The outer loop's objective went negative and stayed negative beyond
    /// `OBJECTIVE_EPSILON`; the source aborts the loop the same way.
    #[error("pricing outer loop declared infeasible (objective persistently negative)")]
    Infeasible,
}
