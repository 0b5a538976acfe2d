//! Oracle interfaces the sampler consumes.
//!
//! The sampler never looks inside the tree or the trait data. It only sees a
//! log-likelihood function of the rate ([`RateLikelihood`]) and, for
//! presentation purposes, per-node state probabilities ([`AncestralOracle`]).
//! Both are assumed pure: deterministic in their inputs and free of side
//! effects.

use anyhow::Result;

/// Errors that happen when the likelihood oracle evaluates a rate.
pub trait LikelihoodError: std::error::Error + Send + Sync + 'static {
    /// Unrecoverable errors stop sampling; recoverable errors are treated as
    /// zero likelihood and reject the proposal.
    fn is_recoverable(&self) -> bool;
}

/// Log-likelihood of the observed trait data as a function of the rate.
///
/// Implementations return a finite log-likelihood, or negative infinity for
/// rates outside the model's domain. A hard failure (data corruption, a
/// numerical fault in user code) is reported through the error type instead,
/// and ends the run unless the error says it is recoverable.
pub trait RateLikelihood {
    type Error: LikelihoodError;

    fn log_likelihood(&self, rate: f64) -> Result<f64, Self::Error>;
}

impl<L: RateLikelihood> RateLikelihood for &L {
    type Error = L::Error;

    fn log_likelihood(&self, rate: f64) -> Result<f64, Self::Error> {
        (*self).log_likelihood(rate)
    }
}

/// Marginal ancestral state probabilities at a given rate.
///
/// Returns one `[p_state0, p_state1]` pair per node, indexed like the
/// underlying tree. Tip nodes carry a point mass on their observed state.
pub trait AncestralOracle {
    fn marginal_states(&self, rate: f64) -> Result<Vec<[f64; 2]>>;
}
