//! Chain drivers and run configuration.
//!
//! A run is configured through [`SamplerSettings`], validated up front so no
//! chain ever starts with out-of-domain parameters. Independent chains share
//! nothing mutable: each gets its own generator derived from the run seed and
//! the chain id, so runs are reproducible draw for draw and chains may execute
//! in parallel.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;

use crate::chain::{Progress, RateChain};
use crate::model::RateLikelihood;
use crate::prior::Prior;
use crate::trace::{RateTrace, SampleRecord};

/// Smallest accepted starting rate.
pub const MIN_INITIAL_RATE: f64 = 0.001;
/// Largest accepted starting rate.
pub const MAX_INITIAL_RATE: f64 = 9.999;
/// Largest accepted iteration count per chain.
pub const MAX_DRAWS: u64 = 50_000;
/// Largest accepted proposal window width.
pub const MAX_PROPOSAL_WIDTH: f64 = 100.;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SamplerError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("likelihood function returned unrecoverable error")]
    OracleFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn invalid(name: &'static str, reason: String) -> SamplerError {
    SamplerError::InvalidParameter { name, reason }
}

/// Settings for a sampler run.
#[derive(Debug, Clone, Copy)]
pub struct SamplerSettings {
    /// Iterations per chain. The trace has exactly this many records; the
    /// initial state is not emitted.
    pub num_draws: u64,
    /// Starting rate for every chain.
    pub initial_rate: f64,
    /// Width of the symmetric uniform proposal window. Zero degenerates to a
    /// constant chain.
    pub proposal_width: f64,
    /// Number of independent chains.
    pub num_chains: usize,
    pub seed: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            num_draws: 1000,
            initial_rate: 0.1,
            proposal_width: 0.2,
            num_chains: 4,
            seed: 0,
        }
    }
}

impl SamplerSettings {
    /// Check every parameter against its domain.
    ///
    /// Fails with [`SamplerError::InvalidParameter`] before any chain step
    /// executes; values are never silently clamped.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if !self.initial_rate.is_finite()
            || !(MIN_INITIAL_RATE..=MAX_INITIAL_RATE).contains(&self.initial_rate)
        {
            return Err(invalid(
                "initial_rate",
                format!(
                    "{} not in [{}, {}]",
                    self.initial_rate, MIN_INITIAL_RATE, MAX_INITIAL_RATE
                ),
            ));
        }
        if self.num_draws == 0 || self.num_draws > MAX_DRAWS {
            return Err(invalid(
                "num_draws",
                format!("{} not in [1, {}]", self.num_draws, MAX_DRAWS),
            ));
        }
        if !self.proposal_width.is_finite()
            || !(0f64..=MAX_PROPOSAL_WIDTH).contains(&self.proposal_width)
        {
            return Err(invalid(
                "proposal_width",
                format!("{} not in [0, {}]", self.proposal_width, MAX_PROPOSAL_WIDTH),
            ));
        }
        if self.num_chains == 0 {
            return Err(invalid("num_chains", "must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Generator for one chain: a `ChaCha8` stream keyed by chain id feeds a
    /// `SmallRng`, so chains are independent and byte-reproducible.
    fn chain_rng(&self, chain: u64) -> SmallRng {
        let mut seed_rng = ChaCha8Rng::seed_from_u64(self.seed);
        seed_rng.set_stream(chain);
        SmallRng::from_rng(&mut seed_rng)
    }
}

/// Run all configured chains to completion and collect one trace per chain.
///
/// Chains are embarrassingly parallel and run on the rayon pool. The
/// likelihood and prior are shared immutably; re-running with new settings
/// starts from scratch, nothing is resumed.
pub fn sample_rate<L>(
    likelihood: &L,
    prior: &Prior,
    settings: &SamplerSettings,
) -> Result<Vec<RateTrace>, SamplerError>
where
    L: RateLikelihood + Sync,
{
    settings.validate()?;
    (0..settings.num_chains as u64)
        .into_par_iter()
        .map(|chain_id| run_chain(likelihood, prior, settings, chain_id))
        .collect()
}

fn run_chain<L>(
    likelihood: &L,
    prior: &Prior,
    settings: &SamplerSettings,
    chain_id: u64,
) -> Result<RateTrace, SamplerError>
where
    L: RateLikelihood,
{
    let rng = settings.chain_rng(chain_id);
    let mut chain = RateChain::new(
        likelihood,
        *prior,
        settings.initial_rate,
        settings.proposal_width,
        chain_id,
        rng,
    )?;
    let mut trace = RateTrace::with_capacity(chain_id, settings.num_draws as usize);
    for _ in 0..settings.num_draws {
        let (record, _) = chain.draw()?;
        trace.push(record);
    }
    Ok(trace)
}

/// Lazily draw from a single chain.
///
/// Draws are produced on demand; dropping the iterator abandons the run. The
/// chain owns all of its state, so abandonment cannot corrupt anything shared.
pub fn sample_sequentially<L>(
    likelihood: L,
    prior: Prior,
    settings: &SamplerSettings,
    chain: u64,
) -> Result<impl Iterator<Item = Result<(SampleRecord, Progress), SamplerError>>, SamplerError>
where
    L: RateLikelihood,
{
    settings.validate()?;
    let rng = settings.chain_rng(chain);
    let mut sampler = RateChain::new(
        likelihood,
        prior,
        settings.initial_rate,
        settings.proposal_width,
        chain,
        rng,
    )?;
    Ok((0..settings.num_draws).map(move |_| sampler.draw()))
}
