//! Random-walk Metropolis-Hastings over the transition rate.
//!
//! A [`RateChain`] owns its pseudorandom source and its current state, and is
//! strictly sequential: every draw depends on the previously accepted state.
//! All posterior comparisons happen in log space.

use rand::Rng;

use crate::model::{LikelihoodError, RateLikelihood};
use crate::prior::Prior;
use crate::sampler::SamplerError;
use crate::trace::SampleRecord;

/// The current accepted state of a chain.
///
/// Owned exclusively by the running chain and replaced only when a proposal is
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainState {
    pub rate: f64,
    pub log_likelihood: f64,
    pub log_prior: f64,
}

impl ChainState {
    pub fn log_posterior(&self) -> f64 {
        self.log_likelihood + self.log_prior
    }
}

/// Per-draw progress information.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Progress {
    pub draw: u64,
    pub chain: u64,
    pub accepted: bool,
    pub acceptance_rate: f64,
}

/// A single Metropolis-Hastings chain over the rate parameter.
pub struct RateChain<L, R> {
    likelihood: L,
    prior: Prior,
    proposal_width: f64,
    rng: R,
    chain: u64,
    state: ChainState,
    draw_count: u64,
    accept_count: u64,
}

impl<L, R> RateChain<L, R>
where
    L: RateLikelihood,
    R: Rng,
{
    /// Initialize a chain at `initial_rate`.
    ///
    /// This evaluates the likelihood once and fails if the oracle returns an
    /// unrecoverable error. A zero-density starting point is allowed; the
    /// chain accepts the first proposal with positive posterior density.
    pub fn new(
        likelihood: L,
        prior: Prior,
        initial_rate: f64,
        proposal_width: f64,
        chain: u64,
        rng: R,
    ) -> Result<Self, SamplerError> {
        let log_prior = prior.log_density(initial_rate);
        let log_likelihood = evaluate(&likelihood, initial_rate)?;
        Ok(RateChain {
            likelihood,
            prior,
            proposal_width,
            rng,
            chain,
            state: ChainState {
                rate: initial_rate,
                log_likelihood,
                log_prior,
            },
            draw_count: 0,
            accept_count: 0,
        })
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn chain(&self) -> u64 {
        self.chain
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.draw_count == 0 {
            return 0.;
        }
        self.accept_count as f64 / self.draw_count as f64
    }

    /// Perform one iteration: propose, accept or reject, record.
    pub fn draw(&mut self) -> Result<(SampleRecord, Progress), SamplerError> {
        let offset = if self.proposal_width == 0. {
            // Degenerate proposal: the chain repeats its state forever.
            0.
        } else {
            let half = self.proposal_width / 2.;
            self.rng.random_range(-half..half)
        };
        let u: f64 = self.rng.random();
        self.advance(offset, u)
    }

    /// Advance one iteration with an externally supplied proposal offset and
    /// uniform draw.
    ///
    /// [`draw`](Self::draw) samples both from the chain's own generator; this
    /// entry point exposes the deterministic accept/reject core so fixtures
    /// can script the exact random sequence.
    pub fn advance(&mut self, offset: f64, u: f64) -> Result<(SampleRecord, Progress), SamplerError> {
        let proposed_rate = self.state.rate + offset;
        let (log_likelihood, log_prior) = self.evaluate_proposal(proposed_rate)?;
        let alpha = acceptance_probability(self.state.log_posterior(), log_likelihood + log_prior);
        let accepted = u < alpha;
        if accepted {
            self.state = ChainState {
                rate: proposed_rate,
                log_likelihood,
                log_prior,
            };
            self.accept_count += 1;
        }
        self.draw_count += 1;

        let record = SampleRecord {
            iteration: self.draw_count,
            rate: self.state.rate,
            log_likelihood: self.state.log_likelihood,
            log_prior: self.state.log_prior,
            accepted,
        };
        let progress = Progress {
            draw: self.draw_count,
            chain: self.chain,
            accepted,
            acceptance_rate: self.accept_count as f64 / self.draw_count as f64,
        };
        Ok((record, progress))
    }

    /// Evaluate a proposal's log-likelihood and log-prior.
    ///
    /// Proposals outside the positive rate domain or outside prior support
    /// have zero density; the likelihood oracle is never consulted for them.
    fn evaluate_proposal(&self, rate: f64) -> Result<(f64, f64), SamplerError> {
        if rate <= 0. || !rate.is_finite() {
            return Ok((f64::NEG_INFINITY, f64::NEG_INFINITY));
        }
        let log_prior = self.prior.log_density(rate);
        if log_prior == f64::NEG_INFINITY {
            return Ok((f64::NEG_INFINITY, log_prior));
        }
        let log_likelihood = evaluate(&self.likelihood, rate)?;
        Ok((log_likelihood, log_prior))
    }
}

fn evaluate<L: RateLikelihood>(likelihood: &L, rate: f64) -> Result<f64, SamplerError> {
    match likelihood.log_likelihood(rate) {
        // NaN and +inf have no posterior interpretation; treat them as zero
        // likelihood so the proposal is rejected.
        Ok(value) if value.is_nan() || value == f64::INFINITY => Ok(f64::NEG_INFINITY),
        Ok(value) => Ok(value),
        Err(err) if err.is_recoverable() => Ok(f64::NEG_INFINITY),
        Err(err) => Err(SamplerError::OracleFailure(Box::new(err))),
    }
}

/// `min(1, exp(proposed - current))`, with zero-density proposals always
/// rejected regardless of the current state.
pub(crate) fn acceptance_probability(current: f64, proposed: f64) -> f64 {
    if proposed == f64::NEG_INFINITY {
        return 0.;
    }
    let log_ratio = proposed - current;
    if log_ratio >= 0. {
        1.
    } else {
        log_ratio.exp()
    }
}
