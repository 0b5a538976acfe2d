//! Estimate the transition rate of a binary trait on a phylogenetic tree.
//!
//! A teaching-oriented Bayesian setup: a single symmetric transition rate
//! (q01 = q10 = q) governs trait evolution on a fixed tree, a user-selected
//! prior goes in, and a random-walk Metropolis-Hastings chain samples the
//! posterior over the rate. Ancestral states can be reconstructed at any
//! sampled rate for tree-plot overlays.
//!
//! The sampler only sees the likelihood through the [`RateLikelihood`] trait,
//! so any rate-to-log-likelihood oracle works; [`TwoStateLikelihood`] is the
//! built-in one. All randomness is seeded and per-chain, making every run
//! exactly reproducible.
//!
//! ```
//! use ratewalk::{
//!     sample_rate, AncestralOracle, Prior, SamplerSettings, Tree, TwoStateLikelihood,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let tree = Tree::from_newick("((A:1,B:1):0.5,(C:1,D:1):0.5);")?;
//!     let likelihood = TwoStateLikelihood::new(tree, &[0, 0, 1, 1])?;
//!     let prior = Prior::from_family("exponential", &[2.0])?;
//!
//!     let settings = SamplerSettings {
//!         num_draws: 500,
//!         initial_rate: 0.5,
//!         seed: 1,
//!         ..Default::default()
//!     };
//!     let traces = sample_rate(&likelihood, &prior, &settings)?;
//!     assert_eq!(traces[0].len(), 500);
//!
//!     let last_rate = traces[0].records().last().unwrap().rate;
//!     let states = likelihood.marginal_states(last_rate)?;
//!     assert_eq!(states.len(), likelihood.tree().n_nodes());
//!     Ok(())
//! }
//! ```

pub(crate) mod asr;
pub(crate) mod chain;
pub(crate) mod math;
pub(crate) mod model;
pub(crate) mod prior;
pub(crate) mod pruning;
pub(crate) mod sampler;
pub(crate) mod simulate;
pub(crate) mod stats;
pub(crate) mod trace;
pub(crate) mod tree;

pub use chain::{ChainState, Progress, RateChain};
pub use model::{AncestralOracle, LikelihoodError, RateLikelihood};
pub use prior::{Prior, PriorError};
pub use pruning::{
    flip_probability, stay_probability, DataError, PruningError, TwoStateLikelihood,
};
pub use sampler::{
    sample_rate, sample_sequentially, SamplerError, SamplerSettings, MAX_DRAWS,
    MAX_INITIAL_RATE, MAX_PROPOSAL_WIDTH, MIN_INITIAL_RATE,
};
pub use simulate::{simulate_history, simulate_tip_states, SimulationError, TraitHistory};
pub use stats::{summarize, Histogram, PosteriorSummary};
pub use trace::{RateTrace, SampleRecord, TraceBuilder, DEFAULT_TABLE_ROWS};
pub use tree::{Tree, TreeError};
