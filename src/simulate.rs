//! Simulation of binary trait evolution along a tree.
//!
//! The data generator for demonstrations and tests: a trait starts at the
//! root in an equilibrium-distributed state and evolves tip-ward as a
//! two-state jump process. All randomness comes from the caller's generator,
//! so simulated datasets are reproducible from a seed.

use rand::Rng;
use rand_distr::{Distribution, Exp};
use thiserror::Error;

use crate::tree::Tree;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("simulation rate must be non-negative and finite, got {0}")]
    InvalidRate(f64),
}

/// A realized trait history: the state at every node and the number of state
/// flips on the branch above it.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitHistory {
    pub node_states: Vec<u8>,
    pub flips: Vec<u32>,
}

impl TraitHistory {
    /// The observable part of the history, in the tree's tip order.
    pub fn tip_states(&self, tree: &Tree) -> Vec<u8> {
        tree.tips().iter().map(|&tip| self.node_states[tip]).collect()
    }
}

/// Evolve a binary trait along `tree` at `rate`.
///
/// Each branch runs the symmetric jump process explicitly: exponential
/// waiting times between flips until the branch length is exhausted. A zero
/// rate freezes the trait at the root state.
pub fn simulate_history<R: Rng + ?Sized>(
    tree: &Tree,
    rate: f64,
    rng: &mut R,
) -> Result<TraitHistory, SimulationError> {
    if !rate.is_finite() || rate < 0. {
        return Err(SimulationError::InvalidRate(rate));
    }
    let mut node_states = vec![0u8; tree.n_nodes()];
    let mut flips = vec![0u32; tree.n_nodes()];
    node_states[tree.root()] = rng.random_bool(0.5) as u8;

    let waiting_time = (rate > 0.)
        .then(|| Exp::new(rate))
        .transpose()
        .map_err(|_| SimulationError::InvalidRate(rate))?;

    for node in tree.preorder() {
        for &child in tree.children(node) {
            let mut state = node_states[node];
            let mut count = 0u32;
            if let Some(waiting_time) = &waiting_time {
                let length = tree.branch_length(child);
                let mut elapsed = waiting_time.sample(rng);
                while elapsed < length {
                    state ^= 1;
                    count += 1;
                    elapsed += waiting_time.sample(rng);
                }
            }
            node_states[child] = state;
            flips[child] = count;
        }
    }
    Ok(TraitHistory { node_states, flips })
}

/// Simulate a history and keep only the tip observations.
pub fn simulate_tip_states<R: Rng + ?Sized>(
    tree: &Tree,
    rate: f64,
    rng: &mut R,
) -> Result<Vec<u8>, SimulationError> {
    Ok(simulate_history(tree, rate, rng)?.tip_states(tree))
}
