//! Likelihood of binary trait observations under a symmetric two-state model.
//!
//! The transition rate is constrained symmetric (q01 = q10 = q), so the
//! 2x2 transition matrix has the closed form
//! `P(stay, t) = 1/2 + 1/2 exp(-2qt)`, `P(flip, t) = 1/2 - 1/2 exp(-2qt)`
//! with equilibrium frequencies `[1/2, 1/2]`. The likelihood of the tip data
//! is computed by Felsenstein pruning with per-node rescaling, so deep trees
//! and extreme rates stay inside f64 range.

use thiserror::Error;

use crate::math::logaddexp;
use crate::model::{LikelihoodError, RateLikelihood};
use crate::tree::Tree;

/// Probability that the trait is in the same state after time `t`.
pub fn stay_probability(rate: f64, t: f64) -> f64 {
    0.5 + 0.5 * (-2. * rate * t).exp()
}

/// Probability that the trait has switched state after time `t`.
pub fn flip_probability(rate: f64, t: f64) -> f64 {
    0.5 - 0.5 * (-2. * rate * t).exp()
}

pub(crate) const EQUILIBRIUM: [f64; 2] = [0.5, 0.5];

/// Trait data that does not fit the tree.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DataError {
    #[error("expected {expected} tip states, got {actual}")]
    TipCountMismatch { expected: usize, actual: usize },
    #[error("tip state at position {index} must be 0 or 1, got {value}")]
    InvalidState { index: usize, value: u8 },
}

/// Evaluation errors. Construction validates the data, so evaluating a rate
/// cannot fail; the sampler still requires the error type.
#[derive(Error, Debug)]
pub enum PruningError {}

impl LikelihoodError for PruningError {
    fn is_recoverable(&self) -> bool {
        true
    }
}

/// The fixed tree-plus-observations half of the model.
///
/// Built once per dataset and shared immutably by every chain and by the
/// ancestral reconstruction; only the rate varies between evaluations.
#[derive(Debug, Clone)]
pub struct TwoStateLikelihood {
    tree: Tree,
    tip_states: Vec<u8>,
    postorder: Vec<usize>,
    observed: Vec<Option<u8>>,
}

impl TwoStateLikelihood {
    /// Pair a tree with tip observations, given in the tree's tip order.
    pub fn new(tree: Tree, tip_states: &[u8]) -> Result<Self, DataError> {
        let tips = tree.tips();
        if tip_states.len() != tips.len() {
            return Err(DataError::TipCountMismatch {
                expected: tips.len(),
                actual: tip_states.len(),
            });
        }
        let mut observed = vec![None; tree.n_nodes()];
        for (index, (&tip, &state)) in tips.iter().zip(tip_states).enumerate() {
            if state > 1 {
                return Err(DataError::InvalidState {
                    index,
                    value: state,
                });
            }
            observed[tip] = Some(state);
        }
        let postorder = tree.postorder();
        Ok(TwoStateLikelihood {
            tree,
            tip_states: tip_states.to_vec(),
            postorder,
            observed,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tip_states(&self) -> &[u8] {
        &self.tip_states
    }

    pub(crate) fn observed_state(&self, node: usize) -> Option<u8> {
        self.observed[node]
    }

    /// Conditional likelihoods of the data below each node, given the node's
    /// state, rescaled per node. Returns the conditionals and the summed log
    /// of the scale factors taken out.
    pub(crate) fn conditionals(&self, rate: f64) -> (Vec<[f64; 2]>, f64) {
        let mut cond = vec![[1., 1.]; self.tree.n_nodes()];
        for (node, observed) in self.observed.iter().enumerate() {
            if let Some(state) = observed {
                cond[node] = if *state == 1 { [0., 1.] } else { [1., 0.] };
            }
        }

        let mut log_scale = 0.;
        for &node in &self.postorder {
            if self.tree.is_tip(node) {
                continue;
            }
            for &child in self.tree.children(node) {
                let t = self.tree.branch_length(child);
                let stay = stay_probability(rate, t);
                let flip = flip_probability(rate, t);
                let down = cond[child];
                let contrib = [
                    stay * down[0] + flip * down[1],
                    flip * down[0] + stay * down[1],
                ];
                cond[node][0] *= contrib[0];
                cond[node][1] *= contrib[1];
            }
            let scale = cond[node][0].max(cond[node][1]);
            if scale > 0. {
                cond[node][0] /= scale;
                cond[node][1] /= scale;
                log_scale += scale.ln();
            }
        }
        (cond, log_scale)
    }

    /// Log-likelihood of the tip data at `rate`; negative infinity outside
    /// the positive rate domain or for data the model cannot produce.
    pub fn log_likelihood_at(&self, rate: f64) -> f64 {
        if !rate.is_finite() || rate <= 0. {
            return f64::NEG_INFINITY;
        }
        let (cond, log_scale) = self.conditionals(rate);
        let root = cond[self.tree.root()];
        // ln(0) collapses to -inf here, so data the model cannot produce
        // comes out as zero likelihood rather than a panic or NaN.
        let root_log_likelihood = logaddexp(
            EQUILIBRIUM[0].ln() + root[0].ln(),
            EQUILIBRIUM[1].ln() + root[1].ln(),
        );
        root_log_likelihood + log_scale
    }
}

impl RateLikelihood for TwoStateLikelihood {
    type Error = PruningError;

    fn log_likelihood(&self, rate: f64) -> Result<f64, PruningError> {
        Ok(self.log_likelihood_at(rate))
    }
}
