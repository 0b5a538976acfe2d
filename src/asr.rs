//! Marginal ancestral state reconstruction.
//!
//! For a fixed rate, the marginal probability of each node's state combines
//! the conditional likelihood of the data below the node (the pruning pass)
//! with the likelihood of everything outside its subtree, accumulated
//! root-to-tips. Per-node normalization keeps the partials scaled; only the
//! normalized marginals are observable.

use anyhow::{ensure, Result};

use crate::math::normalize2;
use crate::model::AncestralOracle;
use crate::pruning::{flip_probability, stay_probability, TwoStateLikelihood, EQUILIBRIUM};

impl TwoStateLikelihood {
    fn reconstruct(&self, rate: f64) -> Vec<[f64; 2]> {
        let tree = self.tree();
        let (cond, _) = self.conditionals(rate);
        let mut outside = vec![[0.; 2]; tree.n_nodes()];
        outside[tree.root()] = EQUILIBRIUM;

        for node in tree.preorder() {
            let children = tree.children(node);
            // Message each child subtree sends the parent, indexed by the
            // parent's state.
            let messages: Vec<[f64; 2]> = children
                .iter()
                .map(|&child| {
                    let t = tree.branch_length(child);
                    let stay = stay_probability(rate, t);
                    let flip = flip_probability(rate, t);
                    [
                        stay * cond[child][0] + flip * cond[child][1],
                        flip * cond[child][0] + stay * cond[child][1],
                    ]
                })
                .collect();

            for (i, &child) in children.iter().enumerate() {
                let mut above = outside[node];
                for (j, message) in messages.iter().enumerate() {
                    if i != j {
                        above[0] *= message[0];
                        above[1] *= message[1];
                    }
                }
                let t = tree.branch_length(child);
                let stay = stay_probability(rate, t);
                let flip = flip_probability(rate, t);
                outside[child] = normalize2([
                    stay * above[0] + flip * above[1],
                    flip * above[0] + stay * above[1],
                ]);
            }
        }

        (0..tree.n_nodes())
            .map(|node| normalize2([outside[node][0] * cond[node][0], outside[node][1] * cond[node][1]]))
            .collect()
    }
}

impl AncestralOracle for TwoStateLikelihood {
    fn marginal_states(&self, rate: f64) -> Result<Vec<[f64; 2]>> {
        ensure!(
            rate.is_finite() && rate > 0.,
            "rate must be positive and finite, got {rate}"
        );
        Ok(self.reconstruct(rate))
    }
}
