//! End-to-end run: simulate data, sample the posterior, reconstruct states.

use anyhow::Result;
use approx::assert_abs_diff_eq;
use arrow::array::Array;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ratewalk::{
    sample_rate, simulate_tip_states, summarize, AncestralOracle, Histogram, Prior,
    SamplerSettings, Tree, TwoStateLikelihood,
};

fn balanced_newick(depth: u32) -> String {
    fn subtree(depth: u32, next_tip: &mut u32) -> String {
        if depth == 0 {
            *next_tip += 1;
            format!("T{}:0.5", next_tip)
        } else {
            format!(
                "({},{}):0.5",
                subtree(depth - 1, next_tip),
                subtree(depth - 1, next_tip)
            )
        }
    }
    let mut next_tip = 0;
    format!("{};", subtree(depth, &mut next_tip))
}

fn simulated_dataset(true_rate: f64) -> Result<TwoStateLikelihood> {
    let tree = Tree::from_newick(&balanced_newick(4))?;
    let mut rng = SmallRng::seed_from_u64(2024);
    let states = simulate_tip_states(&tree, true_rate, &mut rng)?;
    Ok(TwoStateLikelihood::new(tree, &states)?)
}

fn settings() -> SamplerSettings {
    SamplerSettings {
        num_draws: 3000,
        initial_rate: 1.,
        proposal_width: 0.4,
        num_chains: 4,
        seed: 31,
    }
}

#[test]
fn posterior_lands_in_a_sane_region() -> Result<()> {
    let likelihood = simulated_dataset(0.5)?;
    let prior = Prior::uniform(0., 10.)?;
    let traces = sample_rate(&likelihood, &prior, &settings())?;
    assert_eq!(traces.len(), 4);

    for trace in &traces {
        assert_eq!(trace.len(), 3000);
        let summary = summarize(trace).expect("non-empty trace");
        // 16 simulated tips at q = 0.5: the posterior is diffuse but far from
        // both the origin and the prior's upper tail.
        assert!(summary.mean > 0.01, "mean {}", summary.mean);
        assert!(summary.mean < 5., "mean {}", summary.mean);
        assert!(summary.q025 < summary.median && summary.median < summary.q975);
        assert!(summary.std_dev > 0.);
        assert!(summary.acceptance_rate > 0. && summary.acceptance_rate < 1.);
    }
    Ok(())
}

#[test]
fn reruns_fully_replace_and_reproduce() -> Result<()> {
    let likelihood = simulated_dataset(0.5)?;
    let prior = Prior::exponential(1.)?;
    let first = sample_rate(&likelihood, &prior, &settings())?;
    let second = sample_rate(&likelihood, &prior, &settings())?;
    assert_eq!(first, second);

    // A different seed is a genuinely different run.
    let reseeded = sample_rate(
        &likelihood,
        &prior,
        &SamplerSettings {
            seed: 32,
            ..settings()
        },
    )?;
    assert_ne!(first, reseeded);
    Ok(())
}

#[test]
fn trace_exports_columnar_records() -> Result<()> {
    let likelihood = simulated_dataset(0.5)?;
    let prior = Prior::exponential(1.)?;
    let config = SamplerSettings {
        num_draws: 100,
        num_chains: 1,
        ..settings()
    };
    let traces = sample_rate(&likelihood, &prior, &config)?;
    let array = traces[0].to_struct_array();
    assert_eq!(array.len(), 100);
    assert_eq!(array.num_columns(), 5);
    assert_eq!(traces[0].table().len(), 25);
    Ok(())
}

#[test]
fn histogram_covers_the_sampled_rates() -> Result<()> {
    let likelihood = simulated_dataset(0.5)?;
    let prior = Prior::exponential(1.)?;
    let traces = sample_rate(&likelihood, &prior, &settings())?;
    let pooled: Vec<f64> = traces.iter().flat_map(|t| t.rates()).collect();
    let hist = Histogram::from_values(&pooled, 40).expect("non-empty sample");
    assert_eq!(hist.counts().iter().sum::<u64>() as usize, pooled.len());
    let width = hist.edges()[1] - hist.edges()[0];
    let mass: f64 = hist.densities().iter().map(|d| d * width).sum();
    assert_abs_diff_eq!(mass, 1., epsilon = 1e-9);
    Ok(())
}

#[test]
fn ancestral_states_follow_each_sampled_rate() -> Result<()> {
    let likelihood = simulated_dataset(0.5)?;
    let prior = Prior::exponential(1.)?;
    let config = SamplerSettings {
        num_draws: 20,
        num_chains: 1,
        ..settings()
    };
    let traces = sample_rate(&likelihood, &prior, &config)?;

    // The interactive display recomputes the pies for the current sample.
    for record in traces[0].records() {
        let marginals = likelihood.marginal_states(record.rate)?;
        assert_eq!(marginals.len(), likelihood.tree().n_nodes());
        for probs in marginals {
            assert_abs_diff_eq!(probs[0] + probs[1], 1., epsilon = 1e-9);
        }
    }
    Ok(())
}
