//! The chain's output: ordered sample records, plus columnar export.
//!
//! A [`RateTrace`] is the complete record of one chain run. Insertion order is
//! the trace; presentation layers read it either directly (tabular prefix,
//! trace-plot projection) or as an Arrow [`StructArray`] built with
//! [`TraceBuilder`].

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, StructArray, UInt64Builder};
use arrow::datatypes::{DataType, Field, FieldRef};

/// Default number of leading records shown in tabular output.
pub const DEFAULT_TABLE_ROWS: usize = 25;

/// One iteration of the chain, recorded after the accept/reject decision.
///
/// Rejected iterations repeat the previous state, so a trace always has one
/// record per iteration. Iteration indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub iteration: u64,
    pub rate: f64,
    pub log_likelihood: f64,
    pub log_prior: f64,
    /// Whether this iteration's proposal was accepted.
    pub accepted: bool,
}

impl SampleRecord {
    pub fn log_posterior(&self) -> f64 {
        self.log_likelihood + self.log_prior
    }
}

/// The ordered sample sequence produced by one chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateTrace {
    chain: u64,
    records: Vec<SampleRecord>,
}

impl RateTrace {
    pub(crate) fn with_capacity(chain: u64, capacity: usize) -> Self {
        RateTrace {
            chain,
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    pub fn chain(&self) -> u64 {
        self.chain
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Sampled rate values in iteration order.
    pub fn rates(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.rate)
    }

    /// `(iteration, rate)` pairs for trace plots.
    pub fn trace_points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.records.iter().map(|r| (r.iteration, r.rate))
    }

    /// The first `rows` records, for tabular display.
    pub fn head(&self, rows: usize) -> &[SampleRecord] {
        &self.records[..rows.min(self.records.len())]
    }

    /// The first [`DEFAULT_TABLE_ROWS`] records.
    pub fn table(&self) -> &[SampleRecord] {
        self.head(DEFAULT_TABLE_ROWS)
    }

    pub fn accepted_count(&self) -> usize {
        self.records.iter().filter(|r| r.accepted).count()
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.;
        }
        self.accepted_count() as f64 / self.records.len() as f64
    }

    /// Export the full sequence as a columnar record batch.
    pub fn to_struct_array(&self) -> StructArray {
        let mut builder = TraceBuilder::with_capacity(self.records.len());
        for record in &self.records {
            builder.append_value(record);
        }
        builder.finalize()
    }
}

/// Incremental columnar builder for sample records.
///
/// `finalize` consumes the builder; `inspect` snapshots the data accumulated
/// so far without ending the run.
pub struct TraceBuilder {
    iterations: UInt64Builder,
    rates: Float64Builder,
    log_likelihoods: Float64Builder,
    log_priors: Float64Builder,
    accepted: BooleanBuilder,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TraceBuilder {
            iterations: UInt64Builder::with_capacity(capacity),
            rates: Float64Builder::with_capacity(capacity),
            log_likelihoods: Float64Builder::with_capacity(capacity),
            log_priors: Float64Builder::with_capacity(capacity),
            accepted: BooleanBuilder::with_capacity(capacity),
        }
    }

    pub fn append_value(&mut self, record: &SampleRecord) {
        self.iterations.append_value(record.iteration);
        self.rates.append_value(record.rate);
        self.log_likelihoods.append_value(record.log_likelihood);
        self.log_priors.append_value(record.log_prior);
        self.accepted.append_value(record.accepted);
    }

    fn fields() -> [FieldRef; 5] {
        [
            Arc::new(Field::new("iteration", DataType::UInt64, false)),
            Arc::new(Field::new("rate", DataType::Float64, false)),
            Arc::new(Field::new("log_likelihood", DataType::Float64, false)),
            Arc::new(Field::new("log_prior", DataType::Float64, false)),
            Arc::new(Field::new("accepted", DataType::Boolean, false)),
        ]
    }

    pub fn finalize(mut self) -> StructArray {
        let [iteration, rate, log_likelihood, log_prior, accepted] = Self::fields();
        StructArray::from(vec![
            (iteration, Arc::new(self.iterations.finish()) as ArrayRef),
            (rate, Arc::new(self.rates.finish()) as ArrayRef),
            (log_likelihood, Arc::new(self.log_likelihoods.finish()) as ArrayRef),
            (log_prior, Arc::new(self.log_priors.finish()) as ArrayRef),
            (accepted, Arc::new(self.accepted.finish()) as ArrayRef),
        ])
    }

    pub fn inspect(&self) -> StructArray {
        let [iteration, rate, log_likelihood, log_prior, accepted] = Self::fields();
        StructArray::from(vec![
            (iteration, Arc::new(self.iterations.finish_cloned()) as ArrayRef),
            (rate, Arc::new(self.rates.finish_cloned()) as ArrayRef),
            (
                log_likelihood,
                Arc::new(self.log_likelihoods.finish_cloned()) as ArrayRef,
            ),
            (log_prior, Arc::new(self.log_priors.finish_cloned()) as ArrayRef),
            (accepted, Arc::new(self.accepted.finish_cloned()) as ArrayRef),
        ])
    }
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
