//! Anomaly pipeline orchestrator.
//!
//! Wires the stages into a single synchronous batch run:
//!
//! - **Encode**: build the role vocabulary, encode every record (parallel).
//! - **Scale**: per-column scale factors; identity unless standardization is
//!   switched on.
//! - **Fit**: centre and decompose into a rank-k [`SubspaceBasis`].
//! - **Score**: residual norm per record (parallel), sorted for reporting.
//!
//! Vocabulary, scaler and basis live in a [`FittedModel`] owned by the caller
//! for the duration of one run; nothing is cached between runs.

pub mod anomaly;
pub mod features;
pub mod metrics;

use std::time::Instant;

use payroll_core::EmployeeRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::algorithms::subspace::{SubspaceBasis, SubspaceModel};
use crate::error::AnomalyError;

use self::anomaly::{sort_results, AnomalyResult, AnomalyScorer, FeatureScaling, Standardizer};
use self::features::{EncoderOptions, FeatureEncoder, RoleVocabulary};
use self::metrics::RunMetrics;

/// Rank used when the caller does not choose one.
pub const DEFAULT_RANK: usize = 3;

/// Default upper bound on records per run.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100_000;

/// Pipeline options, typically built from env config or CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub scaling: FeatureScaling,
    #[serde(default)]
    pub encoder: EncoderOptions,
    /// Batches larger than this are rejected before fitting.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_max_batch_size() -> usize { DEFAULT_MAX_BATCH_SIZE }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scaling: FeatureScaling::default(),
            encoder: EncoderOptions::default(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Everything fitted from one batch. Immutable once built.
#[derive(Debug, Clone)]
pub struct FittedModel {
    encoder: FeatureEncoder,
    vocabulary: RoleVocabulary,
    scaler: Standardizer,
    basis: SubspaceBasis,
}

impl FittedModel {
    pub fn vocabulary(&self) -> &RoleVocabulary {
        &self.vocabulary
    }

    pub fn scaler(&self) -> &Standardizer {
        &self.scaler
    }

    pub fn basis(&self) -> &SubspaceBasis {
        &self.basis
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.encoder.feature_names(&self.vocabulary)
    }

    /// Encode and scale a record the same way the fitting batch was.
    pub fn transform(&self, record: &EmployeeRecord) -> Result<Vec<f64>, AnomalyError> {
        let encoded = self.encoder.encode(record, &self.vocabulary);
        self.scaler.apply(encoded.as_slice())
    }

    /// Score a single record, which need not have been in the fitting batch.
    /// Roles unseen at fit time get an all-zero role block.
    pub fn score_record(&self, record: &EmployeeRecord) -> Result<f64, AnomalyError> {
        AnomalyScorer::score(&self.transform(record)?, &self.basis)
    }

    /// Score records against this model and return them in report order.
    pub fn score_records(&self, records: &[EmployeeRecord]) -> Result<Vec<AnomalyResult>, AnomalyError> {
        let mut results = records
            .par_iter()
            .map(|rec| {
                self.score_record(rec)
                    .map(|score| AnomalyResult { id: rec.id, score })
            })
            .collect::<Result<Vec<_>, _>>()?;
        sort_results(&mut results);
        Ok(results)
    }
}

/// Stateless batch pipeline: encode → scale → fit → score.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fit a model over `records` at the given rank.
    pub fn fit(&self, records: &[EmployeeRecord], rank: usize) -> Result<FittedModel, AnomalyError> {
        self.fit_batch(records, rank, None).map(|(model, _)| model)
    }

    /// Score every record of the batch against a basis fitted on that batch.
    ///
    /// Results are sorted by descending score, ties by ascending id. On any
    /// error nothing is returned.
    pub fn run(&self, records: &[EmployeeRecord], rank: usize) -> Result<Vec<AnomalyResult>, AnomalyError> {
        self.run_with_metrics(records, rank).map(|(results, _)| results)
    }

    /// Like [`Pipeline::run`], also returning stage timings.
    pub fn run_with_metrics(
        &self,
        records: &[EmployeeRecord],
        rank: usize,
    ) -> Result<(Vec<AnomalyResult>, RunMetrics), AnomalyError> {
        let mut metrics = RunMetrics::new(records.len(), rank);
        let (model, vectors) = self.fit_batch(records, rank, Some(&mut metrics))?;

        let start = Instant::now();
        let scores = AnomalyScorer::score_all(&vectors, model.basis())?;
        let mut results: Vec<AnomalyResult> = records
            .iter()
            .zip(scores)
            .map(|(rec, score)| AnomalyResult { id: rec.id, score })
            .collect();
        sort_results(&mut results);
        metrics.record_score(start.elapsed());
        metrics.finish();

        info!(
            run_id = %metrics.run_id,
            records = metrics.records,
            dim = metrics.dim,
            rank = metrics.rank,
            explained_variance_ratio = metrics.explained_variance_ratio,
            total_ms = metrics.total_ms(),
            "anomaly run complete"
        );

        Ok((results, metrics))
    }

    /// Shared fit path; also returns the scaled training vectors so a run
    /// does not encode twice.
    fn fit_batch(
        &self,
        records: &[EmployeeRecord],
        rank: usize,
        mut metrics: Option<&mut RunMetrics>,
    ) -> Result<(FittedModel, Vec<Vec<f64>>), AnomalyError> {
        let vocabulary = RoleVocabulary::build(records)?;
        if records.len() > self.config.max_batch_size {
            return Err(AnomalyError::BatchTooLarge {
                size: records.len(),
                max: self.config.max_batch_size,
            });
        }

        let start = Instant::now();
        let encoder = FeatureEncoder::new(self.config.encoder);
        let encoded: Vec<Vec<f64>> = records
            .par_iter()
            .map(|rec| encoder.encode(rec, &vocabulary).into_inner())
            .collect();
        let scaler = Standardizer::fit(&encoded, self.config.scaling)?;
        let vectors = encoded
            .iter()
            .map(|v| scaler.apply(v))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(m) = metrics.as_deref_mut() {
            m.record_encode(start.elapsed());
            m.dim = scaler.dim();
            m.vocabulary_size = vocabulary.len();
        }

        debug!(
            records = records.len(),
            dim = scaler.dim(),
            roles = vocabulary.len(),
            scaling = %self.config.scaling,
            "batch encoded"
        );

        let start = Instant::now();
        let basis = SubspaceModel::fit(&vectors, rank)?;
        let fit_elapsed = start.elapsed();
        if let Some(m) = metrics {
            m.record_fit(fit_elapsed);
            m.explained_variance_ratio = basis.explained_variance_ratio();
        }

        debug!(
            rank,
            singular_values = ?basis.singular_values(),
            fit_ms = fit_elapsed.as_secs_f64() * 1000.0,
            "basis fitted"
        );

        let model = FittedModel {
            encoder,
            vocabulary,
            scaler,
            basis,
        };
        Ok((model, vectors))
    }
}
