//! End-to-end runs over the sample employee export in `data/`.

use std::collections::HashSet;

use payroll_compute::{AnomalyError, FeatureScaling, Pipeline, PipelineConfig, DEFAULT_RANK};
use payroll_core::{JsonFileSource, RecordSource};

/// Integration tests run from the crate directory, so we go up two levels.
fn sample_path() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/employees.json")
}

fn load_sample() -> Vec<payroll_core::EmployeeRecord> {
    JsonFileSource::new(sample_path())
        .load()
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", sample_path().display(), e))
}

#[test]
fn scores_every_sample_record_once() {
    let records = load_sample();
    let results = Pipeline::new().run(&records, DEFAULT_RANK).unwrap();

    assert_eq!(results.len(), records.len());
    let ids: HashSet<_> = results.iter().map(|r| r.id).collect();
    let expected: HashSet<_> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, expected);

    for r in &results {
        assert!(r.score.is_finite() && r.score >= 0.0, "id {} score {}", r.id, r.score);
    }
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn overpaid_clerk_outranks_other_clerks() {
    let records = load_sample();
    let results = Pipeline::new().run(&records, DEFAULT_RANK).unwrap();

    let clerks: Vec<_> = records
        .iter()
        .filter(|r| r.job_id == "ST_CLERK")
        .map(|r| r.id)
        .collect();
    let first_clerk = results
        .iter()
        .find(|r| clerks.contains(&r.id))
        .map(|r| r.id);
    assert_eq!(first_clerk, Some(207));
}

#[test]
fn sample_fit_reports_vocabulary_and_dimension() {
    let records = load_sample();
    let (_, metrics) = Pipeline::new()
        .run_with_metrics(&records, DEFAULT_RANK)
        .unwrap();

    // 4 numeric columns plus one column per distinct job role.
    assert_eq!(metrics.vocabulary_size, 12);
    assert_eq!(metrics.dim, 16);
    assert_eq!(metrics.records, 27);
}

#[test]
fn standardized_scaling_also_singles_out_the_overpaid_clerk() {
    let pipeline = Pipeline::with_config(PipelineConfig {
        scaling: FeatureScaling::Standardize,
        ..PipelineConfig::default()
    });
    let records = load_sample();
    let results = pipeline.run(&records, DEFAULT_RANK).unwrap();
    assert_eq!(results.len(), 27);

    let first_clerk = results
        .iter()
        .find(|r| matches!(r.id, 141..=144 | 207))
        .map(|r| r.id);
    assert_eq!(first_clerk, Some(207));
}

#[test]
fn rank_above_feature_dimension_is_rejected() {
    let records = load_sample();
    // D = 16 is below n - 1 = 26, so the feature dimension is the limit.
    assert!(Pipeline::new().run(&records, 16).is_ok());
    let err = Pipeline::new().run(&records, 17).unwrap_err();
    assert_eq!(err, AnomalyError::InvalidRank { rank: 17, max: 16 });
}
