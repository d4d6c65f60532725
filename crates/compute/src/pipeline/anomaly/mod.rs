//! Reconstruction-residual anomaly scoring.
//!
//! A vector is centered, projected onto the fitted subspace, projected back
//! to full dimension, and scored by the Euclidean norm of what the subspace
//! failed to explain.
//!
//! Sub-modules:
//! - [`population`]: column statistics and pre-fit scaling

pub mod population;

use nalgebra::DVector;
use payroll_core::EmployeeId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithms::subspace::SubspaceBasis;
use crate::error::AnomalyError;

pub use population::{compute_population_stddevs, FeatureScaling, Standardizer};

/// One scored record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub id: EmployeeId,
    /// Residual norm, always >= 0.
    pub score: f64,
}

impl AnomalyResult {
    pub fn is_anomalous(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

/// Sort by descending score, ties by ascending id.
pub fn sort_results(results: &mut [AnomalyResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
}

/// Scores vectors against a fitted [`SubspaceBasis`].
pub struct AnomalyScorer;

impl AnomalyScorer {
    /// Residual between a vector and its reconstruction from the subspace.
    pub fn residual<V: AsRef<[f64]> + ?Sized>(
        vector: &V,
        basis: &SubspaceBasis,
    ) -> Result<DVector<f64>, AnomalyError> {
        let values = vector.as_ref();
        if values.len() != basis.dim() {
            return Err(AnomalyError::DimensionMismatch {
                expected: basis.dim(),
                actual: values.len(),
            });
        }

        let centered = DVector::from_column_slice(values) - basis.mean_vector();
        let coords = basis.components() * &centered;
        let reconstruction = basis.components().transpose() * coords;
        Ok(centered - reconstruction)
    }

    /// Euclidean norm of the reconstruction residual.
    pub fn score<V: AsRef<[f64]> + ?Sized>(
        vector: &V,
        basis: &SubspaceBasis,
    ) -> Result<f64, AnomalyError> {
        let residual = Self::residual(vector, basis)?;
        Ok(residual.norm().max(0.0))
    }

    /// Score a batch in parallel; output order matches input order.
    pub fn score_all<V: AsRef<[f64]> + Sync>(
        vectors: &[V],
        basis: &SubspaceBasis,
    ) -> Result<Vec<f64>, AnomalyError> {
        vectors.par_iter().map(|v| Self::score(v, basis)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::subspace::SubspaceModel;

    fn batch() -> Vec<Vec<f64>> {
        vec![
            vec![2.0, 0.5, 7.0],
            vec![1.0, 3.5, 2.0],
            vec![4.0, 1.5, 0.5],
            vec![0.0, 2.0, 3.0],
            vec![3.0, 2.5, 2.5],
        ]
    }

    #[test]
    fn mean_vector_scores_zero() {
        let data = batch();
        for rank in 1..=3 {
            let basis = SubspaceModel::fit(&data, rank).unwrap();
            let mean = basis.mean().to_vec();
            let score = AnomalyScorer::score(&mean, &basis).unwrap();
            assert!(score.abs() < 1e-12, "rank {}: score = {}", rank, score);
        }
    }

    #[test]
    fn vector_inside_subspace_scores_zero() {
        let data = batch();
        let basis = SubspaceModel::fit(&data, 2).unwrap();
        let along: Vec<f64> = basis
            .mean()
            .iter()
            .zip(basis.component(0).unwrap())
            .zip(basis.component(1).unwrap())
            .map(|((m, a), b)| m + 3.0 * a - 2.0 * b)
            .collect();
        let score = AnomalyScorer::score(&along, &basis).unwrap();
        assert!(score < 1e-9, "score = {}", score);
    }

    #[test]
    fn residual_is_orthogonal_to_basis() {
        let data = batch();
        let basis = SubspaceModel::fit(&data, 2).unwrap();
        let residual = AnomalyScorer::residual(&[10.0, -4.0, 1.0], &basis).unwrap();
        let dots = basis.components() * &residual;
        assert!(dots.iter().all(|d| d.abs() < 1e-9), "dots = {:?}", dots);
    }

    #[test]
    fn score_is_non_negative_and_deterministic() {
        let data = batch();
        let basis = SubspaceModel::fit(&data, 1).unwrap();
        let probe = [9.0, 9.0, -9.0];
        let a = AnomalyScorer::score(&probe, &basis).unwrap();
        let b = AnomalyScorer::score(&probe, &basis).unwrap();
        assert!(a >= 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn full_rank_explains_everything() {
        let data = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![3.0, 2.0]];
        let basis = SubspaceModel::fit(&data, 2).unwrap();
        let score = AnomalyScorer::score(&[-50.0, 7.0], &basis).unwrap();
        assert!(score < 1e-9, "score = {}", score);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let basis = SubspaceModel::fit(&batch(), 1).unwrap();
        assert_eq!(
            AnomalyScorer::score(&[1.0, 2.0], &basis),
            Err(AnomalyError::DimensionMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn score_all_preserves_order() {
        let data = batch();
        let basis = SubspaceModel::fit(&data, 1).unwrap();
        let scores = AnomalyScorer::score_all(&data, &basis).unwrap();
        for (v, s) in data.iter().zip(&scores) {
            assert_eq!(AnomalyScorer::score(v, &basis).unwrap(), *s);
        }
    }

    #[test]
    fn sort_orders_by_score_then_id() {
        let mut results = vec![
            AnomalyResult { id: 3, score: 1.0 },
            AnomalyResult { id: 1, score: 2.5 },
            AnomalyResult { id: 2, score: 1.0 },
            AnomalyResult { id: 0, score: 0.0 },
        ];
        sort_results(&mut results);
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 0]);
    }

    #[test]
    fn threshold_is_strict() {
        let r = AnomalyResult { id: 1, score: 2.0 };
        assert!(!r.is_anomalous(2.0));
        assert!(r.is_anomalous(1.999));
    }
}
