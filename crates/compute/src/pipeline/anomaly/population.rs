//! Population-level statistics over a batch of encoded vectors.
//!
//! Provides per-column deviation computation and the opt-in [`Standardizer`]
//! that rescales columns before the subspace fit.

use serde::{Deserialize, Serialize};

use crate::error::AnomalyError;

/// Columns with a deviation below this are treated as constant.
const MIN_SCALE: f64 = 1e-9;

/// How encoded columns are scaled before fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureScaling {
    /// Feed raw encoded values to the fit; the subspace only centres.
    #[default]
    None,
    /// Divide each column by its population standard deviation.
    Standardize,
}

impl std::str::FromStr for FeatureScaling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "raw" => Ok(FeatureScaling::None),
            "standardize" | "zscore" => Ok(FeatureScaling::Standardize),
            other => Err(format!("unknown scaling '{}', expected 'standardize' or 'none'", other)),
        }
    }
}

impl std::fmt::Display for FeatureScaling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureScaling::None => write!(f, "none"),
            FeatureScaling::Standardize => write!(f, "standardize"),
        }
    }
}

/// Population standard deviation per column.
///
/// Deviations are not floored; callers decide how to treat constant columns.
/// Rows must all have the same length.
pub fn compute_population_stddevs(rows: &[Vec<f64>]) -> Vec<f64> {
    if rows.is_empty() {
        return Vec::new();
    }

    let dim = rows[0].len();
    let n = rows.len() as f64;

    let mut means = vec![0.0; dim];
    for row in rows {
        for (m, x) in means.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in &mut means {
        *m /= n;
    }

    let mut variance = vec![0.0; dim];
    for row in rows {
        for ((v, x), m) in variance.iter_mut().zip(row).zip(&means) {
            let diff = x - m;
            *v += diff * diff;
        }
    }

    variance.iter().map(|v| (v / n).max(0.0).sqrt()).collect()
}

/// Per-column divisor fitted on one batch and applied to every vector scored
/// against that fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standardizer {
    scale: Vec<f64>,
}

impl Standardizer {
    /// Fit scale factors for `mode`. `None` yields an identity scaler.
    pub fn fit(rows: &[Vec<f64>], mode: FeatureScaling) -> Result<Self, AnomalyError> {
        if rows.is_empty() {
            return Err(AnomalyError::EmptyBatch);
        }
        let dim = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(AnomalyError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let scale = match mode {
            FeatureScaling::None => vec![1.0; dim],
            FeatureScaling::Standardize => compute_population_stddevs(rows)
                .into_iter()
                .map(|s| if s.is_finite() && s > MIN_SCALE { s } else { 1.0 })
                .collect(),
        };

        Ok(Self { scale })
    }

    pub fn dim(&self) -> usize {
        self.scale.len()
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn apply(&self, values: &[f64]) -> Result<Vec<f64>, AnomalyError> {
        if values.len() != self.scale.len() {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.scale.len(),
                actual: values.len(),
            });
        }
        Ok(values.iter().zip(&self.scale).map(|(x, s)| x / s).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_stddevs_basic() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let stddevs = compute_population_stddevs(&data);
        assert_eq!(stddevs.len(), 2);
        // Each column: sqrt(((1-2)^2 + (3-2)^2) / 2) = 1.0
        assert!((stddevs[0] - 1.0).abs() < 1e-10);
        assert!((stddevs[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn population_stddevs_empty() {
        assert!(compute_population_stddevs(&[]).is_empty());
    }

    #[test]
    fn default_scaling_leaves_columns_raw() {
        assert_eq!(FeatureScaling::default(), FeatureScaling::None);
        let data = vec![vec![4_000.0, 0.1], vec![40_000.0, 0.3]];
        let scaler = Standardizer::fit(&data, FeatureScaling::default()).unwrap();
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
    }

    #[test]
    fn standardize_uses_unit_scale_for_constant_columns() {
        let data = vec![vec![10.0, 1.0], vec![30.0, 1.0]];
        let scaler = Standardizer::fit(&data, FeatureScaling::Standardize).unwrap();
        assert_eq!(scaler.scale(), &[10.0, 1.0]);
        assert_eq!(scaler.apply(&[20.0, 1.0]).unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    fn none_scaling_is_identity() {
        let data = vec![vec![10.0, 1.0], vec![30.0, 5.0]];
        let scaler = Standardizer::fit(&data, FeatureScaling::None).unwrap();
        assert_eq!(scaler.apply(&[7.0, 3.0]).unwrap(), vec![7.0, 3.0]);
    }

    #[test]
    fn apply_rejects_wrong_dimension() {
        let scaler = Standardizer::fit(&[vec![1.0, 2.0]], FeatureScaling::None).unwrap();
        assert_eq!(
            scaler.apply(&[1.0]),
            Err(AnomalyError::DimensionMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn fit_rejects_ragged_rows() {
        let data = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            Standardizer::fit(&data, FeatureScaling::Standardize),
            Err(AnomalyError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn scaling_parses_from_str() {
        assert_eq!("NONE".parse::<FeatureScaling>(), Ok(FeatureScaling::None));
        assert_eq!("standardize".parse::<FeatureScaling>(), Ok(FeatureScaling::Standardize));
        assert!("minmax".parse::<FeatureScaling>().is_err());
    }
}
