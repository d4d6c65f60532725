//! Low-rank linear subspace fitting (principal components via SVD).
//!
//! The centered data matrix X is n × D with one row per record. The fitted
//! basis is the top-k right singular vectors of X, i.e. the principal
//! directions in feature space. Working on X directly rather than on XᵀX
//! avoids squaring the condition number.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AnomalyError;

/// Singular values closer than this (relative to the largest) are ties.
const TIE_TOLERANCE: f64 = 1e-10;

/// Row coordinates below this (relative to the largest singular value) are
/// treated as zero when breaking ties.
const COORD_TOLERANCE: f64 = 1e-9;

/// Centering vector plus an orthonormal rank-k basis, fitted once and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct SubspaceBasis {
    mean: DVector<f64>,
    /// k × D, rows orthonormal.
    components: DMatrix<f64>,
    singular_values: Vec<f64>,
    explained_variance: Vec<f64>,
    retained_ratio: f64,
    n_samples: usize,
}

/// Fit diagnostics, safe to log or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct SubspaceSummary {
    pub n_samples: usize,
    pub dim: usize,
    pub rank: usize,
    pub singular_values: Vec<f64>,
    pub explained_variance: Vec<f64>,
    pub explained_variance_ratio: f64,
}

impl SubspaceBasis {
    /// Feature dimension D.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Number of retained directions k.
    pub fn rank(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Per-column mean of the fitting batch.
    pub fn mean(&self) -> &[f64] {
        self.mean.as_slice()
    }

    pub(crate) fn mean_vector(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Basis as a k × D matrix with orthonormal rows.
    pub fn components(&self) -> &DMatrix<f64> {
        &self.components
    }

    /// The i-th basis direction.
    pub fn component(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.rank()).then(|| self.components.row(i).iter().copied().collect())
    }

    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Variance captured by each retained direction, σ² / (n − 1).
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Share of the batch's total variance captured by the basis.
    pub fn explained_variance_ratio(&self) -> f64 {
        self.retained_ratio
    }

    pub fn summary(&self) -> SubspaceSummary {
        SubspaceSummary {
            n_samples: self.n_samples,
            dim: self.dim(),
            rank: self.rank(),
            singular_values: self.singular_values.clone(),
            explained_variance: self.explained_variance.clone(),
            explained_variance_ratio: self.explained_variance_ratio(),
        }
    }
}

/// Fits [`SubspaceBasis`] values.
pub struct SubspaceModel;

impl SubspaceModel {
    /// Largest valid rank for a batch of `n` vectors of dimension `dim`.
    pub fn max_rank(n: usize, dim: usize) -> usize {
        dim.min(n.saturating_sub(1))
    }

    /// Fit a rank-`rank` basis over `vectors`.
    ///
    /// Requires at least two vectors of equal, finite dimension and
    /// `1 <= rank <= min(D, n - 1)`.
    pub fn fit<V: AsRef<[f64]>>(vectors: &[V], rank: usize) -> Result<SubspaceBasis, AnomalyError> {
        let n = vectors.len();
        if n == 0 {
            return Err(AnomalyError::EmptyBatch);
        }

        let dim = vectors[0].as_ref().len();
        for (row, v) in vectors.iter().enumerate() {
            let v = v.as_ref();
            if v.len() != dim {
                return Err(AnomalyError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(AnomalyError::NonFiniteInput { row });
            }
        }

        let max = Self::max_rank(n, dim);
        if rank == 0 || rank > max {
            return Err(AnomalyError::InvalidRank { rank, max });
        }

        let mut x = DMatrix::from_fn(n, dim, |i, j| vectors[i].as_ref()[j]);
        let mean = DVector::from_iterator(dim, (0..dim).map(|j| x.column(j).mean()));
        for (j, m) in mean.iter().enumerate() {
            x.column_mut(j).add_scalar_mut(-m);
        }

        let dof = (n - 1) as f64;

        let svd = x
            .clone()
            .try_svd(false, true, f64::EPSILON, 0)
            .ok_or(AnomalyError::DecompositionFailed)?;
        let v_t = svd.v_t.ok_or(AnomalyError::DecompositionFailed)?;

        let singular_values: Vec<f64> = svd
            .singular_values
            .iter()
            .map(|&s| {
                if s.is_finite() && s >= 0.0 {
                    s
                } else {
                    warn!(value = s, "clamping invalid singular value to zero");
                    0.0
                }
            })
            .collect();

        // Coordinates of every row along every candidate direction; used to
        // break ties by first appearance in the batch.
        let coords = &x * v_t.transpose();
        let scale = singular_values.iter().copied().fold(1.0_f64, f64::max);
        let coord_tol = COORD_TOLERANCE * scale;
        let first_rows: Vec<usize> = (0..singular_values.len())
            .map(|c| {
                (0..n)
                    .find(|&i| coords[(i, c)].abs() > coord_tol)
                    .unwrap_or(n)
            })
            .collect();

        let order = order_components(&singular_values, &first_rows, TIE_TOLERANCE * scale);

        let mut components = DMatrix::zeros(rank, dim);
        let mut kept_singular = Vec::with_capacity(rank);
        for (row, &c) in order.iter().take(rank).enumerate() {
            let mut direction: Vec<f64> = v_t.row(c).iter().copied().collect();
            canonicalize_sign(&mut direction);
            for (j, value) in direction.into_iter().enumerate() {
                components[(row, j)] = value;
            }
            kept_singular.push(singular_values[c]);
        }

        let explained_variance: Vec<f64> = kept_singular
            .iter()
            .map(|s| (s * s / dof).max(0.0))
            .collect();

        let retained_ratio = retained_variance_ratio(&x, &kept_singular);

        let basis = SubspaceBasis {
            mean,
            components,
            singular_values: kept_singular,
            explained_variance,
            retained_ratio,
            n_samples: n,
        };

        debug!(
            n_samples = n,
            dim,
            rank,
            explained_variance_ratio = basis.explained_variance_ratio(),
            "subspace fitted"
        );

        Ok(basis)
    }
}

/// Order candidate directions by descending singular value; runs of tied
/// values are ordered by the first batch row with a non-zero coordinate,
/// then by decomposition index.
fn order_components(singular_values: &[f64], first_rows: &[usize], tol: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..singular_values.len()).collect();
    order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]).then(a.cmp(&b)));

    let mut start = 0;
    while start < order.len() {
        let head = singular_values[order[start]];
        let mut end = start + 1;
        while end < order.len() && head - singular_values[order[end]] <= tol {
            end += 1;
        }
        order[start..end].sort_by_key(|&c| (first_rows[c], c));
        start = end;
    }

    order
}

/// Share of the centred batch's squared norm carried by `kept`, computed on
/// values rescaled by the largest magnitude so large inputs cannot overflow.
/// An all-zero batch counts as fully explained.
fn retained_variance_ratio(centered: &DMatrix<f64>, kept: &[f64]) -> f64 {
    let amax = centered.amax();
    if amax <= 0.0 || !amax.is_finite() {
        return 1.0;
    }
    let total = centered.unscale(amax).norm_squared();
    let retained: f64 = kept.iter().map(|s| (s / amax).powi(2)).sum();
    let ratio = retained / total;
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Flip a direction so its largest-magnitude component is positive.
fn canonicalize_sign(direction: &mut [f64]) {
    let mut pivot = 0;
    for (i, v) in direction.iter().enumerate() {
        if v.abs() > direction[pivot].abs() {
            pivot = i;
        }
    }
    if direction.get(pivot).is_some_and(|v| *v < 0.0) {
        for v in direction.iter_mut() {
            *v = -*v;
        }
    }
}
