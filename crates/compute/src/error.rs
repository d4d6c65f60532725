/// Errors raised by the anomaly-scoring stages.
///
/// Each stage raises synchronously and the pipeline propagates the error
/// unchanged; a failed run produces no results at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnomalyError {
    #[error("Empty batch: at least one record is required")]
    EmptyBatch,
    #[error("Invalid rank {rank}: must be within [1, {max}]")]
    InvalidRank { rank: usize, max: usize },
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Batch too large: {size} records exceeds limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
    #[error("Non-finite value in input row {row}")]
    NonFiniteInput { row: usize },
    #[error("Singular value decomposition did not converge")]
    DecompositionFailed,
}
