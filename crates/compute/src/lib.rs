pub mod algorithms;
pub mod error;
pub mod pipeline;

pub use algorithms::subspace::{SubspaceBasis, SubspaceModel, SubspaceSummary};
pub use error::AnomalyError;
pub use pipeline::anomaly::{AnomalyResult, AnomalyScorer, FeatureScaling, Standardizer};
pub use pipeline::features::{EncodedVector, EncoderOptions, FeatureEncoder, RoleVocabulary};
pub use pipeline::metrics::RunMetrics;
pub use pipeline::{FittedModel, Pipeline, PipelineConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_RANK};
