use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Timing and shape of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub run_id: Uuid,
    pub records: usize,
    /// Encoded vector dimension D.
    pub dim: usize,
    pub rank: usize,
    pub vocabulary_size: usize,
    pub encode_ms: f64,
    pub fit_ms: f64,
    pub score_ms: f64,
    /// Share of the batch's variance captured by the fitted basis.
    pub explained_variance_ratio: f64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunMetrics {
    pub fn new(records: usize, rank: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            records,
            dim: 0,
            rank,
            vocabulary_size: 0,
            encode_ms: 0.0,
            fit_ms: 0.0,
            score_ms: 0.0,
            explained_variance_ratio: 0.0,
            finished_at: None,
        }
    }

    pub fn record_encode(&mut self, elapsed: Duration) {
        self.encode_ms = elapsed.as_secs_f64() * 1000.0;
    }

    pub fn record_fit(&mut self, elapsed: Duration) {
        self.fit_ms = elapsed.as_secs_f64() * 1000.0;
    }

    pub fn record_score(&mut self, elapsed: Duration) {
        self.score_ms = elapsed.as_secs_f64() * 1000.0;
    }

    pub fn total_ms(&self) -> f64 {
        self.encode_ms + self.fit_ms + self.score_ms
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
