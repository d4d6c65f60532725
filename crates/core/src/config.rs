use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub input: InputConfig,
    pub model: ModelConfig,
    pub report: ReportConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &["PAYROLL_INPUT", "PAYROLL_RANK"];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PAYROLL_PROFILE` env var. When set (e.g. `AUDIT`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PAYROLL_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            input: InputConfig::from_env_profiled(p),
            model: ModelConfig::from_env_profiled(p),
            report: ReportConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  input:   path={}", self.input.path.display());
        tracing::info!(
            "  model:   rank={}, scaling={}, include_identifier={}, max_batch_size={}",
            self.model.rank,
            self.model.scaling,
            self.model.include_identifier,
            self.model.max_batch_size
        );
        tracing::info!(
            "  report:  threshold={}, top={}",
            self.report.threshold.map(|t| t.to_string()).as_deref().unwrap_or("(none)"),
            self.report.top.map(|t| t.to_string()).as_deref().unwrap_or("(all)")
        );
    }
}

// ── Input ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// JSON / JSON Lines export of the employee table.
    pub path: PathBuf,
}

impl InputConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            path: PathBuf::from(profiled_env_or(p, "PAYROLL_INPUT", "data/employees.json")),
        }
    }
}

// ── Model ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of retained subspace directions.
    pub rank: usize,
    /// "none" (default) or "standardize"
    pub scaling: String,
    /// Feed the employee id into the feature vector as the legacy model did.
    pub include_identifier: bool,
    pub max_batch_size: usize,
}

impl ModelConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rank: profiled_env_usize(p, "PAYROLL_RANK", 3),
            scaling: profiled_env_or(p, "PAYROLL_SCALING", "none").to_lowercase(),
            include_identifier: profiled_env_bool(p, "PAYROLL_INCLUDE_ID", false),
            max_batch_size: profiled_env_usize(p, "PAYROLL_MAX_BATCH", 100_000),
        }
    }
}

// ── Report ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Scores strictly above this are flagged in the report.
    pub threshold: Option<f64>,
    /// Print only the first N results.
    pub top: Option<usize>,
}

impl ReportConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            threshold: profiled_env_opt(p, "PAYROLL_THRESHOLD").and_then(|v| v.parse().ok()),
            top: profiled_env_opt(p, "PAYROLL_TOP").and_then(|v| v.parse().ok()),
        }
    }
}
