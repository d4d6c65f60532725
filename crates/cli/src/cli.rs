use std::path::PathBuf;

use clap::Parser;
use payroll_compute::FeatureScaling;
use payroll_core::Config;

use crate::report::ReportFormat;

/// Flag payroll records whose attribute combination is unusual.
///
/// Fits a low-rank subspace over the whole batch and prints each employee's
/// reconstruction-residual score, highest first. Flags override values from
/// the environment / `.env` file.
#[derive(Parser, Debug)]
#[command(name = "payroll-audit", version, about = "Score payroll records for anomalies")]
pub struct CliArgs {
    /// Employee export (JSON array or JSON Lines)
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Number of retained subspace directions
    #[arg(long, short)]
    pub rank: Option<usize>,

    /// Column scaling before the fit: none or standardize
    #[arg(long)]
    pub scaling: Option<FeatureScaling>,

    /// Feed the employee id into the feature vector
    #[arg(long, overrides_with = "no_include_id")]
    pub include_id: bool,

    /// Keep the employee id out of the feature vector
    #[arg(long, overrides_with = "include_id")]
    pub no_include_id: bool,

    /// Flag scores strictly above this value
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Print only the N highest-scoring records
    #[arg(long)]
    pub top: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Config profile (overrides PAYROLL_PROFILE)
    #[arg(long)]
    pub profile: Option<String>,

    /// Print the config profiles found in the environment and exit
    #[arg(long)]
    pub list_profiles: bool,
}

impl CliArgs {
    /// Flags win over env / `.env` values.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref path) = self.input {
            config.input.path = path.clone();
        }
        if let Some(rank) = self.rank {
            config.model.rank = rank;
        }
        if let Some(scaling) = self.scaling {
            config.model.scaling = scaling.to_string();
        }
        if self.include_id {
            config.model.include_identifier = true;
        }
        if self.no_include_id {
            config.model.include_identifier = false;
        }
        if self.threshold.is_some() {
            config.report.threshold = self.threshold;
        }
        if self.top.is_some() {
            config.report.top = self.top;
        }
    }
}
