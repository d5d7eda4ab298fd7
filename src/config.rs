use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::constants::DEFAULT_WAREHOUSE_TABLE;

/// Per-site run configuration, loaded once at startup and passed into each
/// stage explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct WrapConfig {
    pub site: SiteConfig,
    pub dirs: DirConfig,
    pub input: InputConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Health center display name as it appears on every schedule header.
    pub health_center: String,
    /// FQHC billing number, constant for the run.
    pub fqhc_billing_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirConfig {
    /// Directory containing the billing extract files.
    pub data_src_dir: PathBuf,
    /// Directory the workbook and side reports are written under.
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Extract file names, resolved relative to data_src_dir.
    pub extract_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Reporting year, e.g. "2023".
    pub year: String,
    /// Reporting quarter, Q1 through Q4.
    pub quarter: String,
    /// Report type label used in the workbook file name.
    #[serde(default = "default_report_type")]
    pub report_type: String,
    /// Per-encounter PPS payment rate.
    pub pay_rate: f64,
    /// Capitation amount reported on the Schedule B capitation line.
    #[serde(default)]
    pub capitation: f64,
    /// Write the missing-claim-date CSV report even when empty.
    #[serde(default)]
    pub show_missing_claim_dates: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// SQLite database the raw extract is copied into. No copy when unset.
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_warehouse_table")]
    pub table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            table: default_warehouse_table(),
        }
    }
}

fn default_report_type() -> String {
    "RECON".to_string()
}

fn default_warehouse_table() -> String {
    DEFAULT_WAREHOUSE_TABLE.to_string()
}

pub fn load_config(path: &Path) -> Result<WrapConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed reading config {}", path.display()))?;
    let config: WrapConfig = toml::from_str(&raw)
        .with_context(|| format!("Failed parsing config {}", path.display()))?;
    Ok(config)
}
