use clap::Parser;

use crate::constants::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "build_wrap_report")]
#[command(about = "Build the FQHC Wraparound reconciliation workbook from billing extract files")]
pub struct Args {
    /// Path to the TOML run configuration.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: std::path::PathBuf,

    /// Reporting quarter override (Q1-Q4). Defaults to the config value.
    #[arg(long)]
    pub quarter: Option<String>,

    /// Reporting year override (4 digits). Defaults to the config value.
    #[arg(long)]
    pub year: Option<String>,

    /// Workbook output path. If omitted, it defaults to
    /// <work_dir>/wrap_to_submit/<quarter year> <report type> - DRAFT.xlsx.
    #[arg(long)]
    pub output_path: Option<std::path::PathBuf>,

    /// SQLite warehouse database path override.
    #[arg(long)]
    pub warehouse_db: Option<std::path::PathBuf>,

    /// Skip the warehouse copy of the raw extract.
    #[arg(long, default_value_t = false)]
    pub skip_warehouse: bool,

    /// Output CSV path for claim lines with no posted payment date.
    #[arg(long)]
    pub missing_dates_csv: Option<std::path::PathBuf>,
}
