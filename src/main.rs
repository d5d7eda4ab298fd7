mod aggregate;
mod args;
mod config;
mod constants;
mod detail;
mod extract;
mod normalize;
mod period;
mod render;
mod schedule;
mod sequence;
mod summary;
mod warehouse;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use args::Args;
use config::WrapConfig;
use constants::MISSING_CLAIM_DATES_FILE;
use period::ReportPeriod;
use render::ReportContext;

fn default_workbook_path(config: &WrapConfig, period: &ReportPeriod) -> PathBuf {
    config.dirs.work_dir.join("wrap_to_submit").join(format!(
        "{} {} - DRAFT.xlsx",
        period.quarter_label(),
        config.report.report_type
    ))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    let quarter = args.quarter.as_deref().unwrap_or(&config.report.quarter);
    let year = args.year.as_deref().unwrap_or(&config.report.year);
    let period = ReportPeriod::from_quarter(quarter, year)?;

    println!("Health center: {}", config.site.health_center);
    println!("Quarter:       {}", period.quarter_label());
    println!("Start date:    {}", period.start_date);
    println!("End date:      {}", period.end_date);
    println!("Months:        {}", period.months.join(", "));

    let extract_paths: Vec<PathBuf> = config
        .input
        .extract_files
        .iter()
        .map(|name| config.dirs.data_src_dir.join(name))
        .collect();
    let lines = extract::load_extracts(&extract_paths)?;
    println!(
        "Loaded {} claim lines from {} extract files",
        lines.len(),
        extract_paths.len()
    );

    let warehouse_db = args
        .warehouse_db
        .clone()
        .or_else(|| config.warehouse.db_path.clone());
    if args.skip_warehouse {
        println!("--skip-warehouse set; skipping raw extract copy.");
    } else if let Some(db_path) = warehouse_db {
        let written = warehouse::replace_raw_extract(&db_path, &config.warehouse.table, &lines)?;
        println!(
            "Replaced warehouse table {} ({} rows) in {}",
            config.warehouse.table,
            written,
            db_path.display()
        );
    } else {
        println!("No warehouse database configured; skipping raw extract copy.");
    }

    let outcome =
        normalize::filter_and_normalize(&lines, &period.months, &config.site.fqhc_billing_number)?;
    println!(
        "Kept {} claim lines (dropped: {} plan code, {} service type, {} out of period)",
        outcome.records.len(),
        outcome.dropped_plan_code,
        outcome.dropped_service_type,
        outcome.dropped_out_of_period
    );

    if !outcome.missing_claim_dates.is_empty() || config.report.show_missing_claim_dates {
        let report_path = args
            .missing_dates_csv
            .clone()
            .unwrap_or_else(|| config.dirs.work_dir.join(MISSING_CLAIM_DATES_FILE));
        normalize::write_missing_claim_dates_report(&report_path, &outcome.missing_claim_dates)?;
        println!(
            "Wrote {} claim lines with no posted payment date to {}",
            outcome.missing_claim_dates.len(),
            report_path.display()
        );
    }

    let mut records = outcome.records;
    sequence::sort_for_sequencing(&mut records);
    let records = sequence::assign_encounter_flags(records)?;

    let pivots = aggregate::monthly_encounter_pivots(&records, &period.months);
    for pivot in &pivots {
        let unique: u64 = pivot.rows.iter().map(|r| r.total).sum();
        println!("Unique encounters for {}: {}", pivot.month, unique);
    }
    let receipts =
        aggregate::monthly_receipt_schedules(&records, &period.months, config.report.capitation);
    let summary = summary::build_summary(&records, config.report.pay_rate);
    println!("Unique encounters for the quarter: {}", summary.unique_encounters);

    let detail_rows = detail::detail_rows(&records);

    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| default_workbook_path(&config, &period));
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }

    let ctx = ReportContext {
        health_center: &config.site.health_center,
        fqhc_billing_number: &config.site.fqhc_billing_number,
        period: &period,
    };
    render::write_report(&output_path, &ctx, &summary, &detail_rows, &pivots, &receipts)?;
    println!("Wrote workbook {}", output_path.display());
    Ok(())
}
