use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use csv::Writer;
use std::path::Path;

use crate::constants::{HMO_SUBMISSION_CODES, VALID_SERVICE_TYPES};
use crate::extract::ClaimLine;
use crate::period::MONTHS_PER_QUARTER;

/// A claim line that survived the plan-code, service-type, and reporting-month
/// filters, renamed and enriched into the canonical report schema.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub fqhc_billing_number: String,
    pub recipient_id: String,
    pub patient_name: String,
    pub patient_dob: String,
    /// 3-digit submission code, "001" through "005".
    pub hmo_code: String,
    pub hmo_assigned_id: String,
    pub date_of_service: NaiveDate,
    /// "YYYY-MM", derived from date_of_service.
    pub service_month: String,
    pub cpt_code: String,
    pub service_type: String,
    /// Raw payment-post date; empty when the payment has not posted.
    pub claim_payment_date: String,
    /// First-of-encounter flag, assigned by the sequencer. 0 until then.
    pub encounter_flag: u8,
    pub encounter_number: String,
    pub claim_payment_amount: f64,
}

/// Filter results plus the drop tallies printed by the pipeline. Dropped rows
/// are expected exclusions, not errors.
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    /// Records kept in the main set whose payment-post date is empty,
    /// surfaced separately for inspection.
    pub missing_claim_dates: Vec<NormalizedRecord>,
    pub dropped_plan_code: usize,
    pub dropped_service_type: usize,
    pub dropped_out_of_period: usize,
}

/// Apply the three business filters and derive the canonical fields.
/// Unparseable service dates are fatal: a row that cannot be placed in a
/// month is a malformed extract, not an expected exclusion.
pub fn filter_and_normalize(
    lines: &[ClaimLine],
    months: &[String; MONTHS_PER_QUARTER],
    fqhc_billing_number: &str,
) -> Result<NormalizeOutcome> {
    let mut outcome = NormalizeOutcome {
        records: Vec::new(),
        missing_claim_dates: Vec::new(),
        dropped_plan_code: 0,
        dropped_service_type: 0,
        dropped_out_of_period: 0,
    };

    for line in lines {
        let Some(hmo_code) = hmo_submission_code(&line.plan_code) else {
            outcome.dropped_plan_code += 1;
            continue;
        };
        if !VALID_SERVICE_TYPES.contains(&line.position_name.as_str()) {
            outcome.dropped_service_type += 1;
            continue;
        }

        let date_of_service = parse_extract_date(&line.service_date).with_context(|| {
            format!(
                "Invalid service date for encounter {}",
                line.encounter_number
            )
        })?;
        let service_month = date_of_service.format("%Y-%m").to_string();
        if !months.contains(&service_month) {
            outcome.dropped_out_of_period += 1;
            continue;
        }

        let record = NormalizedRecord {
            fqhc_billing_number: fqhc_billing_number.to_string(),
            recipient_id: line.member_id.clone(),
            patient_name: line.patient_name.clone(),
            patient_dob: line.patient_dob.clone(),
            hmo_code,
            hmo_assigned_id: line.group_number.clone(),
            date_of_service,
            service_month,
            cpt_code: line.procedure_code.clone(),
            service_type: line.position_name.clone(),
            claim_payment_date: line.payment_post_date.clone(),
            encounter_flag: 0,
            encounter_number: line.encounter_number.clone(),
            claim_payment_amount: line.amount_charge,
        };
        if record.claim_payment_date.is_empty() {
            outcome.missing_claim_dates.push(record.clone());
        }
        outcome.records.push(record);
    }

    Ok(outcome)
}

/// Map a plan code onto its zero-padded 3-digit submission code.
pub fn hmo_submission_code(plan_code: &str) -> Option<String> {
    HMO_SUBMISSION_CODES
        .iter()
        .find(|(code, _)| *code == plan_code)
        .map(|(_, number)| format!("{number:03}"))
}

/// Plan code displayed at a given schedule column, 0-based.
pub fn plan_code_for_column(column: usize) -> &'static str {
    HMO_SUBMISSION_CODES[column].0
}

/// Schedule column, 0-based, for a 3-digit submission code.
pub fn hmo_column_index(hmo_code: &str) -> Option<usize> {
    let number: usize = hmo_code.parse().ok()?;
    if (1..=HMO_SUBMISSION_CODES.len()).contains(&number) {
        Some(number - 1)
    } else {
        None
    }
}

/// Service dates arrive as ISO dates from xlsx conversion, or m/d/Y text
/// from CSV exports; datetime forms keep the date part.
pub fn parse_extract_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Ok(date);
        }
    }
    bail!("Unparseable date {raw:?}")
}

/// Write the surfaced missing-payment-date subset for manual review.
pub fn write_missing_claim_dates_report(
    path: &Path,
    records: &[NormalizedRecord],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed creating missing-dates report {}", path.display()))?;
    writer
        .write_record([
            "encounter_number",
            "recipient_id",
            "patient_name",
            "hmo_code",
            "service_type",
            "date_of_service",
            "claim_payment_amount",
        ])
        .context("Failed writing missing-dates report header")?;
    for record in records {
        writer
            .write_record([
                record.encounter_number.as_str(),
                record.recipient_id.as_str(),
                record.patient_name.as_str(),
                record.hmo_code.as_str(),
                record.service_type.as_str(),
                record.date_of_service.format("%Y-%m-%d").to_string().as_str(),
                format!("{:.2}", record.claim_payment_amount).as_str(),
            ])
            .context("Failed writing missing-dates report row")?;
    }
    writer
        .flush()
        .context("Failed flushing missing-dates report writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_line(plan_code: &str, position: &str, service_date: &str) -> ClaimLine {
        ClaimLine {
            amount_charge: 100.0,
            member_id: "M1".to_string(),
            plan_code: plan_code.to_string(),
            group_number: "G1".to_string(),
            claim_number: "C1".to_string(),
            position_name: position.to_string(),
            provider_name: "Provider".to_string(),
            payment_post_date: "2023-11-01".to_string(),
            service_date: service_date.to_string(),
            encounter_number: "100200300".to_string(),
            patient_dob: "1990-01-01".to_string(),
            patient_name: "Ada Lovelace".to_string(),
            procedure_code: "99213".to_string(),
            record_type: "Charge".to_string(),
        }
    }

    fn quarter_months() -> [String; 3] {
        ["2023-10".to_string(), "2023-11".to_string(), "2023-12".to_string()]
    }

    #[test]
    fn keeps_only_allow_listed_plan_codes() {
        let lines = vec![
            claim_line("HZNJ", "Physician", "2023-10-05"),
            claim_line("BCBS", "Physician", "2023-10-05"),
        ];
        let outcome = filter_and_normalize(&lines, &quarter_months(), "0012345").unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped_plan_code, 1);
        assert_eq!(outcome.records[0].hmo_code, "003");
    }

    #[test]
    fn keeps_only_valid_service_types() {
        let lines = vec![
            claim_line("AMGP", "Physician", "2023-10-05"),
            claim_line("AMGP", "Front Desk", "2023-10-05"),
        ];
        let outcome = filter_and_normalize(&lines, &quarter_months(), "0012345").unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped_service_type, 1);
    }

    #[test]
    fn drops_records_outside_the_reporting_months() {
        let lines = vec![
            claim_line("AMGP", "Physician", "2023-09-30"),
            claim_line("AMGP", "Physician", "2023-10-01"),
            claim_line("AMGP", "Physician", "2024-01-01"),
        ];
        let outcome = filter_and_normalize(&lines, &quarter_months(), "0012345").unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.dropped_out_of_period, 2);
        assert_eq!(outcome.records[0].service_month, "2023-10");
    }

    #[test]
    fn every_kept_record_has_mapped_code_and_valid_type() {
        let lines: Vec<ClaimLine> = [
            ("AMGP", "Physician"),
            ("UHCCP", "Dentist"),
            ("HZNJ", "LCSW"),
            ("AETBH", "Nurse Practitioner"),
            ("WELLCAID", "Podiatry"),
            ("MEDICARE", "Physician"),
        ]
        .iter()
        .map(|(plan, position)| claim_line(plan, position, "2023-11-15"))
        .collect();
        let outcome = filter_and_normalize(&lines, &quarter_months(), "0012345").unwrap();
        assert_eq!(outcome.records.len(), 5);
        for record in &outcome.records {
            assert!(["001", "002", "003", "004", "005"].contains(&record.hmo_code.as_str()));
            assert!(VALID_SERVICE_TYPES.contains(&record.service_type.as_str()));
        }
    }

    #[test]
    fn surfaces_missing_payment_dates_without_excluding_them() {
        let mut with_date = claim_line("AMGP", "Physician", "2023-10-05");
        with_date.encounter_number = "1".to_string();
        let mut without_date = claim_line("AMGP", "Physician", "2023-10-06");
        without_date.encounter_number = "2".to_string();
        without_date.payment_post_date = String::new();

        let outcome =
            filter_and_normalize(&[with_date, without_date], &quarter_months(), "0012345").unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.missing_claim_dates.len(), 1);
        assert_eq!(outcome.missing_claim_dates[0].encounter_number, "2");
    }

    #[test]
    fn unparseable_service_date_is_fatal() {
        let lines = vec![claim_line("AMGP", "Physician", "soon")];
        let err = filter_and_normalize(&lines, &quarter_months(), "0012345").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid service date"));
    }

    #[test]
    fn parses_the_supported_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 10, 5).unwrap();
        assert_eq!(parse_extract_date("2023-10-05").unwrap(), expected);
        assert_eq!(parse_extract_date("10/05/2023").unwrap(), expected);
        assert_eq!(parse_extract_date("2023-10-05 00:00:00").unwrap(), expected);
    }

    #[test]
    fn submission_codes_are_zero_padded() {
        assert_eq!(hmo_submission_code("AMGP").as_deref(), Some("001"));
        assert_eq!(hmo_submission_code("WELLCAID").as_deref(), Some("005"));
        assert_eq!(hmo_submission_code("BCBS"), None);
        assert_eq!(hmo_column_index("003"), Some(2));
        assert_eq!(hmo_column_index("006"), None);
    }

    #[test]
    fn missing_dates_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_claim_dates.csv");
        let mut line = claim_line("AMGP", "Physician", "2023-10-05");
        line.payment_post_date = String::new();
        let outcome = filter_and_normalize(&[line], &quarter_months(), "0012345").unwrap();
        write_missing_claim_dates_report(&path, &outcome.missing_claim_dates).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "100200300");
        assert_eq!(&rows[0][6], "100.00");
    }
}
