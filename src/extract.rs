use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::{collections::HashMap, path::Path};

/// One raw claim line from the Greenway "Charge Detail" extract. Field names
/// follow the canonical schema; the source column for each is resolved by
/// header name, so extra columns and column reordering are tolerated.
#[derive(Debug, Clone)]
pub struct ClaimLine {
    /// "Amount Charge"
    pub amount_charge: f64,
    /// "Chg Cv1 Claim Member ID"
    pub member_id: String,
    /// "Chg Cv1 Plan Code"
    pub plan_code: String,
    /// "Chg Cv1 Grp Number"
    pub group_number: String,
    /// "Chg Claim 1 Claim Number"
    pub claim_number: String,
    /// "Credited Prov Pstn Name", trailing spaces removed
    pub position_name: String,
    /// "Credited Prov Name", trailing spaces removed
    pub provider_name: String,
    /// "Date Post Pmt"; empty when the payment has not posted
    pub payment_post_date: String,
    /// "Date Svc From"
    pub service_date: String,
    /// "Encounter Nbr"
    pub encounter_number: String,
    /// "Pat DOB"
    pub patient_dob: String,
    /// "Pat First Name" + " " + "Pat Last Name"
    pub patient_name: String,
    /// "Procedure Code"
    pub procedure_code: String,
    /// "Record Type Desc"
    pub record_type: String,
}

const AMOUNT_CHARGE: &str = "Amount Charge";
const MEMBER_ID: &str = "Chg Cv1 Claim Member ID";
const PLAN_CODE: &str = "Chg Cv1 Plan Code";
const GROUP_NUMBER: &str = "Chg Cv1 Grp Number";
const CLAIM_NUMBER: &str = "Chg Claim 1 Claim Number";
const POSITION_NAME: &str = "Credited Prov Pstn Name";
const PROVIDER_NAME: &str = "Credited Prov Name";
const PAYMENT_POST_DATE: &str = "Date Post Pmt";
const SERVICE_DATE: &str = "Date Svc From";
const ENCOUNTER_NUMBER: &str = "Encounter Nbr";
const PATIENT_DOB: &str = "Pat DOB";
const PATIENT_FIRST_NAME: &str = "Pat First Name";
const PATIENT_LAST_NAME: &str = "Pat Last Name";
const PROCEDURE_CODE: &str = "Procedure Code";
const RECORD_TYPE: &str = "Record Type Desc";

const EXPECTED_COLUMNS: [&str; 15] = [
    AMOUNT_CHARGE,
    MEMBER_ID,
    PLAN_CODE,
    GROUP_NUMBER,
    CLAIM_NUMBER,
    POSITION_NAME,
    PROVIDER_NAME,
    PAYMENT_POST_DATE,
    SERVICE_DATE,
    ENCOUNTER_NUMBER,
    PATIENT_DOB,
    PATIENT_FIRST_NAME,
    PATIENT_LAST_NAME,
    PROCEDURE_CODE,
    RECORD_TYPE,
];

/// Maps expected column name -> position in the source file.
struct ColumnIndex {
    by_name: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String], source: &Path) -> Result<Self> {
        let mut by_name = HashMap::new();
        let mut missing = Vec::new();
        for expected in EXPECTED_COLUMNS {
            match headers.iter().position(|h| h.trim() == expected) {
                Some(idx) => {
                    by_name.insert(expected, idx);
                }
                None => missing.push(expected),
            }
        }
        if !missing.is_empty() {
            bail!(
                "Extract {} is missing expected columns: {}",
                source.display(),
                missing.join(", ")
            );
        }
        Ok(Self { by_name })
    }

    fn get<'a>(&self, row: &'a [String], column: &'static str) -> &'a str {
        self.by_name
            .get(column)
            .and_then(|idx| row.get(*idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Read and concatenate every extract file, in the order given.
pub fn load_extracts(paths: &[std::path::PathBuf]) -> Result<Vec<ClaimLine>> {
    let mut lines = Vec::new();
    for path in paths {
        println!("Reading: {}", path.display());
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress.set_message(format!("reading {}", path.display()));

        let before = lines.len();
        read_extract(path, &mut lines)?;
        progress.finish_with_message(format!(
            "{} rows from {}",
            lines.len() - before,
            path.display()
        ));
    }
    Ok(lines)
}

fn read_extract(path: &Path, lines: &mut Vec<ClaimLine>) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|x| x.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => read_csv_extract(path, lines),
        "xlsx" | "xlsm" | "xls" => read_xlsx_extract(path, lines),
        _ => bail!(
            "Unsupported input extension for {}. Use .csv or .xlsx",
            path.display()
        ),
    }
}

fn read_csv_extract(path: &Path, lines: &mut Vec<ClaimLine>) -> Result<()> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed opening extract {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed reading extract header {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let index = ColumnIndex::resolve(&headers, path)?;

    for (row_number, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed reading row {} of {}", row_number + 2, path.display())
        })?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        lines.push(claim_line_from_row(&index, &row, path, row_number + 2)?);
    }
    Ok(())
}

fn read_xlsx_extract(path: &Path, lines: &mut Vec<ClaimLine>) -> Result<()> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed opening extract {}", path.display()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .with_context(|| format!("Extract {} contains no sheets", path.display()))?;
    let range = workbook
        .worksheet_range(first_sheet)
        .with_context(|| format!("Failed reading sheet {first_sheet:?} of {}", path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .with_context(|| format!("Extract {} has no header row", path.display()))?
        .iter()
        .map(cell_to_string)
        .collect();
    let index = ColumnIndex::resolve(&headers, path)?;

    for (row_number, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let row: Vec<String> = row.iter().map(cell_to_string).collect();
        lines.push(claim_line_from_row(&index, &row, path, row_number + 2)?);
    }
    Ok(())
}

fn claim_line_from_row(
    index: &ColumnIndex,
    row: &[String],
    path: &Path,
    row_number: usize,
) -> Result<ClaimLine> {
    let amount_raw = index.get(row, AMOUNT_CHARGE);
    let amount_charge: f64 = amount_raw.trim().parse().with_context(|| {
        format!(
            "Invalid {AMOUNT_CHARGE} {amount_raw:?} at row {row_number} of {}",
            path.display()
        )
    })?;

    let first = index.get(row, PATIENT_FIRST_NAME).trim();
    let last = index.get(row, PATIENT_LAST_NAME).trim();

    Ok(ClaimLine {
        amount_charge,
        member_id: index.get(row, MEMBER_ID).trim().to_string(),
        plan_code: index.get(row, PLAN_CODE).trim().to_string(),
        group_number: index.get(row, GROUP_NUMBER).trim().to_string(),
        claim_number: index.get(row, CLAIM_NUMBER).trim().to_string(),
        position_name: index.get(row, POSITION_NAME).trim().to_string(),
        provider_name: index.get(row, PROVIDER_NAME).trim().to_string(),
        payment_post_date: index.get(row, PAYMENT_POST_DATE).trim().to_string(),
        service_date: index.get(row, SERVICE_DATE).trim().to_string(),
        encounter_number: index.get(row, ENCOUNTER_NUMBER).trim().to_string(),
        patient_dob: index.get(row, PATIENT_DOB).trim().to_string(),
        patient_name: format!("{first} {last}").trim().to_string(),
        procedure_code: index.get(row, PROCEDURE_CODE).trim().to_string(),
        record_type: index.get(row, RECORD_TYPE).trim().to_string(),
    })
}

/// Render a calamine cell as the canonical string form. Date cells become
/// ISO dates, integral floats lose their trailing ".0" (encounter numbers and
/// procedure codes arrive as numeric cells in xlsx extracts).
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => format!("{b}"),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

/// Excel serial date (1900 system, epoch 1899-12-30) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let days = serial.floor();
    if days < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(chrono::Days::new(days as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Amount Charge,Chg Cv1 Claim Member ID,Chg Cv1 Plan Code,\
Chg Cv1 Grp Number,Chg Claim 1 Claim Number,Credited Prov Pstn Name,Credited Prov Name,\
Date Post Pmt,Date Svc From,Encounter Nbr,Pat DOB,Pat First Name,Pat Last Name,\
Procedure Code,Record Type Desc";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_csv_extract_rows() {
        let file = write_csv(&[
            "150.25,M001,HZNJ,G1,C1,Physician ,Buch MD,2023-11-02,2023-10-05,100200300,1990-01-01,Ada,Lovelace,99213,Charge",
        ]);
        let lines = load_extracts(&[file.path().to_path_buf()]).unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.amount_charge, 150.25);
        assert_eq!(line.plan_code, "HZNJ");
        assert_eq!(line.position_name, "Physician");
        assert_eq!(line.patient_name, "Ada Lovelace");
        assert_eq!(line.encounter_number, "100200300");
    }

    #[test]
    fn concatenates_multiple_files_in_order() {
        let first = write_csv(&[
            "1.0,M1,HZNJ,G,C,Physician,P,,2023-10-01,1,1990-01-01,A,B,99213,Charge",
        ]);
        let second = write_csv(&[
            "2.0,M2,AMGP,G,C,Dentist,P,,2023-11-01,2,1990-01-01,C,D,D0120,Charge",
        ]);
        let lines =
            load_extracts(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].member_id, "M1");
        assert_eq!(lines[1].member_id, "M2");
    }

    #[test]
    fn missing_column_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Amount Charge,Chg Cv1 Plan Code").unwrap();
        writeln!(file, "1.0,HZNJ").unwrap();
        file.flush().unwrap();

        let err = load_extracts(&[file.path().to_path_buf()]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing expected columns"));
        assert!(message.contains("Encounter Nbr"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let err = load_extracts(&[file.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("Unsupported input extension"));
    }

    #[test]
    fn invalid_amount_is_fatal() {
        let file = write_csv(&[
            "not-a-number,M1,HZNJ,G,C,Physician,P,,2023-10-01,1,1990-01-01,A,B,99213,Charge",
        ]);
        let err = load_extracts(&[file.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("Invalid Amount Charge"));
    }

    #[test]
    fn excel_serial_conversion_matches_known_dates() {
        assert_eq!(
            excel_serial_to_date(45200.0),
            NaiveDate::from_ymd_opt(2023, 10, 1)
        );
        assert_eq!(excel_serial_to_date(0.0), None);
    }
}
