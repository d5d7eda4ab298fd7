use chrono::NaiveDate;

use crate::normalize::{NormalizedRecord, parse_extract_date};

/// Detail-sheet column names recognized by the state's WRAP intake.
pub const WRAP_DETAIL_COLUMNS: [&str; 14] = [
    "BILLING_PROV_ NO",
    "MEDICAID_RCP_ID_NO",
    "MEDICAID_MEDICAID_RCP_FULL_NAME",
    "MEDICAID_RCP_BIRTH_DATE",
    "HMO_NAME",
    "MEDICAID_RCP_HMO_ASSIGNED_ID",
    "CLM_SVC_DTE",
    "CLM_CPT_CDE",
    "SERVICE_TYPE",
    "CLM_PMT_AMT_DATE",
    "ENCOUNTER",
    "CLM_PMT_AMT",
    "Claim ID",
    "COMMENT",
];

/// One row of the "detail data" sheet, already in submission form.
#[derive(Debug, Clone)]
pub struct DetailRow {
    pub billing_prov_no: String,
    pub recipient_id: String,
    pub patient_name: String,
    /// mm/dd/yyyy
    pub birth_date: String,
    pub hmo_name: String,
    pub hmo_assigned_id: String,
    /// mm/dd/yyyy
    pub service_date: String,
    pub cpt_code: String,
    pub service_type: String,
    pub payment_date: String,
    pub encounter_flag: u8,
    pub payment_amount: f64,
    /// Last 6 characters of the encounter number.
    pub claim_id: String,
    pub comment: String,
}

pub fn detail_rows(records: &[NormalizedRecord]) -> Vec<DetailRow> {
    records
        .iter()
        .map(|record| DetailRow {
            billing_prov_no: record.fqhc_billing_number.clone(),
            recipient_id: record.recipient_id.clone(),
            patient_name: record.patient_name.clone(),
            birth_date: format_mdy(&record.patient_dob),
            hmo_name: record.hmo_code.clone(),
            hmo_assigned_id: record.hmo_assigned_id.clone(),
            service_date: mdy(record.date_of_service),
            cpt_code: record.cpt_code.clone(),
            service_type: record.service_type.clone(),
            payment_date: record.claim_payment_date.clone(),
            encounter_flag: record.encounter_flag,
            payment_amount: record.claim_payment_amount,
            claim_id: short_claim_id(&record.encounter_number),
            comment: String::new(),
        })
        .collect()
}

fn mdy(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Reformat a raw date string to mm/dd/yyyy, passing unparseable values
/// through unchanged.
fn format_mdy(raw: &str) -> String {
    parse_extract_date(raw).map(mdy).unwrap_or_else(|_| raw.to_string())
}

fn short_claim_id(encounter_number: &str) -> String {
    let chars: Vec<char> = encounter_number.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            fqhc_billing_number: "0012345".to_string(),
            recipient_id: "M123".to_string(),
            patient_name: "Ada Lovelace".to_string(),
            patient_dob: "1990-01-15".to_string(),
            hmo_code: "003".to_string(),
            hmo_assigned_id: "G9".to_string(),
            date_of_service: NaiveDate::from_ymd_opt(2023, 10, 5).unwrap(),
            service_month: "2023-10".to_string(),
            cpt_code: "99213".to_string(),
            service_type: "Physician".to_string(),
            claim_payment_date: "2023-11-01".to_string(),
            encounter_flag: 1,
            encounter_number: "100200300".to_string(),
            claim_payment_amount: -150.0,
        }
    }

    #[test]
    fn shapes_a_record_into_submission_form() {
        let rows = detail_rows(&[record()]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.billing_prov_no, "0012345");
        assert_eq!(row.birth_date, "01/15/1990");
        assert_eq!(row.service_date, "10/05/2023");
        assert_eq!(row.claim_id, "200300");
        assert_eq!(row.encounter_flag, 1);
        assert_eq!(row.comment, "");
    }

    #[test]
    fn short_encounter_numbers_are_kept_whole() {
        assert_eq!(short_claim_id("123"), "123");
        assert_eq!(short_claim_id("1234567890"), "567890");
    }

    #[test]
    fn unparseable_birth_date_passes_through() {
        let mut rec = record();
        rec.patient_dob = "unknown".to_string();
        let rows = detail_rows(&[rec]);
        assert_eq!(rows[0].birth_date, "unknown");
    }
}
