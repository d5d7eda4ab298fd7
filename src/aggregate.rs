use std::collections::{BTreeMap, HashSet};

use crate::constants::{
    CORE_SERVICE_RANKS, HMO_COLUMN_COUNT, UNRANKED_SERVICE_RANK, VALID_SERVICE_TYPES,
};
use crate::normalize::{NormalizedRecord, hmo_column_index};
use crate::period::MONTHS_PER_QUARTER;

/// One Schedule A row: unique-encounter counts for a service type, one column
/// per HMO submission code plus the row total.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub core_rank: u32,
    pub service_type: String,
    pub counts: [u64; HMO_COLUMN_COUNT],
    pub total: u64,
}

/// Unique-encounter pivot for a single reporting month.
#[derive(Debug, Clone)]
pub struct MonthlyPivot {
    pub month: String,
    pub rows: Vec<PivotRow>,
}

/// One Schedule B row: a receipt category with per-HMO amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRow {
    pub line_no: u32,
    pub category: String,
    pub amounts: [f64; HMO_COLUMN_COUNT],
}

/// Receipt schedule for a single reporting month.
#[derive(Debug, Clone)]
pub struct ReceiptSchedule {
    pub month: String,
    pub rows: Vec<ReceiptRow>,
}

const CAPITATION_LINE: u32 = 2;
const FEE_FOR_SERVICE_LINE: u32 = 3;
/// Schedule column holding capitation receipts (HMO 003).
const CAPITATION_COLUMN: usize = 2;

/// Build one unique-encounter pivot per reporting month.
///
/// Each encounter is attributed to its first record, so the caller must pass
/// records in sequencer order. Every valid service type appears in every
/// pivot, zero-filled when unobserved; "Unknown" appears only when observed.
pub fn monthly_encounter_pivots(
    records: &[NormalizedRecord],
    months: &[String; MONTHS_PER_QUARTER],
) -> Vec<MonthlyPivot> {
    months
        .iter()
        .map(|month| MonthlyPivot {
            month: month.clone(),
            rows: pivot_rows_for_month(records, month),
        })
        .collect()
}

fn pivot_rows_for_month(records: &[NormalizedRecord], month: &str) -> Vec<PivotRow> {
    let mut seen_encounters: HashSet<&str> = HashSet::new();
    let mut counts: BTreeMap<&str, [u64; HMO_COLUMN_COUNT]> = BTreeMap::new();

    for record in records.iter().filter(|r| r.service_month == month) {
        // First record per encounter carries the encounter's service type
        // and plan; later lines of the same visit are not re-counted.
        if !seen_encounters.insert(record.encounter_number.as_str()) {
            continue;
        }
        let Some(column) = hmo_column_index(&record.hmo_code) else {
            continue;
        };
        counts.entry(record.service_type.as_str()).or_default()[column] += 1;
    }

    // The state requires a row for every valid service type even when no
    // encounters were observed. "Unknown" is only shown when present.
    for service_type in VALID_SERVICE_TYPES {
        if service_type != "Unknown" {
            counts.entry(service_type).or_default();
        }
    }

    let mut rows: Vec<PivotRow> = counts
        .into_iter()
        .map(|(service_type, counts)| PivotRow {
            core_rank: core_service_rank(service_type),
            service_type: service_type.to_string(),
            total: counts.iter().sum(),
            counts,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.core_rank
            .cmp(&b.core_rank)
            .then_with(|| a.service_type.cmp(&b.service_type))
    });
    rows
}

/// Core Services ordinal for a service type; types outside the fixed table
/// sort after every ranked row.
pub fn core_service_rank(service_type: &str) -> u32 {
    CORE_SERVICE_RANKS
        .iter()
        .find(|(name, _)| *name == service_type)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRANKED_SERVICE_RANK)
}

/// Build one receipt schedule per reporting month: absolute payment sums by
/// HMO on the Fee for Service line, merged with the fixed category lines.
pub fn monthly_receipt_schedules(
    records: &[NormalizedRecord],
    months: &[String; MONTHS_PER_QUARTER],
    capitation: f64,
) -> Vec<ReceiptSchedule> {
    months
        .iter()
        .map(|month| {
            let mut fee_for_service = [0.0_f64; HMO_COLUMN_COUNT];
            for record in records.iter().filter(|r| r.service_month == *month) {
                if let Some(column) = hmo_column_index(&record.hmo_code) {
                    fee_for_service[column] += record.claim_payment_amount.abs();
                }
            }

            let mut capitation_amounts = [0.0_f64; HMO_COLUMN_COUNT];
            capitation_amounts[CAPITATION_COLUMN] = capitation;

            let rows = vec![
                ReceiptRow {
                    line_no: CAPITATION_LINE,
                    category: "Capitation Receipts".to_string(),
                    amounts: capitation_amounts,
                },
                ReceiptRow {
                    line_no: FEE_FOR_SERVICE_LINE,
                    category: "Fee for Service".to_string(),
                    amounts: fee_for_service,
                },
                ReceiptRow {
                    line_no: 4,
                    category: "TLP Receipts".to_string(),
                    amounts: [0.0; HMO_COLUMN_COUNT],
                },
                ReceiptRow {
                    line_no: 5,
                    category: "Other (Specify)".to_string(),
                    amounts: [0.0; HMO_COLUMN_COUNT],
                },
                ReceiptRow {
                    line_no: 6,
                    category: "Other (Specify)".to_string(),
                    amounts: [0.0; HMO_COLUMN_COUNT],
                },
            ];
            ReceiptSchedule {
                month: month.clone(),
                rows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        encounter: &str,
        service_type: &str,
        hmo_code: &str,
        month: u32,
        amount: f64,
    ) -> NormalizedRecord {
        NormalizedRecord {
            fqhc_billing_number: "0012345".to_string(),
            recipient_id: "M1".to_string(),
            patient_name: "Ada Lovelace".to_string(),
            patient_dob: "1990-01-01".to_string(),
            hmo_code: hmo_code.to_string(),
            hmo_assigned_id: "G1".to_string(),
            date_of_service: NaiveDate::from_ymd_opt(2023, month, 5).unwrap(),
            service_month: format!("2023-{month:02}"),
            cpt_code: "99213".to_string(),
            service_type: service_type.to_string(),
            claim_payment_date: "2023-11-01".to_string(),
            encounter_flag: 0,
            encounter_number: encounter.to_string(),
            claim_payment_amount: amount,
        }
    }

    fn quarter_months() -> [String; 3] {
        ["2023-10".to_string(), "2023-11".to_string(), "2023-12".to_string()]
    }

    #[test]
    fn pivot_has_every_service_type_and_all_columns() {
        let records = vec![record("A1", "Physician", "003", 10, 100.0)];
        let pivots = monthly_encounter_pivots(&records, &quarter_months());
        assert_eq!(pivots.len(), 3);

        for pivot in &pivots {
            // 11 zero-filled service types; "Unknown" absent because unobserved.
            assert_eq!(pivot.rows.len(), 11);
            for row in &pivot.rows {
                assert_eq!(row.counts.len(), 5);
                assert_eq!(row.total, row.counts.iter().sum::<u64>());
            }
        }

        let physician = pivots[0]
            .rows
            .iter()
            .find(|r| r.service_type == "Physician")
            .unwrap();
        assert_eq!(physician.counts, [0, 0, 1, 0, 0]);
        assert_eq!(physician.total, 1);

        // Months 2 and 3 saw nothing; every row is zero-filled.
        assert!(pivots[1].rows.iter().all(|r| r.total == 0));
        assert!(pivots[2].rows.iter().all(|r| r.total == 0));
    }

    #[test]
    fn multi_line_encounters_count_once() {
        let records = vec![
            record("A1", "Physician", "001", 10, 100.0),
            record("A1", "Physician", "001", 10, 50.0),
            record("B2", "Physician", "001", 10, 75.0),
        ];
        let pivots = monthly_encounter_pivots(&records, &quarter_months());
        let physician = pivots[0]
            .rows
            .iter()
            .find(|r| r.service_type == "Physician")
            .unwrap();
        assert_eq!(physician.counts[0], 2);
    }

    #[test]
    fn rows_follow_core_services_order() {
        let records = vec![record("A1", "Unknown", "001", 10, 10.0)];
        let pivots = monthly_encounter_pivots(&records, &quarter_months());
        let order: Vec<&str> = pivots[0]
            .rows
            .iter()
            .map(|r| r.service_type.as_str())
            .collect();
        assert_eq!(
            order,
            [
                "Physician",
                "Nurse Practitioner",
                "Dentist",
                "Dental Hygienist",
                "Nurse Midwife",
                "OB/GYN",
                "Podiatry",
                "Chiropractor",
                "Optometrist",
                "LCSW",
                "Psychologist",
                "Unknown",
            ]
        );
        // Unranked type carries the explicit terminal rank.
        assert_eq!(pivots[0].rows.last().unwrap().core_rank, 12);
    }

    #[test]
    fn receipt_schedule_sums_absolute_amounts_per_hmo() {
        let records = vec![
            record("A1", "Physician", "001", 10, -120.0),
            record("A1", "Physician", "001", 10, 30.0),
            record("B2", "Dentist", "005", 10, -45.5),
        ];
        let schedules = monthly_receipt_schedules(&records, &quarter_months(), 0.0);
        assert_eq!(schedules.len(), 3);

        let fee_row = schedules[0]
            .rows
            .iter()
            .find(|r| r.line_no == 3)
            .unwrap();
        assert_eq!(fee_row.category, "Fee for Service");
        assert_eq!(fee_row.amounts[0], 150.0);
        assert_eq!(fee_row.amounts[4], 45.5);
        assert_eq!(fee_row.amounts[1], 0.0);

        // Line order is fixed: 2 through 6.
        let line_numbers: Vec<u32> = schedules[0].rows.iter().map(|r| r.line_no).collect();
        assert_eq!(line_numbers, [2, 3, 4, 5, 6]);
    }

    #[test]
    fn capitation_lands_on_the_hmo_003_column() {
        let schedules = monthly_receipt_schedules(&[], &quarter_months(), 2500.0);
        let capitation_row = schedules[0]
            .rows
            .iter()
            .find(|r| r.line_no == 2)
            .unwrap();
        assert_eq!(capitation_row.amounts, [0.0, 0.0, 2500.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_months_still_produce_full_schedules() {
        let schedules = monthly_receipt_schedules(&[], &quarter_months(), 0.0);
        for schedule in &schedules {
            assert_eq!(schedule.rows.len(), 5);
        }
    }
}
