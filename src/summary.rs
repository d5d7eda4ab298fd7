use std::collections::HashSet;

use crate::normalize::NormalizedRecord;

/// Page 1 reconciliation metrics for the quarter.
#[derive(Debug, Clone)]
pub struct ReconciliationSummary {
    pub unique_encounters: u64,
    pub pay_rate: f64,
    pub total_payment: f64,
    pub managed_care_receipts: f64,
    pub vaccine_receipts: f64,
    pub difference: f64,
    pub amount_due: f64,
}

/// One Page 1 row: letter, regulatory label, initial and reconciliation
/// values.
#[derive(Debug, Clone)]
pub struct SummaryLine {
    pub letter: &'static str,
    pub label: &'static str,
    pub initial: f64,
    pub reconciliation: f64,
}

pub fn build_summary(records: &[NormalizedRecord], pay_rate: f64) -> ReconciliationSummary {
    let unique_encounters = records
        .iter()
        .map(|r| r.encounter_number.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    let total_payment = unique_encounters as f64 * pay_rate;
    let managed_care_receipts = records
        .iter()
        .map(|r| r.claim_payment_amount)
        .sum::<f64>()
        .abs();
    // Vaccination receipts are excluded from the wraparound payment and
    // reported as their own line; the extract carries none.
    let vaccine_receipts = 0.0;
    let difference = total_payment - managed_care_receipts - vaccine_receipts;
    let amount_due = (vaccine_receipts - managed_care_receipts).abs();

    ReconciliationSummary {
        unique_encounters,
        pay_rate,
        total_payment,
        managed_care_receipts,
        vaccine_receipts,
        difference,
        amount_due,
    }
}

impl ReconciliationSummary {
    /// Page 1 rows A through G. The initial column is the as-submitted
    /// starting position: zero everywhere except the PPS rate.
    pub fn lines(&self) -> [SummaryLine; 7] {
        [
            SummaryLine {
                letter: "A",
                label: "Medicaid Managed Care Encounter Approved",
                initial: 0.0,
                reconciliation: self.unique_encounters as f64,
            },
            SummaryLine {
                letter: "B",
                label: "Medicaid PPS (pps alternative methodology rate)",
                initial: self.pay_rate,
                reconciliation: self.pay_rate,
            },
            SummaryLine {
                letter: "C",
                label: "Total Payment  (A times B)",
                initial: 0.0,
                reconciliation: self.total_payment,
            },
            SummaryLine {
                letter: "D",
                label: "Medicaid Managed Care Receipts",
                initial: 0.0,
                reconciliation: self.managed_care_receipts,
            },
            SummaryLine {
                letter: "E",
                label: "Excluded Vaccination Receipts",
                initial: 0.0,
                reconciliation: self.vaccine_receipts,
            },
            SummaryLine {
                letter: "F",
                label: "Difference    (C less D) + E",
                initial: 0.0,
                reconciliation: self.difference,
            },
            SummaryLine {
                letter: "G",
                label: "Amount Due/ (From)  (column E less column D)",
                initial: 0.0,
                reconciliation: self.amount_due,
            },
        ]
    }
}
