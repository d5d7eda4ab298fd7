use anyhow::{Result, bail};

use crate::normalize::NormalizedRecord;

/// Order records for flag assignment: encounter number, then service date.
pub fn sort_for_sequencing(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| {
        a.encounter_number
            .cmp(&b.encounter_number)
            .then(a.date_of_service.cmp(&b.date_of_service))
    });
}

/// Mark the first record of each encounter with flag 1 and every later record
/// of the same encounter with 0. The state requires exactly one flagged row
/// per encounter, at the encounter's first claim line.
///
/// Input must already be in (encounter number, service date) order; unsorted
/// input is rejected rather than silently producing wrong flags.
pub fn assign_encounter_flags(
    mut records: Vec<NormalizedRecord>,
) -> Result<Vec<NormalizedRecord>> {
    for pair in records.windows(2) {
        let ordered = (&pair[0].encounter_number, pair[0].date_of_service)
            <= (&pair[1].encounter_number, pair[1].date_of_service);
        if !ordered {
            bail!(
                "Records must be sorted by encounter number and service date \
                 before flag assignment (encounter {} precedes {})",
                pair[0].encounter_number,
                pair[1].encounter_number
            );
        }
    }

    // Row 0 is always the first line of its encounter.
    let mut previous: Option<String> = None;
    for record in &mut records {
        if previous.as_deref() == Some(record.encounter_number.as_str()) {
            record.encounter_flag = 0;
        } else {
            record.encounter_flag = 1;
            previous = Some(record.encounter_number.clone());
        }
    }
    Ok(records)
}
