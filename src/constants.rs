/// Managed-care plan codes accepted by the report, paired with the 3-digit
/// submission code the state expects. Order is the column order of every
/// schedule (HMO 001 through HMO 005).
pub const HMO_SUBMISSION_CODES: [(&str, u32); 5] = [
    ("AMGP", 1),
    ("UHCCP", 2),
    ("HZNJ", 3),
    ("AETBH", 4),
    ("WELLCAID", 5),
];

pub const HMO_COLUMN_COUNT: usize = HMO_SUBMISSION_CODES.len();

/// Provider position names that count as reportable service types.
pub const VALID_SERVICE_TYPES: [&str; 12] = [
    "Chiropractor",
    "Dentist",
    "Dental Hygienist",
    "LCSW",
    "Nurse Midwife",
    "Nurse Practitioner",
    "OB/GYN",
    "Optometrist",
    "Physician",
    "Podiatry",
    "Psychologist",
    "Unknown",
];

/// Fixed Core Services precedence used to order Schedule A rows.
pub const CORE_SERVICE_RANKS: [(&str, u32); 11] = [
    ("Physician", 1),
    ("Nurse Practitioner", 2),
    ("Dentist", 3),
    ("Dental Hygienist", 4),
    ("Nurse Midwife", 5),
    ("OB/GYN", 6),
    ("Podiatry", 7),
    ("Chiropractor", 8),
    ("Optometrist", 9),
    ("LCSW", 10),
    ("Psychologist", 11),
];

/// Terminal rank for service types absent from CORE_SERVICE_RANKS, so their
/// sort position after the ranked rows is still deterministic.
pub const UNRANKED_SERVICE_RANK: u32 = 12;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_WAREHOUSE_TABLE: &str = "charges_detail";
pub const MISSING_CLAIM_DATES_FILE: &str = "missing_claim_dates.csv";
