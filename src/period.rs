use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

pub const MONTHS_PER_QUARTER: usize = 3;

/// Resolved reporting period: the three months of one calendar-year quarter,
/// plus the labels and sheet sequence the workbook is built around.
#[derive(Debug, Clone)]
pub struct ReportPeriod {
    pub quarter: String,
    pub year: String,
    /// Months in "YYYY-MM" form, matched against each record's service month.
    pub months: [String; MONTHS_PER_QUARTER],
    /// Month labels used in schedule sheet names and headers.
    pub month_labels: [String; MONTHS_PER_QUARTER],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportPeriod {
    pub fn from_quarter(quarter: &str, year: &str) -> Result<Self> {
        let (month_numbers, labels): ([u32; 3], [&str; 3]) = match quarter {
            "Q1" => ([1, 2, 3], ["Jan", "Feb", "Mar"]),
            "Q2" => ([4, 5, 6], ["April", "May", "June"]),
            "Q3" => ([7, 8, 9], ["July", "Aug", "Sept"]),
            "Q4" => ([10, 11, 12], ["Oct", "Nov", "Dec"]),
            other => bail!("Invalid quarter {other:?}. Expected Q1, Q2, Q3, or Q4"),
        };

        let year_number: i32 = match year.parse() {
            Ok(y) if year.len() == 4 => y,
            _ => bail!("Invalid year {year:?}. Expected a 4-digit year"),
        };

        let start_date = NaiveDate::from_ymd_opt(year_number, month_numbers[0], 1)
            .with_context(|| format!("Could not resolve dates for {quarter} {year}"))?;
        let end_date = last_day_of_month(year_number, month_numbers[2])
            .with_context(|| format!("Could not resolve dates for {quarter} {year}"))?;

        Ok(Self {
            quarter: quarter.to_string(),
            year: year.to_string(),
            months: month_numbers.map(|m| format!("{year_number}-{m:02}")),
            month_labels: labels.map(str::to_string),
            start_date,
            end_date,
        })
    }

    /// Quarter and year as shown on Page 1, e.g. "Q4 2023".
    pub fn quarter_label(&self) -> String {
        format!("{} {}", self.quarter, self.year)
    }

    /// The fixed sheet sequence of the submission workbook.
    pub fn sheet_names(&self) -> Vec<String> {
        let mut names = vec!["Page 1".to_string(), "detail data".to_string()];
        for letter in ['A', 'B', 'C', 'D', 'E', 'F'] {
            for label in &self.month_labels {
                names.push(format!("Support Schedule {letter} - {label}"));
            }
        }
        names
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q4_maps_to_closing_months() {
        let period = ReportPeriod::from_quarter("Q4", "2023").unwrap();
        assert_eq!(period.months, ["2023-10", "2023-11", "2023-12"]);
        assert_eq!(period.month_labels, ["Oct", "Nov", "Dec"]);
        assert_eq!(period.start_date, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
        assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(period.quarter_label(), "Q4 2023");
    }

    #[test]
    fn q2_uses_spelled_out_labels() {
        let period = ReportPeriod::from_quarter("Q2", "2024").unwrap();
        assert_eq!(period.month_labels, ["April", "May", "June"]);
        assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn invalid_quarter_is_rejected() {
        let err = ReportPeriod::from_quarter("Q5", "2023").unwrap_err();
        assert!(err.to_string().contains("Invalid quarter"));
        assert!(ReportPeriod::from_quarter("q4", "2023").is_err());
    }

    #[test]
    fn invalid_year_is_rejected() {
        assert!(ReportPeriod::from_quarter("Q1", "23").is_err());
        assert!(ReportPeriod::from_quarter("Q1", "twenty").is_err());
    }

    #[test]
    fn sheet_sequence_matches_submission_layout() {
        let period = ReportPeriod::from_quarter("Q1", "2023").unwrap();
        let sheets = period.sheet_names();
        assert_eq!(sheets.len(), 20);
        assert_eq!(sheets[0], "Page 1");
        assert_eq!(sheets[1], "detail data");
        assert_eq!(sheets[2], "Support Schedule A - Jan");
        assert_eq!(sheets[7], "Support Schedule B - Mar");
        assert_eq!(sheets[19], "Support Schedule F - Mar");
    }
}
