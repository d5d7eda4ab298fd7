use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, Formula, Workbook, Worksheet};
use std::path::Path;

use crate::aggregate::{MonthlyPivot, ReceiptSchedule};
use crate::constants::HMO_COLUMN_COUNT;
use crate::detail::{DetailRow, WRAP_DETAIL_COLUMNS};
use crate::normalize::plan_code_for_column;
use crate::period::ReportPeriod;
use crate::schedule::{FIXED_SCHEDULES, SKELETON_ROWS, ScheduleTemplate};
use crate::summary::ReconciliationSummary;

/// Run-constant labels threaded through every sheet header.
pub struct ReportContext<'a> {
    pub health_center: &'a str,
    pub fqhc_billing_number: &'a str,
    pub period: &'a ReportPeriod,
}

/// The emphasis formats used across the workbook template.
struct SheetFormats {
    bold: Format,
    bold_left: Format,
    red: Format,
    red_left: Format,
}

const RED_EMPHASIS: Color = Color::RGB(0x9C0006);

impl SheetFormats {
    fn new() -> Self {
        Self {
            bold: Format::new().set_bold().set_align(FormatAlign::Center),
            bold_left: Format::new().set_bold().set_align(FormatAlign::Left),
            red: Format::new()
                .set_bold()
                .set_font_color(RED_EMPHASIS)
                .set_align(FormatAlign::Center),
            red_left: Format::new()
                .set_bold()
                .set_font_color(RED_EMPHASIS)
                .set_align(FormatAlign::Left),
        }
    }
}

/// Write the full submission workbook: Page 1, the detail sheet, the three
/// Schedule A and B months, and the fixed C-F skeletons. Sheet order and all
/// cell offsets are the external contract; nothing here aggregates.
pub fn write_report(
    path: &Path,
    ctx: &ReportContext,
    summary: &ReconciliationSummary,
    detail: &[DetailRow],
    pivots: &[MonthlyPivot],
    receipts: &[ReceiptSchedule],
) -> Result<()> {
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Page 1")?;
    write_page1(worksheet, &formats, ctx, summary)?;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("detail data")?;
    write_detail(worksheet, detail)?;

    for (pivot, label) in pivots.iter().zip(&ctx.period.month_labels) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(format!("Support Schedule A - {label}"))?;
        write_schedule_a(worksheet, &formats, ctx, pivot, label)?;
    }

    for (schedule, label) in receipts.iter().zip(&ctx.period.month_labels) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(format!("Support Schedule B - {label}"))?;
        write_schedule_b(worksheet, &formats, ctx, schedule, label)?;
    }

    for template in &FIXED_SCHEDULES {
        for label in &ctx.period.month_labels {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(format!("Support Schedule {} - {label}", template.letter))?;
            write_fixed_schedule(worksheet, &formats, ctx, template)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed saving workbook {}", path.display()))?;
    Ok(())
}

fn col_letter(col: u16) -> char {
    (b'A' + col as u8) as char
}

fn write_page1(
    worksheet: &mut Worksheet,
    formats: &SheetFormats,
    ctx: &ReportContext,
    summary: &ReconciliationSummary,
) -> Result<()> {
    worksheet.write_string_with_format(
        0,
        1,
        "FQHC WRAPAROUND RECONCILIATION REPORT",
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(2, 0, "Prov No.", &formats.bold_left)?;
    worksheet.write_string_with_format(2, 1, ctx.fqhc_billing_number, &formats.bold_left)?;
    worksheet.write_string_with_format(4, 0, "Prov Name", &formats.bold_left)?;
    worksheet.write_string_with_format(4, 1, ctx.health_center, &formats.bold_left)?;
    worksheet.write_string_with_format(5, 2, "Initial &", &formats.bold)?;
    worksheet.write_string_with_format(6, 1, "CALENDAR YEAR QUARTER:", &formats.bold_left)?;
    worksheet.write_string_with_format(6, 2, "Revision to Initial", &formats.bold)?;
    worksheet.write_string_with_format(6, 3, "Reconciliation", &formats.bold)?;

    let quarter_label = ctx.period.quarter_label();
    worksheet.write_string_with_format(7, 1, &quarter_label, &formats.bold_left)?;
    worksheet.write_string_with_format(7, 2, "Payment", &formats.bold)?;
    worksheet.write_string_with_format(7, 3, &quarter_label, &formats.bold)?;

    // Metric rows A-G at Excel rows 10-16.
    for (i, line) in summary.lines().iter().enumerate() {
        let row = (9 + i) as u32;
        worksheet.write_string_with_format(row, 0, line.letter, &formats.bold)?;
        let label_format = if line.letter == "E" {
            &formats.red_left
        } else {
            &formats.bold_left
        };
        worksheet.write_string_with_format(row, 1, line.label, label_format)?;
        worksheet.write_number(row, 2, line.initial)?;
        worksheet.write_number(row, 3, line.reconciliation)?;
    }

    worksheet.set_column_width(0, 8)?;
    worksheet.set_column_width(1, 60)?;
    worksheet.set_column_width(2, 10)?;
    worksheet.set_column_width(3, 10)?;
    Ok(())
}

fn write_detail(worksheet: &mut Worksheet, rows: &[DetailRow]) -> Result<()> {
    for (col, name) in WRAP_DETAIL_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (1 + i) as u32;
        worksheet.write_string(r, 0, &row.billing_prov_no)?;
        worksheet.write_string(r, 1, &row.recipient_id)?;
        worksheet.write_string(r, 2, &row.patient_name)?;
        worksheet.write_string(r, 3, &row.birth_date)?;
        worksheet.write_string(r, 4, &row.hmo_name)?;
        worksheet.write_string(r, 5, &row.hmo_assigned_id)?;
        worksheet.write_string(r, 6, &row.service_date)?;
        worksheet.write_string(r, 7, &row.cpt_code)?;
        worksheet.write_string(r, 8, &row.service_type)?;
        worksheet.write_string(r, 9, &row.payment_date)?;
        worksheet.write_number(r, 10, row.encounter_flag as f64)?;
        worksheet.write_number(r, 11, row.payment_amount)?;
        worksheet.write_string(r, 12, &row.claim_id)?;
        worksheet.write_string(r, 13, &row.comment)?;
    }

    for col in 0..=2u16 {
        worksheet.set_column_width(col, 20)?;
    }
    for col in 3..=13u16 {
        worksheet.set_column_width(col, 30)?;
    }
    Ok(())
}

/// Shared header block of the monthly schedules A and B: center identity,
/// month line, worksheet labels, and the HMO column headers.
fn write_schedule_title_block(
    worksheet: &mut Worksheet,
    formats: &SheetFormats,
    ctx: &ReportContext,
    letter: char,
    month_label: &str,
) -> Result<()> {
    worksheet.write_string_with_format(
        0,
        1,
        format!(
            "Federally Qualified Health Center Name: {}",
            ctx.health_center
        ),
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(
        1,
        1,
        "MEDICAID MANAGED CARE ENCOUNTER DETAIL",
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(
        2,
        2,
        format!("Reporting Month: {month_label} {}", ctx.period.year),
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(
        1,
        5,
        format!("FQHC Number: {}", ctx.fqhc_billing_number),
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(0, 7, "Worksheet 2", &formats.bold)?;
    worksheet.write_string_with_format(1, 7, format!("Support Schedule {letter}"), &formats.bold)?;
    worksheet.write_string_with_format(3, 7, "Total", &formats.bold)?;
    worksheet.write_string_with_format(4, 7, "Medicaid", &formats.bold)?;
    worksheet.write_string_with_format(5, 7, "HMO", &formats.bold)?;
    worksheet.write_string_with_format(6, 7, "Encounters", &formats.bold)?;

    for col in 0..HMO_COLUMN_COUNT {
        worksheet.write_string_with_format(
            5,
            (2 + col) as u16,
            format!("HMO {:03}", col + 1),
            &formats.bold,
        )?;
        worksheet.write_string_with_format(
            6,
            (2 + col) as u16,
            plan_code_for_column(col),
            &formats.red,
        )?;
    }
    Ok(())
}

fn write_schedule_a(
    worksheet: &mut Worksheet,
    formats: &SheetFormats,
    ctx: &ReportContext,
    pivot: &MonthlyPivot,
    month_label: &str,
) -> Result<()> {
    write_schedule_title_block(worksheet, formats, ctx, 'A', month_label)?;

    for col in 0..HMO_COLUMN_COUNT {
        worksheet.write_string_with_format(
            7,
            (2 + col) as u16,
            format!("({})", col + 1),
            &formats.bold,
        )?;
    }
    worksheet.write_string_with_format(7, 7, "(7)", &formats.bold)?;
    worksheet.write_string_with_format(8, 0, "Core Services", &formats.bold)?;

    // Pivot body from Excel row 10.
    for (i, row) in pivot.rows.iter().enumerate() {
        let r = (9 + i) as u32;
        worksheet.write_number(r, 0, row.core_rank as f64)?;
        worksheet.write_string(r, 1, &row.service_type)?;
        for (col, count) in row.counts.iter().enumerate() {
            worksheet.write_number(r, (2 + col) as u16, *count as f64)?;
        }
        worksheet.write_number(r, 7, row.total as f64)?;
    }

    // Totals at row 22, summing the body range.
    let last_data_row = 9 + pivot.rows.len();
    worksheet.write_string(21, 1, "Total Payable Encounters")?;
    for col in 2..=7u16 {
        let letter = col_letter(col);
        worksheet.write_formula(
            21,
            col,
            Formula::new(format!("=SUM({letter}10:{letter}{last_data_row})")),
        )?;
    }

    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(1, 30)?;
    for col in 2..=7u16 {
        worksheet.set_column_width(col, 20)?;
    }
    Ok(())
}

fn write_schedule_b(
    worksheet: &mut Worksheet,
    formats: &SheetFormats,
    ctx: &ReportContext,
    schedule: &ReceiptSchedule,
    month_label: &str,
) -> Result<()> {
    write_schedule_title_block(worksheet, formats, ctx, 'B', month_label)?;
    worksheet.write_string_with_format(6, 1, "HMO Name", &formats.bold)?;

    // Receipt body from Excel row 8, one row per category line.
    for (i, row) in schedule.rows.iter().enumerate() {
        let r = (7 + i) as u32;
        worksheet.write_number(r, 0, row.line_no as f64)?;
        worksheet.write_string(r, 1, &row.category)?;
        for (col, amount) in row.amounts.iter().enumerate() {
            worksheet.write_number(r, (2 + col) as u16, *amount)?;
        }
        worksheet.write_formula(
            r,
            7,
            Formula::new(format!("=SUM(C{row}:G{row})", row = r + 1)),
        )?;
    }

    let totals_row = (7 + schedule.rows.len()) as u32;
    let last_data_row = 7 + schedule.rows.len();
    worksheet.write_string(totals_row, 1, "Total Receipts")?;
    for col in 2..=7u16 {
        let letter = col_letter(col);
        worksheet.write_formula(
            totals_row,
            col,
            Formula::new(format!("=SUM({letter}8:{letter}{last_data_row})")),
        )?;
    }

    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(1, 30)?;
    for col in 2..=7u16 {
        worksheet.set_column_width(col, 20)?;
    }
    Ok(())
}

fn write_fixed_schedule(
    worksheet: &mut Worksheet,
    formats: &SheetFormats,
    ctx: &ReportContext,
    template: &ScheduleTemplate,
) -> Result<()> {
    worksheet.write_string_with_format(
        0,
        1,
        format!(
            "Federally Qualified Health Center Name: {}",
            ctx.health_center
        ),
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(1, 1, template.subtitle, &formats.bold_left)?;
    worksheet.write_string_with_format(
        0,
        5,
        format!("FQHC Number: {}", ctx.fqhc_billing_number),
        &formats.bold_left,
    )?;
    worksheet.write_string_with_format(0, 7, "Worksheet 2", &formats.bold)?;
    worksheet.write_string_with_format(
        1,
        7,
        format!("Support Schedule {}", template.letter),
        &formats.bold,
    )?;

    for (i, heading) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
        worksheet.write_string_with_format(3, (1 + i) as u16, *heading, &formats.bold)?;
    }
    for col in 0..HMO_COLUMN_COUNT {
        worksheet.write_string_with_format(
            4,
            (2 + col) as u16,
            format!("HMO {:03}", col + 1),
            &formats.bold,
        )?;
        worksheet.write_string_with_format(
            5,
            (2 + col) as u16,
            plan_code_for_column(col),
            &formats.red,
        )?;
    }
    worksheet.write_string_with_format(4, 7, "Total Medicaid", &formats.bold)?;
    worksheet.write_string_with_format(5, 1, "HMO Name", &formats.bold_left)?;
    worksheet.write_string_with_format(5, 7, template.unit_header, &formats.bold)?;
    worksheet.write_string_with_format(7, 1, template.body_label, &formats.bold_left)?;
    worksheet.write_string_with_format(7, 7, template.count_header, &formats.bold)?;

    // Skeleton body A8:H33. The total column starts zeroed; the other cells
    // are filled in by hand on review.
    for i in 0..SKELETON_ROWS {
        worksheet.write_number((7 + i) as u32, 7, 0.0)?;
    }

    // Line numbering down column A: 1-3, then 4 at the body start, 5-30
    // below it, 31 on the totals line.
    for row in 0..3u32 {
        worksheet.write_number(row, 0, (row + 1) as f64)?;
    }
    worksheet.write_string(7, 0, "4")?;
    for (offset, value) in (5..=30).enumerate() {
        worksheet.write_number((8 + offset) as u32, 0, value as f64)?;
    }
    worksheet.write_number(35, 0, 31.0)?;
    worksheet.write_string_with_format(35, 1, "Total (Lines 8-34)", &formats.bold_left)?;
    for col in 2..=7u16 {
        let letter = col_letter(col);
        worksheet.write_formula(35, col, Formula::new(format!("=SUM({letter}8:{letter}33)")))?;
    }

    worksheet.set_column_width(0, 5)?;
    worksheet.set_column_width(1, 30)?;
    for col in 2..=7u16 {
        worksheet.set_column_width(col, 20)?;
    }
    Ok(())
}
