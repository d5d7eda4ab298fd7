use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use std::{fs, path::Path};

use crate::extract::ClaimLine;

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Replace the warehouse table with the raw concatenated extract. The copy is
/// an audit side channel, independent of the report pipeline: prior contents
/// are dropped so the table always mirrors the latest run's input.
pub fn replace_raw_extract(db_path: &Path, table: &str, lines: &[ClaimLine]) -> Result<usize> {
    if table.is_empty() {
        bail!("Warehouse table name must not be empty");
    }
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating {}", parent.display()))?;
    }

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed opening warehouse DB {}", db_path.display()))?;
    let table_ident = quote_ident(table);
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        DROP TABLE IF EXISTS {table_ident};
        CREATE TABLE {table_ident} (
            amount_charge REAL NOT NULL,
            member_id TEXT,
            plan_code TEXT,
            group_number TEXT,
            claim_number TEXT,
            position_name TEXT,
            provider_name TEXT,
            payment_post_date TEXT,
            service_date TEXT,
            encounter_number TEXT,
            patient_dob TEXT,
            patient_name TEXT,
            procedure_code TEXT,
            record_type TEXT
        );
        "
    ))
    .with_context(|| format!("Failed recreating warehouse table {table}"))?;

    let tx = conn
        .transaction()
        .context("Failed starting warehouse transaction")?;
    {
        let mut stmt = tx
            .prepare(&format!(
                "
                INSERT INTO {table_ident} (
                    amount_charge,
                    member_id,
                    plan_code,
                    group_number,
                    claim_number,
                    position_name,
                    provider_name,
                    payment_post_date,
                    service_date,
                    encounter_number,
                    patient_dob,
                    patient_name,
                    procedure_code,
                    record_type
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "
            ))
            .context("Failed preparing warehouse insert statement")?;
        for line in lines {
            stmt.execute(params![
                line.amount_charge,
                line.member_id.as_str(),
                line.plan_code.as_str(),
                line.group_number.as_str(),
                line.claim_number.as_str(),
                line.position_name.as_str(),
                line.provider_name.as_str(),
                line.payment_post_date.as_str(),
                line.service_date.as_str(),
                line.encounter_number.as_str(),
                line.patient_dob.as_str(),
                line.patient_name.as_str(),
                line.procedure_code.as_str(),
                line.record_type.as_str(),
            ])
            .with_context(|| {
                format!(
                    "Failed inserting warehouse row for encounter {}",
                    line.encounter_number
                )
            })?;
        }
    }
    tx.commit().context("Failed committing warehouse transaction")?;
    Ok(lines.len())
}
