use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::parser::aggregate::PropertyRecord;
use crate::parser::DocumentResult;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id           INTEGER PRIMARY KEY,
            name         TEXT NOT NULL,
            section      TEXT NOT NULL,
            owner_count  INTEGER NOT NULL,
            processed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_documents_section ON documents(section);

        CREATE TABLE IF NOT EXISTS property_records (
            id           INTEGER PRIMARY KEY,
            document_id  INTEGER NOT NULL REFERENCES documents(id),
            proprietaire TEXT NOT NULL,
            adresse      TEXT NOT NULL,
            lot          TEXT NOT NULL,
            quote_part   TEXT NOT NULL,
            section      TEXT NOT NULL,
            plan         TEXT NOT NULL,
            UNIQUE(document_id, lot)
        );
        CREATE INDEX IF NOT EXISTS idx_records_section ON property_records(section);
        CREATE INDEX IF NOT EXISTS idx_records_lot ON property_records(lot);
        ",
    )?;
    Ok(())
}

/// Save one run: a `documents` row per processed document and its records.
/// Returns the number of records written.
pub fn save_results(conn: &Connection, section: &str, results: &[DocumentResult]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut d_stmt = tx.prepare(
            "INSERT INTO documents (name, section, owner_count) VALUES (?1, ?2, ?3)",
        )?;
        let mut r_stmt = tx.prepare(
            "INSERT OR IGNORE INTO property_records
             (document_id, proprietaire, adresse, lot, quote_part, section, plan)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for result in results {
            d_stmt.execute(rusqlite::params![result.document, section, result.owners as i64])?;
            let document_id = tx.last_insert_rowid();
            for r in &result.records {
                count += r_stmt.execute(rusqlite::params![
                    document_id, r.proprietaire, r.adresse, r.lot, r.quote_part, r.section, r.plan,
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── History ──

pub struct HistoryRow {
    pub document: String,
    pub processed_at: String,
    pub record: PropertyRecord,
}

pub fn fetch_history(
    conn: &Connection,
    section: Option<&str>,
    limit: usize,
) -> Result<Vec<HistoryRow>> {
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let where_clause = match section {
        Some(s) => {
            params.push(Box::new(s.to_string()));
            " WHERE r.section = ?1"
        }
        None => "",
    };

    let sql = format!(
        "SELECT d.name, d.processed_at, r.proprietaire, r.adresse, r.lot,
                r.quote_part, r.section, r.plan
         FROM property_records r
         JOIN documents d ON d.id = r.document_id{}
         ORDER BY d.id DESC, r.id
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(HistoryRow {
                document: row.get(0)?,
                processed_at: row.get(1)?,
                record: PropertyRecord {
                    proprietaire: row.get(2)?,
                    adresse: row.get(3)?,
                    lot: row.get(4)?,
                    quote_part: row.get(5)?,
                    section: row.get(6)?,
                    plan: row.get(7)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub empty_documents: usize,
    pub records: usize,
    pub sections: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let empty_documents: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents d
         WHERE NOT EXISTS (SELECT 1 FROM property_records r WHERE r.document_id = d.id)",
        [],
        |r| r.get(0),
    )?;
    let records: usize =
        conn.query_row("SELECT COUNT(*) FROM property_records", [], |r| r.get(0))?;
    let sections: usize = conn.query_row(
        "SELECT COUNT(DISTINCT section) FROM property_records",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        documents,
        empty_documents,
        records,
        sections,
    })
}
