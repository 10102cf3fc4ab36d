use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::parser::aggregate::PropertyRecord;

pub const HEADER: [&str; 5] = ["Propriétaire", "Adresse", "Lot", "Section", "Quote-part"];

/// `;`-separated export, one row per record, fields quoted only when needed.
pub fn write_records<W: Write>(writer: W, records: &[PropertyRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b';').from_writer(writer);
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.write_record([&r.proprietaire, &r.adresse, &r.lot, &r.section, &r.quote_part])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_delimited(records: &[PropertyRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_records(&mut buf, records)?;
    Ok(String::from_utf8(buf)?)
}

pub fn write_file(path: &Path, records: &[PropertyRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_records(file, records).with_context(|| format!("Failed to write {}", path.display()))
}

/// `releve_AS_20240131_101500.csv`
pub fn default_path(section: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("releve_{}_{}.csv", section, stamp))
}
