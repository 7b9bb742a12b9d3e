use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::models::{BeerRecord, MergedBeerRecord, SourceBatch};

/// Source id for a crawler output file: the file stem without `prefix`.
pub fn source_id_for(path: &Path, prefix: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match stem.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}

/// Records read from a JSON array, with the number of entries that could
/// not be read as a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecords {
    pub records: Vec<BeerRecord>,
    pub skipped: usize,
}

/// Load one crawler output file (a JSON array of records).
///
/// Array entries that are not record objects are skipped with a warning.
pub fn load_source_file(path: &Path, prefix: &str) -> Result<SourceBatch> {
    let source_id = source_id_for(path, prefix);
    let loaded = read_record_array(path, &source_id)?;

    info!(source = %source_id, records = loaded.records.len(), "loaded {}", path.display());
    Ok(SourceBatch::new(source_id, loaded.records))
}

/// Load several source files. A file that cannot be read is skipped with a
/// warning; it is an error only when none of them could be read.
pub fn load_sources(paths: &[PathBuf], prefix: &str) -> Result<Vec<SourceBatch>> {
    let mut batches = Vec::with_capacity(paths.len());
    let mut failed = Vec::new();

    for path in paths {
        match load_source_file(path, prefix) {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                warn!("skipping source {}: {e}", path.display());
                failed.push(path.display().to_string());
            }
        }
    }

    if batches.is_empty() && !failed.is_empty() {
        return Err(CoreError::SourceNotFound(failed.join(", ")));
    }
    Ok(batches)
}

/// Load a plain list of records with the same tolerance as
/// [`load_source_file`]: unreadable entries are skipped and counted.
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    let label = path.display().to_string();
    read_record_array(path, &label)
}

/// Load a merged list written by [`save_merged`].
pub fn load_merged(path: &Path) -> Result<Vec<MergedBeerRecord>> {
    let contents = fs::read_to_string(path)?;
    let merged: Vec<MergedBeerRecord> = serde_json::from_str(&contents)?;
    Ok(merged)
}

pub fn save_merged(path: &Path, records: &[MergedBeerRecord], pretty: bool) -> Result<()> {
    write_json_list(path, records, pretty)
}

pub fn save_records(path: &Path, records: &[BeerRecord], pretty: bool) -> Result<()> {
    write_json_list(path, records, pretty)
}

fn read_record_array(path: &Path, label: &str) -> Result<LoadedRecords> {
    if !path.exists() {
        return Err(CoreError::SourceNotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path)?;
    let Value::Array(items) = serde_json::from_str::<Value>(&contents)? else {
        return Err(CoreError::InvalidSource(path.display().to_string()));
    };

    let mut loaded = LoadedRecords {
        records: Vec::with_capacity(items.len()),
        skipped: 0,
    };
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<BeerRecord>(item) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                loaded.skipped += 1;
                warn!(source = %label, index = idx, "skipping unreadable record: {e}");
            }
        }
    }
    Ok(loaded)
}

/// Writes through a sibling temp file so a failed run never leaves a
/// truncated output behind.
fn write_json_list<T: Serialize>(path: &Path, items: &[T], pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = if pretty {
        serde_json::to_string_pretty(items)?
    } else {
        serde_json::to_string(items)?
    };

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
