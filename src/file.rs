// src/file.rs

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::config::options::ExportOptions;
use crate::csv::{parse_rows, split_header, to_table_string};
use crate::error::{Error, Result};

/// Write `bytes` to a sibling temp file, fsync, then rename over `path`.
/// Readers see either the old file or the new one, never a torn write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = write_and_swap(&tmp, path, bytes);
    if written.is_err() {
        // the target is untouched; don't leave the half-written sibling behind
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_and_swap(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(tmp).map_err(|e| Error::io(tmp, e))?;
    file.write_all(bytes).map_err(|e| Error::io(tmp, e))?;
    file.sync_all().map_err(|e| Error::io(tmp, e))?;
    drop(file);

    fs::rename(tmp, path).map_err(|e| Error::io(path, e))
}

/// Export a table per `ExportOptions` (CSV/TSV/JSON). `json` is what gets
/// written in JSON mode so records keep their types. Returns the path written.
pub fn export_table<T: Serialize>(
    export: &ExportOptions,
    headers: &[String],
    rows: &[Vec<String>],
    json: &T,
) -> Result<PathBuf> {
    let path = export.out_path();
    match export.format.delim() {
        Some(sep) => {
            let headers = export.include_headers.then_some(headers);
            let contents = to_table_string(headers, rows, sep);
            write_atomic(&path, contents.as_bytes())?;
        }
        None => write_json(&path, json)?,
    }
    Ok(path)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_atomic(path, text.as_bytes())
}

/// Entity names from a file: one per line, `#` comments and blanks skipped.
/// `.csv`/`.tsv` files use their first column (header row dropped if it says "name").
pub fn read_entity_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let sep = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(','),
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some('\t'),
        _ => None,
    };

    let names: Vec<String> = match sep {
        Some(sep) => {
            let (_, rows) = split_header(parse_rows(&text, sep), &["name", "entity", "region"]);
            rows.into_iter().filter_map(|r| r.into_iter().next()).collect()
        }
        None => text.lines().map(|l| s!(l)).collect(),
    };

    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && !n.starts_with('#'))
        .collect())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::config(format!("path exists but is not a directory: {}", dir.display())));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    Ok(())
}

pub fn looks_like_dir_hint(p: &Path) -> bool {
    let s = p.to_string_lossy();
    s.ends_with('/') || s.ends_with('\\')
}
