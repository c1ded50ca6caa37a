// src/csv.rs
//
// Small CSV/TSV reader and writer for entity lists and exports.

use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Rows of `text` split on `sep`. Handles quoted fields with doubled quotes,
/// CRLF endings and blank lines (skipped).
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = s!();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    let end_row = |row: &mut Vec<String>, rows: &mut Vec<Vec<String>>| {
        let blank = row.len() == 1 && row[0].is_empty();
        if blank {
            row.clear();
        } else {
            rows.push(take(row));
        }
    };

    while let Some(ch) = chars.next() {
        if quoted {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => quoted = true,
            '\r' => {}
            '\n' => {
                row.push(take(&mut field));
                end_row(&mut row, &mut rows);
            }
            c if c == sep => row.push(take(&mut field)),
            _ => field.push(ch),
        }
    }

    // last line without a trailing newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        end_row(&mut row, &mut rows);
    }
    rows
}

/// Treat the first row as a header when its first cell names a known column.
pub fn split_header(mut rows: Vec<Vec<String>>, names: &[&str]) -> (Option<Vec<String>>, Vec<Vec<String>>) {
    let is_header = rows
        .first()
        .and_then(|r| r.first())
        .map(|c| names.iter().any(|n| c.trim().eq_ignore_ascii_case(n)))
        .unwrap_or(false);
    if is_header {
        let header = rows.remove(0);
        return (Some(header), rows);
    }
    (None, rows)
}

/* ---------------- Writing ---------------- */

/// Append one cell, quoted when it holds the separator, a quote or a line break.
fn push_cell(out: &mut String, cell: &str, sep: char) {
    if cell.contains([sep, '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

/// Append one row, newline-terminated.
pub fn push_row(out: &mut String, row: &[String], sep: char) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        push_cell(out, cell, sep);
    }
    out.push('\n');
}

/// Whole table as one string; `headers` first when given.
pub fn to_table_string(headers: Option<&[String]>, rows: &[Vec<String>], sep: char) -> String {
    let mut out = String::new();
    for row in headers.into_iter().chain(rows.iter().map(Vec::as_slice)) {
        push_row(&mut out, row, sep);
    }
    out
}
