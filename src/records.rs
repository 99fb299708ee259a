//! Record store for the file-backed variant.
//!
//! Loads `(student_id, course_id, marks)` rows from a delimited text file,
//! skipping the header and dropping rows that fail integer coercion.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// One enrollment fact: a student took a course and scored some marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrollmentRecord {
    pub student_id: u32,
    pub course_id: u32,
    pub marks: u32,
}

/// Result of loading a source file: the usable records plus a count of rows
/// that were dropped. Dropping malformed rows is policy, not an error, but
/// the count keeps it observable.
#[derive(Debug)]
pub struct LoadOutcome {
    pub records: Vec<EnrollmentRecord>,
    pub skipped: usize,
}

/// Reads enrollment records from a CSV file with a header row.
///
/// Fields are whitespace-trimmed before integer coercion. Rows with the
/// wrong column count or any non-integer field are counted and skipped.
///
/// # Errors
///
/// Returns an error only when the file itself cannot be opened or read;
/// malformed rows never fail the load.
pub fn load_records(path: impl AsRef<Path>) -> Result<LoadOutcome> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading enrollment records");

    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = idx + 2, error = %e, "Skipping unreadable row");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&row) {
            Some(record) => records.push(record),
            None => {
                warn!(line = idx + 2, "Skipping malformed row");
                skipped += 1;
            }
        }
    }

    debug!(
        loaded = records.len(),
        skipped,
        "Enrollment records loaded"
    );

    Ok(LoadOutcome { records, skipped })
}

fn parse_row(row: &csv::StringRecord) -> Option<EnrollmentRecord> {
    if row.len() != 3 {
        return None;
    }

    let student_id = row.get(0)?.trim().parse().ok()?;
    let course_id = row.get(1)?.trim().parse().ok()?;
    let marks = row.get(2)?.trim().parse().ok()?;

    Some(EnrollmentRecord {
        student_id,
        course_id,
        marks,
    })
}
