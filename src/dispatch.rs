//! Report orchestration: load, aggregate, chart, render.
//!
//! The `Reporter` is constructed once with its data source and chart
//! renderer injected, so tests can substitute an in-memory renderer.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate_by_course, aggregate_by_student};
use crate::chart::ChartRenderer;
use crate::records::load_records;
use crate::report::{error_document, render_course_report, render_student_report};

/// A report request validated at the boundary. `Invalid` covers missing and
/// non-numeric identifiers; it still produces a document, never a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRequest {
    Student(u32),
    Course(u32),
    Invalid,
}

impl ReportRequest {
    /// Parses the raw optional CLI values. The course id takes precedence
    /// when both are given.
    pub fn parse(student: Option<&str>, course: Option<&str>) -> Self {
        if let Some(c) = course {
            return match c.trim().parse() {
                Ok(id) => ReportRequest::Course(id),
                Err(_) => ReportRequest::Invalid,
            };
        }
        if let Some(s) = student {
            return match s.trim().parse() {
                Ok(id) => ReportRequest::Student(id),
                Err(_) => ReportRequest::Invalid,
            };
        }
        ReportRequest::Invalid
    }
}

pub struct Reporter<C> {
    data_path: PathBuf,
    chart: C,
}

impl<C: ChartRenderer> Reporter<C> {
    pub fn new(data_path: impl Into<PathBuf>, chart: C) -> Self {
        Self {
            data_path: data_path.into(),
            chart,
        }
    }

    /// Produces the final report document for `request`.
    ///
    /// Invalid input and not-found ids yield the fixed error document.
    /// Only I/O and rendering failures surface as errors.
    pub fn run(&self, request: ReportRequest) -> Result<String> {
        let request = match request {
            ReportRequest::Invalid => {
                warn!("Invalid or missing identifier, producing error document");
                return Ok(error_document());
            }
            other => other,
        };

        let outcome = load_records(&self.data_path)?;
        if outcome.skipped > 0 {
            warn!(skipped = outcome.skipped, "Malformed rows dropped from source");
        }

        match request {
            ReportRequest::Student(id) => match aggregate_by_student(&outcome.records, id) {
                Some(agg) => {
                    debug!(stats = %serde_json::to_string(&agg)?, "Student aggregate");
                    info!(student_id = id, courses = agg.rows.len(), "Student report generated");
                    render_student_report(&agg)
                }
                None => {
                    warn!(student_id = id, "Student not found");
                    Ok(error_document())
                }
            },
            ReportRequest::Course(id) => match aggregate_by_course(&outcome.records, id) {
                Some(agg) => {
                    debug!(stats = %serde_json::to_string(&agg)?, "Course aggregate");
                    let chart_path = self.chart.render(id, &agg.histogram)?;
                    info!(course_id = id, count = agg.count, "Course report generated");
                    render_course_report(&agg, &chart_path.display().to_string())
                }
                None => {
                    warn!(course_id = id, "Course not found");
                    Ok(error_document())
                }
            },
            ReportRequest::Invalid => unreachable!(),
        }
    }
}
