//! HTML report presentation.
//!
//! Binds aggregator output and the chart path into embedded tera templates.
//! Invalid or not-found lookups get the fixed error document rather than an
//! error propagated to the caller.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::aggregate::{CourseAggregate, StudentAggregate};

static STUDENT_TEMPLATE: &str = include_str!("../templates/student.html");
static COURSE_TEMPLATE: &str = include_str!("../templates/course.html");
static ERROR_TEMPLATE: &str = include_str!("../templates/error.html");

/// Renders the per-student marks table with its total row.
pub fn render_student_report(agg: &StudentAggregate) -> Result<String> {
    let mut context = tera::Context::new();
    context.insert("student_id", &agg.student_id);
    context.insert("rows", &agg.rows);
    context.insert("total", &agg.total);
    context.insert("generated_at", &Utc::now().to_rfc3339());

    Ok(tera::Tera::one_off(STUDENT_TEMPLATE, &context, true)?)
}

/// Renders the course summary with average, maximum, and the chart image.
///
/// `chart_ref` is the path the document should reference; the image itself
/// was already written by the chart renderer.
pub fn render_course_report(agg: &CourseAggregate, chart_ref: &str) -> Result<String> {
    let mut context = tera::Context::new();
    context.insert("course_id", &agg.course_id);
    // Formatting is decided here; the aggregate carries full precision.
    context.insert("average", &format!("{:.2}", agg.average));
    context.insert("max", &agg.max);
    context.insert("chart", chart_ref);
    context.insert("generated_at", &Utc::now().to_rfc3339());

    Ok(tera::Tera::one_off(COURSE_TEMPLATE, &context, true)?)
}

/// The fixed document for invalid input and failed lookups.
pub fn error_document() -> String {
    ERROR_TEMPLATE.to_string()
}

/// Writes the final document to `path`.
pub fn write_report(path: impl AsRef<Path>, html: &str) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, html)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}
