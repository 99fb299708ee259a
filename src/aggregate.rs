//! Statistics over filtered enrollment records.
//!
//! Both entry points are a single linear scan over the in-memory records;
//! at this data volume an index would be more machinery than the problem
//! deserves.

use serde::Serialize;

use crate::records::EnrollmentRecord;

/// Frequency count of marks values, preserving insertion order of first
/// occurrence. Consumers that need a sorted x-axis must sort explicitly.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram(Vec<(u32, u32)>);

impl Histogram {
    pub fn bump(&mut self, marks: u32) {
        match self.0.iter_mut().find(|(m, _)| *m == marks) {
            Some((_, count)) => *count += 1,
            None => self.0.push((marks, 1)),
        }
    }

    /// `(marks, count)` pairs in first-occurrence order.
    pub fn entries(&self) -> &[(u32, u32)] {
        &self.0
    }

    /// `(marks, count)` pairs sorted ascending by marks value.
    pub fn sorted_entries(&self) -> Vec<(u32, u32)> {
        let mut entries = self.0.clone();
        entries.sort_by_key(|(m, _)| *m);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of records counted across all marks values.
    pub fn total_count(&self) -> u32 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

/// One `(course_id, marks)` row of a student's report, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourseMarks {
    pub course_id: u32,
    pub marks: u32,
}

#[derive(Debug, Serialize)]
pub struct StudentAggregate {
    pub student_id: u32,
    pub rows: Vec<CourseMarks>,
    pub total: u32,
}

#[derive(Debug, Serialize)]
pub struct CourseAggregate {
    pub course_id: u32,
    pub count: usize,
    pub average: f64,
    pub max: u32,
    pub histogram: Histogram,
}

/// Collects every record for `student_id` along with the marks total.
///
/// Returns `None` when no record matches; callers must take the not-found
/// path rather than render a zeroed report.
pub fn aggregate_by_student(
    records: &[EnrollmentRecord],
    student_id: u32,
) -> Option<StudentAggregate> {
    let mut rows = Vec::new();
    let mut total = 0u32;

    for r in records {
        if r.student_id == student_id {
            rows.push(CourseMarks {
                course_id: r.course_id,
                marks: r.marks,
            });
            total += r.marks;
        }
    }

    if rows.is_empty() {
        return None;
    }

    Some(StudentAggregate {
        student_id,
        rows,
        total,
    })
}

/// Computes average, maximum, and marks-frequency histogram for `course_id`.
///
/// Returns `None` when no record matches. The average keeps full f64
/// precision; formatting is the presenter's decision.
pub fn aggregate_by_course(
    records: &[EnrollmentRecord],
    course_id: u32,
) -> Option<CourseAggregate> {
    let mut count = 0usize;
    let mut sum = 0u64;
    let mut max = 0u32;
    let mut histogram = Histogram::default();

    for r in records {
        if r.course_id == course_id {
            count += 1;
            sum += u64::from(r.marks);
            max = max.max(r.marks);
            histogram.bump(r.marks);
        }
    }

    if count == 0 {
        return None;
    }

    Some(CourseAggregate {
        course_id,
        count,
        average: sum as f64 / count as f64,
        max,
        histogram,
    })
}
