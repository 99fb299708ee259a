//! Enrollment management over the `enrollments` association table.
//!
//! The table keeps the original external schema's renamed columns
//! (`estudent_id`, `ecourse_id`); everything above the SQL speaks in entity
//! attribute names.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::info;

use super::courses::Course;
use super::students::Student;
use super::{StoreError, StoreResult};

/// One enrollment joined with its student and course columns, as shown in
/// the enrollments listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentRow {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub roll_number: String,
    pub student_name: String,
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
}

pub struct EnrollmentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> EnrollmentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All enrollments with their student and course details, ordered by
    /// primary key.
    pub fn list(&self) -> StoreResult<Vec<EnrollmentRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.enrollment_id,
                    s.student_id, s.roll_number, s.first_name, s.last_name,
                    c.course_id, c.course_code, c.course_name
             FROM enrollments e
             JOIN Student s ON s.student_id = e.estudent_id
             JOIN Course c ON c.course_id = e.ecourse_id
             ORDER BY e.enrollment_id",
        )?;
        let rows = stmt.query_map([], row_to_enrollment)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Enrolls a student in a course.
    ///
    /// Both sides must exist, and an existing identical pair is refused
    /// with the already-enrolled outcome. The `UNIQUE (estudent_id,
    /// ecourse_id)` constraint backs this check at the storage layer.
    pub fn create(&self, student_id: i64, course_id: i64) -> StoreResult<i64> {
        self.require_student(student_id)?;
        self.require_course(course_id)?;

        if self.pair_id(student_id, course_id)?.is_some() {
            return Err(StoreError::AlreadyEnrolled {
                student_id,
                course_id,
            });
        }

        self.conn.execute(
            "INSERT INTO enrollments (estudent_id, ecourse_id) VALUES (?1, ?2)",
            params![student_id, course_id],
        )?;
        let enrollment_id = self.conn.last_insert_rowid();
        info!(enrollment_id, student_id, course_id, "Enrollment created");

        Ok(enrollment_id)
    }

    /// Removes a single enrollment by its primary key.
    pub fn delete(&self, enrollment_id: i64) -> StoreResult<()> {
        let deleted = self.conn.execute(
            "DELETE FROM enrollments WHERE enrollment_id = ?1",
            params![enrollment_id],
        )?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("enrollment {enrollment_id}")));
        }
        info!(enrollment_id, "Enrollment deleted");
        Ok(())
    }

    /// Withdraws a student from a course by deleting the matching pair.
    pub fn withdraw(&self, student_id: i64, course_id: i64) -> StoreResult<()> {
        let deleted = self.conn.execute(
            "DELETE FROM enrollments WHERE estudent_id = ?1 AND ecourse_id = ?2",
            params![student_id, course_id],
        )?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!(
                "enrollment of student {student_id} in course {course_id}"
            )));
        }
        info!(student_id, course_id, "Enrollment withdrawn");
        Ok(())
    }

    /// The courses a student is enrolled in, for the student detail view.
    pub fn courses_for_student(&self, student_id: i64) -> StoreResult<Vec<Course>> {
        self.require_student(student_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT c.course_id, c.course_code, c.course_name, c.course_description
             FROM enrollments e
             JOIN Course c ON c.course_id = e.ecourse_id
             WHERE e.estudent_id = ?1
             ORDER BY c.course_id",
        )?;
        let rows = stmt.query_map(params![student_id], |row| {
            Ok(Course {
                course_id: row.get(0)?,
                course_code: row.get(1)?,
                course_name: row.get(2)?,
                course_description: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// The students enrolled in a course, for the course detail view.
    pub fn students_for_course(&self, course_id: i64) -> StoreResult<Vec<Student>> {
        self.require_course(course_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT s.student_id, s.roll_number, s.first_name, s.last_name
             FROM enrollments e
             JOIN Student s ON s.student_id = e.estudent_id
             WHERE e.ecourse_id = ?1
             ORDER BY s.student_id",
        )?;
        let rows = stmt.query_map(params![course_id], |row| {
            Ok(Student {
                student_id: row.get(0)?,
                roll_number: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn pair_id(&self, student_id: i64, course_id: i64) -> StoreResult<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT enrollment_id FROM enrollments
                 WHERE estudent_id = ?1 AND ecourse_id = ?2",
                params![student_id, course_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn require_student(&self, student_id: i64) -> StoreResult<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT student_id FROM Student WHERE student_id = ?1",
                params![student_id],
                |row| row.get(0),
            )
            .optional()?;
        match exists {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("student {student_id}"))),
        }
    }

    fn require_course(&self, course_id: i64) -> StoreResult<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT course_id FROM Course WHERE course_id = ?1",
                params![course_id],
                |row| row.get(0),
            )
            .optional()?;
        match exists {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("course {course_id}"))),
        }
    }
}

fn row_to_enrollment(row: &Row<'_>) -> rusqlite::Result<EnrollmentRow> {
    let first: String = row.get(3)?;
    let last: Option<String> = row.get(4)?;
    let student_name = match last {
        Some(ref l) if !l.is_empty() => format!("{first} {l}"),
        _ => first,
    };

    Ok(EnrollmentRow {
        enrollment_id: row.get(0)?,
        student_id: row.get(1)?,
        roll_number: row.get(2)?,
        student_name,
        course_id: row.get(5)?,
        course_code: row.get(6)?,
        course_name: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::courses::NewCourse;
    use crate::store::students::NewStudent;
    use crate::store::{Db, test_db};

    fn seed(db: &Db) -> (i64, i64, i64) {
        let s1 = db
            .students()
            .create(&NewStudent::parse("R-1", "Jane", None).unwrap())
            .unwrap();
        let s2 = db
            .students()
            .create(&NewStudent::parse("R-2", "John", None).unwrap())
            .unwrap();
        let c = db
            .courses()
            .create(&NewCourse::parse("CS101", "Programming", None).unwrap())
            .unwrap();
        (s1.student_id, s2.student_id, c.course_id)
    }

    #[test]
    fn test_create_and_list_joined_rows() {
        let db = test_db();
        let (s1, _, c) = seed(&db);

        db.enrollments().create(s1, c).unwrap();
        let rows = db.enrollments().list().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].roll_number, "R-1");
        assert_eq!(rows[0].course_code, "CS101");
        assert_eq!(rows[0].student_name, "Jane");
    }

    #[test]
    fn test_duplicate_pair_is_already_enrolled() {
        let db = test_db();
        let (s1, _, c) = seed(&db);

        db.enrollments().create(s1, c).unwrap();
        let err = db.enrollments().create(s1, c).unwrap_err();

        assert!(matches!(err, StoreError::AlreadyEnrolled { .. }));
        assert_eq!(db.enrollments().list().unwrap().len(), 1);
    }

    #[test]
    fn test_create_requires_existing_student_and_course() {
        let db = test_db();
        let (s1, _, c) = seed(&db);

        assert!(matches!(
            db.enrollments().create(999, c),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            db.enrollments().create(s1, 999),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_student_delete_cascades_only_to_own_enrollments() {
        let db = test_db();
        let (s1, s2, c) = seed(&db);
        db.enrollments().create(s1, c).unwrap();
        db.enrollments().create(s2, c).unwrap();

        db.students().delete(s1).unwrap();

        let remaining = db.enrollments().list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].student_id, s2);
    }

    #[test]
    fn test_course_delete_cascades() {
        let db = test_db();
        let (s1, _, c) = seed(&db);
        db.enrollments().create(s1, c).unwrap();

        db.courses().delete(c).unwrap();
        assert!(db.enrollments().list().unwrap().is_empty());
    }

    #[test]
    fn test_withdraw_removes_only_the_pair() {
        let db = test_db();
        let (s1, s2, c) = seed(&db);
        db.enrollments().create(s1, c).unwrap();
        db.enrollments().create(s2, c).unwrap();

        db.enrollments().withdraw(s1, c).unwrap();

        let remaining = db.enrollments().list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].student_id, s2);

        assert!(matches!(
            db.enrollments().withdraw(s1, c),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_detail_views() {
        let db = test_db();
        let (s1, _, c) = seed(&db);
        db.enrollments().create(s1, c).unwrap();

        let courses = db.enrollments().courses_for_student(s1).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course_code, "CS101");

        let students = db.enrollments().students_for_course(c).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].roll_number, "R-1");

        assert!(matches!(
            db.enrollments().courses_for_student(999),
            Err(StoreError::NotFound { .. })
        ));
    }
}
