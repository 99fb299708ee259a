//! Course CRUD over the `Course` table.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::info;

use super::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub course_description: Option<String>,
}

/// Validated input for creating a course. The course code is the natural
/// key and is immutable after creation.
#[derive(Debug)]
pub struct NewCourse {
    pub course_code: String,
    pub course_name: String,
    pub course_description: Option<String>,
}

impl NewCourse {
    pub fn parse(code: &str, name: &str, description: Option<&str>) -> StoreResult<Self> {
        let code = code.trim();
        let name = name.trim();

        if code.is_empty() || name.is_empty() {
            return Err(StoreError::invalid("course code and name are required"));
        }

        Ok(Self {
            course_code: code.to_string(),
            course_name: name.to_string(),
            course_description: description
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

pub struct CourseRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CourseRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All courses ordered by primary key.
    pub fn list(&self) -> StoreResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT course_id, course_code, course_name, course_description
             FROM Course ORDER BY course_id",
        )?;
        let rows = stmt.query_map([], row_to_course)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get(&self, course_id: i64) -> StoreResult<Course> {
        self.conn
            .query_row(
                "SELECT course_id, course_code, course_name, course_description
                 FROM Course WHERE course_id = ?1",
                params![course_id],
                row_to_course,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("course {course_id}")))
    }

    pub fn create(&self, new: &NewCourse) -> StoreResult<Course> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT course_id FROM Course WHERE course_code = ?1",
                params![new.course_code],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "course",
                key: "course_code",
                value: new.course_code.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO Course (course_code, course_name, course_description)
             VALUES (?1, ?2, ?3)",
            params![new.course_code, new.course_name, new.course_description],
        )?;
        let course_id = self.conn.last_insert_rowid();
        info!(course_id, course_code = %new.course_code, "Course created");

        self.get(course_id)
    }

    /// Replaces name and description. The course code cannot change after
    /// creation.
    pub fn update(
        &self,
        course_id: i64,
        course_name: &str,
        course_description: Option<&str>,
    ) -> StoreResult<Course> {
        let course_name = course_name.trim();
        if course_name.is_empty() {
            return Err(StoreError::invalid("course name is required"));
        }
        let course_description = course_description
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let updated = self.conn.execute(
            "UPDATE Course SET course_name = ?2, course_description = ?3
             WHERE course_id = ?1",
            params![course_id, course_name, course_description],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("course {course_id}")));
        }
        info!(course_id, "Course updated");

        self.get(course_id)
    }

    /// Deletes the course; enrollments go with it via the cascade.
    pub fn delete(&self, course_id: i64) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM Course WHERE course_id = ?1", params![course_id])?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("course {course_id}")));
        }
        info!(course_id, "Course deleted");
        Ok(())
    }
}

fn row_to_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        course_id: row.get(0)?,
        course_code: row.get(1)?,
        course_name: row.get(2)?,
        course_description: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_db;

    fn new_course(code: &str, name: &str) -> NewCourse {
        NewCourse::parse(code, name, Some("An introductory course")).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let db = test_db();
        let created = db.courses().create(&new_course("CS101", "Programming")).unwrap();

        let fetched = db.courses().get(created.course_id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_duplicate_code_is_distinct_outcome() {
        let db = test_db();
        db.courses().create(&new_course("CS101", "Programming")).unwrap();

        let err = db
            .courses()
            .create(&new_course("CS101", "Programming II"))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(db.courses().list().unwrap().len(), 1);
    }

    #[test]
    fn test_update_keeps_code() {
        let db = test_db();
        let c = db.courses().create(&new_course("CS101", "Programming")).unwrap();

        let updated = db
            .courses()
            .update(c.course_id, "Systems Programming", None)
            .unwrap();
        assert_eq!(updated.course_code, "CS101");
        assert_eq!(updated.course_name, "Systems Programming");
        assert_eq!(updated.course_description, None);
    }

    #[test]
    fn test_parse_rejects_empty_required_fields() {
        assert!(matches!(
            NewCourse::parse("", "Programming", None),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            NewCourse::parse("CS101", "  ", None),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.courses().get(9),
            Err(StoreError::NotFound { .. })
        ));
    }
}
