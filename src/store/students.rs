//! Student CRUD over the `Student` table.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::info;

use super::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub student_id: i64,
    pub roll_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Student {
    /// First and last name joined, as shown in listings.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// Validated input for creating a student. Roll number is the natural key
/// and is immutable after creation.
#[derive(Debug)]
pub struct NewStudent {
    pub roll_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl NewStudent {
    /// Trims the fields and rejects empty required ones.
    pub fn parse(
        roll_number: &str,
        first_name: &str,
        last_name: Option<&str>,
    ) -> StoreResult<Self> {
        let roll_number = roll_number.trim();
        let first_name = first_name.trim();

        if roll_number.is_empty() || first_name.is_empty() {
            return Err(StoreError::invalid(
                "roll number and first name are required",
            ));
        }

        Ok(Self {
            roll_number: roll_number.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

pub struct StudentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StudentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All students ordered by primary key.
    pub fn list(&self) -> StoreResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_id, roll_number, first_name, last_name
             FROM Student ORDER BY student_id",
        )?;
        let rows = stmt.query_map([], row_to_student)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get(&self, student_id: i64) -> StoreResult<Student> {
        self.conn
            .query_row(
                "SELECT student_id, roll_number, first_name, last_name
                 FROM Student WHERE student_id = ?1",
                params![student_id],
                row_to_student,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(format!("student {student_id}")))
    }

    /// Inserts a new student, rejecting a duplicate roll number with a
    /// distinct outcome before the database constraint would fire.
    pub fn create(&self, new: &NewStudent) -> StoreResult<Student> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT student_id FROM Student WHERE roll_number = ?1",
                params![new.roll_number],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "student",
                key: "roll_number",
                value: new.roll_number.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO Student (roll_number, first_name, last_name) VALUES (?1, ?2, ?3)",
            params![new.roll_number, new.first_name, new.last_name],
        )?;
        let student_id = self.conn.last_insert_rowid();
        info!(student_id, roll_number = %new.roll_number, "Student created");

        self.get(student_id)
    }

    /// Replaces the name fields. The roll number is a natural key and
    /// cannot change after creation.
    pub fn update(
        &self,
        student_id: i64,
        first_name: &str,
        last_name: Option<&str>,
    ) -> StoreResult<Student> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(StoreError::invalid("first name is required"));
        }
        let last_name = last_name
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let updated = self.conn.execute(
            "UPDATE Student SET first_name = ?2, last_name = ?3 WHERE student_id = ?1",
            params![student_id, first_name, last_name],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("student {student_id}")));
        }
        info!(student_id, "Student updated");

        self.get(student_id)
    }

    /// Deletes the student; enrollments go with it via the cascade.
    pub fn delete(&self, student_id: i64) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM Student WHERE student_id = ?1", params![student_id])?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("student {student_id}")));
        }
        info!(student_id, "Student deleted");
        Ok(())
    }
}

fn row_to_student(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        student_id: row.get(0)?,
        roll_number: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_db;

    fn new_student(roll: &str, first: &str) -> NewStudent {
        NewStudent::parse(roll, first, Some("Doe")).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let db = test_db();
        let created = db.students().create(&new_student("R-1", "Jane")).unwrap();

        let fetched = db.students().get(created.student_id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.full_name(), "Jane Doe");
    }

    #[test]
    fn test_duplicate_roll_number_is_distinct_outcome() {
        let db = test_db();
        db.students().create(&new_student("R-1", "Jane")).unwrap();

        let err = db.students().create(&new_student("R-1", "John")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        // No second row was created.
        assert_eq!(db.students().list().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_rejects_empty_required_fields() {
        assert!(matches!(
            NewStudent::parse("  ", "Jane", None),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            NewStudent::parse("R-1", "", None),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_update_keeps_roll_number() {
        let db = test_db();
        let s = db.students().create(&new_student("R-1", "Jane")).unwrap();

        let updated = db
            .students()
            .update(s.student_id, "Janet", None)
            .unwrap();
        assert_eq!(updated.roll_number, "R-1");
        assert_eq!(updated.first_name, "Janet");
        assert_eq!(updated.last_name, None);
    }

    #[test]
    fn test_list_orders_by_primary_key() {
        let db = test_db();
        db.students().create(&new_student("R-2", "B")).unwrap();
        db.students().create(&new_student("R-1", "A")).unwrap();

        let ids: Vec<i64> = db
            .students()
            .list()
            .unwrap()
            .iter()
            .map(|s| s.student_id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let db = test_db();
        assert!(matches!(
            db.students().get(42),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            db.students().delete(42),
            Err(StoreError::NotFound { .. })
        ));
    }
}
