//! Relational store for students, courses, and enrollments.
//!
//! Backed by an embedded SQLite database. The `Db` facade owns the
//! connection and hands out per-entity repositories; foreign keys are
//! enabled per connection so parent deletes cascade at the storage layer.

pub mod courses;
pub mod enrollments;
pub mod students;

pub use courses::CourseRepository;
pub use enrollments::EnrollmentRepository;
pub use students::StudentRepository;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Outcomes the CLI must render distinctly, plus a transparent variant for
/// unanticipated storage failures that propagate to the top-level handler.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{entity} with {key} '{value}' already exists")]
    AlreadyExists {
        entity: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("student {student_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { student_id: i64, course_id: i64 },

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidInput(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Student (
    student_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    roll_number TEXT NOT NULL UNIQUE,
    first_name  TEXT NOT NULL,
    last_name   TEXT
);

CREATE TABLE IF NOT EXISTS Course (
    course_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    course_code        TEXT NOT NULL UNIQUE,
    course_name        TEXT NOT NULL,
    course_description TEXT
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    estudent_id   INTEGER NOT NULL
        REFERENCES Student (student_id) ON DELETE CASCADE,
    ecourse_id    INTEGER NOT NULL
        REFERENCES Course (course_id) ON DELETE CASCADE,
    UNIQUE (estudent_id, ecourse_id)
);
";

/// Owns the SQLite connection and hands out entity repositories.
pub struct Db {
    conn: Connection,
}

impl Db {
    /// Opens (creating if absent) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening database");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a fresh in-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        // Cascades rely on this; SQLite defaults foreign keys to off.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Creates the tables if they do not exist yet.
    pub fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        debug!("Schema initialized");
        Ok(())
    }

    pub fn students(&self) -> StudentRepository<'_> {
        StudentRepository::new(&self.conn)
    }

    pub fn courses(&self) -> CourseRepository<'_> {
        CourseRepository::new(&self.conn)
    }

    pub fn enrollments(&self) -> EnrollmentRepository<'_> {
        EnrollmentRepository::new(&self.conn)
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    db.init_schema().unwrap();
    db
}
