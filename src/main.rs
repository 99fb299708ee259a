//! CLI entry point for the gradebook tool.
//!
//! Provides subcommands for generating HTML reports from the CSV data file
//! and for managing students, courses, and enrollments in the SQLite store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use gradebook::chart::BarChartRenderer;
use gradebook::dispatch::{ReportRequest, Reporter};
use gradebook::report::write_report;
use gradebook::store::courses::NewCourse;
use gradebook::store::students::NewStudent;
use gradebook::store::{Db, StoreError, StoreResult};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Student-record reporting and management", long_about = None)]
struct Cli {
    /// SQLite database file (falls back to GRADEBOOK_DB, then gradebook.sqlite3)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an HTML report from the CSV data file
    Report {
        /// Student id to report on
        #[arg(short = 's', long)]
        student: Option<String>,

        /// Course id to report on (takes precedence over --student)
        #[arg(short = 'c', long)]
        course: Option<String>,

        /// CSV source file
        #[arg(long, default_value = "data.csv")]
        data: String,

        /// Path the final document is written to
        #[arg(short, long, default_value = "output.html")]
        output: String,

        /// Directory chart images are written to
        #[arg(long, default_value = "static/images")]
        images_dir: String,
    },
    /// Create the database tables if they do not exist
    InitDb,
    /// Manage students
    Students {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Manage courses
    Courses {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Manage enrollments
    Enrollments {
        #[command(subcommand)]
        command: EnrollmentCommands,
    },
}

#[derive(Subcommand)]
enum StudentCommands {
    /// List all students
    List,
    /// Show one student with their enrolled courses
    Show { student_id: i64 },
    /// Add a student
    Create {
        roll_number: String,
        first_name: String,
        last_name: Option<String>,
    },
    /// Change a student's name (the roll number is immutable)
    Update {
        student_id: i64,
        first_name: String,
        last_name: Option<String>,
    },
    /// Delete a student and their enrollments
    Delete { student_id: i64 },
    /// Withdraw a student from a course
    Withdraw { student_id: i64, course_id: i64 },
}

#[derive(Subcommand)]
enum CourseCommands {
    /// List all courses
    List,
    /// Show one course with its enrolled students
    Show { course_id: i64 },
    /// Add a course
    Create {
        course_code: String,
        course_name: String,
        description: Option<String>,
    },
    /// Change a course's name or description (the code is immutable)
    Update {
        course_id: i64,
        course_name: String,
        description: Option<String>,
    },
    /// Delete a course and its enrollments
    Delete { course_id: i64 },
}

#[derive(Subcommand)]
enum EnrollmentCommands {
    /// List all enrollments with student and course details
    List,
    /// Enroll a student in a course
    Add { student_id: i64, course_id: i64 },
    /// Delete an enrollment by its id
    Delete { enrollment_id: i64 },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gradebook.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let db_path = cli
        .db
        .clone()
        .or_else(|| std::env::var("GRADEBOOK_DB").ok())
        .unwrap_or_else(|| "gradebook.sqlite3".to_string());

    match cli.command {
        Commands::Report {
            student,
            course,
            data,
            output,
            images_dir,
        } => {
            let request = ReportRequest::parse(student.as_deref(), course.as_deref());
            let reporter = Reporter::new(&data, BarChartRenderer::new(&images_dir));

            let html = reporter.run(request)?;
            write_report(&output, &html)?;
        }
        Commands::InitDb => {
            let db = Db::open(&db_path)?;
            db.init_schema()?;
            info!(db = %db_path, "Database initialized");
        }
        Commands::Students { command } => {
            let db = open_db(&db_path)?;
            run_student_command(&db, command)?;
        }
        Commands::Courses { command } => {
            let db = open_db(&db_path)?;
            run_course_command(&db, command)?;
        }
        Commands::Enrollments { command } => {
            let db = open_db(&db_path)?;
            run_enrollment_command(&db, command)?;
        }
    }

    Ok(())
}

fn open_db(path: &str) -> Result<Db> {
    let db = Db::open(path)?;
    db.init_schema()?;
    Ok(db)
}

fn run_student_command(db: &Db, command: StudentCommands) -> Result<()> {
    match command {
        StudentCommands::List => {
            let students = db.students().list()?;
            for s in &students {
                info!(
                    student_id = s.student_id,
                    roll_number = %s.roll_number,
                    name = %s.full_name(),
                    "Student"
                );
            }
            info!(total = students.len(), "Student list");
            Ok(())
        }
        StudentCommands::Show { student_id } => finish(try_show_student(db, student_id)),
        StudentCommands::Create {
            roll_number,
            first_name,
            last_name,
        } => finish(
            NewStudent::parse(&roll_number, &first_name, last_name.as_deref())
                .and_then(|new| db.students().create(&new))
                .map(|s| info!(student_id = s.student_id, roll_number = %s.roll_number, "Student created")),
        ),
        StudentCommands::Update {
            student_id,
            first_name,
            last_name,
        } => finish(
            db.students()
                .update(student_id, &first_name, last_name.as_deref())
                .map(|s| info!(student_id = s.student_id, name = %s.full_name(), "Student updated")),
        ),
        StudentCommands::Delete { student_id } => finish(
            db.students()
                .delete(student_id)
                .map(|()| info!(student_id, "Student deleted")),
        ),
        StudentCommands::Withdraw {
            student_id,
            course_id,
        } => finish(
            db.enrollments()
                .withdraw(student_id, course_id)
                .map(|()| info!(student_id, course_id, "Enrollment withdrawn")),
        ),
    }
}

fn try_show_student(db: &Db, student_id: i64) -> StoreResult<()> {
    let s = db.students().get(student_id)?;
    let courses = db.enrollments().courses_for_student(student_id)?;

    info!(
        student_id = s.student_id,
        roll_number = %s.roll_number,
        name = %s.full_name(),
        enrolled = courses.len(),
        "Student"
    );
    for c in &courses {
        info!(
            course_id = c.course_id,
            course_code = %c.course_code,
            course_name = %c.course_name,
            "Enrolled course"
        );
    }
    Ok(())
}

fn run_course_command(db: &Db, command: CourseCommands) -> Result<()> {
    match command {
        CourseCommands::List => {
            let courses = db.courses().list()?;
            for c in &courses {
                info!(
                    course_id = c.course_id,
                    course_code = %c.course_code,
                    course_name = %c.course_name,
                    "Course"
                );
            }
            info!(total = courses.len(), "Course list");
            Ok(())
        }
        CourseCommands::Show { course_id } => finish(try_show_course(db, course_id)),
        CourseCommands::Create {
            course_code,
            course_name,
            description,
        } => finish(
            NewCourse::parse(&course_code, &course_name, description.as_deref())
                .and_then(|new| db.courses().create(&new))
                .map(|c| info!(course_id = c.course_id, course_code = %c.course_code, "Course created")),
        ),
        CourseCommands::Update {
            course_id,
            course_name,
            description,
        } => finish(
            db.courses()
                .update(course_id, &course_name, description.as_deref())
                .map(|c| info!(course_id = c.course_id, course_name = %c.course_name, "Course updated")),
        ),
        CourseCommands::Delete { course_id } => finish(
            db.courses()
                .delete(course_id)
                .map(|()| info!(course_id, "Course deleted")),
        ),
    }
}

fn try_show_course(db: &Db, course_id: i64) -> StoreResult<()> {
    let c = db.courses().get(course_id)?;
    let students = db.enrollments().students_for_course(course_id)?;

    info!(
        course_id = c.course_id,
        course_code = %c.course_code,
        course_name = %c.course_name,
        enrolled = students.len(),
        "Course"
    );
    for s in &students {
        info!(
            student_id = s.student_id,
            roll_number = %s.roll_number,
            name = %s.full_name(),
            "Enrolled student"
        );
    }
    Ok(())
}

fn run_enrollment_command(db: &Db, command: EnrollmentCommands) -> Result<()> {
    match command {
        EnrollmentCommands::List => {
            let rows = db.enrollments().list()?;
            for e in &rows {
                info!(
                    enrollment_id = e.enrollment_id,
                    student_id = e.student_id,
                    roll_number = %e.roll_number,
                    student = %e.student_name,
                    course_id = e.course_id,
                    course_code = %e.course_code,
                    "Enrollment"
                );
            }
            info!(total = rows.len(), "Enrollment list");
            Ok(())
        }
        EnrollmentCommands::Add {
            student_id,
            course_id,
        } => finish(
            db.enrollments()
                .create(student_id, course_id)
                .map(|enrollment_id| info!(enrollment_id, student_id, course_id, "Enrollment created")),
        ),
        EnrollmentCommands::Delete { enrollment_id } => finish(
            db.enrollments()
                .delete(enrollment_id)
                .map(|()| info!(enrollment_id, "Enrollment deleted")),
        ),
    }
}

/// Maps the anticipated store outcomes to a rendered message and exit 0;
/// only unanticipated storage failures propagate.
fn finish(result: StoreResult<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(
            e @ (StoreError::NotFound { .. }
            | StoreError::AlreadyExists { .. }
            | StoreError::AlreadyEnrolled { .. }
            | StoreError::InvalidInput(_)),
        ) => {
            warn!("{e}");
            Ok(())
        }
        Err(StoreError::Storage(e)) => Err(e.into()),
    }
}
