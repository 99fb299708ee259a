use gradebook::chart::BarChartRenderer;
use gradebook::dispatch::{ReportRequest, Reporter};
use gradebook::report::write_report;
use gradebook::store::Db;
use gradebook::store::courses::NewCourse;
use gradebook::store::students::NewStudent;
use std::env;
use std::fs;
use std::path::PathBuf;

fn workspace(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_full_report_pipeline() {
    let dir = workspace("gradebook_it_pipeline");
    let data = dir.join("data.csv");
    fs::write(
        &data,
        "student_id,course_id,marks\n1,10,80\n1,11,90\n2,10,70\nbad,row,\n",
    )
    .unwrap();

    let reporter = Reporter::new(&data, BarChartRenderer::new(dir.join("images")));

    // Student mode: table with total, no chart side effect.
    let html = reporter.run(ReportRequest::Student(1)).unwrap();
    assert!(html.contains("<td>170</td>"));

    let output = dir.join("output.html");
    write_report(&output, &html).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), html);

    // Course mode: statistics plus the deterministically named chart image.
    let html = reporter.run(ReportRequest::Course(10)).unwrap();
    assert!(html.contains("75.00"));
    assert!(html.contains("<td>80</td>"));
    assert!(dir.join("images/10.png").exists());

    // A second run with unchanged data produces the same statistics and image.
    let first_image = fs::read(dir.join("images/10.png")).unwrap();
    let html_again = reporter.run(ReportRequest::Course(10)).unwrap();
    assert!(html_again.contains("75.00"));
    assert!(html_again.contains("<td>80</td>"));
    assert_eq!(fs::read(dir.join("images/10.png")).unwrap(), first_image);

    // Unknown ids and invalid input fall through to the fixed error document.
    for request in [
        ReportRequest::Student(99),
        ReportRequest::Course(99),
        ReportRequest::Invalid,
    ] {
        let html = reporter.run(request).unwrap();
        assert!(html.contains("Wrong input"));
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_file_backed_store_crud_round_trip() {
    let dir = workspace("gradebook_it_store");
    let db_path = dir.join("gradebook.sqlite3");

    let db = Db::open(&db_path).unwrap();
    db.init_schema().unwrap();

    let s = db
        .students()
        .create(&NewStudent::parse("21f1000001", "Jane", Some("Doe")).unwrap())
        .unwrap();
    let c = db
        .courses()
        .create(&NewCourse::parse("CS1001", "Programming", None).unwrap())
        .unwrap();
    db.enrollments().create(s.student_id, c.course_id).unwrap();

    // Reopen the same file; the data and the cascade behavior persist.
    drop(db);
    let db = Db::open(&db_path).unwrap();
    db.init_schema().unwrap();

    assert_eq!(db.enrollments().list().unwrap().len(), 1);
    db.students().delete(s.student_id).unwrap();
    assert!(db.enrollments().list().unwrap().is_empty());
    assert_eq!(db.courses().list().unwrap().len(), 1);

    fs::remove_dir_all(&dir).unwrap();
}
