//! Class and student reports built from the journal

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serial_test::serial;

use helpers::*;
use school_journal::models::{CreateGradeRequest, GradeFilter, Role};
use school_journal::services::ServiceFactory;
use school_journal::utils::errors::SchoolError;

async fn give_grade(services: &ServiceFactory, school: &School, lesson_id: i64, student_id: i64, value: f64, note: &str) {
    services
        .journal_service
        .create_grade(
            &school.teacher,
            CreateGradeRequest {
                lesson_id,
                student_id,
                value,
                max_value: None,
                note: note.to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
#[serial]
async fn test_class_report_averages() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let latecomer = create_user(&database.db, "abramov@school.test", "Олег", "Абрамов", Role::Student).await;
    enroll(&database.db, &latecomer, &school.classroom).await;
    let second_lesson = create_lesson(
        &database.db,
        &school.subject,
        &school.classroom,
        &school.teacher,
        date(2025, 3, 5),
        "Десятичные дроби",
    )
    .await;

    give_grade(&services, &school, school.lesson.id, school.student.id, 4.0, "устный ответ").await;
    give_grade(&services, &school, second_lesson.id, school.student.id, 5.0, "").await;

    let report = services
        .report_service
        .class_report(&school.teacher, school.classroom.id, GradeFilter::default())
        .await
        .unwrap();

    assert_eq!(report.classroom.label, "5А");
    assert_eq!(report.students.len(), 2);

    // Sorted by last name: Абрамов before Иванов
    let empty = &report.students[0];
    assert_eq!(empty.student.id, latecomer.id);
    assert_eq!(empty.average, None);
    assert_eq!(empty.average_display, "-");
    assert_eq!(empty.comment, "-");

    let graded = &report.students[1];
    assert_eq!(graded.student.id, school.student.id);
    assert_eq!(graded.average, Some(4.5));
    assert_eq!(graded.average_display, "4.50");
    assert_eq!(graded.grade_count, 2);
    assert_eq!(graded.comment, "устный ответ");
}

#[tokio::test]
#[serial]
async fn test_class_report_filters() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let physics = create_subject(&database.db, "Физика", "PHYS-9F3C", Some(&school.teacher)).await;
    let physics_lesson = create_lesson(
        &database.db,
        &physics,
        &school.classroom,
        &school.teacher,
        date(2025, 3, 6),
        "Сила тяжести",
    )
    .await;

    give_grade(&services, &school, school.lesson.id, school.student.id, 3.0, "").await;
    give_grade(&services, &school, physics_lesson.id, school.student.id, 5.0, "").await;

    let by_subject = services
        .report_service
        .class_report(
            &school.admin,
            school.classroom.id,
            GradeFilter { subject_id: Some(physics.id), ..GradeFilter::default() },
        )
        .await
        .unwrap();
    assert_eq!(by_subject.students[0].average_display, "5.00");

    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let future = services
        .report_service
        .class_report(
            &school.admin,
            school.classroom.id,
            GradeFilter { start_date: Some(tomorrow), ..GradeFilter::default() },
        )
        .await
        .unwrap();
    assert_eq!(future.students[0].grade_count, 0);
    assert_eq!(future.students[0].average_display, "-");
}

#[tokio::test]
#[serial]
async fn test_class_report_is_for_staff() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    assert_matches!(
        services
            .report_service
            .class_report(&school.student, school.classroom.id, GradeFilter::default())
            .await,
        Err(SchoolError::PermissionDenied(_))
    );
    assert_matches!(
        services
            .report_service
            .class_report(&school.admin, 999_999, GradeFilter::default())
            .await,
        Err(SchoolError::NotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_student_report_permissions() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    give_grade(&services, &school, school.lesson.id, school.student.id, 4.25, "").await;

    let own = services
        .report_service
        .student_report(&school.student, school.student.id)
        .await
        .unwrap();
    assert_eq!(own.average_display, "4.25");
    assert_eq!(own.classroom.as_ref().map(|c| c.id), Some(school.classroom.id));

    assert!(services
        .report_service
        .student_report(&school.other_teacher, school.student.id)
        .await
        .is_ok());

    assert_matches!(
        services
            .report_service
            .student_report(&school.other_student, school.student.id)
            .await,
        Err(SchoolError::PermissionDenied(_))
    );

    // Staff asking for a non-student get a missing report
    assert_matches!(
        services
            .report_service
            .student_report(&school.admin, school.teacher.id)
            .await,
        Err(SchoolError::NotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_search_students() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let reports = &services.report_service;

    let found = reports.search_students(&school.teacher, "Иван").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, school.student.id);

    // Teachers never show up in student search
    assert!(reports.search_students(&school.admin, "Петров").await.unwrap().is_empty());
    assert!(reports.search_students(&school.admin, "   ").await.unwrap().is_empty());
    assert!(reports.search_students(&school.admin, "%").await.unwrap().is_empty());

    assert_matches!(
        reports.search_students(&school.student, "Ольга").await,
        Err(SchoolError::PermissionDenied(_))
    );
}
