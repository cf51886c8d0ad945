//! Journal writes: who may write, for whom, and who may change records later

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::*;
use school_journal::models::{
    AttendanceStatus, CreateAttendanceRequest, CreateGradeRequest, UpdateAttendanceRequest, UpdateGradeRequest,
};
use school_journal::services::journal::GradeForm;
use school_journal::utils::errors::SchoolError;

fn grade_request(school: &School, value: f64) -> CreateGradeRequest {
    CreateGradeRequest {
        lesson_id: school.lesson.id,
        student_id: school.student.id,
        value,
        max_value: None,
        note: "контрольная".to_string(),
    }
}

#[tokio::test]
#[serial]
async fn test_teacher_grades_enrolled_student() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let grade = services
        .journal_service
        .create_grade(&school.teacher, grade_request(&school, 4.5))
        .await
        .unwrap();

    assert_eq!(grade.value, 4.5);
    assert_eq!(grade.max_value, 100.0);
    assert_eq!(grade.note, "контрольная");

    let details = services.journal_service.grade(&school.student, grade.id).await.unwrap();
    assert_eq!(details.lesson.topic, "Дроби");
    assert_eq!(details.student.id, school.student.id);
}

#[tokio::test]
#[serial]
async fn test_grade_requires_enrollment() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let request = CreateGradeRequest {
        student_id: school.other_student.id,
        ..grade_request(&school, 4.0)
    };
    let result = services.journal_service.create_grade(&school.teacher, request).await;

    assert_matches!(result, Err(SchoolError::Validation(errors)) if errors.has(Some("student"), "student_not_enrolled"));
    assert_eq!(database.count_records("grade_records").await, 0);
}

#[tokio::test]
#[serial]
async fn test_grade_on_foreign_lesson_is_invalid_choice() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let request = CreateGradeRequest {
        lesson_id: school.other_lesson.id,
        student_id: school.other_student.id,
        ..grade_request(&school, 4.0)
    };
    let result = services.journal_service.create_grade(&school.teacher, request).await;

    assert_matches!(result, Err(SchoolError::Validation(errors)) if errors.has(Some("lesson"), "invalid_choice"));
}

#[tokio::test]
#[serial]
async fn test_second_grade_for_same_lesson_is_rejected() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    services
        .journal_service
        .create_grade(&school.teacher, grade_request(&school, 5.0))
        .await
        .unwrap();
    let result = services
        .journal_service
        .create_grade(&school.teacher, grade_request(&school, 3.0))
        .await;

    assert_matches!(result, Err(SchoolError::Validation(errors)) if errors.has(None, "grade_exists"));
    assert_eq!(database.count_records("grade_records").await, 1);
}

#[tokio::test]
#[serial]
async fn test_only_teachers_write() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let by_student = services
        .journal_service
        .create_grade(&school.student, grade_request(&school, 5.0))
        .await;
    assert_matches!(by_student, Err(SchoolError::PermissionDenied(_)));

    let by_admin = services
        .journal_service
        .create_grade(&school.admin, grade_request(&school, 5.0))
        .await;
    assert_matches!(by_admin, Err(SchoolError::PermissionDenied(_)));
}

#[tokio::test]
#[serial]
async fn test_grade_form_parses_before_service_checks() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let form = GradeForm {
        lesson: school.lesson.id.to_string(),
        student: school.student.id.to_string(),
        value: "4,75".to_string(),
        max_value: String::new(),
        note: "  устный ответ ".to_string(),
    };
    let request = form.parse().unwrap();
    let grade = services
        .journal_service
        .create_grade(&school.teacher, request)
        .await
        .unwrap();

    assert_eq!(grade.value, 4.75);
    assert_eq!(grade.note, "устный ответ");
}

#[tokio::test]
#[serial]
async fn test_update_and_delete_by_lesson_teacher_only() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let journal = &services.journal_service;

    let grade = journal
        .create_grade(&school.teacher, grade_request(&school, 3.0))
        .await
        .unwrap();

    // Another teacher cannot even see the record
    let by_other_teacher = journal
        .update_grade(&school.other_teacher, grade.id, UpdateGradeRequest { value: Some(5.0), ..Default::default() })
        .await;
    assert_matches!(by_other_teacher, Err(SchoolError::NotFound { .. }));

    // The administrator sees it but does not own the lesson
    let by_admin = journal.delete_grade(&school.admin, grade.id).await;
    assert_matches!(by_admin, Err(SchoolError::PermissionDenied(_)));

    // The student sees their own grade but cannot change it
    let by_student = journal
        .update_grade(&school.student, grade.id, UpdateGradeRequest { value: Some(5.0), ..Default::default() })
        .await;
    assert_matches!(by_student, Err(SchoolError::PermissionDenied(_)));

    let updated = journal
        .update_grade(
            &school.teacher,
            grade.id,
            UpdateGradeRequest {
                value: Some(4.0),
                note: Some("пересдача".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.value, 4.0);
    assert_eq!(updated.note, "пересдача");
    assert_eq!(updated.max_value, 100.0);

    journal.delete_grade(&school.teacher, grade.id).await.unwrap();
    assert_matches!(
        journal.grade(&school.teacher, grade.id).await,
        Err(SchoolError::NotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_attendance_lifecycle() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let journal = &services.journal_service;

    let record = journal
        .create_attendance(
            &school.teacher,
            CreateAttendanceRequest {
                lesson_id: school.lesson.id,
                student_id: school.student.id,
                status: AttendanceStatus::Late,
                comment: String::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Late);

    let duplicate = journal
        .create_attendance(
            &school.teacher,
            CreateAttendanceRequest {
                lesson_id: school.lesson.id,
                student_id: school.student.id,
                status: AttendanceStatus::Present,
                comment: String::new(),
            },
        )
        .await;
    assert_matches!(duplicate, Err(SchoolError::Validation(errors)) if errors.has(None, "attendance_exists"));

    let updated = journal
        .update_attendance(
            &school.teacher,
            record.id,
            UpdateAttendanceRequest {
                status: Some(AttendanceStatus::Absent),
                comment: Some("болеет".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AttendanceStatus::Absent);
    assert_eq!(updated.status_label, AttendanceStatus::Absent.label());
    assert_eq!(updated.comment, "болеет");

    journal.delete_attendance(&school.teacher, record.id).await.unwrap();
    assert_eq!(database.count_records("attendance_records").await, 0);
}

#[tokio::test]
#[serial]
async fn test_form_choices_only_list_own_lessons() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    let (lessons, students) = services
        .journal_service
        .form_choices(&school.teacher, Some(school.lesson.id))
        .await
        .unwrap();
    assert_eq!(lessons.iter().map(|l| l.id).collect::<Vec<_>>(), vec![school.lesson.id]);
    assert_eq!(students.iter().map(|s| s.id).collect::<Vec<_>>(), vec![school.student.id]);

    let (_, students) = services
        .journal_service
        .form_choices(&school.teacher, Some(school.other_lesson.id))
        .await
        .unwrap();
    assert!(students.is_empty());
}
