//! Role-based visibility of academic and journal records

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use helpers::*;
use school_journal::models::{CreateGradeRequest, Role};
use school_journal::services::Scope;
use school_journal::utils::errors::SchoolError;

fn ids<T>(items: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    let mut ids: Vec<i64> = items.iter().map(id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
#[serial]
async fn test_lessons_by_role() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let academics = &services.academics_service;

    let all = academics.lessons(&school.admin, None).await.unwrap();
    assert_eq!(all.total, 2);

    let taught = academics.lessons(&school.teacher, None).await.unwrap();
    assert_eq!(ids(&taught.items, |l| l.id), vec![school.lesson.id]);

    let attended = academics.lessons(&school.other_student, None).await.unwrap();
    assert_eq!(ids(&attended.items, |l| l.id), vec![school.other_lesson.id]);

    assert_matches!(
        academics.lesson(&school.student, school.other_lesson.id).await,
        Err(SchoolError::NotFound { .. })
    );
    assert!(academics.lesson(&school.admin, school.other_lesson.id).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_classrooms_by_role() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let academics = &services.academics_service;

    let curated = academics.classrooms(&school.teacher).await.unwrap();
    assert_eq!(ids(&curated, |c| c.id), vec![school.classroom.id]);
    assert_eq!(curated[0].label, "5А");
    assert_eq!(curated[0].curator.as_ref().map(|c| c.id), Some(school.teacher.id));

    let enrolled = academics.classrooms(&school.student).await.unwrap();
    assert_eq!(ids(&enrolled, |c| c.id), vec![school.classroom.id]);

    let everything = academics.classrooms(&school.admin).await.unwrap();
    assert_eq!(everything.len(), 2);

    assert_matches!(
        academics.classroom(&school.teacher, school.other_classroom.id).await,
        Err(SchoolError::NotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_enrollments_by_role() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let academics = &services.academics_service;

    let curated = academics.enrollments(&school.other_teacher, None).await.unwrap();
    assert_eq!(ids(&curated.items, |e| e.student.id), vec![school.other_student.id]);

    let own = academics.enrollments(&school.student, None).await.unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].classroom.id, school.classroom.id);

    let all = academics.enrollments(&school.admin, None).await.unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
#[serial]
async fn test_subjects_are_visible_to_everyone() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;

    for user in [&school.admin, &school.teacher, &school.student] {
        let subjects = services.academics_service.subjects(user).await.unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].code, "MATH-1A2B");
    }
}

#[tokio::test]
#[serial]
async fn test_grades_by_role() {
    let database = require_db!();
    let services = database.services();
    let school = School::seed(&database.db).await;
    let journal = &services.journal_service;

    let own = journal
        .create_grade(
            &school.teacher,
            CreateGradeRequest {
                lesson_id: school.lesson.id,
                student_id: school.student.id,
                value: 5.0,
                max_value: None,
                note: String::new(),
            },
        )
        .await
        .unwrap();
    let foreign = journal
        .create_grade(
            &school.other_teacher,
            CreateGradeRequest {
                lesson_id: school.other_lesson.id,
                student_id: school.other_student.id,
                value: 3.0,
                max_value: None,
                note: String::new(),
            },
        )
        .await
        .unwrap();

    let student_view = journal.grades(&school.student, None).await.unwrap();
    assert_eq!(ids(&student_view.items, |g| g.id), vec![own.id]);

    let teacher_view = journal.teacher_grades(&school.other_teacher, None).await.unwrap();
    assert_eq!(ids(&teacher_view.items, |g| g.id), vec![foreign.id]);

    let admin_view = journal.grades(&school.admin, None).await.unwrap();
    assert_eq!(admin_view.total, 2);

    assert_matches!(journal.grade(&school.student, foreign.id).await, Err(SchoolError::NotFound { .. }));
    assert_matches!(journal.student_grades(&school.teacher, None).await, Err(SchoolError::PermissionDenied(_)));
}

#[tokio::test]
#[serial]
async fn test_dashboard_counts_follow_scope() {
    let database = require_db!();
    let school = School::seed(&database.db).await;

    let admin = database.db.dashboard_stats(&Scope::for_user(&school.admin)).await.unwrap();
    assert_eq!(admin.lessons, 2);
    assert_eq!(admin.classrooms, 2);
    assert_eq!(admin.students, Some(2));
    assert_eq!(admin.teachers, Some(2));

    let teacher = database.db.dashboard_stats(&Scope::for_user(&school.teacher)).await.unwrap();
    assert_eq!(teacher.lessons, 1);
    assert_eq!(teacher.classrooms, 1);
    assert_eq!(teacher.students, None);
    assert_eq!(teacher.recent_lessons.len(), 1);

    assert_eq!(school.student.role, Role::Student);
    let student = database.db.dashboard_stats(&Scope::for_user(&school.student)).await.unwrap();
    assert_eq!(student.lessons, 1);
    assert_eq!(student.recent_lessons[0].id, school.lesson.id);
}
