//! Role-based visibility of journal records
//!
//! Every listing and detail lookup goes through a [`Scope`], so HTML pages and
//! the JSON API filter records the same way.

use sqlx::{Postgres, QueryBuilder};

use crate::models::{Lesson, Role, User};
use crate::utils::errors::{Result, SchoolError, ValidationErrors};

/// What a requester is allowed to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Administrators see everything
    All,
    Teacher(i64),
    Student(i64),
}

impl Scope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Admin => Scope::All,
            Role::Teacher => Scope::Teacher(user.id),
            Role::Student => Scope::Student(user.id),
        }
    }

    /// Classrooms: curated by the teacher, or those the student is enrolled in
    pub fn restrict_classrooms(&self, query: &mut QueryBuilder<'_, Postgres>, classroom: &str) {
        match *self {
            Scope::All => {}
            Scope::Teacher(id) => {
                query.push(format!(" AND {}.curator_id = ", classroom)).push_bind(id);
            }
            Scope::Student(id) => {
                query
                    .push(format!(
                        " AND {}.id IN (SELECT classroom_id FROM enrollments WHERE student_id = ",
                        classroom
                    ))
                    .push_bind(id)
                    .push(")");
            }
        }
    }

    /// Lessons: taught by the teacher, or held in the student's classrooms
    pub fn restrict_lessons(&self, query: &mut QueryBuilder<'_, Postgres>, lesson: &str) {
        match *self {
            Scope::All => {}
            Scope::Teacher(id) => {
                query.push(format!(" AND {}.teacher_id = ", lesson)).push_bind(id);
            }
            Scope::Student(id) => {
                query
                    .push(format!(
                        " AND {}.classroom_id IN (SELECT classroom_id FROM enrollments WHERE student_id = ",
                        lesson
                    ))
                    .push_bind(id)
                    .push(")");
            }
        }
    }

    /// Grades and attendance: tied to the teacher's lessons, or the student's own
    pub fn restrict_journal(&self, query: &mut QueryBuilder<'_, Postgres>, record: &str) {
        match *self {
            Scope::All => {}
            Scope::Teacher(id) => {
                query
                    .push(format!(
                        " AND {}.lesson_id IN (SELECT id FROM lessons WHERE teacher_id = ",
                        record
                    ))
                    .push_bind(id)
                    .push(")");
            }
            Scope::Student(id) => {
                query.push(format!(" AND {}.student_id = ", record)).push_bind(id);
            }
        }
    }

    /// Enrollments: of classrooms the teacher curates, or the student's own
    pub fn restrict_enrollments(&self, query: &mut QueryBuilder<'_, Postgres>, enrollment: &str) {
        match *self {
            Scope::All => {}
            Scope::Teacher(id) => {
                query
                    .push(format!(
                        " AND {}.classroom_id IN (SELECT id FROM classrooms WHERE curator_id = ",
                        enrollment
                    ))
                    .push_bind(id)
                    .push(")");
            }
            Scope::Student(id) => {
                query.push(format!(" AND {}.student_id = ", enrollment)).push_bind(id);
            }
        }
    }
}

/// Only teachers write journal records
pub fn require_teacher(user: &User) -> Result<()> {
    if user.is_teacher() {
        Ok(())
    } else {
        Err(SchoolError::PermissionDenied(
            "only teachers may write journal records".to_string(),
        ))
    }
}

/// The lesson a teacher writes to must be one of their own; anything else is an invalid choice
pub fn check_lesson_choice(teacher: &User, lesson: Option<&Lesson>) -> Result<()> {
    match lesson {
        Some(lesson) if lesson.teacher_id == teacher.id => Ok(()),
        _ => Err(ValidationErrors::single("lesson", "invalid_choice").into()),
    }
}

/// Existing records may only be changed by the teacher of their lesson
pub fn check_lesson_owner(user: &User, lesson: &Lesson) -> Result<()> {
    if user.is_teacher() && lesson.teacher_id == user.id {
        Ok(())
    } else {
        Err(SchoolError::PermissionDenied(
            "only the teacher of the lesson may change its records".to_string(),
        ))
    }
}

/// Who may open a student's report: staff, or the student themselves
pub fn can_view_student_report(user: &User, student_id: i64) -> bool {
    user.is_teacher() || user.is_admin() || (user.is_student() && user.id == student_id)
}

pub fn require_staff(user: &User) -> Result<()> {
    if user.is_teacher() || user.is_admin() {
        Ok(())
    } else {
        Err(SchoolError::PermissionDenied("staff only".to_string()))
    }
}

pub fn require_admin(user: &User) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(SchoolError::PermissionDenied("administrators only".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, Utc};

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            email: format!("user{}@school.test", id),
            username: format!("user{}", id),
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lesson(teacher_id: i64) -> Lesson {
        Lesson {
            id: 10,
            subject_id: 1,
            classroom_id: 2,
            teacher_id,
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            topic: "Дроби".to_string(),
        }
    }

    fn sql(scope: Scope, restrict: fn(&Scope, &mut QueryBuilder<'_, Postgres>, &str)) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM t WHERE TRUE");
        restrict(&scope, &mut query, "t");
        query.sql().to_string()
    }

    #[test]
    fn test_scope_from_role() {
        assert_eq!(Scope::for_user(&user(1, Role::Admin)), Scope::All);
        assert_eq!(Scope::for_user(&user(2, Role::Teacher)), Scope::Teacher(2));
        assert_eq!(Scope::for_user(&user(3, Role::Student)), Scope::Student(3));
    }

    #[test]
    fn test_admin_scope_adds_no_filter() {
        assert_eq!(sql(Scope::All, Scope::restrict_lessons), "SELECT 1 FROM t WHERE TRUE");
        assert_eq!(sql(Scope::All, Scope::restrict_journal), "SELECT 1 FROM t WHERE TRUE");
    }

    #[test]
    fn test_student_lessons_come_from_enrollments() {
        let sql = sql(Scope::Student(3), Scope::restrict_lessons);
        assert!(sql.ends_with(
            " AND t.classroom_id IN (SELECT classroom_id FROM enrollments WHERE student_id = $1)"
        ));
    }

    #[test]
    fn test_teacher_filters() {
        assert!(sql(Scope::Teacher(2), Scope::restrict_classrooms).ends_with(" AND t.curator_id = $1"));
        assert!(sql(Scope::Teacher(2), Scope::restrict_lessons).ends_with(" AND t.teacher_id = $1"));
        assert!(sql(Scope::Teacher(2), Scope::restrict_journal)
            .contains("t.lesson_id IN (SELECT id FROM lessons WHERE teacher_id = $1)"));
        assert!(sql(Scope::Teacher(2), Scope::restrict_enrollments)
            .contains("t.classroom_id IN (SELECT id FROM classrooms WHERE curator_id = $1)"));
    }

    #[test]
    fn test_student_sees_own_journal_only() {
        assert!(sql(Scope::Student(3), Scope::restrict_journal).ends_with(" AND t.student_id = $1"));
        assert!(sql(Scope::Student(3), Scope::restrict_enrollments).ends_with(" AND t.student_id = $1"));
    }

    #[test]
    fn test_write_rules() {
        let teacher = user(2, Role::Teacher);
        let other = user(5, Role::Teacher);

        assert!(require_teacher(&teacher).is_ok());
        assert_matches!(require_teacher(&user(3, Role::Student)), Err(SchoolError::PermissionDenied(_)));
        assert_matches!(require_teacher(&user(1, Role::Admin)), Err(SchoolError::PermissionDenied(_)));

        assert!(check_lesson_choice(&teacher, Some(&lesson(2))).is_ok());
        assert_matches!(
            check_lesson_choice(&other, Some(&lesson(2))),
            Err(SchoolError::Validation(errors)) if errors.has(Some("lesson"), "invalid_choice")
        );
        assert_matches!(check_lesson_choice(&teacher, None), Err(SchoolError::Validation(_)));

        assert!(check_lesson_owner(&teacher, &lesson(2)).is_ok());
        assert_matches!(check_lesson_owner(&other, &lesson(2)), Err(SchoolError::PermissionDenied(_)));
    }

    #[test]
    fn test_student_report_visibility() {
        assert!(can_view_student_report(&user(2, Role::Teacher), 3));
        assert!(can_view_student_report(&user(1, Role::Admin), 3));
        assert!(can_view_student_report(&user(3, Role::Student), 3));
        assert!(!can_view_student_report(&user(4, Role::Student), 3));
    }
}
