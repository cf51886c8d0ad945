//! Academic registry: browsing for every user, management for administrators

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::repositories::enrollment::RosterSort;
use crate::database::DatabaseService;
use crate::models::{
    ClassRoom, ClassRoomDetails, CreateClassRoomRequest, CreateEnrollmentRequest, CreateLessonRequest,
    CreateSubjectRequest, Enrollment, EnrollmentDetails, Lesson, LessonDetails, Role, Subject,
    SubjectDetails, User, UserSummary,
};
use crate::services::access::{require_admin, Scope};
use crate::utils::errors::{Result, SchoolError, ValidationErrors};
use crate::utils::forms::{check_length, parse_date, parse_id, parse_optional_id, required_text};
use crate::utils::helpers::{random_code_suffix, subject_code, Page, Pagination};
use crate::utils::logging::log_admin_action;

pub const ENROLLMENTS_PER_PAGE: i64 = 50;
pub const LESSONS_PER_PAGE: i64 = 50;

const CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassRoomForm {
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub curator: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub teacher: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollForm {
    #[serde(default)]
    pub student: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonForm {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub classroom: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub topic: String,
}

/// Service for subjects, classrooms, enrollments and lessons
#[derive(Clone)]
pub struct AcademicsService {
    db: DatabaseService,
}

impl AcademicsService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn subjects(&self, _user: &User) -> Result<Vec<SubjectDetails>> {
        self.db.subjects.list().await
    }

    pub async fn subject(&self, _user: &User, id: i64) -> Result<SubjectDetails> {
        self.db
            .subjects
            .find_details(id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "subject", id })
    }

    pub async fn classrooms(&self, user: &User) -> Result<Vec<ClassRoomDetails>> {
        self.db.classrooms.list_visible(&Scope::for_user(user)).await
    }

    pub async fn classroom(&self, user: &User, id: i64) -> Result<ClassRoomDetails> {
        self.db
            .classrooms
            .find_visible(&Scope::for_user(user), id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "classroom", id })
    }

    pub async fn enrollments(&self, user: &User, page: Option<i64>) -> Result<Page<EnrollmentDetails>> {
        self.db
            .enrollments
            .list_visible(&Scope::for_user(user), Pagination::new(page, ENROLLMENTS_PER_PAGE))
            .await
    }

    pub async fn lessons(&self, user: &User, page: Option<i64>) -> Result<Page<LessonDetails>> {
        self.db
            .lessons
            .list_visible(&Scope::for_user(user), Pagination::new(page, LESSONS_PER_PAGE))
            .await
    }

    pub async fn lesson(&self, user: &User, id: i64) -> Result<LessonDetails> {
        self.db
            .lessons
            .find_visible(&Scope::for_user(user), id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "lesson", id })
    }

    /// Users of a role for choice lists
    pub async fn users_with_role(&self, role: Role) -> Result<Vec<UserSummary>> {
        self.db.users.summaries_by_role(role).await
    }

    /// Check that an optional user reference points at someone of `role`
    async fn check_role(
        &self,
        errors: &mut ValidationErrors,
        field: &str,
        user_id: Option<i64>,
        role: Role,
        code: &str,
    ) -> Result<()> {
        if let Some(id) = user_id {
            match self.db.users.find_by_id(id).await? {
                Some(user) if user.role == role => {}
                Some(_) => errors.add(field, code),
                None => errors.add(field, "invalid_choice"),
            }
        }
        Ok(())
    }

    pub async fn create_classroom(&self, admin: &User, form: &ClassRoomForm) -> Result<ClassRoom> {
        require_admin(admin)?;
        let mut errors = ValidationErrors::new();

        let grade_level = match form.grade_level.trim().parse::<i16>() {
            Ok(level) if level >= 0 => Some(level),
            Ok(_) => {
                errors.add("grade_level", "invalid_grade_level");
                None
            }
            Err(_) if form.grade_level.trim().is_empty() => {
                errors.add("grade_level", "required");
                None
            }
            Err(_) => {
                errors.add("grade_level", "invalid_number");
                None
            }
        };
        let name = required_text(&mut errors, "name", &form.name, 50);
        let curator_id = parse_optional_id(&mut errors, "curator", &form.curator);
        self.check_role(&mut errors, "curator", curator_id, Role::Teacher, "not_a_teacher")
            .await?;
        errors.into_result()?;

        let (Some(grade_level), Some(name)) = (grade_level, name) else {
            return Err(ValidationErrors::non_field("invalid_form").into());
        };
        let classroom = self
            .db
            .classrooms
            .create(CreateClassRoomRequest { grade_level, name, curator_id })
            .await?;

        log_admin_action(admin.id, "create_classroom", Some(&classroom.label()), None);
        Ok(classroom)
    }

    pub async fn all_classrooms(&self, admin: &User) -> Result<Vec<ClassRoomDetails>> {
        require_admin(admin)?;
        self.db.classrooms.list_visible(&Scope::All).await
    }

    pub async fn delete_classroom(&self, admin: &User, id: i64) -> Result<()> {
        require_admin(admin)?;
        if !self.db.classrooms.delete(id).await? {
            return Err(SchoolError::NotFound { resource: "classroom", id });
        }
        log_admin_action(admin.id, "delete_classroom", Some(&id.to_string()), None);
        Ok(())
    }

    /// Create a subject with a freshly generated unique code
    pub async fn create_subject(&self, admin: &User, form: &SubjectForm) -> Result<Subject> {
        require_admin(admin)?;
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", &form.name, 100);
        let teacher_id = parse_optional_id(&mut errors, "teacher", &form.teacher);
        self.check_role(&mut errors, "teacher", teacher_id, Role::Teacher, "not_a_teacher")
            .await?;
        errors.into_result()?;
        let Some(name) = name else {
            return Err(ValidationErrors::single("name", "required").into());
        };

        let mut last_error = None;
        for _ in 0..CODE_ATTEMPTS {
            let code = subject_code(&name, &random_code_suffix());
            if self.db.subjects.code_exists(&code).await? {
                continue;
            }
            match self
                .db
                .subjects
                .create(CreateSubjectRequest { name: name.clone(), code, teacher_id })
                .await
            {
                Ok(subject) => {
                    log_admin_action(admin.id, "create_subject", Some(&subject.code), Some(&subject.name));
                    return Ok(subject);
                }
                Err(SchoolError::Validation(e)) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ValidationErrors::single("code", "subject_code_taken"))
            .into())
    }

    pub async fn delete_subject(&self, admin: &User, id: i64) -> Result<()> {
        require_admin(admin)?;
        if !self.db.subjects.delete(id).await? {
            return Err(SchoolError::NotFound { resource: "subject", id });
        }
        log_admin_action(admin.id, "delete_subject", Some(&id.to_string()), None);
        Ok(())
    }

    /// A classroom's students, searched and sorted
    pub async fn class_students(
        &self,
        admin: &User,
        classroom_id: i64,
        search: Option<&str>,
        sort: RosterSort,
    ) -> Result<(ClassRoom, Vec<UserSummary>)> {
        require_admin(admin)?;
        let classroom = self.existing_classroom(classroom_id).await?;
        let students = self.db.enrollments.roster(classroom_id, search, sort).await?;
        Ok((classroom, students))
    }

    /// Students who could still be added to a classroom
    pub async fn enrollable_students(&self, admin: &User, classroom_id: i64) -> Result<(ClassRoom, Vec<UserSummary>)> {
        require_admin(admin)?;
        let classroom = self.existing_classroom(classroom_id).await?;
        let students = self.db.enrollments.students_not_in(classroom_id).await?;
        Ok((classroom, students))
    }

    pub async fn enroll_student(&self, admin: &User, classroom_id: i64, form: &EnrollForm) -> Result<Enrollment> {
        require_admin(admin)?;
        let classroom = self.existing_classroom(classroom_id).await?;

        let mut errors = ValidationErrors::new();
        let student_id = parse_id(&mut errors, "student", &form.student);
        self.check_role(&mut errors, "student", student_id, Role::Student, "not_a_student")
            .await?;
        if let Some(student_id) = student_id {
            if !errors.has_field("student") && self.db.enrollments.is_enrolled(student_id, classroom_id).await? {
                errors.add("student", "already_enrolled");
            }
        }
        errors.into_result()?;
        let Some(student_id) = student_id else {
            return Err(ValidationErrors::single("student", "required").into());
        };

        let enrollment = self
            .db
            .enrollments
            .create(CreateEnrollmentRequest { student_id, classroom_id })
            .await?;

        log_admin_action(
            admin.id,
            "enroll_student",
            Some(&classroom.label()),
            Some(&student_id.to_string()),
        );
        Ok(enrollment)
    }

    pub async fn create_lesson(&self, admin: &User, form: &LessonForm) -> Result<Lesson> {
        require_admin(admin)?;
        let mut errors = ValidationErrors::new();

        let subject_id = parse_id(&mut errors, "subject", &form.subject);
        let classroom_id = parse_id(&mut errors, "classroom", &form.classroom);
        let teacher_id = parse_id(&mut errors, "teacher", &form.teacher);
        let date = parse_date(&mut errors, "date", &form.date);
        let topic = form.topic.trim().to_string();
        check_length(&mut errors, "topic", &topic, 255);

        if let Some(id) = subject_id {
            if self.db.subjects.find_details(id).await?.is_none() {
                errors.add("subject", "invalid_choice");
            }
        }
        if let Some(id) = classroom_id {
            if self.db.classrooms.find_by_id(id).await?.is_none() {
                errors.add("classroom", "invalid_choice");
            }
        }
        self.check_role(&mut errors, "teacher", teacher_id, Role::Teacher, "not_a_teacher")
            .await?;
        errors.into_result()?;

        let (Some(subject_id), Some(classroom_id), Some(teacher_id), Some(date)) =
            (subject_id, classroom_id, teacher_id, date)
        else {
            return Err(ValidationErrors::non_field("invalid_form").into());
        };

        let lesson = self
            .db
            .lessons
            .create(CreateLessonRequest { subject_id, classroom_id, teacher_id, date, topic })
            .await?;

        info!(lesson_id = lesson.id, teacher_id = teacher_id, "Lesson created");
        log_admin_action(admin.id, "create_lesson", Some(&lesson.id.to_string()), None);
        Ok(lesson)
    }

    pub async fn all_lessons(&self, admin: &User, page: Option<i64>) -> Result<Page<LessonDetails>> {
        require_admin(admin)?;
        self.db
            .lessons
            .list_visible(&Scope::All, Pagination::new(page, LESSONS_PER_PAGE))
            .await
    }

    pub async fn delete_lesson(&self, admin: &User, id: i64) -> Result<()> {
        require_admin(admin)?;
        if !self.db.lessons.delete(id).await? {
            return Err(SchoolError::NotFound { resource: "lesson", id });
        }
        log_admin_action(admin.id, "delete_lesson", Some(&id.to_string()), None);
        Ok(())
    }

    async fn existing_classroom(&self, id: i64) -> Result<ClassRoom> {
        self.db
            .classrooms
            .find_by_id(id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "classroom", id })
    }
}
