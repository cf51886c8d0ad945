//! Grade and attendance journal
//!
//! Writes go through one path for HTML forms and the JSON API: only the
//! teacher of a lesson writes, and only for students enrolled in the lesson's
//! classroom.

use serde::{Deserialize, Serialize};

use crate::database::DatabaseService;
use crate::models::{
    AttendanceDetails, AttendanceRecord, AttendanceStatus, CreateAttendanceRequest, CreateGradeRequest,
    GradeDetails, GradeRecord, Lesson, LessonDetails, UpdateAttendanceRequest, UpdateGradeRequest, User,
    UserSummary,
};
use crate::services::access::{check_lesson_choice, check_lesson_owner, require_teacher, Scope};
use crate::utils::errors::{Result, SchoolError, ValidationErrors};
use crate::utils::forms::{check_length, check_score, parse_id, parse_score};
use crate::utils::helpers::{Page, Pagination};
use crate::utils::logging::log_journal_write;

pub const TEACHER_PER_PAGE: i64 = 10;
pub const STUDENT_PER_PAGE: i64 = 20;
pub const API_PER_PAGE: i64 = 50;

const TEXT_LIMIT: usize = 255;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeForm {
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub max_value: String,
    #[serde(default)]
    pub note: String,
}

impl GradeForm {
    /// Parse the raw fields; ownership and enrollment are checked by the service
    pub fn parse(&self) -> Result<CreateGradeRequest> {
        let mut errors = ValidationErrors::new();
        let lesson_id = parse_id(&mut errors, "lesson", &self.lesson);
        let student_id = parse_id(&mut errors, "student", &self.student);
        let value = parse_score(&mut errors, "value", &self.value);
        let max_value = if self.max_value.trim().is_empty() {
            None
        } else {
            parse_score(&mut errors, "max_value", &self.max_value)
        };
        let note = self.note.trim().to_string();
        check_length(&mut errors, "note", &note, TEXT_LIMIT);
        errors.into_result()?;

        match (lesson_id, student_id, value) {
            (Some(lesson_id), Some(student_id), Some(value)) => Ok(CreateGradeRequest {
                lesson_id,
                student_id,
                value,
                max_value,
                note,
            }),
            _ => Err(ValidationErrors::non_field("invalid_form").into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceForm {
    #[serde(default)]
    pub lesson: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub comment: String,
}

impl AttendanceForm {
    pub fn parse(&self) -> Result<CreateAttendanceRequest> {
        let mut errors = ValidationErrors::new();
        let lesson_id = parse_id(&mut errors, "lesson", &self.lesson);
        let student_id = parse_id(&mut errors, "student", &self.student);
        let status = if self.status.trim().is_empty() {
            errors.add("status", "required");
            None
        } else {
            match self.status.parse::<AttendanceStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", "invalid_choice");
                    None
                }
            }
        };
        let comment = self.comment.trim().to_string();
        check_length(&mut errors, "comment", &comment, TEXT_LIMIT);
        errors.into_result()?;

        match (lesson_id, student_id, status) {
            (Some(lesson_id), Some(student_id), Some(status)) => Ok(CreateAttendanceRequest {
                lesson_id,
                student_id,
                status,
                comment,
            }),
            _ => Err(ValidationErrors::non_field("invalid_form").into()),
        }
    }
}

fn validate_grade_values(value: Option<f64>, max_value: Option<f64>, note: Option<&str>) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if let Some(value) = value {
        check_score(&mut errors, "value", value);
    }
    if let Some(max_value) = max_value {
        check_score(&mut errors, "max_value", max_value);
    }
    if let Some(note) = note {
        check_length(&mut errors, "note", note, TEXT_LIMIT);
    }
    errors.into_result()
}

/// Service for journal writes and journal listings
#[derive(Clone)]
pub struct JournalService {
    db: DatabaseService,
}

impl JournalService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// The lesson must be the teacher's own and the student enrolled in its classroom
    async fn check_write_target(&self, teacher: &User, lesson_id: i64, student_id: i64) -> Result<Lesson> {
        require_teacher(teacher)?;

        let lesson = self.db.lessons.find_by_id(lesson_id).await?;
        check_lesson_choice(teacher, lesson.as_ref())?;
        let Some(lesson) = lesson else {
            return Err(ValidationErrors::single("lesson", "invalid_choice").into());
        };

        if !self.db.enrollments.is_enrolled(student_id, lesson.classroom_id).await? {
            return Err(ValidationErrors::single("student", "student_not_enrolled").into());
        }
        Ok(lesson)
    }

    pub async fn create_grade(&self, teacher: &User, request: CreateGradeRequest) -> Result<GradeRecord> {
        require_teacher(teacher)?;
        validate_grade_values(Some(request.value), request.max_value, Some(&request.note))?;
        self.check_write_target(teacher, request.lesson_id, request.student_id)
            .await?;

        let grade = self.db.grades.create(request).await?;
        log_journal_write(teacher.id, "grade", grade.lesson_id, grade.student_id);
        Ok(grade)
    }

    pub async fn create_attendance(
        &self,
        teacher: &User,
        request: CreateAttendanceRequest,
    ) -> Result<AttendanceRecord> {
        require_teacher(teacher)?;
        let mut errors = ValidationErrors::new();
        check_length(&mut errors, "comment", &request.comment, TEXT_LIMIT);
        errors.into_result()?;
        self.check_write_target(teacher, request.lesson_id, request.student_id)
            .await?;

        let record = self.db.attendance.create(request).await?;
        log_journal_write(teacher.id, "attendance", record.lesson_id, record.student_id);
        Ok(record)
    }

    /// The lesson of a visible record, with the writer checked against it
    async fn owned_lesson(&self, user: &User, lesson_id: i64) -> Result<()> {
        let lesson = self
            .db
            .lessons
            .find_by_id(lesson_id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "lesson", id: lesson_id })?;
        check_lesson_owner(user, &lesson)
    }

    pub async fn update_grade(&self, user: &User, id: i64, request: UpdateGradeRequest) -> Result<GradeDetails> {
        let existing = self.grade(user, id).await?;
        self.owned_lesson(user, existing.lesson.id).await?;
        validate_grade_values(request.value, request.max_value, request.note.as_deref())?;

        self.db.grades.update(id, request).await?;
        log_journal_write(user.id, "grade_update", existing.lesson.id, existing.student.id);
        self.grade(user, id).await
    }

    pub async fn delete_grade(&self, user: &User, id: i64) -> Result<()> {
        let existing = self.grade(user, id).await?;
        self.owned_lesson(user, existing.lesson.id).await?;

        self.db.grades.delete(id).await?;
        log_journal_write(user.id, "grade_delete", existing.lesson.id, existing.student.id);
        Ok(())
    }

    pub async fn update_attendance(
        &self,
        user: &User,
        id: i64,
        request: UpdateAttendanceRequest,
    ) -> Result<AttendanceDetails> {
        let existing = self.attendance_record(user, id).await?;
        self.owned_lesson(user, existing.lesson.id).await?;
        if let Some(comment) = &request.comment {
            let mut errors = ValidationErrors::new();
            check_length(&mut errors, "comment", comment, TEXT_LIMIT);
            errors.into_result()?;
        }

        self.db.attendance.update(id, request).await?;
        log_journal_write(user.id, "attendance_update", existing.lesson.id, existing.student.id);
        self.attendance_record(user, id).await
    }

    pub async fn delete_attendance(&self, user: &User, id: i64) -> Result<()> {
        let existing = self.attendance_record(user, id).await?;
        self.owned_lesson(user, existing.lesson.id).await?;

        self.db.attendance.delete(id).await?;
        log_journal_write(user.id, "attendance_delete", existing.lesson.id, existing.student.id);
        Ok(())
    }

    /// A grade visible to the user; anything else is not found
    pub async fn grade(&self, user: &User, id: i64) -> Result<GradeDetails> {
        self.db
            .grades
            .find_visible(&Scope::for_user(user), id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "grade", id })
    }

    pub async fn attendance_record(&self, user: &User, id: i64) -> Result<AttendanceDetails> {
        self.db
            .attendance
            .find_visible(&Scope::for_user(user), id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "attendance", id })
    }

    pub async fn grades(&self, user: &User, page: Option<i64>) -> Result<Page<GradeDetails>> {
        self.db
            .grades
            .list_visible(&Scope::for_user(user), Pagination::new(page, API_PER_PAGE))
            .await
    }

    pub async fn attendance(&self, user: &User, page: Option<i64>) -> Result<Page<AttendanceDetails>> {
        self.db
            .attendance
            .list_visible(&Scope::for_user(user), Pagination::new(page, API_PER_PAGE))
            .await
    }

    pub async fn teacher_lessons(&self, teacher: &User, page: Option<i64>) -> Result<Page<LessonDetails>> {
        require_teacher(teacher)?;
        self.db
            .lessons
            .list_visible(&Scope::Teacher(teacher.id), Pagination::new(page, TEACHER_PER_PAGE))
            .await
    }

    pub async fn teacher_grades(&self, teacher: &User, page: Option<i64>) -> Result<Page<GradeDetails>> {
        require_teacher(teacher)?;
        self.db
            .grades
            .list_visible(&Scope::Teacher(teacher.id), Pagination::new(page, TEACHER_PER_PAGE))
            .await
    }

    pub async fn teacher_attendance(&self, teacher: &User, page: Option<i64>) -> Result<Page<AttendanceDetails>> {
        require_teacher(teacher)?;
        self.db
            .attendance
            .list_visible(&Scope::Teacher(teacher.id), Pagination::new(page, TEACHER_PER_PAGE))
            .await
    }

    pub async fn student_grades(&self, student: &User, page: Option<i64>) -> Result<Page<GradeDetails>> {
        require_student(student)?;
        self.db
            .grades
            .list_visible(&Scope::Student(student.id), Pagination::new(page, STUDENT_PER_PAGE))
            .await
    }

    pub async fn student_attendance(&self, student: &User, page: Option<i64>) -> Result<Page<AttendanceDetails>> {
        require_student(student)?;
        self.db
            .attendance
            .list_visible(&Scope::Student(student.id), Pagination::new(page, STUDENT_PER_PAGE))
            .await
    }

    /// Choices for the grade and attendance forms: the teacher's lessons and,
    /// once a lesson is picked, the students enrolled in its classroom
    pub async fn form_choices(
        &self,
        teacher: &User,
        lesson_id: Option<i64>,
    ) -> Result<(Vec<LessonDetails>, Vec<UserSummary>)> {
        require_teacher(teacher)?;
        let lessons = self.db.lessons.all_of_teacher(teacher.id).await?;

        let students = match lesson_id {
            Some(id) if lessons.iter().any(|l| l.id == id) => self.db.lessons.enrolled_students(id).await?,
            _ => Vec::new(),
        };
        Ok((lessons, students))
    }
}

fn require_student(user: &User) -> Result<()> {
    if user.is_student() {
        Ok(())
    } else {
        Err(SchoolError::PermissionDenied("students only".to_string()))
    }
}
