//! Class and student reports

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::database::repositories::enrollment::RosterSort;
use crate::database::DatabaseService;
use crate::models::{ClassRoomBrief, GradeFilter, User};
use crate::reports::document::{self, ReportDocument};
use crate::reports::summary::{summarize_class, ClassReport, StudentReport};
use crate::reports::PdfRenderer;
use crate::services::access::{can_view_student_report, require_staff};
use crate::utils::errors::{Result, SchoolError, ValidationErrors};
use crate::utils::forms::{parse_optional_date, parse_optional_id};
use crate::utils::logging::log_report_generated;

/// Query string of the class report page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub subject: String,
}

impl ReportQuery {
    pub fn filter(&self) -> Result<GradeFilter> {
        let mut errors = ValidationErrors::new();
        let filter = GradeFilter {
            start_date: parse_optional_date(&mut errors, "start_date", &self.start_date),
            end_date: parse_optional_date(&mut errors, "end_date", &self.end_date),
            subject_id: parse_optional_id(&mut errors, "subject", &self.subject),
        };
        errors.into_result()?;
        Ok(filter)
    }
}

/// Rendered PDF with its download name
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub content_disposition: String,
    pub bytes: Vec<u8>,
}

/// Service building report data and documents
#[derive(Clone)]
pub struct ReportService {
    db: DatabaseService,
    renderer: PdfRenderer,
}

impl ReportService {
    pub fn new(db: DatabaseService, renderer: PdfRenderer) -> Self {
        Self { db, renderer }
    }

    async fn classroom(&self, id: i64) -> Result<ClassRoomBrief> {
        let classroom = self
            .db
            .classrooms
            .find_by_id(id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "classroom", id })?;
        Ok(ClassRoomBrief::new(classroom.id, classroom.grade_level, classroom.name))
    }

    /// Per-student averages of a class; one query for the roster, one for the grades
    pub async fn class_report(&self, user: &User, classroom_id: i64, filter: GradeFilter) -> Result<ClassReport> {
        require_staff(user)?;
        let classroom = self.classroom(classroom_id).await?;

        let students = self
            .db
            .enrollments
            .roster(classroom_id, None, RosterSort::LastName)
            .await?;
        let grades = self.db.grades.for_class_students(classroom_id, &filter).await?;
        let rows = summarize_class(students, grades);

        log_report_generated(user.id, "class", classroom_id, rows.len());
        Ok(ClassReport { classroom, filter, students: rows })
    }

    pub async fn student_report(&self, user: &User, student_id: i64) -> Result<StudentReport> {
        if !can_view_student_report(user, student_id) {
            return Err(SchoolError::PermissionDenied("report of another student".to_string()));
        }

        let student = match self.db.users.find_by_id(student_id).await? {
            Some(student) if student.is_student() => student,
            _ => return Err(SchoolError::NotFound { resource: "student", id: student_id }),
        };
        let grades = self
            .db
            .grades
            .for_student(student_id, &GradeFilter::default())
            .await?;

        let report = StudentReport::new(student.summary(), grades);
        log_report_generated(user.id, "student", student_id, report.grades.len());
        Ok(report)
    }

    fn render(&self, layout: ReportDocument) -> Result<PdfFile> {
        let bytes = self.renderer.render(&layout)?;
        Ok(PdfFile {
            content_disposition: layout.content_disposition(),
            bytes,
        })
    }

    pub async fn class_report_pdf(&self, user: &User, classroom_id: i64) -> Result<PdfFile> {
        let report = self.class_report(user, classroom_id, GradeFilter::default()).await?;
        let layout = document::class_grades(
            &report.classroom.label,
            &report.students,
            Utc::now().date_naive(),
            &user.full_name(),
        );
        self.render(layout)
    }

    pub async fn student_report_pdf(&self, user: &User, student_id: i64) -> Result<PdfFile> {
        let report = self.student_report(user, student_id).await?;
        let layout = document::student_grades(&report, Utc::now().date_naive(), &user.full_name());
        self.render(layout)
    }

    pub async fn class_attendance_pdf(&self, user: &User, classroom_id: i64) -> Result<PdfFile> {
        require_staff(user)?;
        let classroom = self.classroom(classroom_id).await?;
        let records = self.db.attendance.for_class_students(classroom_id).await?;

        log_report_generated(user.id, "attendance", classroom_id, records.len());
        let layout = document::class_attendance(
            &classroom.label,
            &records,
            Utc::now().date_naive(),
            &user.full_name(),
        );
        self.render(layout)
    }

    /// Students whose first name, last name or username contains `query`
    pub async fn search_students(&self, user: &User, query: &str) -> Result<Vec<User>> {
        require_staff(user)?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.db.users.search_students(query).await
    }
}
