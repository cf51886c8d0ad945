//! Joined row shapes shared by the repositories

use chrono::NaiveDate;
use sqlx::FromRow;

use crate::models::{
    AttendanceDetails, AttendanceStatus, ClassRoomBrief, GradeDetails, LessonDetails, Role,
    SubjectBrief, UserSummary,
};

/// Lesson with its subject, classroom and teacher; requires `LESSON_JOINS`
pub(crate) const LESSON_COLUMNS: &str = "l.id AS lesson_id, l.date AS lesson_date, l.topic AS lesson_topic, \
     s.id AS subject_id, s.name AS subject_name, s.code AS subject_code, \
     c.id AS classroom_id, c.name AS classroom_name, c.grade_level AS classroom_grade_level, \
     t.id AS teacher_id, t.email AS teacher_email, t.first_name AS teacher_first_name, \
     t.last_name AS teacher_last_name, t.role AS teacher_role";

pub(crate) const LESSON_JOINS: &str = "JOIN subjects s ON s.id = l.subject_id \
     JOIN classrooms c ON c.id = l.classroom_id \
     JOIN users t ON t.id = l.teacher_id";

/// Student summary; requires the student joined as `u`
pub(crate) const STUDENT_COLUMNS: &str = "u.id AS student_id, u.email AS student_email, \
     u.first_name AS student_first_name, u.last_name AS student_last_name, u.role AS student_role";

#[derive(Debug, FromRow)]
pub(crate) struct LessonRow {
    lesson_id: i64,
    lesson_date: NaiveDate,
    lesson_topic: String,
    subject_id: i64,
    subject_name: String,
    subject_code: String,
    classroom_id: i64,
    classroom_name: String,
    classroom_grade_level: i16,
    teacher_id: i64,
    teacher_email: String,
    teacher_first_name: String,
    teacher_last_name: String,
    teacher_role: Role,
}

impl From<LessonRow> for LessonDetails {
    fn from(row: LessonRow) -> Self {
        LessonDetails {
            id: row.lesson_id,
            subject: SubjectBrief {
                id: row.subject_id,
                name: row.subject_name,
                code: row.subject_code,
            },
            classroom: ClassRoomBrief::new(row.classroom_id, row.classroom_grade_level, row.classroom_name),
            teacher: UserSummary {
                id: row.teacher_id,
                email: row.teacher_email,
                first_name: row.teacher_first_name,
                last_name: row.teacher_last_name,
                role: row.teacher_role,
            },
            date: row.lesson_date,
            topic: row.lesson_topic,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct StudentRow {
    student_id: i64,
    student_email: String,
    student_first_name: String,
    student_last_name: String,
    student_role: Role,
}

impl From<StudentRow> for UserSummary {
    fn from(row: StudentRow) -> Self {
        UserSummary {
            id: row.student_id,
            email: row.student_email,
            first_name: row.student_first_name,
            last_name: row.student_last_name,
            role: row.student_role,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct GradeRow {
    id: i64,
    value: f64,
    max_value: f64,
    note: String,
    date: NaiveDate,
    #[sqlx(flatten)]
    lesson: LessonRow,
    #[sqlx(flatten)]
    student: StudentRow,
}

impl From<GradeRow> for GradeDetails {
    fn from(row: GradeRow) -> Self {
        GradeDetails {
            id: row.id,
            lesson: row.lesson.into(),
            student: row.student.into(),
            value: row.value,
            max_value: row.max_value,
            note: row.note,
            date: row.date,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AttendanceRow {
    id: i64,
    status: AttendanceStatus,
    comment: String,
    #[sqlx(flatten)]
    lesson: LessonRow,
    #[sqlx(flatten)]
    student: StudentRow,
}

impl From<AttendanceRow> for AttendanceDetails {
    fn from(row: AttendanceRow) -> Self {
        AttendanceDetails {
            id: row.id,
            lesson: row.lesson.into(),
            student: row.student.into(),
            status_label: row.status.label().to_string(),
            status: row.status,
            comment: row.comment,
        }
    }
}

/// Optional user joined as a nullable reference (curator, subject teacher)
#[derive(Debug, FromRow)]
pub(crate) struct OptionalUserRow {
    ref_id: Option<i64>,
    ref_email: Option<String>,
    ref_first_name: Option<String>,
    ref_last_name: Option<String>,
    ref_role: Option<Role>,
}

/// Columns for `OptionalUserRow`; requires the user left-joined as `r`
pub(crate) const OPTIONAL_USER_COLUMNS: &str = "r.id AS ref_id, r.email AS ref_email, \
     r.first_name AS ref_first_name, r.last_name AS ref_last_name, r.role AS ref_role";

impl OptionalUserRow {
    pub(crate) fn into_summary(self) -> Option<UserSummary> {
        match (self.ref_id, self.ref_email, self.ref_first_name, self.ref_last_name, self.ref_role) {
            (Some(id), Some(email), Some(first_name), Some(last_name), Some(role)) => Some(UserSummary {
                id,
                email,
                first_name,
                last_name,
                role,
            }),
            _ => None,
        }
    }
}
