//! Grade record model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lesson::LessonDetails;
use super::user::UserSummary;

/// Default maximum score of a grade
pub const DEFAULT_MAX_VALUE: f64 = 100.0;

/// One grade of one student for one lesson
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GradeRecord {
    pub id: i64,
    pub lesson_id: i64,
    pub student_id: i64,
    pub value: f64,
    pub max_value: f64,
    pub note: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeDetails {
    pub id: i64,
    pub lesson: LessonDetails,
    pub student: UserSummary,
    pub value: f64,
    pub max_value: f64,
    pub note: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGradeRequest {
    pub lesson_id: i64,
    pub student_id: i64,
    pub value: f64,
    pub max_value: Option<f64>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGradeRequest {
    pub value: Option<f64>,
    pub max_value: Option<f64>,
    pub note: Option<String>,
}

/// Narrowing of the grades a report aggregates; bounds are inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub subject_id: Option<i64>,
}
