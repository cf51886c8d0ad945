//! Lesson model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::classroom::ClassRoomBrief;
use super::subject::SubjectBrief;
use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub subject_id: i64,
    pub classroom_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDetails {
    pub id: i64,
    pub subject: SubjectBrief,
    pub classroom: ClassRoomBrief,
    pub teacher: UserSummary,
    pub date: NaiveDate,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub subject_id: i64,
    pub classroom_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub topic: String,
}
