//! Enrollment model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::classroom::ClassRoomBrief;
use super::user::UserSummary;

/// A student's membership in a classroom; unique per (student, classroom)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub classroom_id: i64,
    pub date_enrolled: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDetails {
    pub id: i64,
    pub student: UserSummary,
    pub classroom: ClassRoomBrief,
    pub date_enrolled: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub student_id: i64,
    pub classroom_id: i64,
}
