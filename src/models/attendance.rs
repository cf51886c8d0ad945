//! Attendance record model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lesson::LessonDetails;
use super::user::UserSummary;

/// Attendance status, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status")]
pub enum AttendanceStatus {
    #[sqlx(rename = "P")]
    #[serde(rename = "P")]
    Present,
    #[sqlx(rename = "A")]
    #[serde(rename = "A")]
    Absent,
    #[sqlx(rename = "L")]
    #[serde(rename = "L")]
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "P",
            AttendanceStatus::Absent => "A",
            AttendanceStatus::Late => "L",
        }
    }

    /// Fixed label printed in reports
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Был",
            AttendanceStatus::Absent => "Отсутствовал",
            AttendanceStatus::Late => "Опоздал",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "P" => Ok(AttendanceStatus::Present),
            "A" => Ok(AttendanceStatus::Absent),
            "L" => Ok(AttendanceStatus::Late),
            other => Err(format!("unknown attendance status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub lesson_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDetails {
    pub id: i64,
    pub lesson: LessonDetails,
    pub student: UserSummary,
    pub status: AttendanceStatus,
    pub status_label: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceRequest {
    pub lesson_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub status: Option<AttendanceStatus>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_follow_fixed_mapping() {
        assert_eq!(AttendanceStatus::Present.label(), "Был");
        assert_eq!(AttendanceStatus::Absent.label(), "Отсутствовал");
        assert_eq!(AttendanceStatus::Late.label(), "Опоздал");
    }

    #[test]
    fn test_status_codes() {
        for status in AttendanceStatus::ALL {
            assert_eq!(status.code().parse::<AttendanceStatus>().unwrap(), status);
        }
        assert!("X".parse::<AttendanceStatus>().is_err());
        assert_eq!(serde_json::to_string(&AttendanceStatus::Late).unwrap(), "\"L\"");
    }
}
