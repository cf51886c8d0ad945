//! Classroom model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassRoom {
    pub id: i64,
    pub name: String,
    pub grade_level: i16,
    pub curator_id: Option<i64>,
}

/// Composite label such as "5A"
pub fn classroom_label(grade_level: i16, name: &str) -> String {
    format!("{}{}", grade_level, name)
}

impl ClassRoom {
    pub fn label(&self) -> String {
        classroom_label(self.grade_level, &self.name)
    }
}

/// Classroom reference embedded in other records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRoomBrief {
    pub id: i64,
    pub grade_level: i16,
    pub name: String,
    pub label: String,
}

impl ClassRoomBrief {
    pub fn new(id: i64, grade_level: i16, name: String) -> Self {
        let label = classroom_label(grade_level, &name);
        Self { id, grade_level, name, label }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRoomDetails {
    pub id: i64,
    pub grade_level: i16,
    pub name: String,
    pub label: String,
    pub curator: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassRoomRequest {
    pub grade_level: i16,
    pub name: String,
    pub curator_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_grade_then_letter() {
        let classroom = ClassRoom { id: 1, name: "А".to_string(), grade_level: 5, curator_id: None };
        assert_eq!(classroom.label(), "5А");
        assert_eq!(ClassRoomBrief::new(2, 11, "Б".to_string()).label, "11Б");
    }
}
