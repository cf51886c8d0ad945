//! Subject model

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub teacher_id: Option<i64>,
}

/// Subject reference embedded in lessons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectBrief {
    pub id: i64,
    pub name: String,
    pub code: String,
}

impl fmt::Display for SubjectBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDetails {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub teacher: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub code: String,
    pub teacher_id: Option<i64>,
}
