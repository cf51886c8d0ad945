//! Subject repository implementation

use sqlx::{FromRow, PgPool};

use super::rows::{OptionalUserRow, OPTIONAL_USER_COLUMNS};
use crate::models::subject::{CreateSubjectRequest, Subject, SubjectDetails};
use crate::utils::errors::{unique_violation_as, SchoolError};

#[derive(Debug, FromRow)]
struct SubjectRow {
    id: i64,
    name: String,
    code: String,
    #[sqlx(flatten)]
    teacher: OptionalUserRow,
}

impl From<SubjectRow> for SubjectDetails {
    fn from(row: SubjectRow) -> Self {
        SubjectDetails {
            id: row.id,
            name: row.name,
            code: row.code,
            teacher: row.teacher.into_summary(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubjectRepository {
    pool: PgPool,
}

impl SubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select() -> String {
        format!(
            "SELECT sub.id, sub.name, sub.code, {} FROM subjects sub LEFT JOIN users r ON r.id = sub.teacher_id",
            OPTIONAL_USER_COLUMNS
        )
    }

    /// Insert a subject; a clashing code surfaces as a validation error on `code`
    pub async fn create(&self, request: CreateSubjectRequest) -> Result<Subject, SchoolError> {
        let subject = sqlx::query_as::<_, Subject>(
            "INSERT INTO subjects (name, code, teacher_id) VALUES ($1, $2, $3) RETURNING id, name, code, teacher_id"
        )
        .bind(request.name)
        .bind(request.code)
        .bind(request.teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, Some("code"), "subject_code_taken"))?;

        Ok(subject)
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool, SchoolError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM subjects WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    pub async fn find_details(&self, id: i64) -> Result<Option<SubjectDetails>, SchoolError> {
        let row = sqlx::query_as::<_, SubjectRow>(&format!("{} WHERE sub.id = $1", Self::select()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// All subjects ordered by name
    pub async fn list(&self) -> Result<Vec<SubjectDetails>, SchoolError> {
        let rows = sqlx::query_as::<_, SubjectRow>(&format!("{} ORDER BY sub.name, sub.id", Self::select()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, SchoolError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subjects")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
