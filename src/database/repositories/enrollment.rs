//! Enrollment repository implementation

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::rows::{StudentRow, STUDENT_COLUMNS};
use super::user::escape_like;
use crate::models::classroom::ClassRoomBrief;
use crate::models::enrollment::{CreateEnrollmentRequest, Enrollment, EnrollmentDetails};
use crate::models::user::UserSummary;
use crate::services::access::Scope;
use crate::utils::errors::{unique_violation_as, SchoolError};
use crate::utils::helpers::{Page, Pagination};

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    id: i64,
    date_enrolled: NaiveDate,
    classroom_id: i64,
    classroom_name: String,
    classroom_grade_level: i16,
    #[sqlx(flatten)]
    student: StudentRow,
}

impl From<EnrollmentRow> for EnrollmentDetails {
    fn from(row: EnrollmentRow) -> Self {
        EnrollmentDetails {
            id: row.id,
            student: row.student.into(),
            classroom: ClassRoomBrief::new(row.classroom_id, row.classroom_grade_level, row.classroom_name),
            date_enrolled: row.date_enrolled,
        }
    }
}

/// Column a classroom roster is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RosterSort {
    FirstName,
    #[default]
    LastName,
}

impl RosterSort {
    /// Unknown values fall back to last name
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("first_name") => RosterSort::FirstName,
            _ => RosterSort::LastName,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RosterSort::FirstName => "first_name",
            RosterSort::LastName => "last_name",
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            RosterSort::FirstName => " ORDER BY u.first_name, u.last_name, u.id",
            RosterSort::LastName => " ORDER BY u.last_name, u.first_name, u.id",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enroll a student; a repeated pair surfaces as a validation error on `student`
    pub async fn create(&self, request: CreateEnrollmentRequest) -> Result<Enrollment, SchoolError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, classroom_id)
            VALUES ($1, $2)
            RETURNING id, student_id, classroom_id, date_enrolled
            "#
        )
        .bind(request.student_id)
        .bind(request.classroom_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, Some("student"), "already_enrolled"))?;

        Ok(enrollment)
    }

    pub async fn is_enrolled(&self, student_id: i64, classroom_id: i64) -> Result<bool, SchoolError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND classroom_id = $2)"
        )
        .bind(student_id)
        .bind(classroom_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Enrollments visible in `scope`, newest first
    pub async fn list_visible(
        &self,
        scope: &Scope,
        pagination: Pagination,
    ) -> Result<Page<EnrollmentDetails>, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT e.id, e.date_enrolled, c.id AS classroom_id, c.name AS classroom_name,
                   c.grade_level AS classroom_grade_level, {}
            FROM enrollments e
            JOIN classrooms c ON c.id = e.classroom_id
            JOIN users u ON u.id = e.student_id
            WHERE TRUE
            "#,
            STUDENT_COLUMNS
        ));
        scope.restrict_enrollments(&mut query, "e");
        query
            .push(" ORDER BY e.date_enrolled DESC, e.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query.build_query_as::<EnrollmentRow>().fetch_all(&self.pool).await?;
        let total = self.count_visible(scope).await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    pub async fn count_visible(&self, scope: &Scope) -> Result<i64, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM enrollments e WHERE TRUE");
        scope.restrict_enrollments(&mut query, "e");

        let count: (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// Students of a classroom, optionally filtered by a first/last name substring
    pub async fn roster(
        &self,
        classroom_id: i64,
        search: Option<&str>,
        sort: RosterSort,
    ) -> Result<Vec<UserSummary>, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM enrollments e JOIN users u ON u.id = e.student_id WHERE e.classroom_id = ",
            STUDENT_COLUMNS
        ));
        query.push_bind(classroom_id);

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            query
                .push(" AND (u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(sort.order_by());

        let rows = query.build_query_as::<StudentRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Students not yet enrolled in this classroom, for the enroll form
    pub async fn students_not_in(&self, classroom_id: i64) -> Result<Vec<UserSummary>, SchoolError> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            r#"
            SELECT {} FROM users u
            WHERE u.role = 'STUDENT'
              AND NOT EXISTS (SELECT 1 FROM enrollments e WHERE e.student_id = u.id AND e.classroom_id = $1)
            ORDER BY u.last_name, u.first_name
            "#,
            STUDENT_COLUMNS
        ))
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_sort_parsing() {
        assert_eq!(RosterSort::parse(Some("first_name")), RosterSort::FirstName);
        assert_eq!(RosterSort::parse(Some("last_name")), RosterSort::LastName);
        assert_eq!(RosterSort::parse(Some("id; DROP TABLE users")), RosterSort::LastName);
        assert_eq!(RosterSort::parse(None), RosterSort::default());
    }
}
