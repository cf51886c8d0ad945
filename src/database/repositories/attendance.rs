//! Attendance record repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::rows::{AttendanceRow, LESSON_COLUMNS, LESSON_JOINS, STUDENT_COLUMNS};
use crate::models::attendance::{
    AttendanceDetails, AttendanceRecord, CreateAttendanceRequest, UpdateAttendanceRequest,
};
use crate::services::access::Scope;
use crate::utils::errors::{unique_violation_as, SchoolError};
use crate::utils::helpers::{Page, Pagination};

const ATTENDANCE_RECORD_COLUMNS: &str = "id, lesson_id, student_id, status, comment";

#[derive(Clone, Debug)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!(
            r#"
            SELECT a.id, a.status, a.comment, {}, {}
            FROM attendance_records a
            JOIN lessons l ON l.id = a.lesson_id
            {}
            JOIN users u ON u.id = a.student_id
            WHERE TRUE
            "#,
            LESSON_COLUMNS, STUDENT_COLUMNS, LESSON_JOINS
        ))
    }

    /// Insert an attendance mark; one per lesson and student
    pub async fn create(&self, request: CreateAttendanceRequest) -> Result<AttendanceRecord, SchoolError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            INSERT INTO attendance_records (lesson_id, student_id, status, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ATTENDANCE_RECORD_COLUMNS
        ))
        .bind(request.lesson_id)
        .bind(request.student_id)
        .bind(request.status)
        .bind(request.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, None, "attendance_exists"))?;

        Ok(record)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceRecord>, SchoolError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {} FROM attendance_records WHERE id = $1",
            ATTENDANCE_RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn find_visible(&self, scope: &Scope, id: i64) -> Result<Option<AttendanceDetails>, SchoolError> {
        let mut query = Self::select();
        scope.restrict_journal(&mut query, "a");
        query.push(" AND a.id = ").push_bind(id);

        let row = query.build_query_as::<AttendanceRow>().fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    /// Attendance visible in `scope`, newest lessons first
    pub async fn list_visible(
        &self,
        scope: &Scope,
        pagination: Pagination,
    ) -> Result<Page<AttendanceDetails>, SchoolError> {
        let mut query = Self::select();
        scope.restrict_journal(&mut query, "a");
        query
            .push(" ORDER BY l.date DESC, a.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query.build_query_as::<AttendanceRow>().fetch_all(&self.pool).await?;
        let total = self.count_visible(scope).await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    pub async fn count_visible(&self, scope: &Scope) -> Result<i64, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM attendance_records a WHERE TRUE");
        scope.restrict_journal(&mut query, "a");

        let count: (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// Attendance of every student enrolled in a classroom, grouped by student
    pub async fn for_class_students(&self, classroom_id: i64) -> Result<Vec<AttendanceDetails>, SchoolError> {
        let mut query = Self::select();
        query
            .push(" AND a.student_id IN (SELECT student_id FROM enrollments WHERE classroom_id = ")
            .push_bind(classroom_id)
            .push(") ORDER BY u.last_name, u.first_name, u.id, l.date, a.id");

        let rows = query.build_query_as::<AttendanceRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update(&self, id: i64, request: UpdateAttendanceRequest) -> Result<AttendanceRecord, SchoolError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            UPDATE attendance_records
            SET status = COALESCE($2, status),
                comment = COALESCE($3, comment)
            WHERE id = $1
            RETURNING {}
            "#,
            ATTENDANCE_RECORD_COLUMNS
        ))
        .bind(id)
        .bind(request.status)
        .bind(request.comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SchoolError::NotFound { resource: "attendance", id })?;

        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
