//! Grade record repository implementation

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::rows::{GradeRow, LESSON_COLUMNS, LESSON_JOINS, STUDENT_COLUMNS};
use crate::models::grade::{
    CreateGradeRequest, GradeDetails, GradeFilter, GradeRecord, UpdateGradeRequest, DEFAULT_MAX_VALUE,
};
use crate::services::access::Scope;
use crate::utils::errors::{unique_violation_as, SchoolError};
use crate::utils::helpers::{Page, Pagination};

const GRADE_RECORD_COLUMNS: &str = "id, lesson_id, student_id, value, max_value, note, date";

#[derive(Clone, Debug)]
pub struct GradeRepository {
    pool: PgPool,
}

impl GradeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!(
            r#"
            SELECT g.id, g.value, g.max_value, g.note, g.date, {}, {}
            FROM grade_records g
            JOIN lessons l ON l.id = g.lesson_id
            {}
            JOIN users u ON u.id = g.student_id
            WHERE TRUE
            "#,
            LESSON_COLUMNS, STUDENT_COLUMNS, LESSON_JOINS
        ))
    }

    fn push_filter(query: &mut QueryBuilder<'static, Postgres>, filter: &GradeFilter) {
        if let Some(start) = filter.start_date {
            query.push(" AND g.date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND g.date <= ").push_bind(end);
        }
        if let Some(subject_id) = filter.subject_id {
            query.push(" AND l.subject_id = ").push_bind(subject_id);
        }
    }

    /// Insert a grade; a second grade for the same lesson and student is a form error
    pub async fn create(&self, request: CreateGradeRequest) -> Result<GradeRecord, SchoolError> {
        let grade = sqlx::query_as::<_, GradeRecord>(&format!(
            r#"
            INSERT INTO grade_records (lesson_id, student_id, value, max_value, note, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            GRADE_RECORD_COLUMNS
        ))
        .bind(request.lesson_id)
        .bind(request.student_id)
        .bind(request.value)
        .bind(request.max_value.unwrap_or(DEFAULT_MAX_VALUE))
        .bind(request.note)
        .bind(Utc::now().date_naive())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as(e, None, "grade_exists"))?;

        Ok(grade)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<GradeRecord>, SchoolError> {
        let grade = sqlx::query_as::<_, GradeRecord>(&format!(
            "SELECT {} FROM grade_records WHERE id = $1",
            GRADE_RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grade)
    }

    pub async fn find_visible(&self, scope: &Scope, id: i64) -> Result<Option<GradeDetails>, SchoolError> {
        let mut query = Self::select();
        scope.restrict_journal(&mut query, "g");
        query.push(" AND g.id = ").push_bind(id);

        let row = query.build_query_as::<GradeRow>().fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    /// Grades visible in `scope`, newest first
    pub async fn list_visible(
        &self,
        scope: &Scope,
        pagination: Pagination,
    ) -> Result<Page<GradeDetails>, SchoolError> {
        let mut query = Self::select();
        scope.restrict_journal(&mut query, "g");
        query
            .push(" ORDER BY g.date DESC, g.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query.build_query_as::<GradeRow>().fetch_all(&self.pool).await?;
        let total = self.count_visible(scope).await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    pub async fn count_visible(&self, scope: &Scope) -> Result<i64, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM grade_records g WHERE TRUE");
        scope.restrict_journal(&mut query, "g");

        let count: (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// Every matching grade of every student enrolled in a classroom, in one query
    pub async fn for_class_students(
        &self,
        classroom_id: i64,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeDetails>, SchoolError> {
        let mut query = Self::select();
        query
            .push(" AND g.student_id IN (SELECT student_id FROM enrollments WHERE classroom_id = ")
            .push_bind(classroom_id)
            .push(")");
        Self::push_filter(&mut query, filter);
        query.push(" ORDER BY g.date DESC, g.id DESC");

        let rows = query.build_query_as::<GradeRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every matching grade of one student, newest first
    pub async fn for_student(
        &self,
        student_id: i64,
        filter: &GradeFilter,
    ) -> Result<Vec<GradeDetails>, SchoolError> {
        let mut query = Self::select();
        query.push(" AND g.student_id = ").push_bind(student_id);
        Self::push_filter(&mut query, filter);
        query.push(" ORDER BY g.date DESC, g.id DESC");

        let rows = query.build_query_as::<GradeRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update(&self, id: i64, request: UpdateGradeRequest) -> Result<GradeRecord, SchoolError> {
        let grade = sqlx::query_as::<_, GradeRecord>(&format!(
            r#"
            UPDATE grade_records
            SET value = COALESCE($2, value),
                max_value = COALESCE($3, max_value),
                note = COALESCE($4, note)
            WHERE id = $1
            RETURNING {}
            "#,
            GRADE_RECORD_COLUMNS
        ))
        .bind(id)
        .bind(request.value)
        .bind(request.max_value)
        .bind(request.note)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SchoolError::NotFound { resource: "grade", id })?;

        Ok(grade)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM grade_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
