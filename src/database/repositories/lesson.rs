//! Lesson repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::rows::{LessonRow, StudentRow, LESSON_COLUMNS, LESSON_JOINS, STUDENT_COLUMNS};
use crate::models::lesson::{CreateLessonRequest, Lesson, LessonDetails};
use crate::models::user::UserSummary;
use crate::services::access::Scope;
use crate::utils::errors::SchoolError;
use crate::utils::helpers::{Page, Pagination};

#[derive(Clone, Debug)]
pub struct LessonRepository {
    pool: PgPool,
}

impl LessonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(scope: &Scope) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {} FROM lessons l {} WHERE TRUE",
            LESSON_COLUMNS, LESSON_JOINS
        ));
        scope.restrict_lessons(&mut query, "l");
        query
    }

    pub async fn create(&self, request: CreateLessonRequest) -> Result<Lesson, SchoolError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (subject_id, classroom_id, teacher_id, date, topic)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, subject_id, classroom_id, teacher_id, date, topic
            "#
        )
        .bind(request.subject_id)
        .bind(request.classroom_id)
        .bind(request.teacher_id)
        .bind(request.date)
        .bind(request.topic)
        .fetch_one(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Lesson>, SchoolError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            "SELECT id, subject_id, classroom_id, teacher_id, date, topic FROM lessons WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn find_visible(&self, scope: &Scope, id: i64) -> Result<Option<LessonDetails>, SchoolError> {
        let mut query = Self::select(scope);
        query.push(" AND l.id = ").push_bind(id);

        let row = query.build_query_as::<LessonRow>().fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    /// Lessons visible in `scope`, newest first
    pub async fn list_visible(
        &self,
        scope: &Scope,
        pagination: Pagination,
    ) -> Result<Page<LessonDetails>, SchoolError> {
        let mut query = Self::select(scope);
        query
            .push(" ORDER BY l.date DESC, l.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query.build_query_as::<LessonRow>().fetch_all(&self.pool).await?;
        let total = self.count_visible(scope).await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    /// Every lesson of a teacher, for choice lists
    pub async fn all_of_teacher(&self, teacher_id: i64) -> Result<Vec<LessonDetails>, SchoolError> {
        let mut query = Self::select(&Scope::Teacher(teacher_id));
        query.push(" ORDER BY l.date DESC, l.id DESC");

        let rows = query.build_query_as::<LessonRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count_visible(&self, scope: &Scope) -> Result<i64, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM lessons l WHERE TRUE");
        scope.restrict_lessons(&mut query, "l");

        let count: (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    /// Students enrolled in the lesson's classroom
    pub async fn enrolled_students(&self, lesson_id: i64) -> Result<Vec<UserSummary>, SchoolError> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            r#"
            SELECT {} FROM lessons l
            JOIN enrollments e ON e.classroom_id = l.classroom_id
            JOIN users u ON u.id = e.student_id
            WHERE l.id = $1
            ORDER BY u.last_name, u.first_name
            "#,
            STUDENT_COLUMNS
        ))
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
