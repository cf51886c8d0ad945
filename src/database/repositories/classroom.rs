//! Classroom repository implementation

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::rows::{OptionalUserRow, OPTIONAL_USER_COLUMNS};
use crate::models::classroom::{classroom_label, ClassRoom, ClassRoomDetails, CreateClassRoomRequest};
use crate::services::access::Scope;
use crate::utils::errors::SchoolError;

#[derive(Debug, FromRow)]
struct ClassRoomRow {
    id: i64,
    name: String,
    grade_level: i16,
    #[sqlx(flatten)]
    curator: OptionalUserRow,
}

impl From<ClassRoomRow> for ClassRoomDetails {
    fn from(row: ClassRoomRow) -> Self {
        ClassRoomDetails {
            id: row.id,
            label: classroom_label(row.grade_level, &row.name),
            grade_level: row.grade_level,
            name: row.name,
            curator: row.curator.into_summary(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassroomRepository {
    pool: PgPool,
}

impl ClassroomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(scope: &Scope) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "SELECT c.id, c.name, c.grade_level, {} FROM classrooms c LEFT JOIN users r ON r.id = c.curator_id WHERE TRUE",
            OPTIONAL_USER_COLUMNS
        ));
        scope.restrict_classrooms(&mut query, "c");
        query
    }

    pub async fn create(&self, request: CreateClassRoomRequest) -> Result<ClassRoom, SchoolError> {
        let classroom = sqlx::query_as::<_, ClassRoom>(
            "INSERT INTO classrooms (grade_level, name, curator_id) VALUES ($1, $2, $3) RETURNING id, name, grade_level, curator_id"
        )
        .bind(request.grade_level)
        .bind(request.name)
        .bind(request.curator_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(classroom)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ClassRoom>, SchoolError> {
        let classroom = sqlx::query_as::<_, ClassRoom>(
            "SELECT id, name, grade_level, curator_id FROM classrooms WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(classroom)
    }

    /// Classrooms visible in `scope`, ordered by grade level then name
    pub async fn list_visible(&self, scope: &Scope) -> Result<Vec<ClassRoomDetails>, SchoolError> {
        let mut query = Self::select(scope);
        query.push(" ORDER BY c.grade_level, c.name, c.id");

        let rows = query.build_query_as::<ClassRoomRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_visible(&self, scope: &Scope, id: i64) -> Result<Option<ClassRoomDetails>, SchoolError> {
        let mut query = Self::select(scope);
        query.push(" AND c.id = ").push_bind(id);

        let row = query.build_query_as::<ClassRoomRow>().fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM classrooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_visible(&self, scope: &Scope) -> Result<i64, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classrooms c WHERE TRUE");
        scope.restrict_classrooms(&mut query, "c");

        let count: (i64,) = query.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }
}
