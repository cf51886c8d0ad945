//! User repository implementation

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::user::{CreateUserRequest, Role, UpdateUserRequest, User, UserSummary};
use crate::utils::errors::{
    foreign_key_violation_as, violated_unique_constraint, SchoolError, ValidationErrors,
};
use crate::utils::helpers::Pagination;

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password_hash, role, is_active, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, SchoolError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(request.email)
        .bind(request.username)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.password_hash)
        .bind(request.role)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(user_conflict)?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, SchoolError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by email; callers pass the normalized address
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, SchoolError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, SchoolError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, SchoolError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    /// Update user
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User, SchoolError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.role)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SchoolError::NotFound { resource: "user", id })?;

        Ok(user)
    }

    /// Delete user; blocked while lessons still reference them as teacher
    pub async fn delete(&self, id: i64) -> Result<bool, SchoolError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| foreign_key_violation_as(e, "user_protected"))?;

        Ok(result.rows_affected() > 0)
    }

    /// List users, optionally of one role, ordered by role then last name
    pub async fn list(&self, role: Option<Role>, pagination: Pagination) -> Result<Vec<User>, SchoolError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        if let Some(role) = role {
            query.push(" AND role = ").push_bind(role);
        }
        query
            .push(" ORDER BY role, last_name, first_name, id LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Count users, optionally of one role
    pub async fn count(&self, role: Option<Role>) -> Result<i64, SchoolError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE $1::user_role IS NULL OR role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// All active users of a role, for choice lists
    pub async fn summaries_by_role(&self, role: Role) -> Result<Vec<UserSummary>, SchoolError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE role = $1 AND is_active ORDER BY last_name, first_name",
            USER_COLUMNS
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.iter().map(User::summary).collect())
    }

    /// Case-insensitive substring search among students by name or username
    pub async fn search_students(&self, pattern: &str) -> Result<Vec<User>, SchoolError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE role = 'STUDENT'
              AND (first_name ILIKE $1 OR last_name ILIKE $1 OR username ILIKE $1)
            ORDER BY last_name, first_name
            "#,
            USER_COLUMNS
        ))
        .bind(format!("%{}%", escape_like(pattern)))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

/// Field and error code for a unique key of the users table
fn conflicting_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    if constraint.starts_with("users_username") {
        Some(("username", "username_taken"))
    } else if constraint.starts_with("users_email") {
        Some(("email", "email_taken"))
    } else {
        None
    }
}

fn user_conflict(error: sqlx::Error) -> SchoolError {
    match violated_unique_constraint(&error).as_deref().and_then(conflicting_field) {
        Some((field, code)) => ValidationErrors::single(field, code).into(),
        None => SchoolError::Database(error),
    }
}

/// Escape LIKE wildcards so user input matches literally
pub(crate) fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
