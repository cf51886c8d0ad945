//! Profile repository implementation

use sqlx::PgPool;

use crate::models::user::{Profile, UpdateProfileRequest};
use crate::utils::errors::SchoolError;

#[derive(Clone, Debug)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the empty profile of a new user; a no-op when one exists
    pub async fn create_empty(&self, user_id: i64) -> Result<Profile, SchoolError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, photo, bio, date_of_birth, phone
            "#
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<Profile>, SchoolError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, photo, bio, date_of_birth, phone FROM profiles WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Replace the editable profile fields
    pub async fn update(&self, user_id: i64, request: UpdateProfileRequest) -> Result<Profile, SchoolError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, photo, bio, date_of_birth, phone)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET photo = EXCLUDED.photo,
                bio = EXCLUDED.bio,
                date_of_birth = EXCLUDED.date_of_birth,
                phone = EXCLUDED.phone
            RETURNING id, user_id, photo, bio, date_of_birth, phone
            "#
        )
        .bind(user_id)
        .bind(request.photo)
        .bind(request.bio)
        .bind(request.date_of_birth)
        .bind(request.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }
}
