//! User service implementation
//! 
//! This service handles profile management and the administrator's user
//! management (roles, activation, deletion).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::{Profile, Role, UpdateProfileRequest, UpdateUserRequest, User};
use crate::services::access::require_admin;
use crate::utils::errors::{Result, SchoolError, ValidationErrors};
use crate::utils::forms::{check_length, parse_optional_date};
use crate::utils::helpers::{is_valid_phone, Page, Pagination};
use crate::utils::logging::{log_admin_action, log_user_action};

pub const USERS_PER_PAGE: i64 = 30;

/// Submitted profile form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub phone: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            photo: profile.photo.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            date_of_birth: profile
                .date_of_birth
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
        }
    }

    /// Validate into an update; blank fields clear the stored value
    pub fn validate(&self) -> Result<UpdateProfileRequest> {
        let mut errors = ValidationErrors::new();

        let non_empty = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        let phone = non_empty(&self.phone);
        if let Some(phone) = &phone {
            if !is_valid_phone(phone) {
                errors.add("phone", "invalid_phone");
            }
        }
        let photo = non_empty(&self.photo);
        if let Some(photo) = &photo {
            check_length(&mut errors, "photo", photo, 255);
        }
        let date_of_birth = parse_optional_date(&mut errors, "date_of_birth", &self.date_of_birth);

        errors.into_result()?;
        Ok(UpdateProfileRequest {
            photo,
            bio: non_empty(&self.bio),
            date_of_birth,
            phone,
        })
    }
}

/// Administrator's role and activation change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleForm {
    #[serde(default)]
    pub role: String,
    /// Checkbox: present when checked
    pub is_active: Option<String>,
}

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        debug!(user_id = user_id, "Getting user by ID");
        self.db
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(SchoolError::NotFound { resource: "user", id: user_id })
    }

    /// Own profile, created empty on first access
    pub async fn profile(&self, user: &User) -> Result<Profile> {
        match self.db.profiles.find_by_user(user.id).await? {
            Some(profile) => Ok(profile),
            None => self.db.profiles.create_empty(user.id).await,
        }
    }

    pub async fn update_profile(&self, user: &User, form: &ProfileForm) -> Result<Profile> {
        let request = form.validate()?;
        let profile = self.db.profiles.update(user.id, request).await?;

        log_user_action(user.id, "update_profile", None);
        Ok(profile)
    }

    /// Paginated user list for the administrator
    pub async fn list_users(&self, admin: &User, role: Option<Role>, page: Option<i64>) -> Result<Page<User>> {
        require_admin(admin)?;

        let pagination = Pagination::new(page, USERS_PER_PAGE);
        let users = self.db.users.list(role, pagination).await?;
        let total = self.db.users.count(role).await?;

        Ok(Page::new(users, pagination, total))
    }

    pub async fn change_role(&self, admin: &User, user_id: i64, form: &RoleForm) -> Result<User> {
        require_admin(admin)?;

        let role = form
            .role
            .parse::<Role>()
            .map_err(|_| SchoolError::from(ValidationErrors::single("role", "invalid_choice")))?;
        let is_active = form.is_active.is_some();

        if admin.id == user_id && (role != Role::Admin || !is_active) {
            return Err(ValidationErrors::non_field("cannot_demote_self").into());
        }

        let user = self
            .db
            .users
            .update(
                user_id,
                UpdateUserRequest {
                    role: Some(role),
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await?;

        log_admin_action(admin.id, "change_role", Some(&user.email), Some(role.as_str()));
        info!(user_id = user.id, role = %role, is_active = is_active, "User role updated");
        Ok(user)
    }

    /// Delete a user; refused while lessons reference them as teacher
    pub async fn delete_user(&self, admin: &User, user_id: i64) -> Result<()> {
        require_admin(admin)?;

        if admin.id == user_id {
            return Err(ValidationErrors::non_field("cannot_delete_self").into());
        }

        let user = self.get_user(user_id).await?;
        self.db.users.delete(user_id).await?;

        log_admin_action(admin.id, "delete_user", Some(&user.email), None);
        Ok(())
    }
}
