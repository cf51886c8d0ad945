//! Login session data

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::helpers::generate_token;

/// A logged-in browser session, keyed by its opaque token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: i64, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token(),
            user_id,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Seconds left before expiry, never less than one
    pub fn remaining_seconds(&self) -> u64 {
        (self.expires_at - Utc::now()).num_seconds().max(1) as u64
    }
}
