//! Session storage implementation
//! 
//! Login sessions are persisted in Redis as JSON with an expiry, so they
//! survive restarts and are shared between server instances.

use redis::AsyncCommands;
use tracing::{debug, error, warn};

use super::session::Session;
use crate::config::{RedisConfig, SessionConfig};
use crate::utils::errors::Result;

/// Redis-based session storage
#[derive(Clone)]
pub struct SessionStorage {
    /// Opening the client does not connect; connections are made per command
    client: redis::Client,
    prefix: String,
    ttl_seconds: u64,
}

impl SessionStorage {
    /// Create a new session storage instance
    pub fn new(redis: &RedisConfig, session: &SessionConfig) -> Result<Self> {
        let client = redis::Client::open(redis.url.as_str())?;

        Ok(Self {
            client,
            prefix: redis.prefix.clone(),
            ttl_seconds: session.ttl_seconds,
        })
    }

    fn session_key(&self, token: &str) -> String {
        format!("{}session:{}", self.prefix, token)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Start a session for a user and persist it with the configured TTL
    pub async fn create(&self, user_id: i64) -> Result<Session> {
        let session = Session::new(user_id, self.ttl_seconds);
        self.save(&session).await?;
        Ok(session)
    }

    /// Save session to Redis
    pub async fn save(&self, session: &Session) -> Result<()> {
        let key = self.session_key(&session.token);
        let serialized = serde_json::to_string(session)?;

        let mut conn = self.connection().await?;
        let saved: redis::RedisResult<()> = redis::cmd("SET")
            .arg(&key)
            .arg(serialized)
            .arg("EX")
            .arg(session.remaining_seconds())
            .query_async(&mut conn)
            .await;
        match saved {
            Ok(_) => {
                debug!(user_id = session.user_id, "Session saved to Redis");
                Ok(())
            }
            Err(e) => {
                error!(user_id = session.user_id, error = %e, "Failed to save session to Redis");
                Err(e.into())
            }
        }
    }

    /// Load session from Redis; expired or unreadable sessions are dropped
    pub async fn load(&self, token: &str) -> Result<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }

        let key = self.session_key(token);
        let mut conn = self.connection().await?;
        let serialized: Option<String> = conn.get(&key).await?;

        let Some(data) = serialized else {
            debug!("No session found in Redis");
            return Ok(None);
        };

        let session = match serde_json::from_str::<Session>(&data) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                self.delete(token).await?;
                return Ok(None);
            }
        };

        if session.is_expired() {
            debug!(user_id = session.user_id, "Session has expired, removing");
            self.delete(token).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete session from Redis
    pub async fn delete(&self, token: &str) -> Result<()> {
        let key = self.session_key(token);
        let mut conn = self.connection().await?;

        let deleted: u32 = conn.del(&key).await?;
        debug!(deleted = deleted, "Session deleted");

        Ok(())
    }

    /// Check that Redis answers
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
