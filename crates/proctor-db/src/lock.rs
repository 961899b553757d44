//! Redis lock manager.
//!
//! Single-node Redis locking: `SET key token NX PX ttl` to acquire,
//! a compare-and-delete script to release. Acquisition retries with
//! jittered backoff up to the configured budget; the TTL bounds how
//! long a crashed holder can block everyone else.
//!
//! This is deliberately not a quorum algorithm. The lock port admits
//! one for clustered Redis deployments; the coordinator does not
//! assume which is behind the trait, and every mutation stays
//! idempotent on the stored state in case a TTL expires while the
//! critical section is still running.

use async_trait::async_trait;
use fred::prelude::*;
use proctor_core::ports::{LockConfig, LockError, LockToken, RoomLock};
use proctor_types::ExamId;
use tracing::debug;
use uuid::Uuid;

use crate::keys;

/// Delete the lock key only if it still holds our token, so a lock
/// that expired and was re-acquired by another actor is left alone.
const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Mutual exclusion per exam, backed by Redis `SET NX PX`.
#[derive(Clone)]
pub struct RedisLock {
    client: Client,
    config: LockConfig,
}

impl RedisLock {
    /// Create a lock manager on an already connected client.
    ///
    /// The client is typically shared with
    /// [`RedisStore`](crate::store::RedisStore).
    pub const fn new(client: Client, config: LockConfig) -> Self {
        Self { client, config }
    }

    async fn try_acquire(&self, key: &str, token: &str) -> Result<bool, LockError> {
        let ttl_ms = i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX);
        let reply: Option<String> = self
            .client
            .set(
                key,
                token,
                Some(Expiration::PX(ttl_ms)),
                Some(SetOptions::NX),
                false,
            )
            .await
            .map_err(|e| LockError::Backend(format!("SET NX failed: {e}")))?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl RoomLock for RedisLock {
    async fn acquire(&self, exam_id: &ExamId) -> Result<LockToken, LockError> {
        let resource = keys::lock_key(exam_id);
        let value = Uuid::new_v4().to_string();

        let mut attempt: u32 = 0;
        loop {
            if self.try_acquire(&resource, &value).await? {
                debug!(resource = %resource, attempt, "lock acquired");
                return Ok(LockToken { resource, value });
            }
            if attempt >= self.config.retry_count {
                return Err(LockError::Unavailable(format!(
                    "retries exhausted for {resource}"
                )));
            }
            attempt = attempt.saturating_add(1);
            tokio::time::sleep(self.config.retry_pause()).await;
        }
    }

    async fn release(&self, token: LockToken) -> Result<(), LockError> {
        let deleted: i64 = self
            .client
            .eval(
                RELEASE_SCRIPT,
                vec![token.resource.clone()],
                vec![token.value],
            )
            .await
            .map_err(|e| LockError::Backend(format!("release script failed: {e}")))?;

        if deleted == 0 {
            return Err(LockError::Lost(format!(
                "lock {} expired or was taken over before release",
                token.resource
            )));
        }
        debug!(resource = %token.resource, "lock released");
        Ok(())
    }
}

impl core::fmt::Debug for RedisLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisLock")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
