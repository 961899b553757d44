//! Redis room store.
//!
//! One JSON value per exam identifier at `exam:{exam_id}`. No caching
//! layer sits in front of Redis: the coordinator only reads room state
//! inside a lock-held critical section, and a cache could observe
//! stale state outside one.

use async_trait::async_trait;
use fred::prelude::*;
use proctor_core::ports::{RoomStore, StoreError};
use proctor_types::{ExamId, ExamRoom};

use crate::keys;

/// Connection handle to the shared Redis instance, typed for room
/// state operations.
///
/// Wraps a [`fred`] [`Client`]. Clone freely; clones share the same
/// connection. The same client can be handed to
/// [`RedisLock`](crate::lock::RedisLock) so one process keeps one
/// Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Connect to Redis at the given URL (`redis://host:port`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL cannot be parsed
    /// or the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid Redis URL: {e}")))?;
        let client = Builder::from_config(config)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("client build failed: {e}")))?;
        client
            .init()
            .await
            .map_err(|e| StoreError::Unavailable(format!("connection failed: {e}")))?;

        tracing::info!("connected to Redis");
        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Close the connection. Called once at process shutdown.
    pub async fn shutdown(&self) {
        if let Err(e) = self.client.quit().await {
            tracing::warn!(error = %e, "Redis shutdown failed");
        }
    }
}

#[async_trait]
impl RoomStore for RedisStore {
    async fn get_room(&self, exam_id: &ExamId) -> Result<Option<ExamRoom>, StoreError> {
        let value: Option<String> = self
            .client
            .get(keys::room_key(exam_id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("GET failed: {e}")))?;
        value
            .map(|s| {
                serde_json::from_str(&s)
                    .map_err(|e| StoreError::Serialization(format!("room decode failed: {e}")))
            })
            .transpose()
    }

    async fn set_room(&self, room: &ExamRoom) -> Result<(), StoreError> {
        let json = serde_json::to_string(room)
            .map_err(|e| StoreError::Serialization(format!("room encode failed: {e}")))?;
        let _: () = self
            .client
            .set(keys::room_key(&room.exam_id), json.as_str(), None, None, false)
            .await
            .map_err(|e| StoreError::Unavailable(format!("SET failed: {e}")))?;
        Ok(())
    }

    async fn delete_room(&self, exam_id: &ExamId) -> Result<(), StoreError> {
        let _: u32 = self
            .client
            .del(keys::room_key(exam_id))
            .await
            .map_err(|e| StoreError::Unavailable(format!("DEL failed: {e}")))?;
        Ok(())
    }
}

impl core::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}
