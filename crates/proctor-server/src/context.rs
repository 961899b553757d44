//! Process-wide application context.
//!
//! [`AppContext`] owns the live infrastructure connections and the room
//! coordinator built on top of them. One context is created at startup
//! and torn down once on shutdown; everything else borrows from it
//! through `Arc`s.

use std::sync::Arc;

use proctor_bus::NatsBus;
use proctor_core::ports::{EventPublisher, RoomLock, RoomStore};
use proctor_core::RoomCoordinator;
use proctor_db::{RedisLock, RedisStore};
use tracing::info;

use crate::config::ProctorConfig;
use crate::error::ServiceError;

/// Live connections plus the coordinator wired on top of them.
#[derive(Debug)]
pub struct AppContext {
    /// Redis-backed room store, kept for shutdown.
    store: RedisStore,

    /// NATS event bus, kept for subscriptions and shutdown.
    bus: NatsBus,

    /// The room coordinator all client operations go through.
    coordinator: Arc<RoomCoordinator>,
}

impl AppContext {
    /// Connect to Redis and NATS and assemble the coordinator.
    ///
    /// The lock shares the store's Redis connection; a separate
    /// connection buys nothing since both run short commands.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] or [`ServiceError::Bus`] if a
    /// backend is unreachable.
    pub async fn connect(config: &ProctorConfig) -> Result<Self, ServiceError> {
        let store = RedisStore::connect(&config.infrastructure.redis_url).await?;
        info!(redis_url = %config.infrastructure.redis_url, "Redis connected");

        let lock = RedisLock::new(store.client().clone(), config.lock.to_lock_config());

        let bus = NatsBus::connect(&config.infrastructure.nats_url).await?;

        let coordinator = RoomCoordinator::with_tick_period(
            Arc::new(store.clone()) as Arc<dyn RoomStore>,
            Arc::new(lock) as Arc<dyn RoomLock>,
            Arc::new(bus.clone()) as Arc<dyn EventPublisher>,
            config.timer.tick_period(),
        );

        Ok(Self {
            store,
            bus,
            coordinator,
        })
    }

    /// The room coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Arc<RoomCoordinator> {
        &self.coordinator
    }

    /// The NATS event bus.
    #[must_use]
    pub const fn bus(&self) -> &NatsBus {
        &self.bus
    }

    /// Stop timer drivers and close both backend connections.
    pub async fn shutdown(&self) {
        self.coordinator.abort_drivers().await;
        self.bus.shutdown().await;
        self.store.shutdown().await;
        info!("application context shut down");
    }
}
