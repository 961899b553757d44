//! NATS client wrapper for room event publication and subscription.

use async_trait::async_trait;
use proctor_core::ports::{BusError, EventPublisher};
use proctor_types::RoomEvent;
use tracing::{debug, info, warn};

use crate::subject;

/// NATS client wrapper shared by the coordinator (publish side) and
/// the fanout loop (subscribe side).
///
/// Manages a single NATS connection per process.
#[derive(Clone)]
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unavailable`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Unavailable(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub const fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Subscribe to room events for every exam.
    ///
    /// Returns a subscription yielding messages on
    /// [`subject::EVENTS_WILDCARD`]; decode payloads with
    /// [`deserialize_event`](Self::deserialize_event).
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unavailable`] if the subscription fails.
    pub async fn subscribe_events(&self) -> Result<async_nats::Subscriber, BusError> {
        debug!(subject = subject::EVENTS_WILDCARD, "subscribing to room events");
        let subscriber = self
            .client
            .subscribe(subject::EVENTS_WILDCARD)
            .await
            .map_err(|e| {
                BusError::Unavailable(format!(
                    "failed to subscribe to {}: {e}",
                    subject::EVENTS_WILDCARD
                ))
            })?;
        info!("subscribed to room events");
        Ok(subscriber)
    }

    /// Deserialize a NATS message payload into a [`RoomEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Serialization`] if deserialization fails.
    pub fn deserialize_event(data: &[u8]) -> Result<RoomEvent, BusError> {
        serde_json::from_slice(data)
            .map_err(|e| BusError::Serialization(format!("failed to deserialize event: {e}")))
    }

    /// Flush pending messages and drain the connection. Called once at
    /// process shutdown; failures are logged, not propagated.
    pub async fn shutdown(&self) {
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "NATS flush failed during shutdown");
        }
        if let Err(e) = self.client.drain().await {
            warn!(error = %e, "NATS drain failed during shutdown");
        }
    }
}

#[async_trait]
impl EventPublisher for NatsBus {
    async fn publish(&self, event: &RoomEvent) -> Result<(), BusError> {
        let subject = subject::events_subject(&event.room.exam_id);
        let payload = serde_json::to_vec(event)
            .map_err(|e| BusError::Serialization(format!("failed to serialize event: {e}")))?;
        debug!(
            subject = subject,
            exam_id = %event.room.exam_id,
            kind = %event.kind,
            "publishing room event"
        );
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| BusError::Unavailable(format!("failed to publish to {subject}: {e}")))?;
        Ok(())
    }
}

impl core::fmt::Debug for NatsBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NatsBus")
            .field("connected", &true)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proctor_types::{EventKind, ExamId, ExamRoom};

    use super::*;

    fn event() -> RoomEvent {
        RoomEvent::new(
            EventKind::TimerTick,
            ExamRoom {
                exam_id: ExamId::new("exam-wire"),
                subject: "biology".to_owned(),
                duration: 60,
                time_left: 42,
                is_running: true,
                is_finished: false,
            },
        )
    }

    #[test]
    fn deserialize_valid_event() {
        let bytes = serde_json::to_vec(&event()).expect("serialize failed");
        let decoded = NatsBus::deserialize_event(&bytes).expect("deserialize failed");
        assert_eq!(decoded, event());
        assert_eq!(decoded.room.time_left, 42);
    }

    #[test]
    fn deserialize_invalid_event() {
        let result = NatsBus::deserialize_event(b"not valid json");
        assert!(matches!(result, Err(BusError::Serialization(_))));
    }

    // Integration tests that require a live NATS server are marked #[ignore].
    #[tokio::test]
    #[ignore]
    async fn connect_to_nats() {
        let result = NatsBus::connect("nats://localhost:4222").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore]
    async fn publish_and_receive_round_trip() {
        use futures::StreamExt as _;

        let bus = NatsBus::connect("nats://localhost:4222")
            .await
            .expect("NATS connection failed");
        let mut sub = bus.subscribe_events().await.expect("subscribe failed");

        bus.publish(&event()).await.expect("publish failed");

        let msg = sub.next().await.expect("no message received");
        let decoded = NatsBus::deserialize_event(&msg.payload).expect("deserialize failed");
        assert_eq!(decoded, event());
    }
}
