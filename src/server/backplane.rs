use crate::domain_model::*;
use crate::domain_port::RoomBroker;
use crate::server::{EventHandler, EventPublisher, HandleOutcome, LocalRooms};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ROOM_EVENTS_TOPIC: &str = "tradepost.room-events";

/// One room emission as it travels between instances.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room: RoomKey,
    pub except: Option<ConnectionId>,
    pub event: S2CEvent,
}

/// Room broker for multi-instance deployments: membership stays local,
/// emissions go through the shared topic so every instance delivers to
/// its own members.
pub struct BackplaneRoomBroker {
    local_rooms: Arc<LocalRooms>,
    publisher: Arc<dyn EventPublisher>,
    topic: String,
}

impl BackplaneRoomBroker {
    pub fn new(local_rooms: Arc<LocalRooms>, publisher: Arc<dyn EventPublisher>, topic: &str) -> Self {
        Self {
            local_rooms,
            publisher,
            topic: topic.to_owned(),
        }
    }
}

#[async_trait::async_trait]
impl RoomBroker for BackplaneRoomBroker {
    async fn add_to_room(&self, connection: ConnectionId, room: RoomKey) {
        self.local_rooms.add_to_room(connection, room).await;
    }

    async fn remove_from_room(&self, connection: ConnectionId, room: RoomKey) {
        self.local_rooms.remove_from_room(connection, room).await;
    }

    async fn emit_to_room(
        &self,
        room: RoomKey,
        event: &S2CEvent,
        except: Option<ConnectionId>,
    ) -> anyhow::Result<()> {
        let envelope = RoomEnvelope {
            room,
            except,
            event: event.clone(),
        };
        let payload = serde_json::to_vec(&envelope)?;
        // same room, same partition: per-room emission order survives
        self.publisher
            .publish(&self.topic, room.to_string().as_bytes(), &payload)
            .await
    }
}

/// Consumes room envelopes and delivers them to this instance's members.
pub struct RoomFanoutHandler {
    local_rooms: Arc<LocalRooms>,
}

impl RoomFanoutHandler {
    pub fn new(local_rooms: Arc<LocalRooms>) -> Self {
        Self { local_rooms }
    }
}

#[async_trait::async_trait]
impl EventHandler for RoomFanoutHandler {
    async fn handle(&self, payload: &[u8]) -> anyhow::Result<HandleOutcome> {
        let envelope = match serde_json::from_slice::<RoomEnvelope>(payload) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("undecodable room envelope: {e}");
                return Ok(HandleOutcome::Skipped);
            }
        };

        let delivered = self
            .local_rooms
            .deliver(envelope.room, &envelope.event, envelope.except)?;
        tracing::trace!(room = %envelope.room, delivered, "room envelope fanned out");
        Ok(HandleOutcome::Commit)
    }
}
