use crate::domain_model::*;

/// Room membership and room-addressed delivery. Implementations may keep
/// membership in process or back it with a shared pub/sub.
#[async_trait::async_trait]
pub trait RoomBroker: Send + Sync {
    async fn add_to_room(&self, connection: ConnectionId, room: RoomKey);

    async fn remove_from_room(&self, connection: ConnectionId, room: RoomKey);

    /// Deliver to every connection in `room` except `except`. Delivery is
    /// best-effort; an error means nothing could be handed off at all.
    async fn emit_to_room(
        &self,
        room: RoomKey,
        event: &S2CEvent,
        except: Option<ConnectionId>,
    ) -> anyhow::Result<()>;
}

/// Fire-and-forget push to every live session of `user`.
pub async fn emit_to_user(broker: &dyn RoomBroker, user: UserId, event: &S2CEvent) {
    if let Err(e) = broker.emit_to_room(RoomKey::User(user), event, None).await {
        tracing::debug!(%user, "realtime push dropped: {e}");
    }
}
