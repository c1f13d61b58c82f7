use crate::domain_model::*;
use crate::domain_port::RoomBroker;
use std::sync::Mutex;

/// Broker double that records every emitted event instead of delivering it.
#[derive(Default)]
pub struct RecordingBroker {
    emitted: Mutex<Vec<(RoomKey, S2CEvent)>>,
}

impl RecordingBroker {
    pub fn events_for(&self, room: RoomKey) -> Vec<S2CEvent> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == room)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl RoomBroker for RecordingBroker {
    async fn add_to_room(&self, _connection: ConnectionId, _room: RoomKey) {}

    async fn remove_from_room(&self, _connection: ConnectionId, _room: RoomKey) {}

    async fn emit_to_room(
        &self,
        room: RoomKey,
        event: &S2CEvent,
        _except: Option<ConnectionId>,
    ) -> anyhow::Result<()> {
        self.emitted.lock().unwrap().push((room, event.clone()));
        Ok(())
    }
}
