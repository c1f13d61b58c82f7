use crate::domain_model::*;
use crate::domain_port::RoomBroker;
use crate::server::ConnMessage;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

/// Room membership for the connections attached to this process.
#[derive(Default)]
pub struct LocalRooms {
    mailboxes: DashMap<ConnectionId, Sender<ConnMessage>>,
    members: DashMap<RoomKey, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<RoomKey>>,
}

impl LocalRooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: ConnectionId, mailbox: Sender<ConnMessage>) {
        self.mailboxes.insert(connection, mailbox);
        self.join(connection, RoomKey::Everyone);
    }

    /// Drop the connection and every room membership it held.
    pub fn unregister(&self, connection: ConnectionId) {
        self.mailboxes.remove(&connection);
        let Some((_, rooms)) = self.memberships.remove(&connection) else {
            return;
        };
        for room in rooms {
            self.leave_room_only(connection, room);
        }
    }

    pub fn is_member(&self, connection: ConnectionId, room: RoomKey) -> bool {
        self.memberships
            .get(&connection)
            .is_some_and(|rooms| rooms.contains(&room))
    }

    pub fn member_count(&self, room: RoomKey) -> usize {
        self.members.get(&room).map_or(0, |m| m.len())
    }

    fn join(&self, connection: ConnectionId, room: RoomKey) {
        if !self.mailboxes.contains_key(&connection) {
            return;
        }
        self.members.entry(room).or_default().insert(connection);
        self.memberships.entry(connection).or_default().insert(room);
    }

    fn leave_room_only(&self, connection: ConnectionId, room: RoomKey) {
        self.members.remove_if_mut(&room, |_, m| {
            m.remove(&connection);
            m.is_empty()
        });
    }

    fn leave(&self, connection: ConnectionId, room: RoomKey) {
        self.leave_room_only(connection, room);
        if let Some(mut rooms) = self.memberships.get_mut(&connection) {
            rooms.remove(&room);
        }
    }

    /// Hand `event` to each member's mailbox. Full or closed mailboxes are
    /// skipped; the durable write stays the source of truth.
    pub fn deliver(&self, room: RoomKey, event: &S2CEvent, except: Option<ConnectionId>) -> anyhow::Result<usize> {
        let targets: Vec<ConnectionId> = match self.members.get(&room) {
            Some(m) => m.iter().copied().filter(|c| Some(*c) != except).collect(),
            None => return Ok(0),
        };
        if targets.is_empty() {
            return Ok(0);
        }

        let frame = ConnMessage::event(event)?;
        let mut delivered = 0;
        for connection in targets {
            let Some(mailbox) = self.mailboxes.get(&connection) else {
                continue;
            };
            match mailbox.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%connection, %room, "mailbox full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%connection, "mailbox closed");
                }
            }
        }
        Ok(delivered)
    }
}

#[async_trait::async_trait]
impl RoomBroker for LocalRooms {
    async fn add_to_room(&self, connection: ConnectionId, room: RoomKey) {
        self.join(connection, room);
    }

    async fn remove_from_room(&self, connection: ConnectionId, room: RoomKey) {
        self.leave(connection, room);
    }

    async fn emit_to_room(
        &self,
        room: RoomKey,
        event: &S2CEvent,
        except: Option<ConnectionId>,
    ) -> anyhow::Result<()> {
        let delivered = self.deliver(room, event, except)?;
        tracing::trace!(%room, delivered, "room emit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn attach(rooms: &LocalRooms) -> (ConnectionId, mpsc::Receiver<ConnMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let id = ConnectionId::new_v4();
        rooms.register(id, tx);
        (id, rx)
    }

    #[tokio::test]
    async fn emit_reaches_members_except_the_excluded_one() {
        let rooms = LocalRooms::new();
        let (a, mut rx_a) = attach(&rooms);
        let (b, mut rx_b) = attach(&rooms);
        let conversation = RoomKey::Conversation(ConversationId::new_v4());
        rooms.add_to_room(a, conversation).await;
        rooms.add_to_room(b, conversation).await;

        let event = S2CEvent::UnreadCountUpdate;
        assert_eq!(rooms.deliver(conversation, &event, Some(a)).unwrap(), 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(
            rx_b.try_recv().unwrap(),
            ConnMessage::Text(r#"{"event":"unread_count_update"}"#.to_owned())
        );
    }

    #[tokio::test]
    async fn unregister_clears_all_memberships() {
        let rooms = LocalRooms::new();
        let (a, _rx) = attach(&rooms);
        let user = RoomKey::User(UserId::new_v4());
        rooms.add_to_room(a, user).await;
        assert!(rooms.is_member(a, user));
        assert_eq!(rooms.member_count(RoomKey::Everyone), 1);

        rooms.unregister(a);
        assert!(!rooms.is_member(a, user));
        assert_eq!(rooms.member_count(user), 0);
        assert_eq!(rooms.member_count(RoomKey::Everyone), 0);

        // joining after unregister is ignored
        rooms.add_to_room(a, user).await;
        assert_eq!(rooms.member_count(user), 0);
    }

    #[tokio::test]
    async fn empty_room_is_not_an_error() {
        let rooms = LocalRooms::new();
        let n = rooms
            .deliver(RoomKey::User(UserId::new_v4()), &S2CEvent::UnreadCountUpdate, None)
            .unwrap();
        assert_eq!(n, 0);
    }
}
