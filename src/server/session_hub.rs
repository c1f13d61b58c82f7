use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::server::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const MAILBOX_CAP: usize = 256;

#[derive(Debug, Clone)]
pub struct ActorConfig {
    pub mailbox_capacity: usize,
    pub max_worker_timeout: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: MAILBOX_CAP,
            max_worker_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ClientRecord {
    pub user_id: UserId,
    /// Set once the connection has joined its own user room and counts
    /// towards presence.
    pub joined: AtomicBool,
    pub control: Sender<ConnMessage>,
    pub actor_handle: Mutex<Option<JoinHandle<()>>>,
    pub cancellation_token: CancellationToken,
}

pub struct ServiceRegistry {
    pub chat_service: Arc<dyn ChatService>,
}

struct HubState {
    connections: DashMap<ConnectionId, ClientRecord>,
    presence: DashMap<UserId, usize>,
    local_rooms: Arc<LocalRooms>,
    /// Room operations that may need to reach other instances.
    room_broker: Arc<dyn RoomBroker>,
    services: ServiceRegistry,
    config: ActorConfig,
}

/// Owns every live socket of this process: per-connection actors, the
/// presence counters and the C2S command handling.
pub struct SessionHub {
    state: Arc<HubState>,
}

impl SessionHub {
    pub fn new(
        local_rooms: Arc<LocalRooms>,
        room_broker: Arc<dyn RoomBroker>,
        services: ServiceRegistry,
        config: ActorConfig,
    ) -> Self {
        Self {
            state: Arc::new(HubState {
                connections: DashMap::new(),
                presence: DashMap::new(),
                local_rooms,
                room_broker,
                services,
                config,
            }),
        }
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.state.presence.get(&user_id).is_some_and(|n| *n > 0)
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.len()
    }

    pub async fn shutdown(&self) {
        tracing::info!("SessionHub shutting down...");

        for entry in self.state.connections.iter() {
            entry.cancellation_token.cancel();
        }

        let mut handles = Vec::new();
        for entry in self.state.connections.iter() {
            if let Ok(mut lock) = entry.actor_handle.lock() {
                if let Some(handle) = lock.take() {
                    handles.push(handle);
                }
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        tracing::info!("All SessionHub actors shut down.");
    }
}

// region connection acceptor

#[async_trait::async_trait]
impl ConnectionAcceptor for SessionHub {
    async fn accept_connection(
        &self,
        s2c_channel: Box<dyn ConnSender>,
        c2s_channel: Box<dyn ConnReceiver>,
        user_id: UserId,
    ) -> anyhow::Result<ConnectionId> {
        let connection_id = ConnectionId::new_v4();
        let actor_cancel = CancellationToken::new();
        let capacity = self.state.config.mailbox_capacity;

        let (control_tx, control_rx) = tokio::sync::mpsc::channel(capacity);
        let (mailbox_tx, mailbox_rx) = tokio::sync::mpsc::channel(capacity);

        let notify = Arc::new(Notify::new());
        let actor_handle = tokio::spawn(client_actor(
            connection_id,
            user_id,
            s2c_channel,
            c2s_channel,
            control_tx.clone(),
            control_rx,
            mailbox_rx,
            actor_cancel.clone(),
            notify.clone(),
            self.state.clone(),
        ));

        self.state.local_rooms.register(connection_id, mailbox_tx);
        self.state.connections.insert(
            connection_id,
            ClientRecord {
                user_id,
                joined: AtomicBool::new(false),
                control: control_tx,
                actor_handle: Mutex::new(Some(actor_handle)),
                cancellation_token: actor_cancel,
            },
        );
        notify.notify_one();

        tracing::debug!(%connection_id, %user_id, "connection accepted");
        Ok(connection_id)
    }
}

#[allow(clippy::too_many_arguments)]
async fn client_actor(
    connection_id: ConnectionId,
    user_id: UserId,
    s2c_channel: Box<dyn ConnSender>,
    c2s_channel: Box<dyn ConnReceiver>,
    control_tx: Sender<ConnMessage>,
    control_rx: Receiver<ConnMessage>,
    mailbox_rx: Receiver<ConnMessage>,
    actor_cancel: CancellationToken,
    notify: Arc<Notify>,
    state: Arc<HubState>,
) {
    notify.notified().await;
    tracing::info!("ClientActor [{}/{}] starting", user_id, connection_id);

    let sender_handle = tokio::spawn(outbound_sender(
        s2c_channel,
        control_rx,
        mailbox_rx,
        actor_cancel.clone(),
    ));

    let receiver_handle = tokio::spawn(inbound_receiver(
        connection_id,
        user_id,
        c2s_channel,
        control_tx,
        state.clone(),
        actor_cancel.clone(),
    ));

    tokio::select! {
        res = sender_handle => {
            tracing::debug!("Sender task ended first ({}): {:?}", connection_id, res);
        },
        res = receiver_handle => {
            tracing::debug!("Receiver task ended first ({}): {:?}", connection_id, res);
        }
    };
    actor_cancel.cancel();
    state.disconnect(connection_id).await;
    tracing::debug!("connections: {}", state.connections.len());
}

async fn outbound_sender(
    mut s2c_channel: Box<dyn ConnSender>,
    mut control_rx: Receiver<ConnMessage>,
    mut mailbox_rx: Receiver<ConnMessage>,
    actor_cancel: CancellationToken,
) {
    while let Some(msg) = tokio::select! {
        biased;
        _ = actor_cancel.cancelled() => None,
        m = control_rx.recv() => m,
        m = mailbox_rx.recv() => m,
    } {
        tracing::trace!("outbound_sender: {:?}", msg);
        if s2c_channel.send(msg).await.is_err() {
            tracing::trace!("outbound_sender shutting down");
            actor_cancel.cancel();
            break;
        }
    }
}

/// Frames from one connection are handled in arrival order, so a
/// `join_conversation` always takes effect before the typing events after it.
async fn inbound_receiver(
    connection_id: ConnectionId,
    user_id: UserId,
    mut c2s_channel: Box<dyn ConnReceiver>,
    control_tx: Sender<ConnMessage>,
    state: Arc<HubState>,
    actor_cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = actor_cancel.cancelled() => {
                tracing::info!("ClientActor [{}] shutdown by cancel", connection_id);
                break;
            },

            maybe_message = c2s_channel.next() => {
                let conn_msg = match maybe_message {
                    Some(Ok(m)) => m,
                    Some(Err(_)) => break, // low level error
                    None => break,         // connection closed
                };

                let fut = state.handle_frame(connection_id, user_id, conn_msg, &control_tx, &actor_cancel);
                match tokio::time::timeout(state.config.max_worker_timeout, fut).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("frame from [{}] failed: {e:#}", connection_id),
                    Err(_) => tracing::warn!("Worker timeout for connection [{}]", connection_id),
                }
            }
        }
    }

    tracing::info!("ClientActor [{}] shutting down", connection_id);
}

// endregion

// region command handling

impl HubState {
    async fn handle_frame(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        conn_msg: ConnMessage,
        control_tx: &Sender<ConnMessage>,
        actor_cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        match conn_msg {
            ConnMessage::Text(t) => match serde_json::from_str::<C2SCommand>(&t) {
                Ok(command) => {
                    if let Err(reason) = self.dispatch(connection_id, user_id, command).await {
                        send_error(control_tx, reason).await?;
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::debug!("malformed frame from [{}]: {e}", connection_id);
                    send_error(control_tx, format!("malformed frame: {e}")).await
                }
            },
            ConnMessage::Binary(_) => send_error(control_tx, "binary frames are not supported".to_owned()).await,
            ConnMessage::Ping => {
                control_tx.send(ConnMessage::Pong).await?;
                Ok(())
            }
            ConnMessage::Pong => Ok(()),
            ConnMessage::Close => {
                actor_cancel.cancel();
                Ok(())
            }
        }
    }

    /// Apply one client command. An `Err` is reported to the sending
    /// connection only.
    async fn dispatch(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        command: C2SCommand,
    ) -> Result<(), String> {
        match command {
            C2SCommand::Join(requested) => {
                if requested != user_id {
                    return Err("cannot join another user's room".to_owned());
                }
                self.join_user_room(connection_id, user_id).await;
                Ok(())
            }
            C2SCommand::JoinConversation(conversation_id) => {
                let allowed = self
                    .services
                    .chat_service
                    .is_participant(user_id, conversation_id)
                    .await
                    .map_err(|e| e.to_string())?;
                if !allowed {
                    return Err("not a participant of this conversation".to_owned());
                }
                self.room_broker
                    .add_to_room(connection_id, RoomKey::Conversation(conversation_id))
                    .await;
                Ok(())
            }
            C2SCommand::LeaveConversation(conversation_id) => {
                self.room_broker
                    .remove_from_room(connection_id, RoomKey::Conversation(conversation_id))
                    .await;
                Ok(())
            }
            C2SCommand::TypingStart(signal) => {
                let relay = TypingRelay {
                    user_id,
                    conversation_id: signal.conversation_id,
                };
                self.relay_typing(connection_id, S2CEvent::UserTyping(relay)).await
            }
            C2SCommand::TypingStop(signal) => {
                let relay = TypingRelay {
                    user_id,
                    conversation_id: signal.conversation_id,
                };
                self.relay_typing(connection_id, S2CEvent::UserStopTyping(relay)).await
            }
            C2SCommand::ReadMessages(conversation_id) => self
                .services
                .chat_service
                .mark_read(conversation_id, user_id)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }

    async fn relay_typing(&self, connection_id: ConnectionId, event: S2CEvent) -> Result<(), String> {
        let conversation_id = match &event {
            S2CEvent::UserTyping(r) | S2CEvent::UserStopTyping(r) => r.conversation_id,
            _ => return Ok(()),
        };
        let room = RoomKey::Conversation(conversation_id);
        if !self.local_rooms.is_member(connection_id, room) {
            return Err("join the conversation before sending typing events".to_owned());
        }
        if let Err(e) = self.room_broker.emit_to_room(room, &event, Some(connection_id)).await {
            tracing::debug!(%room, "typing relay dropped: {e}");
        }
        Ok(())
    }

    async fn join_user_room(&self, connection_id: ConnectionId, user_id: UserId) {
        match self.connections.get(&connection_id) {
            Some(record) if !record.joined.load(Ordering::SeqCst) => {}
            _ => return,
        }
        self.room_broker
            .add_to_room(connection_id, RoomKey::User(user_id))
            .await;

        // no await from here on: a timed out join must leave presence and
        // the joined flag untouched together
        let Some(record) = self.connections.get(&connection_id) else {
            return;
        };
        let came_online = {
            let mut live = self.presence.entry(user_id).or_insert(0);
            *live += 1;
            *live == 1
        };
        record.joined.store(true, Ordering::SeqCst);
        drop(record);
        if came_online {
            tracing::info!(%user_id, "user online");
            self.broadcast_presence(S2CEvent::UserOnline(user_id));
        }
    }

    async fn disconnect(&self, connection_id: ConnectionId) {
        let Some((_, record)) = self.connections.remove(&connection_id) else {
            return;
        };
        self.local_rooms.unregister(connection_id);

        if !record.joined.load(Ordering::SeqCst) {
            return;
        }
        let user_id = record.user_id;
        let went_offline = self
            .presence
            .remove_if_mut(&user_id, |_, live| {
                *live = live.saturating_sub(1);
                *live == 0
            })
            .is_some();
        if went_offline {
            tracing::info!(%user_id, "user offline");
            self.broadcast_presence(S2CEvent::UserOffline(user_id));
        }
    }

    /// Presence stays process-local.
    fn broadcast_presence(&self, event: S2CEvent) {
        if let Err(e) = self.local_rooms.deliver(RoomKey::Everyone, &event, None) {
            tracing::warn!("presence broadcast failed: {e}");
        }
    }
}

async fn send_error(control_tx: &Sender<ConnMessage>, message: String) -> anyhow::Result<()> {
    let frame = ConnMessage::event(&S2CEvent::Error(ProtocolError { message }))?;
    control_tx.send(frame).await?;
    Ok(())
}

// endregion
