//! WebSocket group chat.
//!
//! Every connection subscribes to one process-wide broadcast channel and
//! forwards only the events of rooms it has joined. Room membership lives
//! in the connection task and disappears with it.

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use rawmate_common::{AppResult, config::ChatConfig};
use rawmate_core::{EventPublisher, PostChatMessageInput};
use rawmate_db::entities::chat_message;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::middleware::AppState;

/// A chat message as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    #[serde(rename = "_id")]
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub message: String,
    pub timestamp: String,
}

impl From<&chat_message::Model> for ChatMessagePayload {
    fn from(m: &chat_message::Model) -> Self {
        Self {
            id: m.id.clone(),
            group_id: m.group_id.clone(),
            sender_id: m.sender_id.clone(),
            sender_name: m.sender_name.clone(),
            message: m.message.clone(),
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

/// A message published into one room.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub group_id: String,
    pub message: ChatMessagePayload,
}

/// Client-to-server frame.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Subscribe to a room and receive its history.
    JoinGroupChat(String),
    /// Unsubscribe from a room.
    LeaveGroupChat(String),
    /// Post into a room.
    ChatMessage(PostChatMessageInput),
}

/// Server-to-client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Recent messages of a room, oldest first. Sent to the joining client only.
    ChatHistory(Vec<ChatMessagePayload>),
    /// A new message in a subscribed room.
    GroupChatMessage(ChatMessagePayload),
    /// Something the client asked for failed.
    ChatError(String),
}

/// Shared fan-out hub.
#[derive(Clone)]
pub struct ChatHub {
    /// Broadcast sender for room events.
    room_tx: Arc<broadcast::Sender<RoomEvent>>,
    max_rooms_per_connection: usize,
}

impl ChatHub {
    /// Create a new hub.
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        let (room_tx, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            room_tx: Arc::new(room_tx),
            max_rooms_per_connection: config.max_rooms_per_connection.max(1),
        }
    }

    /// Receive every room event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.room_tx.subscribe()
    }

    /// Start a per-connection session bounded by the configured room limit.
    #[must_use]
    pub fn session(&self) -> ChatSession {
        ChatSession::new(self.max_rooms_per_connection)
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(&ChatConfig::default())
    }
}

#[async_trait]
impl EventPublisher for ChatHub {
    async fn publish_group_chat_message(&self, message: &chat_message::Model) -> AppResult<()> {
        let event = RoomEvent {
            group_id: message.group_id.clone(),
            message: message.into(),
        };
        // No receivers just means nobody is connected
        let _ = self.room_tx.send(event);
        Ok(())
    }
}

/// Rooms a single connection is subscribed to.
///
/// Holds at most `max_rooms` rooms; joining one more evicts the oldest.
/// Messages already sent in a room's history replay are not forwarded again
/// when their broadcast arrives afterwards.
#[derive(Debug, Clone)]
pub struct ChatSession {
    rooms: VecDeque<String>,
    max_rooms: usize,
    replayed: HashMap<String, HashSet<String>>,
}

impl ChatSession {
    #[must_use]
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: VecDeque::new(),
            max_rooms: max_rooms.max(1),
            replayed: HashMap::new(),
        }
    }

    /// Subscribe to a room. Returns the room evicted to make space, if any.
    pub fn join(&mut self, group_id: &str) -> Option<String> {
        if self.is_subscribed(group_id) {
            return None;
        }

        let evicted = if self.rooms.len() >= self.max_rooms {
            self.rooms.pop_front()
        } else {
            None
        };
        if let Some(room) = &evicted {
            self.replayed.remove(room);
        }
        self.rooms.push_back(group_id.to_string());
        evicted
    }

    /// Unsubscribe from a room. Returns whether it was subscribed.
    pub fn leave(&mut self, group_id: &str) -> bool {
        self.replayed.remove(group_id);
        let before = self.rooms.len();
        self.rooms.retain(|room| room != group_id);
        self.rooms.len() != before
    }

    /// Remember the message ids sent in a room's history replay.
    pub fn mark_replayed<I>(&mut self, group_id: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.replayed
            .insert(group_id.to_string(), ids.into_iter().collect());
    }

    /// Whether a room event should be forwarded to this connection.
    ///
    /// A replayed message is skipped once, when its broadcast catches up.
    pub fn accepts(&mut self, event: &RoomEvent) -> bool {
        if !self.is_subscribed(&event.group_id) {
            return false;
        }

        match self.replayed.get_mut(&event.group_id) {
            Some(ids) => !ids.remove(&event.message.id),
            None => true,
        }
    }

    #[must_use]
    pub fn is_subscribed(&self, group_id: &str) -> bool {
        self.rooms.iter().any(|room| room == group_id)
    }

    #[must_use]
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(String::as_str)
    }
}

/// WebSocket handler for group chat.
pub async fn chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("New chat connection");

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            error!(error = %e, "Failed to serialize chat event");
            Ok(())
        }
    }
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut room_rx = state.chat.subscribe();
    let mut session = state.chat.session();

    loop {
        tokio::select! {
            // Frames from the client
            msg = receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Some(reply) = handle_client_event(&state, &mut session, &text).await
                            && send_event(&mut sender, &reply).await.is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Client closed chat connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Messages published into any room
            event = room_rx.recv() => {
                match event {
                    Ok(event) => {
                        if session.accepts(&event)
                            && send_event(&mut sender, &ServerEvent::GroupChatMessage(event.message))
                                .await
                                .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Chat connection lagged behind room events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(rooms = session.rooms().count(), "Chat connection closed");
}

/// Handle one client frame. Returns the reply for the caller, if any.
///
/// Failures are reported to the caller as `chatError`; the connection stays open.
pub async fn handle_client_event(
    state: &AppState,
    session: &mut ChatSession,
    text: &str,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "Unrecognized chat frame");
            return Some(ServerEvent::ChatError("Unrecognized chat event.".to_string()));
        }
    };

    match event {
        ClientEvent::JoinGroupChat(group_id) => {
            let group_id = group_id.trim();
            if group_id.is_empty() {
                return Some(ServerEvent::ChatError("Group ID is required.".to_string()));
            }

            if let Some(evicted) = session.join(group_id) {
                debug!(group_id = %evicted, "Room evicted from chat session");
            }
            debug!(group_id = %group_id, "Joined chat room");

            match state.chat_service.history(group_id).await {
                Ok(messages) => {
                    session.mark_replayed(group_id, messages.iter().map(|m| m.id.clone()));
                    Some(ServerEvent::ChatHistory(
                        messages.iter().map(ChatMessagePayload::from).collect(),
                    ))
                }
                Err(e) => {
                    error!(error = %e, group_id = %group_id, "Failed to load chat history");
                    Some(ServerEvent::ChatError(
                        "Failed to load chat history.".to_string(),
                    ))
                }
            }
        }
        ClientEvent::LeaveGroupChat(group_id) => {
            if session.leave(group_id.trim()) {
                debug!(group_id = %group_id, "Left chat room");
            }
            None
        }
        ClientEvent::ChatMessage(input) => match state.chat_service.post(input).await {
            Ok(_) => None,
            Err(e) => {
                error!(error = %e, "Failed to save or broadcast chat message");
                Some(ServerEvent::ChatError("Failed to send message.".to_string()))
            }
        },
    }
}
