//! WebSocket stream channel for robot clients
//!
//! Each connection moves through `Connecting → Open → Closed`. While open it
//! is registered in the [`ClientRegistry`] and a writer task drains its
//! outbound queue into the socket. Frames are JSON objects dispatched on their
//! `type` field; a frame that is not JSON closes the connection.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use super::ApiState;
use crate::expression::Expression;
use crate::orchestrator::ChatOrchestrator;
use crate::{Error, Result};

/// Outbound queue depth per client
const CLIENT_QUEUE: usize = 32;

/// Incoming frame from a client
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncoming {
    /// Talk to the robot
    Chat {
        #[serde(default)]
        text: String,
    },
    /// Keepalive
    Ping,
    /// Any other type (ignored)
    #[serde(other)]
    Unknown,
}

/// Outgoing frame to a client
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    /// Reply to a chat frame
    Response { text: String, expression: Expression },
    /// Keepalive reply
    Pong,
}

/// Result of a broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Clients the message was queued for
    pub delivered: Vec<Uuid>,
    /// Clients whose queue rejected the message
    pub failed: Vec<(Uuid, Error)>,
}

/// Connected clients keyed by connection id
#[derive(Clone, Default)]
pub struct ClientRegistry {
    senders: Arc<RwLock<HashMap<Uuid, mpsc::Sender<WsOutgoing>>>>,
}

impl ClientRegistry {
    /// Register a connection's outbound queue
    pub async fn register(&self, id: Uuid, sender: mpsc::Sender<WsOutgoing>) {
        self.senders.write().await.insert(id, sender);
        tracing::debug!(client_id = %id, "client registered");
    }

    /// Remove a connection
    pub async fn deregister(&self, id: Uuid) -> bool {
        let removed = self.senders.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(client_id = %id, "client deregistered");
        }
        removed
    }

    /// Number of connected clients
    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Queue `message` for every connected client
    ///
    /// Failures are reported per client and never stop delivery to the rest.
    /// Failed clients stay registered; their own session removes them when
    /// its socket closes.
    pub async fn broadcast(&self, message: &WsOutgoing) -> BroadcastReport {
        let targets: Vec<(Uuid, mpsc::Sender<WsOutgoing>)> = self
            .senders
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (id, tx) in targets {
            match tx.try_send(message.clone()) {
                Ok(()) => report.delivered.push(id),
                Err(e) => {
                    tracing::warn!(client_id = %id, error = %e, "broadcast delivery failed");
                    report
                        .failed
                        .push((id, Error::Channel(format!("client {id}: {e}"))));
                }
            }
        }

        tracing::debug!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "broadcast complete"
        );
        report
    }
}

/// Build WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ws", get(ws_upgrade)).with_state(state)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one client session until either direction closes
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let client_id = Uuid::new_v4();
    let (mut sender, receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<WsOutgoing>(CLIENT_QUEUE);
    state.clients.register(client_id, tx.clone()).await;
    tracing::info!(client_id = %client_id, "WebSocket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode outgoing frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = Arc::clone(&state);
    let mut recv_task = tokio::spawn(async move {
        receive_frames(receiver, tx, recv_state.pipeline.orchestrator(), client_id).await;
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.clients.deregister(client_id).await;
    tracing::info!(client_id = %client_id, "WebSocket disconnected");
}

/// Read frames until the client goes away
///
/// The socket keeps being read while a chat is in flight. If the client
/// closes meanwhile the chat future is dropped before it commits, which
/// releases the conversation lock and leaves the history untouched. Frames
/// arriving during a chat are answered in order once it finishes.
async fn receive_frames(
    mut receiver: SplitStream<WebSocket>,
    tx: mpsc::Sender<WsOutgoing>,
    orchestrator: &ChatOrchestrator,
    client_id: Uuid,
) {
    let mut pending: VecDeque<Message> = VecDeque::new();

    loop {
        let frame = match pending.pop_front() {
            Some(frame) => frame,
            None => match receiver.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    tracing::debug!(client_id = %client_id, error = %e, "receive failed");
                    return;
                }
                None => return,
            },
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => {
                tracing::info!(client_id = %client_id, "WebSocket closed by client");
                return;
            }
            _ => continue,
        };

        let work = handle_frame(&text, orchestrator);
        tokio::pin!(work);
        let outcome = loop {
            tokio::select! {
                outcome = &mut work => break Some(outcome),
                next = receiver.next() => match next {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break None,
                    Some(Ok(frame)) if pending.len() < CLIENT_QUEUE => pending.push_back(frame),
                    Some(Ok(_)) => {
                        tracing::warn!(client_id = %client_id, "too many frames queued behind a chat");
                        break None;
                    }
                },
            }
        };

        match outcome {
            Some(Ok(Some(reply))) => {
                if tx.send(reply).await.is_err() {
                    return;
                }
            }
            Some(Ok(None)) => {}
            Some(Err(e)) => {
                tracing::warn!(client_id = %client_id, error = %e, "closing connection");
                return;
            }
            None => {
                tracing::info!(client_id = %client_id, "client left mid-request, chat abandoned");
                return;
            }
        }
    }
}

/// Decode and answer a single text frame
///
/// Returns `Ok(None)` for frames that need no reply.
///
/// # Errors
///
/// Returns [`Error::Channel`] for frames that are not JSON, or whose known
/// `type` carries malformed fields
pub async fn handle_frame(text: &str, orchestrator: &ChatOrchestrator) -> Result<Option<WsOutgoing>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::Channel(format!("invalid frame: {e}")))?;

    if value.get("type").is_none() {
        tracing::trace!("ignoring frame without type");
        return Ok(None);
    }

    let incoming: WsIncoming = serde_json::from_value(value)
        .map_err(|e| Error::Channel(format!("invalid frame: {e}")))?;

    match incoming {
        WsIncoming::Ping => Ok(Some(WsOutgoing::Pong)),
        WsIncoming::Chat { text } => {
            let reply = orchestrator.converse(&text).await;
            Ok(Some(WsOutgoing::Response {
                text: reply.text,
                expression: reply.expression,
            }))
        }
        WsIncoming::Unknown => Ok(None),
    }
}
