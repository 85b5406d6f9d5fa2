//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered store events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::{StoreEvent, StoreEventKind};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<StoreEvent>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &state).await;
                        if let Ok(json) = serde_json::to_string(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(store_event) => {
                        if !subs.matches(store_event.kind()) {
                            continue;
                        }
                        let Some(json) = event_message(&store_event) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn event_message(event: &StoreEvent) -> Option<String> {
    let payload = serde_json::to_value(event).ok()?;
    let msg = WsMessage::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload);
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client and builds the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    state: &AppState,
) -> WsMessage {
    let (id, command) = match parse_command(text) {
        Ok(parsed) => parsed,
        Err(reply) => return reply,
    };

    match command {
        WsCommand::Subscribe { kinds } => {
            let (kinds, wildcard, unknown) = parse_kinds(&kinds);
            subs.subscribe(&kinds, wildcard);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": kinds,
                    "unknown": unknown,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { kinds } => {
            let (kinds, wildcard, unknown) = parse_kinds(&kinds);
            subs.unsubscribe(&kinds, wildcard);
            WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": kinds,
                    "unknown": unknown,
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::Status => match state.attendee_service.store().attendee_count().await {
            Ok(attendees) => WsMessage::new(
                id,
                WsMessageType::Response,
                serde_json::json!({
                    "syncing": state.sync_service.is_syncing(),
                    "attendees": attendees,
                }),
            ),
            Err(e) => WsMessage::error(id, 500, &e.to_string()),
        },
    }
}

/// Splits a client message into its id and command, or the error reply.
fn parse_command(text: &str) -> Result<(String, WsCommand), WsMessage> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return Err(WsMessage::error(String::new(), 400, "malformed JSON"));
    };
    if msg.msg_type != WsMessageType::Command {
        return Err(WsMessage::error(msg.id, 400, "expected a command message"));
    }
    match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => Ok((msg.id, command)),
        Err(_) => Err(WsMessage::error(msg.id, 404, "unknown command")),
    }
}

/// Resolves kind names; `"*"` sets the wildcard and unknown names are
/// returned separately.
fn parse_kinds(names: &[String]) -> (Vec<StoreEventKind>, bool, Vec<String>) {
    let mut kinds = Vec::new();
    let mut wildcard = false;
    let mut unknown = Vec::new();
    for name in names {
        if name == "*" {
            wildcard = true;
            continue;
        }
        match serde_json::from_value::<StoreEventKind>(serde_json::Value::String(name.clone())) {
            Ok(kind) => kinds.push(kind),
            Err(_) => unknown.push(name.clone()),
        }
    }
    (kinds, wildcard, unknown)
}
