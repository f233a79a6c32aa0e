//! Per-connection handler: decodes client events and routes them to
//! room sessions.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The loop multiplexes two directions: frames arriving from
//! the socket become room commands, and events emitted by room sessions
//! are encoded back onto the socket.
//!
//! The handler records every `(room, player)` pair this connection
//! joined under. On disconnect that record drives the cleanup, so the
//! right players are removed from the right rooms no matter how the
//! socket died.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use quizcast_protocol::{ClientEvent, Codec, RoomId};
use quizcast_room::EventSender;
use quizcast_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError>
where
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Room sessions push events for this connection onto this channel;
    // the select loop below drains it onto the socket.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    // Which rooms this connection joined, and under which display names.
    // A set per room: one socket may join the same room under several
    // names, and disconnect must remove every one of them.
    let mut joined: HashMap<RoomId, HashSet<String>> = HashMap::new();

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                match incoming {
                    Ok(Some(data)) => {
                        let event: ClientEvent = match state.codec.decode(&data) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::debug!(
                                    %conn_id, error = %e,
                                    "ignoring undecodable frame"
                                );
                                continue;
                            }
                        };
                        if let Err(e) = event.validate() {
                            tracing::debug!(
                                %conn_id, error = %e,
                                "ignoring invalid event"
                            );
                            continue;
                        }
                        dispatch(&state, &event_tx, &mut joined, event).await;
                    }
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                }
            }
            Some(event) = event_rx.recv() => {
                let bytes = state.codec.encode(&event)?;
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, error = %e, "send failed");
                    break;
                }
            }
        }
    }

    // Remove this connection's players from every room it joined.
    for (room, players) in joined {
        let handle = state.registry.lock().await.get(&room);
        let Some(handle) = handle else { continue };
        for player in players {
            if let Err(e) = handle.leave(player).await {
                tracing::debug!(%conn_id, room = %room, error = %e, "leave failed");
            }
        }
    }

    Ok(())
}

/// Routes one client event to its room session.
///
/// Only `join_room` may create a room; every other event on a room that
/// does not exist is dropped.
async fn dispatch<C: Codec>(
    state: &Arc<ServerState<C>>,
    event_tx: &EventSender,
    joined: &mut HashMap<RoomId, HashSet<String>>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom { room, player } => {
            let handle = state.registry.lock().await.get_or_create(&room);
            match handle.join(player.clone(), event_tx.clone()).await {
                Ok(()) => {
                    joined.entry(room).or_default().insert(player);
                }
                Err(e) => {
                    tracing::debug!(room = %room, error = %e, "join failed");
                }
            }
        }
        ClientEvent::PlayerReady { room, player } => {
            let Some(handle) = state.registry.lock().await.get(&room) else {
                tracing::debug!(room = %room, "ready for unknown room ignored");
                return;
            };
            if let Err(e) = handle.ready(player).await {
                tracing::debug!(room = %room, error = %e, "ready failed");
            }
        }
        ClientEvent::StartQuiz { room } => {
            let Some(handle) = state.registry.lock().await.get(&room) else {
                tracing::debug!(room = %room, "start for unknown room ignored");
                return;
            };
            if let Err(e) = handle.start().await {
                tracing::debug!(room = %room, error = %e, "start failed");
            }
        }
        ClientEvent::Answer { room, player, answer } => {
            let Some(handle) = state.registry.lock().await.get(&room) else {
                tracing::debug!(room = %room, "answer for unknown room ignored");
                return;
            };
            if let Err(e) = handle.answer(player, answer).await {
                tracing::debug!(room = %room, error = %e, "answer failed");
            }
        }
    }
}
