//! The room registry: creates sessions on demand and evicts idle ones.

use std::collections::HashMap;
use std::sync::Arc;

use quizcast_bank::QuestionBank;
use quizcast_protocol::RoomId;
use tracing::{debug, info};

use crate::config::QuizConfig;
use crate::error::RoomError;
use crate::session::{self, RoomHandle};

/// Tracks every live room session, keyed by room name.
///
/// Rooms are created lazily on first join and torn down by the idle
/// sweep once they have been empty for [`QuizConfig::idle_timeout`].
/// Every room shares the same question bank.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    bank: Arc<QuestionBank>,
    config: QuizConfig,
}

impl RoomRegistry {
    pub fn new(bank: Arc<QuestionBank>, config: QuizConfig) -> Self {
        Self { rooms: HashMap::new(), bank, config }
    }

    /// Returns the handle for `room_id`, spawning a fresh session if the
    /// room does not exist yet.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room_id) {
            return handle.clone();
        }
        info!(room = %room_id, "creating room");
        let handle = session::spawn_session(
            room_id.clone(),
            Arc::clone(&self.bank),
            self.config,
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        handle
    }

    /// The handle for `room_id`, if the room exists.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).cloned()
    }

    /// Removes a room and stops its session task.
    pub async fn destroy_room(&mut self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        info!(room = %room_id, "destroying room");
        handle.shutdown().await
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// The names of all live rooms, in no particular order.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    /// Evicts rooms that are empty and have been idle past the
    /// configured timeout. Returns how many were evicted.
    ///
    /// Rooms whose session task has died are evicted unconditionally.
    pub async fn sweep_idle(&mut self) -> usize {
        let mut stale = Vec::new();
        for (room_id, handle) in &self.rooms {
            match handle.info().await {
                Ok(info) => {
                    if info.player_count == 0
                        && info.idle_for >= self.config.idle_timeout
                    {
                        stale.push(room_id.clone());
                    }
                }
                Err(_) => stale.push(room_id.clone()),
            }
        }

        for room_id in &stale {
            info!(room = %room_id, "evicting idle room");
            if let Some(handle) = self.rooms.remove(room_id) {
                let _ = handle.shutdown().await;
            }
        }

        if !stale.is_empty() {
            debug!(evicted = stale.len(), remaining = self.rooms.len(), "idle sweep done");
        }
        stale.len()
    }
}
