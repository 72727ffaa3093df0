use std::collections::BTreeMap;

use fruitfall_shared::protocol::{PlayerWire, Point};

use crate::player::Player;

/// Players keyed by session id. Membership mirrors live connections.
pub struct SessionRegistry {
    players: BTreeMap<u32, Player>,
    max_name_len: usize,
}

impl SessionRegistry {
    pub fn new(max_name_len: usize) -> Self {
        Self {
            players: BTreeMap::new(),
            max_name_len,
        }
    }

    /// Register a session. Calling twice with the same id returns the
    /// existing player unchanged.
    pub fn on_connect(&mut self, session_id: u32) -> Player {
        let name = format!("Player {}", self.players.len() + 1);
        self.players
            .entry(session_id)
            .or_insert_with(|| Player::new(session_id, name))
            .clone()
    }

    /// Remove a session. Returns whether it was present.
    pub fn on_disconnect(&mut self, session_id: u32) -> bool {
        self.players.remove(&session_id).is_some()
    }

    /// Set the display name, truncated. Returns false for unknown sessions.
    pub fn update_name(&mut self, session_id: u32, name: &str) -> bool {
        match self.players.get_mut(&session_id) {
            Some(player) => {
                player.set_name(name, self.max_name_len);
                true
            }
            None => false,
        }
    }

    /// Store a reported position. Non-finite input and unknown sessions are ignored.
    pub fn record_position(&mut self, session_id: u32, position: Point) -> bool {
        if !position.is_finite() {
            return false;
        }
        match self.players.get_mut(&session_id) {
            Some(player) => {
                player.position = position;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, session_id: u32) -> Option<&Player> {
        self.players.get(&session_id)
    }

    pub fn get_mut(&mut self, session_id: u32) -> Option<&mut Player> {
        self.players.get_mut(&session_id)
    }

    pub fn contains(&self, session_id: u32) -> bool {
        self.players.contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn wire(&self) -> Vec<PlayerWire> {
        self.players.values().map(Player::to_wire).collect()
    }
}
