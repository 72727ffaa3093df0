use fruitfall_shared::config::PlayfieldConfig;
use fruitfall_shared::protocol::{GameInitMsg, GameStateMsg, Point, PROTOCOL_VERSION};

use crate::collision::{resolve_capture, CaptureEvent};
use crate::config::ServerConfig;
use crate::registry::SessionRegistry;
use crate::simulation::CollectiblePool;

/// Central game state owned by the game loop task.
pub struct GameState {
    pub registry: SessionRegistry,
    pub pool: CollectiblePool,
    pub playfield: PlayfieldConfig,
    next_session_id: u32,
}

impl GameState {
    pub fn new(server_config: &ServerConfig) -> Self {
        let playfield = server_config.playfield;
        Self {
            registry: SessionRegistry::new(playfield.max_name_len),
            pool: CollectiblePool::new(
                &playfield,
                server_config.visual_scheme,
                server_config.rng_seed,
            ),
            playfield,
            next_session_id: 1,
        }
    }

    /// Register a new session and build its init snapshot.
    pub fn player_join(&mut self) -> (u32, GameInitMsg) {
        let id = self.allocate_session_id();
        self.registry.on_connect(id);

        let init = GameInitMsg {
            protocol_version: PROTOCOL_VERSION,
            player_id: id,
            players: self.registry.wire(),
            collectibles: self.pool.wire(),
            playfield: self.playfield,
        };
        (id, init)
    }

    /// Next free session id. Wraps past `u32::MAX`, skipping 0 and live ids.
    fn allocate_session_id(&mut self) -> u32 {
        loop {
            let id = self.next_session_id;
            self.next_session_id = self.next_session_id.wrapping_add(1);
            if id != 0 && !self.registry.contains(id) {
                return id;
            }
        }
    }

    /// Returns true if the player was present.
    pub fn player_leave(&mut self, id: u32) -> bool {
        self.registry.on_disconnect(id)
    }

    /// Record a reported position and check it for a catch.
    pub fn player_move(&mut self, id: u32, position: Point) -> Option<CaptureEvent> {
        if !self.registry.record_position(id, position) {
            return None;
        }
        resolve_capture(
            &mut self.registry,
            &mut self.pool,
            id,
            self.playfield.capture_margin,
            self.playfield.reward,
        )
    }

    pub fn set_name(&mut self, id: u32, name: &str) -> bool {
        self.registry.update_name(id, name)
    }

    /// Advance the simulation by one tick. Returns ids of missed collectibles.
    pub fn tick(&mut self) -> Vec<u32> {
        self.pool.tick()
    }

    /// Full snapshot for broadcasting
    pub fn game_state(&self) -> GameStateMsg {
        GameStateMsg {
            players: self.registry.wire(),
            collectibles: self.pool.wire(),
        }
    }
}
