//! Fruitfall server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod app;
pub mod collectible;
pub mod collision;
pub mod config;
pub mod game_loop;
pub mod player;
pub mod registry;
pub mod simulation;
pub mod state;
pub mod ws;
