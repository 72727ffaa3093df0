//! Wire protocol and playfield configuration shared by the fruitfall server
//! and its browser client.

pub mod config;
pub mod protocol;
