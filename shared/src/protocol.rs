use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::PlayfieldConfig;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    GameInit(GameInitMsg),
    GameState(GameStateMsg),
    PlayerDisconnected(u32),
    FruitCaught(FruitCaughtMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameInitMsg {
    pub protocol_version: u32,
    pub player_id: u32,
    pub players: Vec<PlayerWire>,
    pub collectibles: Vec<CollectibleWire>,
    pub playfield: PlayfieldConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct GameStateMsg {
    pub players: Vec<PlayerWire>,
    pub collectibles: Vec<CollectibleWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(rename_all = "camelCase")]
pub struct FruitCaughtMsg {
    pub player_id: u32,
    pub new_score: u32,
    pub collectible_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct PlayerWire {
    pub id: u32,
    pub name: String,
    pub position: Point,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct CollectibleWire {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub radius: f64,
    pub appearance: Appearance,
}

/// How a collectible is drawn. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Appearance {
    Fruit { fruit: FruitKind },
    /// CSS color string, e.g. `hsl(210, 100%, 50%)`
    Star { color: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(rename_all = "lowercase")]
pub enum FruitKind {
    Apple,
    Blueberry,
    Lemon,
    Orange,
    Raspberry,
    Strawberry,
}

impl FruitKind {
    pub const ALL: [FruitKind; 6] = [
        FruitKind::Apple,
        FruitKind::Blueberry,
        FruitKind::Lemon,
        FruitKind::Orange,
        FruitKind::Raspberry,
        FruitKind::Strawberry,
    ];
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Latest mouth position
    PlayerMove(Point),
    StartGame(StartGameMsg),
    UpdateName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(rename_all = "camelCase")]
pub struct StartGameMsg {
    /// Echoed by clients but never trusted; the name binds to the sending session.
    #[serde(default)]
    #[ts(type = "unknown")]
    pub player_id: Option<serde_json::Value>,
    pub player_name: String,
}
