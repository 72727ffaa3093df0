use fruitfall_shared::config::PlayfieldConfig;
use fruitfall_shared::protocol::{Appearance, CollectibleWire, FruitKind, Point};
use rand::Rng;

use crate::config::VisualScheme;

/// Cosmetic variant of a collectible. Has no effect on gameplay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectibleKind {
    Fruit(FruitKind),
    /// Hue in degrees, `[0, 360)`
    Star { hue: u16 },
}

impl CollectibleKind {
    pub fn random(scheme: VisualScheme, rng: &mut impl Rng) -> Self {
        match scheme {
            VisualScheme::Fruits => {
                CollectibleKind::Fruit(FruitKind::ALL[rng.gen_range(0..FruitKind::ALL.len())])
            }
            VisualScheme::Stars => CollectibleKind::Star {
                hue: rng.gen_range(0..360),
            },
        }
    }

    pub fn appearance(&self) -> Appearance {
        match *self {
            CollectibleKind::Fruit(fruit) => Appearance::Fruit { fruit },
            CollectibleKind::Star { hue } => Appearance::Star {
                color: format!("hsl({}, 100%, 50%)", hue),
            },
        }
    }
}

/// A falling pickup. `id` survives respawns so clients can track it.
#[derive(Debug, Clone)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub pos: Point,
    /// Units per tick, fixed at spawn
    pub speed: f64,
    pub radius: f64,
}

impl Collectible {
    /// Create at the top of the playfield with a random column and speed.
    pub fn spawn(
        id: u32,
        playfield: &PlayfieldConfig,
        scheme: VisualScheme,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            id,
            kind: CollectibleKind::random(scheme, rng),
            pos: Point::new(rng.gen_range(0.0..playfield.width), 0.0),
            speed: rng.gen_range(playfield.min_speed..playfield.max_speed),
            radius: playfield.collectible_radius,
        }
    }

    pub fn advance(&mut self) {
        self.pos.y += self.speed;
    }

    pub fn is_below(&self, height: f64) -> bool {
        self.pos.y > height
    }

    /// Back to the top with a fresh column. Identity, kind and speed are kept.
    pub fn respawn(&mut self, width: f64, rng: &mut impl Rng) {
        self.pos = Point::new(rng.gen_range(0.0..width), 0.0);
    }

    pub fn within(&self, point: Point, margin: f64) -> bool {
        self.pos.distance(point) < self.radius + margin
    }

    pub fn to_wire(&self) -> CollectibleWire {
        CollectibleWire {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            speed: self.speed,
            radius: self.radius,
            appearance: self.kind.appearance(),
        }
    }
}
