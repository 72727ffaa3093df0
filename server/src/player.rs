use fruitfall_shared::protocol::{PlayerWire, Point};

/// Gameplay entity bound to one session
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Last reported mouth position in canvas coordinates
    pub position: Point,
    pub score: u32,
}

impl Player {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            position: Point::ORIGIN,
            score: 0,
        }
    }

    pub fn set_name(&mut self, name: &str, max_len: usize) {
        self.name = truncate_name(name, max_len);
    }

    /// Add `points` and return the new score. Never decreases.
    pub fn award(&mut self, points: u32) -> u32 {
        self.score = self.score.saturating_add(points);
        self.score
    }

    pub fn to_wire(&self) -> PlayerWire {
        PlayerWire {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            score: self.score,
        }
    }
}

/// Keep at most `max_len` characters.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}
