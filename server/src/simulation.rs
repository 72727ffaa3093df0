//! The collectible pool and its per-tick advancement.
//!
//! The pool is created once with a fixed size and never grows or shrinks.
//! Collectibles that fall past the bottom edge respawn at the top under the
//! same id.

use fruitfall_shared::config::PlayfieldConfig;
use fruitfall_shared::protocol::CollectibleWire;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::collectible::Collectible;
use crate::config::VisualScheme;

pub struct CollectiblePool {
    items: Vec<Collectible>,
    width: f64,
    height: f64,
    rng: ChaCha8Rng,
}

impl CollectiblePool {
    pub fn new(playfield: &PlayfieldConfig, scheme: VisualScheme, rng_seed: Option<u64>) -> Self {
        let mut rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let items = (0..playfield.pool_size)
            .map(|i| Collectible::spawn(i as u32 + 1, playfield, scheme, &mut rng))
            .collect();

        Self {
            items,
            width: playfield.width,
            height: playfield.height,
            rng,
        }
    }

    /// Advance every collectible by one tick. Returns the ids that fell off
    /// the bottom and were respawned.
    pub fn tick(&mut self) -> Vec<u32> {
        let mut missed = Vec::new();
        for item in &mut self.items {
            item.advance();
            if item.is_below(self.height) {
                item.respawn(self.width, &mut self.rng);
                missed.push(item.id);
            }
        }
        missed
    }

    /// Respawn the collectible at `index`, e.g. after it was caught.
    pub fn respawn(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.respawn(self.width, &mut self.rng);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collectible> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Collectible> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Collectible> {
        self.items.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn wire(&self) -> Vec<CollectibleWire> {
        self.items.iter().map(Collectible::to_wire).collect()
    }
}
