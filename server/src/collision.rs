//! Proximity scoring, driven by position reports rather than the tick.
//!
//! Only the first collectible in pool order within capture range is awarded,
//! even when several overlap the reported point.

use fruitfall_shared::protocol::{FruitCaughtMsg, Point};

use crate::registry::SessionRegistry;
use crate::simulation::CollectiblePool;

/// A successful catch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent {
    pub player_id: u32,
    pub collectible_id: u32,
    pub new_score: u32,
}

impl CaptureEvent {
    pub fn to_msg(&self) -> FruitCaughtMsg {
        FruitCaughtMsg {
            player_id: self.player_id,
            new_score: self.new_score,
            collectible_id: self.collectible_id,
        }
    }
}

/// Index of the first collectible whose capture radius contains `point`.
pub fn first_capture(pool: &CollectiblePool, point: Point, margin: f64) -> Option<usize> {
    pool.iter().position(|c| c.within(point, margin))
}

/// Test the player's stored position against the pool. On a hit, award
/// `reward` and respawn the collectible before returning.
pub fn resolve_capture(
    registry: &mut SessionRegistry,
    pool: &mut CollectiblePool,
    player_id: u32,
    margin: f64,
    reward: u32,
) -> Option<CaptureEvent> {
    let player = registry.get_mut(player_id)?;
    let index = first_capture(pool, player.position, margin)?;
    let collectible_id = pool.get(index)?.id;

    let new_score = player.award(reward);
    pool.respawn(index);

    Some(CaptureEvent {
        player_id,
        collectible_id,
        new_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualScheme;
    use fruitfall_shared::config::PlayfieldConfig;

    fn setup() -> (SessionRegistry, CollectiblePool) {
        let playfield = PlayfieldConfig::default();
        let mut pool = CollectiblePool::new(&playfield, VisualScheme::Fruits, Some(1));
        // Park every collectible at a known spot, far apart.
        for i in 0..pool.len() {
            pool.get_mut(i).unwrap().pos = Point::new(40.0 + i as f64 * 80.0, 200.0);
        }
        let mut registry = SessionRegistry::new(playfield.max_name_len);
        registry.on_connect(1);
        registry.on_connect(2);
        (registry, pool)
    }

    #[test]
    fn hit_awards_reward_and_respawns() {
        let (mut registry, mut pool) = setup();
        let target = pool.get(2).unwrap().clone();
        registry.record_position(1, Point::new(target.pos.x + 5.0, target.pos.y - 5.0));

        let event = resolve_capture(&mut registry, &mut pool, 1, 30.0, 10).unwrap();
        assert_eq!(event.player_id, 1);
        assert_eq!(event.collectible_id, target.id);
        assert_eq!(event.new_score, 10);
        assert_eq!(registry.get(1).unwrap().score, 10);

        let moved = pool.get(2).unwrap();
        assert_eq!(moved.id, target.id);
        assert_eq!(moved.pos.y, 0.0);
    }

    #[test]
    fn miss_changes_nothing() {
        let (mut registry, mut pool) = setup();
        registry.record_position(1, Point::new(300.0, 400.0));
        assert!(resolve_capture(&mut registry, &mut pool, 1, 30.0, 10).is_none());
        assert_eq!(registry.get(1).unwrap().score, 0);
        assert!(pool.iter().all(|c| c.pos.y == 200.0));
    }

    #[test]
    fn unknown_player_never_scores() {
        let (mut registry, mut pool) = setup();
        assert!(resolve_capture(&mut registry, &mut pool, 77, 30.0, 10).is_none());
    }

    #[test]
    fn first_match_wins_when_overlapping() {
        let (mut registry, mut pool) = setup();
        pool.get_mut(4).unwrap().pos = Point::new(100.0, 100.0);
        pool.get_mut(6).unwrap().pos = Point::new(105.0, 100.0);
        let id4 = pool.get(4).unwrap().id;
        registry.record_position(1, Point::new(102.0, 100.0));

        let event = resolve_capture(&mut registry, &mut pool, 1, 30.0, 10).unwrap();
        assert_eq!(event.collectible_id, id4);
        assert_eq!(event.new_score, 10);
        // The other one is still there.
        assert_eq!(pool.get(6).unwrap().pos, Point::new(105.0, 100.0));
    }

    #[test]
    fn repeated_reports_do_not_double_award() {
        let (mut registry, mut pool) = setup();
        let target = pool.get(0).unwrap().pos;
        registry.record_position(1, target);

        let first = resolve_capture(&mut registry, &mut pool, 1, 30.0, 10);
        assert!(first.is_some());
        // Respawned to y = 0, 200 units away from the mouth.
        let again = resolve_capture(&mut registry, &mut pool, 1, 30.0, 10);
        assert!(again.is_none());
        assert_eq!(registry.get(1).unwrap().score, 10);
    }

    #[test]
    fn first_capture_respects_margin() {
        let (_, pool) = setup();
        let c = pool.get(1).unwrap().pos;
        assert_eq!(first_capture(&pool, Point::new(c.x + 39.0, c.y), 30.0), Some(1));
        assert_eq!(first_capture(&pool, Point::new(c.x + 39.0, c.y), 0.0), None);
    }
}
