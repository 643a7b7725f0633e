use glam::Vec2;

use super::{CLIMB_SPEED, GRAVITY, MAX_STEP_HEIGHT};
use crate::world::{Map, SectorId};

/// Vertical state after one tic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallResult {
    pub z: f32,
    pub zvel: f32,
}

/// Highest floor under the circle that is still within a step of `z`.
///
/// Walks every sector the circle overlaps. Falls back to the home sector's
/// floor when nothing qualifies (the actor sank through it), so the climb
/// below always has somewhere to go.
pub fn support_height(map: &Map, sector: SectorId, pos: Vec2, z: f32, radius: f32) -> f32 {
    let mut visitor = map.visitor(sector);
    let mut target: Option<f32> = None;

    while let Some(s) = visitor.pop() {
        let floor = map.sector(s).floor_h;
        if floor < z + MAX_STEP_HEIGHT && target.is_none_or(|t| floor > t) {
            target = Some(floor);
        }
        for w in map.walls_of(s) {
            if let Some(n) = w.portal.neighbor() {
                if visitor.can_push(n) && map.sector_contains_circle(n, pos, radius) {
                    visitor.push(n);
                }
            }
        }
    }
    target.unwrap_or(map.sector(sector).floor_h)
}

/// Integrate `zvel`, then either land (climbing at most `CLIMB_SPEED` per
/// tic towards the supporting floor) or keep accelerating downwards.
pub fn fall(map: &Map, sector: SectorId, pos: Vec2, z: f32, zvel: f32, radius: f32) -> FallResult {
    let z = z + zvel;
    let target = support_height(map, sector, pos, z, radius);

    if z <= target {
        FallResult {
            z: (z + CLIMB_SPEED).min(target),
            zvel: 0.0,
        }
    } else {
        FallResult {
            z,
            zvel: zvel + GRAVITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::OBJECT_RADIUS;
    use crate::world::samples;
    use glam::vec2;

    #[test]
    fn resting_actor_stays_put() {
        let map = samples::square(64.0).unwrap();
        let r = fall(&map, 0, vec2(32.0, 32.0), 0.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: 0.0, zvel: 0.0 });
    }

    #[test]
    fn airborne_actor_accelerates_down() {
        let map = samples::square(64.0).unwrap();
        let r = fall(&map, 0, vec2(32.0, 32.0), 40.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: 40.0, zvel: GRAVITY });
        let r = fall(&map, 0, vec2(32.0, 32.0), r.z, r.zvel, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: 39.0, zvel: 2.0 * GRAVITY });
    }

    #[test]
    fn landing_never_overshoots_floor() {
        let map = samples::square(64.0).unwrap();
        let r = fall(&map, 0, vec2(32.0, 32.0), 3.0, -5.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: 0.0, zvel: 0.0 });
    }

    #[test]
    fn overlapping_step_is_climbed_gradually() {
        // east room floor 16; circle reaches across x = 64
        let map = samples::two_rooms(16.0).unwrap();
        let pos = vec2(56.0, 32.0);
        let r = fall(&map, 0, pos, 0.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: CLIMB_SPEED, zvel: 0.0 });
        let r = fall(&map, 0, pos, r.z, r.zvel, OBJECT_RADIUS);
        assert_eq!(r.z, 12.0);
        let r = fall(&map, 0, pos, r.z, r.zvel, OBJECT_RADIUS);
        assert_eq!(r.z, 16.0);
    }

    #[test]
    fn ledge_too_high_is_ignored() {
        let map = samples::two_rooms(32.0).unwrap();
        let r = fall(&map, 0, vec2(56.0, 32.0), 0.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: 0.0, zvel: 0.0 });
    }

    #[test]
    fn far_step_does_not_lift() {
        let map = samples::two_rooms(16.0).unwrap();
        let r = fall(&map, 0, vec2(20.0, 32.0), 0.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r.z, 0.0);
    }

    #[test]
    fn sunk_actor_climbs_back_to_own_floor() {
        let map = samples::two_rooms(16.0).unwrap();
        // deep below sector 1's floor: no floor is within a step
        let r = fall(&map, 1, vec2(96.0, 32.0), -40.0, 0.0, OBJECT_RADIUS);
        assert_eq!(r, FallResult { z: -34.0, zvel: 0.0 });
    }
}
