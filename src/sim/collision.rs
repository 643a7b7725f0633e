//! Swept-circle move-and-slide against sector walls.
//!
//! Walls are found by a breadth-first walk from the actor's sector. Only
//! sectors whose bounds overlap the swept box are entered, and a portal wall
//! counts as blocking only when the opening behind it is too short for the
//! actor or its floor is a step too high.

use glam::Vec2;

use super::{MAX_STEP_HEIGHT, OBJECT_HEIGHT};
use crate::world::{Aabb, Map, SectorId, Wall, WallId};

/// Retry budget for one move; each retry follows one wall hit.
pub const MAX_SLIDE_ITERATIONS: usize = 5;
/// Squared velocity below which an actor is considered at rest.
pub const MIN_VELOCITY_SQ: f32 = 0.001;
/// Parameters this far before the start still count as a hit.
const HIT_SLOP: f32 = 0.01;

/// What the caller gets back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    pub pos: Vec2,
    /// Velocity after sliding, zeroed when it fell below `MIN_VELOCITY_SQ`.
    pub vel: Vec2,
    pub sector: SectorId,
    /// Last wall the move was clipped against.
    pub hit_wall: Option<WallId>,
    /// Slide iterations used, at most `MAX_SLIDE_ITERATIONS`.
    pub iterations: usize,
}

/// Fraction of `delta` the circle at `center` can travel before touching
/// `wall`. `1.0` means no contact within this move.
pub fn collision_time(wall: &Wall, center: Vec2, delta: Vec2, radius: f32) -> f32 {
    // Contact point on the circle: the side facing the wall.
    let c = center - wall.normal * radius;
    let e = wall.p2 - wall.p1;
    let w = wall.p1 - c;

    let den = delta.perp_dot(e);
    if den == 0.0 {
        return 1.0;
    }
    let along_motion = w.perp_dot(e) / den;
    let along_wall = w.perp_dot(delta) / den;
    if (-HIT_SLOP..=1.0).contains(&along_motion) && (-HIT_SLOP..=1.0).contains(&along_wall) {
        return along_motion;
    }

    // Past the wall ends: sweep against each endpoint instead.
    let qa = delta.length_squared();
    if qa == 0.0 {
        return 1.0;
    }
    for end in [wall.p1, wall.p2] {
        let d = center - end;
        let qb = d.dot(delta);
        let qc = d.length_squared() - radius * radius;
        let disc = qb * qb - qa * qc;
        if disc >= 0.0 {
            let q = (-qb - disc.sqrt()) / qa;
            if (-HIT_SLOP..=1.0).contains(&q) {
                return q;
            }
        }
    }
    1.0
}

/// A portal lets the actor through when its body fits under the far
/// ceiling and its knees clear the far floor.
#[inline]
fn portal_passable(map: &Map, neighbor: SectorId, z: f32) -> bool {
    let n = map.sector(neighbor);
    z + OBJECT_HEIGHT < n.ceil_h && z + MAX_STEP_HEIGHT > n.floor_h
}

/// Earliest blocking wall along `delta`, with its hit fraction.
fn closest_hit(
    map: &Map,
    sector: SectorId,
    pos: Vec2,
    z: f32,
    delta: Vec2,
    radius: f32,
) -> Option<(WallId, f32)> {
    let swept = Aabb::around(pos, radius).sweep(delta);
    let mut visitor = map.visitor(sector);
    let mut closest: Option<(WallId, f32)> = None;

    while let Some(s) = visitor.pop() {
        for (i, wall) in map.walls_of(s).iter().enumerate() {
            if let Some(n) = wall.portal.neighbor() {
                if swept.overlaps(&map.sector(n).bounds) {
                    visitor.push(n);
                }
                if portal_passable(map, n, z) {
                    continue;
                }
            }
            if wall.normal.dot(delta) >= 0.0 {
                continue;
            }
            let t = collision_time(wall, pos, delta, radius);
            if t < 1.0 && closest.is_none_or(|(_, best)| t < best) {
                closest = Some((map.wall_id(s, i), t));
            }
        }
    }
    closest
}

/// Move a circle of `radius` by `vel`, clipping against the first wall hit
/// and sliding the remainder along it.
pub fn slide_move(
    map: &Map,
    mut sector: SectorId,
    mut pos: Vec2,
    z: f32,
    mut vel: Vec2,
    radius: f32,
) -> MoveResult {
    let mut delta = vel;
    let mut hit_wall = None;
    // walls hit by the last two iterations, newest first
    let mut recent: [Option<WallId>; 2] = [None; 2];
    let mut iterations = 0;

    while iterations < MAX_SLIDE_ITERATIONS && delta.length_squared() > MIN_VELOCITY_SQ {
        iterations += 1;

        let Some((wall_id, t)) = closest_hit(map, sector, pos, z, delta, radius) else {
            pos += delta;
            sector = map.locate_sector(sector, pos);
            delta = Vec2::ZERO;
            break;
        };

        // Wedged between two walls: the slide along one runs straight back
        // into the other without moving.
        if recent[1] == Some(wall_id) && (delta * t).length_squared() < MIN_VELOCITY_SQ {
            hit_wall = Some(wall_id);
            vel = Vec2::ZERO;
            delta = Vec2::ZERO;
            break;
        }

        let wall = &map.walls[wall_id as usize];
        pos += delta * t;
        sector = map.locate_sector(sector, pos);
        hit_wall = Some(wall_id);
        recent = [Some(wall_id), recent[0]];

        let tangent = wall.delta / wall.length;
        let slid = tangent * tangent.dot(delta) * (1.0 - t);
        vel = tangent * tangent.dot(vel);

        let stuck =
            wall.portal.neighbor().is_none() && slid.distance_squared(delta) < MIN_VELOCITY_SQ;
        delta = slid;
        if stuck {
            break;
        }
    }

    if iterations == MAX_SLIDE_ITERATIONS && delta.length_squared() > MIN_VELOCITY_SQ {
        log::warn!(
            "slide budget exhausted at ({:.2}, {:.2}) in sector {sector}",
            pos.x,
            pos.y
        );
    }

    if vel.length_squared() <= MIN_VELOCITY_SQ {
        vel = Vec2::ZERO;
    }

    MoveResult {
        pos,
        vel,
        sector,
        hit_wall,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::OBJECT_RADIUS;
    use crate::world::{MapBuilder, samples};
    use glam::vec2;
    use proptest::prelude::*;

    #[test]
    fn head_on_stops_at_radius() {
        let map = samples::square(64.0).unwrap();
        let r = slide_move(&map, 0, vec2(32.0, 10.0), 0.0, vec2(0.0, -20.0), 8.0);
        assert!((r.pos.y - 8.0).abs() < 1e-4, "{:?}", r.pos);
        assert!((r.pos.x - 32.0).abs() < 1e-4);
        assert_eq!(r.vel.y, 0.0);
        assert_eq!(r.sector, 0);
        assert!(r.hit_wall.is_some());
    }

    #[test]
    fn head_on_with_object_radius() {
        let map = samples::square(64.0).unwrap();
        let r = slide_move(&map, 0, vec2(32.0, 30.0), 0.0, vec2(0.0, -20.0), OBJECT_RADIUS);
        assert!((r.pos.y - OBJECT_RADIUS).abs() < 1e-4);
        assert_eq!(r.vel, Vec2::ZERO);
    }

    #[test]
    fn diagonal_slides_along_wall() {
        let map = samples::square(64.0).unwrap();
        let start = vec2(32.0, 12.0);
        let r = slide_move(&map, 0, start, 0.0, vec2(-6.0, -6.0), 8.0);
        // parallel progress kept, perpendicular stopped at the wall
        assert!(r.pos.x < start.x - 1.0);
        assert!((r.pos.y - 8.0).abs() < 1e-3);
        assert!(r.vel.y.abs() < 1e-5);
        assert!(r.vel.x < 0.0);
    }

    #[test]
    fn zero_velocity_is_a_no_op() {
        let map = samples::courtyard().unwrap();
        let p = samples::COURTYARD_START;
        let r = slide_move(&map, 0, p, 0.0, Vec2::ZERO, OBJECT_RADIUS);
        assert_eq!(r.pos, p);
        assert_eq!(r.sector, 0);
        assert_eq!(r.vel, Vec2::ZERO);
        assert_eq!(r.hit_wall, None);
    }

    #[test]
    fn open_portal_lets_actor_through() {
        let map = samples::two_rooms(0.0).unwrap();
        let r = slide_move(&map, 0, vec2(50.0, 32.0), 0.0, vec2(20.0, 0.0), 8.0);
        assert!((r.pos.x - 70.0).abs() < 1e-4);
        assert_eq!(r.sector, 1);
        assert_eq!(r.hit_wall, None);
    }

    #[test]
    fn high_ledge_blocks_like_a_wall() {
        let map = samples::two_rooms(32.0).unwrap();
        let r = slide_move(&map, 0, vec2(40.0, 32.0), 0.0, vec2(20.0, 0.0), 8.0);
        assert!((r.pos.x - 56.0).abs() < 1e-3);
        assert_eq!(r.sector, 0);
        assert_eq!(r.vel, Vec2::ZERO);
    }

    #[test]
    fn low_step_is_passable() {
        let map = samples::two_rooms(16.0).unwrap();
        let r = slide_move(&map, 0, vec2(40.0, 32.0), 0.0, vec2(30.0, 0.0), 8.0);
        assert_eq!(r.sector, 1);
    }

    #[test]
    fn wedged_actor_stops_dead() {
        // corner far sharper than 90 degrees
        let mut b = MapBuilder::new("wedge");
        b.sector(0.0, 128.0, &[vec2(0.0, 0.0), vec2(20.0, 100.0), vec2(40.0, 0.0)]);
        let map = b.build().unwrap();

        let mut pos = vec2(20.0, 40.0);
        let mut last = None;
        for _ in 0..10 {
            let r = slide_move(&map, 0, pos, 0.0, vec2(0.0, 10.0), 8.0);
            assert!(r.iterations < MAX_SLIDE_ITERATIONS, "{r:?}");
            pos = r.pos;
            last = Some(r);
        }
        let r = last.unwrap();
        // touching both walls: 8 units from each
        assert!((r.pos.x - 20.0).abs() < 0.1, "{:?}", r.pos);
        assert!((r.pos.y - 59.21).abs() < 0.1, "{:?}", r.pos);
        assert_eq!(r.vel, Vec2::ZERO);
        assert!(map.sector_contains_point(0, r.pos));

        let again = slide_move(&map, 0, r.pos, 0.0, vec2(0.0, 10.0), 8.0);
        assert!(again.pos.distance(r.pos) < 0.05);
        assert_eq!(again.vel, Vec2::ZERO);
    }

    #[test]
    fn long_slide_around_a_round_room_runs_out_of_retries() {
        // twelve-sided room of radius 100, walked clockwise
        let points: Vec<Vec2> = (0..12)
            .map(|k| {
                let a = (15.0 - 30.0 * k as f32).to_radians();
                vec2(a.cos(), a.sin()) * 100.0
            })
            .collect();
        let mut b = MapBuilder::new("round");
        b.sector(0.0, 128.0, &points);
        let map = b.build().unwrap();

        // far more motion than five wall hits can absorb
        let r = slide_move(&map, 0, Vec2::ZERO, 0.0, vec2(4000.0, 400.0), 8.0);
        assert_eq!(r.iterations, MAX_SLIDE_ITERATIONS);
        assert!(r.hit_wall.is_some());
        assert_eq!(r.sector, 0);
        assert!(map.sector_contains_point(0, r.pos));
        assert!(r.pos.length() < 100.0 - 7.0, "{:?}", r.pos);
    }

    #[test]
    fn corner_graze_uses_endpoint_sweep() {
        let map = samples::square(64.0).unwrap();
        let wall = &map.walls_of(0)[3]; // (64,0) -> (0,0)
        // circle just past the wall's west end, moving down
        let t = collision_time(wall, vec2(-4.0, 10.0), vec2(0.0, -10.0), 8.0);
        let expected = (10.0 - (64.0f32 - 16.0).sqrt()) / 10.0;
        assert!((t - expected).abs() < 1e-4, "{t} vs {expected}");
    }

    #[test]
    fn parallel_motion_never_hits() {
        let map = samples::square(64.0).unwrap();
        let wall = &map.walls_of(0)[3];
        assert_eq!(collision_time(wall, vec2(32.0, 10.0), vec2(5.0, 0.0), 8.0), 1.0);
    }

    proptest! {
        #[test]
        fn actor_stays_inside_square(
            x in 20.0f32..44.0,
            y in 20.0f32..44.0,
            vx in -30.0f32..30.0,
            vy in -30.0f32..30.0,
        ) {
            let map = samples::square(64.0).unwrap();
            let r = slide_move(&map, 0, vec2(x, y), 0.0, vec2(vx, vy), 8.0);
            prop_assert!(r.pos.x > 7.0 && r.pos.x < 57.0);
            prop_assert!(r.pos.y > 7.0 && r.pos.y < 57.0);
            prop_assert_eq!(r.sector, 0);
        }

        #[test]
        fn sector_always_contains_result(
            vx in -12.0f32..12.0,
            vy in -12.0f32..12.0,
            steps in 1usize..40,
        ) {
            let map = samples::courtyard().unwrap();
            let (mut pos, mut sector) = (samples::COURTYARD_START, 0);
            for _ in 0..steps {
                let r = slide_move(&map, sector, pos, 0.0, vec2(vx, vy), OBJECT_RADIUS);
                let inside_any = (0..map.num_sectors() as SectorId)
                    .any(|id| map.sector_contains_point(id, r.pos));
                if inside_any {
                    prop_assert!(map.sector_contains_point(r.sector, r.pos));
                } else {
                    prop_assert_eq!(r.sector, sector);
                }
                pos = r.pos;
                sector = r.sector;
            }
        }
    }
}
