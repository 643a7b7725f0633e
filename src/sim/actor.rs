//! Actor lifecycle and per-tic movement over `hecs` components.
//!
//! An actor is any entity carrying `Position`, `Velocity`, `Angle` and
//! `SectorRef`. Every operation here leaves `SectorRef` naming a sector
//! that contains the actor origin, or the last such sector when the origin
//! slipped outside the map.

use glam::{Vec2, Vec3};
use hecs::{Entity, World};

use super::collision::{MoveResult, slide_move};
use super::components::{ActorFlags, Angle, Position, SectorRef, Velocity};
use super::gravity::fall;
use super::occupancy::SectorOccupancy;
use crate::world::{Map, SectorId};

pub const OBJECT_RADIUS: f32 = 20.0;
/// Body height checked against portal ceilings.
pub const OBJECT_HEIGHT: f32 = 56.0;
pub const MAX_STEP_HEIGHT: f32 = 24.0;
/// Vertical acceleration, map units per tic².
pub const GRAVITY: f32 = -1.0;
/// Fastest upward snap onto a higher floor, map units per tic.
pub const CLIMB_SPEED: f32 = 6.0;
pub const EYE_HEIGHT: f32 = 32.0;

/// Snapshot of one actor's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub pos: Vec2,
    pub z: f32,
    pub vel: Vec3,
    pub angle: f32,
    pub sector: SectorId,
    pub flags: ActorFlags,
}

/// Place a new actor at `pos`, standing on the floor of the sector found
/// from sector 0, and link it into the occupancy index.
pub fn spawn(world: &mut World, occupancy: &mut SectorOccupancy, map: &Map, pos: Vec2) -> Entity {
    let sector = map.locate_sector(0, pos);
    let z = map.sector(sector).floor_h;
    let e = world.spawn((
        Position(pos, z),
        Velocity(Vec3::ZERO),
        Angle(0.0),
        SectorRef(sector),
        ActorFlags::empty(),
    ));
    occupancy.insert(sector, e);
    log::info!("spawned actor {e:?} at ({:.1}, {:.1}) in sector {sector}", pos.x, pos.y);
    e
}

/// Unlink and destroy. Returns `false` for an unknown entity.
pub fn despawn(world: &mut World, occupancy: &mut SectorOccupancy, e: Entity) -> bool {
    if let Ok(sector) = world.get::<&SectorRef>(e).map(|s| s.0) {
        occupancy.remove(sector, e);
    }
    match world.despawn(e) {
        Ok(()) => {
            log::info!("despawned actor {e:?}");
            true
        }
        Err(_) => false,
    }
}

/// Horizontal move-and-slide for one tic.
pub fn apply_velocity(
    map: &Map,
    pos: &mut Position,
    vel: &mut Velocity,
    sector: &mut SectorRef,
) -> MoveResult {
    let r = slide_move(map, sector.0, pos.0, pos.1, vel.xy(), OBJECT_RADIUS);
    pos.0 = r.pos;
    vel.set_xy(r.vel);
    sector.0 = r.sector;
    r
}

/// Vertical integration and step climbing for one tic.
pub fn apply_gravity(map: &Map, pos: &mut Position, vel: &mut Velocity, sector: &SectorRef) {
    let r = fall(map, sector.0, pos.0, pos.1, vel.0.z, OBJECT_RADIUS);
    pos.1 = r.z;
    vel.0.z = r.zvel;
}

/// Re-resolve the sector after the position was changed directly.
pub fn update_sector(map: &Map, pos: &Position, sector: &mut SectorRef) -> bool {
    let found = map.locate_sector(sector.0, pos.0);
    let changed = found != sector.0;
    sector.0 = found;
    changed
}

pub fn state(world: &World, e: Entity) -> Option<ActorState> {
    let mut q = world
        .query_one::<(&Position, &Velocity, &Angle, &SectorRef, Option<&ActorFlags>)>(e)
        .ok()?;
    let (pos, vel, angle, sector, flags) = q.get()?;
    Some(ActorState {
        pos: pos.0,
        z: pos.1,
        vel: vel.0,
        angle: angle.0,
        sector: sector.0,
        flags: flags.copied().unwrap_or_default(),
    })
}
