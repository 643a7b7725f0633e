use glam::Vec2;
use hecs::{Entity, World};
use smallvec::SmallVec;

use super::actor::{apply_gravity, apply_velocity};
use super::components::{Angle, InputCmd, Position, SectorRef, Velocity};
use super::occupancy::SectorOccupancy;
use crate::world::{Map, SectorId};

pub const MOVE_SPEED: f32 = 6.0; // map-units / tic
pub const TURN_SPEED: f32 = 0.05; // rad / tic
pub const FLY_SPEED: f32 = 4.0; // map-units / tic
const RUN_FACTOR: f32 = 2.0;

pub fn player_input(world: &mut World, player: Entity, cmd: InputCmd) {
    let Ok((ang, vel, pos)) = world.query_one_mut::<(&mut Angle, &mut Velocity, &mut Position)>(player)
    else {
        return;
    };

    if cmd.turn != 0.0 {
        ang.0 = (ang.0 + cmd.turn * TURN_SPEED).rem_euclid(std::f32::consts::TAU);
    }

    let speed = if cmd.run {
        MOVE_SPEED * RUN_FACTOR
    } else {
        MOVE_SPEED
    };

    if cmd.forward != 0.0 || cmd.strafe != 0.0 {
        let (s, c) = ang.0.sin_cos();
        let fwd = Vec2::new(c, s);
        let right = Vec2::new(s, -c);
        let wish = (fwd * cmd.forward + right * cmd.strafe).normalize_or_zero();
        vel.set_xy(wish * speed);
    } else {
        vel.zero_xy();
    }

    if cmd.fly != 0.0 {
        pos.1 += cmd.fly.signum() * FLY_SPEED;
    }
}

/// Move every actor, then relink those whose sector changed.
pub fn physics(world: &mut World, occupancy: &mut SectorOccupancy, map: &Map) {
    let mut moved: SmallVec<[(Entity, SectorId, SectorId); 8]> = SmallVec::new();

    for (e, (pos, vel, sector)) in
        world.query_mut::<(&mut Position, &mut Velocity, &mut SectorRef)>()
    {
        let before = sector.0;
        if vel.xy() != Vec2::ZERO {
            apply_velocity(map, pos, vel, sector);
        }
        apply_gravity(map, pos, vel, sector);
        if sector.0 != before {
            moved.push((e, before, sector.0));
        }
    }

    for (e, from, to) in moved {
        occupancy.relink(from, to, e);
    }
}
