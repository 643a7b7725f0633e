use glam::Vec2;
use hecs::{Entity, World};
use std::time::{Duration, Instant};

use super::actor::{self, ActorState};
use super::components::{
    ActorFlags, Angle, InputCmd, Player, Position, SectorRef, SpriteRef, Velocity,
};
use super::occupancy::SectorOccupancy;
use super::systems;
use crate::renderer::Billboard;
use crate::world::{Map, SectorId, TextureId};

pub const SIM_FPS: u32 = 35;
const TIC: Duration = Duration::from_micros(1_000_000 / SIM_FPS as u64);

/// Owns the ECS world and drives all game-logic systems.
pub struct TicRunner {
    world: World,
    occupancy: SectorOccupancy,
    player: Option<Entity>,
    last: Instant,
}

impl TicRunner {
    pub fn new(map: &Map) -> Self {
        Self {
            world: World::new(),
            occupancy: SectorOccupancy::new(map.num_sectors()),
            player: None,
            last: Instant::now(),
        }
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[inline]
    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /* ---------------------------------------------------------------- */
    /* lifecycle                                                         */
    /* ---------------------------------------------------------------- */

    pub fn spawn(&mut self, map: &Map, pos: Vec2) -> Entity {
        actor::spawn(&mut self.world, &mut self.occupancy, map, pos)
    }

    /// Input-driven actor, hidden from its own view.
    pub fn spawn_player(&mut self, map: &Map, pos: Vec2, angle: f32) -> Entity {
        let e = self.spawn(map, pos);
        if let Err(err) = self
            .world
            .insert(e, (Player, Angle(angle), ActorFlags::NORENDER))
        {
            log::warn!("player {e:?} left without input components: {err}");
        }
        self.player = Some(e);
        e
    }

    pub fn spawn_billboard(&mut self, map: &Map, pos: Vec2, sprite: TextureId) -> Entity {
        let e = self.spawn(map, pos);
        if let Err(err) = self.world.insert_one(e, SpriteRef(sprite)) {
            log::warn!("billboard {e:?} has no sprite: {err}");
        }
        e
    }

    pub fn despawn(&mut self, e: Entity) -> bool {
        if self.player == Some(e) {
            self.player = None;
        }
        actor::despawn(&mut self.world, &mut self.occupancy, e)
    }

    /* ---------------------------------------------------------------- */
    /* single-actor operations                                           */
    /* ---------------------------------------------------------------- */

    pub fn actor(&self, e: Entity) -> Option<ActorState> {
        actor::state(&self.world, e)
    }

    pub fn apply_velocity(&mut self, map: &Map, e: Entity) {
        self.with_actor(e, |pos, vel, sector| {
            actor::apply_velocity(map, pos, vel, sector);
        });
    }

    pub fn apply_gravity(&mut self, map: &Map, e: Entity) {
        self.with_actor(e, |pos, vel, sector| actor::apply_gravity(map, pos, vel, sector));
    }

    /// Re-resolve the sector of an actor moved by hand. Returns the sector.
    pub fn update_sector(&mut self, map: &Map, e: Entity) -> Option<SectorId> {
        let mut result = None;
        self.with_actor(e, |pos, _, sector| {
            actor::update_sector(map, pos, sector);
            result = Some(sector.0);
        });
        result
    }

    /// Teleport without collision; the sector is re-resolved.
    pub fn set_position(&mut self, map: &Map, e: Entity, pos: Vec2) {
        if let Ok(p) = self.world.query_one_mut::<&mut Position>(e) {
            p.0 = pos;
        }
        self.update_sector(map, e);
    }

    pub fn occupants(&self, sector: SectorId) -> &[Entity] {
        self.occupancy.occupants(sector)
    }

    /// Run `f` on one actor's movement state, relinking it afterwards if
    /// its sector changed.
    fn with_actor<F>(&mut self, e: Entity, f: F)
    where
        F: FnOnce(&mut Position, &mut Velocity, &mut SectorRef),
    {
        let Ok((pos, vel, sector)) =
            self.world
                .query_one_mut::<(&mut Position, &mut Velocity, &mut SectorRef)>(e)
        else {
            return;
        };
        let before = sector.0;
        f(pos, vel, sector);
        self.occupancy.relink(before, sector.0, e);
    }

    /* ---------------------------------------------------------------- */
    /* fixed-rate loop                                                   */
    /* ---------------------------------------------------------------- */

    /// Advance enough tics to synchronise simulation with real time.
    /// Returns the number of tics run.
    pub fn pump(&mut self, map: &Map, cmd: InputCmd) -> u32 {
        let mut tics = 0;
        while self.last.elapsed() >= TIC {
            self.tick(map, cmd);
            self.last += TIC;
            tics += 1;
        }
        tics
    }

    /// One fixed-rate game tic: input, then physics for every actor.
    pub fn tick(&mut self, map: &Map, cmd: InputCmd) {
        if let Some(p) = self.player {
            systems::player_input(&mut self.world, p, cmd);
        }
        systems::physics(&mut self.world, &mut self.occupancy, map);
    }

    /// Every drawable actor, for the sprite pass.
    pub fn billboards(&self) -> Vec<Billboard> {
        let mut query = self
            .world
            .query::<(&Position, &SectorRef, &SpriteRef, Option<&ActorFlags>)>();
        query
            .iter()
            .filter(|(_, (_, _, _, flags))| {
                !flags.is_some_and(|f| f.contains(ActorFlags::NORENDER))
            })
            .map(|(_, (pos, sector, sprite, _))| Billboard {
                pos: pos.0,
                z: pos.1,
                sector: sector.0,
                sprite: sprite.0,
            })
            .collect()
    }
}
