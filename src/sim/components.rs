use bitflags::bitflags;
use glam::{Vec2, Vec3};

use crate::world::{SectorId, TextureId};

/// World-space position. z (feet height) is kept apart from x/y, as in the
/// 2½-D maths everywhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2, pub f32);

/// x/y = horizontal velocity per tic, z = vertical velocity per tic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec3);

impl Velocity {
    #[inline]
    pub fn xy(&self) -> Vec2 {
        self.0.truncate()
    }

    #[inline]
    pub fn set_xy(&mut self, v: Vec2) {
        self.0.x = v.x;
        self.0.y = v.y;
    }

    #[inline]
    pub fn zero_xy(&mut self) {
        self.0.x = 0.0;
        self.0.y = 0.0;
    }
}

/// Facing, radians (0 = +X, counter-clockwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle(pub f32);

/// Sector whose polygon contains the actor origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorRef(pub SectorId);

/// Billboard drawn at the actor origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRef(pub TextureId);

/// Marks the entity driven by [`InputCmd`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ActorFlags: u8 {
        /// Skipped by the sprite pass (the viewer itself).
        const NORENDER = 0x01;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    pub forward: f32, // –1 … +1
    pub strafe: f32,  // –1 … +1  (left / right)
    pub turn: f32,    // –1 … +1  (right / left)
    pub run: bool,    // Shift
    pub fly: f32,     // –1 … +1  (down / up)
}
