mod actor;
mod collision;
mod components;
mod gravity;
mod occupancy;
mod systems;
mod tic;

pub use actor::{
    ActorState, CLIMB_SPEED, EYE_HEIGHT, GRAVITY, MAX_STEP_HEIGHT, OBJECT_HEIGHT, OBJECT_RADIUS,
};
pub use collision::{MAX_SLIDE_ITERATIONS, MIN_VELOCITY_SQ, MoveResult, collision_time, slide_move};
pub use components::{
    ActorFlags, Angle, InputCmd, Player, Position, SectorRef, SpriteRef, Velocity,
};
pub use gravity::{FallResult, fall, support_height};
pub use occupancy::SectorOccupancy;
pub use systems::{FLY_SPEED, MOVE_SPEED, TURN_SPEED, physics, player_input};
pub use tic::{SIM_FPS, TicRunner};
