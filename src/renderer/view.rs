use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

use super::{PortalRenderer, Rasterizer, RenderStats, software::Scene};
use crate::{
    sim::{ActorState, EYE_HEIGHT},
    world::Camera,
};

pub const DEFAULT_WIDTH: usize = 400;
pub const DEFAULT_HEIGHT: usize = 240;
pub const DEFAULT_FOV: f32 = FRAC_PI_2;

/// Vertical eye offset from walking, on a 512 ms cycle.
///
/// Scales with the square of the horizontal speed, so a standing or
/// falling actor does not bob.
pub fn view_bob(vel: Vec3, clock_ms: u64) -> f32 {
    let phase = (clock_ms & 511) as f32 * TAU / 512.0;
    phase.cos() * vel.truncate().length_squared() * 0.1
}

/// Render what `actor` sees: full screen, starting in the actor's sector.
pub fn render_viewpoint<R: Rasterizer>(
    renderer: &mut PortalRenderer,
    scene: &Scene<'_>,
    actor: &ActorState,
    clock_ms: u64,
    rast: &mut R,
) -> RenderStats {
    let eye = actor.z + EYE_HEIGHT + view_bob(actor.vel, clock_ms);
    let cam = Camera::new(actor.pos.extend(eye), actor.angle, renderer.fov());
    let stats = renderer.render(scene, &cam, actor.sector, rast);
    log::debug!(
        "view from sector {}: {} frames, depth {}, {} walls, {} sprites",
        actor.sector,
        stats.frames,
        stats.max_depth,
        stats.walls_drawn,
        stats.sprites_drawn
    );
    stats
}
