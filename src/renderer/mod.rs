//! Rendering abstraction layer.
//!
//! *The portal renderer never touches a pixel buffer directly.*
//! It computes [`ColumnSpan`]s (walls, sprites) and [`FlatSpan`]s (floors,
//! ceilings) and hands them to a type implementing [`Rasterizer`].
//!
//! * [`framebuffer::Framebuffer`] is the CPU back-end used by the binaries.
//! * Tests plug in a recorder that keeps the spans instead of pixels.

use glam::Vec2;

use crate::world::{SectorId, TextureId};

pub mod fixed;
pub mod framebuffer;
pub mod software;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use fixed::{FRACBITS, Fixed};
pub use framebuffer::Framebuffer;
pub use software::{MAX_SECTOR_DEPTH, MAX_VISWALLS, PortalRenderer, RenderStats, Scene};
pub use view::{DEFAULT_FOV, DEFAULT_HEIGHT, DEFAULT_WIDTH, render_viewpoint, view_bob};

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// Source height that never wraps; used for sprite posts.
pub const NO_WRAP: u32 = 0x8000;

/// One textured screen column.
///
/// Row `y` in `y_top..y_bottom` samples
/// `source[((scale * (y - h/2) + offset) >> FRACBITS) & (height - 1)]`.
#[derive(Clone, Copy, Debug)]
pub struct ColumnSpan<'a> {
    pub source: &'a [u8],
    /// Power of two, or [`NO_WRAP`].
    pub height: u32,
    /// Texels per screen row.
    pub scale: Fixed,
    pub offset: Fixed,
    pub x: i32,
    pub y_top: i32,    // inclusive
    pub y_bottom: i32, // exclusive
}

/// One textured row of a floor or ceiling, in world-aligned 64×64 flat
/// space. `x_frac`/`y_frac` hold the texel under the centre of `x_left`.
#[derive(Clone, Copy, Debug)]
pub struct FlatSpan<'a> {
    pub source: &'a [u8],
    pub x_step: Fixed,
    pub y_step: Fixed,
    pub x_frac: Fixed,
    pub y_frac: Fixed,
    pub x_left: i32,  // inclusive
    pub x_right: i32, // exclusive
    pub y: i32,
}

/// A drawable actor as seen by the sprite pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Billboard {
    pub pos: Vec2,
    /// Feet height.
    pub z: f32,
    pub sector: SectorId,
    pub sprite: TextureId,
}

/// A back-end that owns its pixels for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Rasterizer {
    /// (Re)allocate for the requested resolution and clear.
    fn begin_frame(&mut self, width: usize, height: usize);

    fn draw_column(&mut self, span: &ColumnSpan<'_>);

    fn draw_span(&mut self, span: &FlatSpan<'_>);

    /// Finish the frame and **loan** the buffer to `submit(&[Rgba], w, h)`.
    /// Called exactly once per frame.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}
