use glam::{Vec2, Vec3, vec2};

/// Viewpoint in world space.
///
/// * Only **yaw** is simulated; the view never pitches or rolls.
/// * `pos.z` is the absolute eye height (floor + eye offset + bob).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pos: Vec3, // x,y in map units; z = absolute eye height
    yaw: f32,  // radians (0 = +X, counter-clockwise)
    fov: f32,  // horizontal FoV in radians
}

impl Camera {
    pub fn new(pos: Vec3, yaw: f32, fov: f32) -> Self {
        Self {
            pos,
            yaw: yaw.rem_euclid(std::f32::consts::TAU),
            fov,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    pub fn eye_z(&self) -> f32 {
        self.pos.z
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// World X–Y point into view space:
    ///  .x = lateral offset (+ right)
    ///  .y = depth along the view direction
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let d = p - self.pos.truncate();
        let (s, c) = self.yaw.sin_cos();
        let depth = d.x * c + d.y * s;
        let lateral = d.x * s - d.y * c;
        vec2(lateral, depth)
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit view direction on the X-Y plane.
    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s)
    }

    /// Unit vector to the right of the view, i.e. forward turned clockwise.
    #[inline(always)]
    pub fn right(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(s, -c)
    }

    /*───────────────── projection helpers ─────────────────*/

    /// Pixels per unit of lateral offset at depth 1 for a viewport `w` wide.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn screen_scale(&self, w: usize) -> f32 {
        (w as f32) * 0.5 / (self.fov * 0.5).tan()
    }

    /// Nothing closer than this is projected.
    #[inline(always)]
    pub fn near(&self) -> f32 {
        1.0
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec3::ZERO, 0.3, 1.57);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!(f.dot(r).abs() < 1e-5);
        // right is clockwise from forward
        assert!(f.perp_dot(r) < 0.0);
    }

    #[test]
    fn screen_scale_at_90_deg() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        assert!((cam.screen_scale(400) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn to_cam_matches_right_vector() {
        let cam = Camera::new(vec2(5.0, 5.0).extend(32.0), 1.1, FRAC_PI_2);
        let p = cam.pos().truncate() + cam.forward() * 10.0 + cam.right() * 3.0;
        assert!((cam.to_cam(p) - vec2(3.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn to_cam_axes_align() {
        let cam = Camera::new(Vec3::ZERO, 0.0, FRAC_PI_2);
        assert!((cam.to_cam(vec2(10.0, 0.0)) - vec2(0.0, 10.0)).length() < 1e-5);
        // facing +X, +Y is on the left
        assert!((cam.to_cam(vec2(0.0, 5.0)) - vec2(-5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn yaw_is_wrapped() {
        let cam = Camera::new(Vec3::ZERO, -FRAC_PI_2, FRAC_PI_2);
        assert!((cam.yaw() - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((cam.forward() - vec2(0.0, -1.0)).length() < 1e-5);
    }
}
