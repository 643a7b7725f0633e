//! Wall projection: view transform, frustum clipping and the linear
//! per-column attributes that walk across a projected wall.

use crate::world::{Camera, Wall};

/// A wall clipped to the current portal bounds.
///
/// `sx_*` are horizontal screen offsets from the view centre (pixels),
/// `x_l..x_r` the covered columns. `1/z` and `u/z` are linear in screen X.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub x_l: i32,
    pub x_r: i32,
    pub sx_l: f32,
    pub sx_r: f32,
    pub invz_l: f32,
    pub invz_r: f32,
    pub uoz_l: f32,
    pub uoz_r: f32,
}

/// Screen geometry shared by every wall of a frame.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub width: i32,
    pub half_w: i32,
    pub focal: f32,
}

impl Screen {
    /// Column of a horizontal screen offset, right side exclusive.
    #[inline]
    pub fn column(&self, sx: f32) -> i32 {
        (sx.floor() as i32).saturating_add(self.half_w).clamp(0, self.width)
    }

    /// Screen offset of the centre of column `x`.
    #[inline]
    pub fn offset(&self, x: i32) -> f32 {
        (x - self.half_w) as f32 + 0.5
    }
}

/// One clipped endpoint candidate.
struct ClipPoint {
    bound: f32,
    uv: f32,
    at: glam::Vec2,
}

/// Project `wall` and clip it against the frustum half-planes through
/// `left` and `right`.
///
/// Rejects walls fully outside either half-plane, walls with an endpoint
/// left behind the eye, back faces and walls that cover no column.
pub fn clip_wall(cam: &Camera, screen: &Screen, wall: &Wall, left: f32, right: f32) -> Option<Edge> {
    let f = screen.focal;
    let mut a = cam.to_cam(wall.p1);
    let mut b = cam.to_cam(wall.p2);

    // al > 0: `a` left of the left plane; bl < 0: `b` left of it
    let al = left * a.y - f * a.x;
    let bl = f * b.x - left * b.y;
    if al > 0.0 && bl < 0.0 {
        return None;
    }
    let ar = right * a.y - f * a.x;
    let br = f * b.x - right * b.y;
    if ar < 0.0 && br > 0.0 {
        return None;
    }

    // a zero denominator means the wall runs along the plane; the point is
    // then never selected below
    let ta = al / (al + bl);
    let tb = ar / (ar + br);
    let d = b - a;
    let u1 = wall.x_off;
    let u2 = wall.x_off + wall.length;
    let cl = ClipPoint {
        bound: left,
        uv: u1 + ta * wall.length,
        at: a + d * ta,
    };
    let cr = ClipPoint {
        bound: right,
        uv: u1 + tb * wall.length,
        at: a + d * tb,
    };

    let (sx_l, ua) = clip_endpoint(&cl, &cr, al, ar, &mut a, u1, f);
    if a.y <= 0.0 {
        return None;
    }
    let (sx_r, ub) = clip_endpoint(&cr, &cl, br, bl, &mut b, u2, f);
    if b.y <= 0.0 {
        return None;
    }
    if a.x * b.y > b.x * a.y {
        return None;
    }

    let x_l = screen.column(sx_l);
    let x_r = screen.column(sx_r);
    if x_l >= x_r || sx_r <= sx_l {
        return None;
    }

    let invz_l = 1.0 / a.y;
    let invz_r = 1.0 / b.y;
    Some(Edge {
        x_l,
        x_r,
        sx_l,
        sx_r,
        invz_l,
        invz_r,
        uoz_l: ua * invz_l,
        uoz_r: ub * invz_r,
    })
}

/// Keep `p` if it is inside its own plane, otherwise move it to the
/// intersection with that plane (or with the opposite plane when it is
/// outside both). Returns the screen offset and U of the result.
fn clip_endpoint(
    own: &ClipPoint,
    other: &ClipPoint,
    own_val: f32,
    other_val: f32,
    p: &mut glam::Vec2,
    u: f32,
    focal: f32,
) -> (f32, f32) {
    if own_val < 0.0 {
        if other_val < 0.0 {
            *p = other.at;
            (other.bound, other.uv)
        } else {
            (focal * p.x / p.y, u)
        }
    } else {
        *p = own.at;
        (own.bound, own.uv)
    }
}

/*──────────────────────── column walking ─────────────────────────────*/

/// Per-column increments across an [`Edge`].
#[derive(Clone, Copy)]
pub struct ColumnStep {
    duoz: f32,
    dinvz: f32,
}

impl ColumnStep {
    pub fn from_edge(e: &Edge) -> Self {
        let span = e.sx_r - e.sx_l;
        Self {
            duoz: (e.uoz_r - e.uoz_l) / span,
            dinvz: (e.invz_r - e.invz_l) / span,
        }
    }
}

/// Attributes at the current column, marching left to right.
#[derive(Clone, Copy)]
pub struct ColumnCursor {
    pub uoz: f32,
    pub inv_z: f32,
}

impl ColumnCursor {
    /// Attributes at the centre of the edge's first column.
    pub fn from_edge(e: &Edge, s: &ColumnStep, screen: &Screen) -> Self {
        let t = screen.offset(e.x_l) - e.sx_l;
        Self {
            uoz: e.uoz_l + s.duoz * t,
            inv_z: e.invz_l + s.dinvz * t,
        }
    }

    #[inline]
    pub fn advance(&mut self, s: &ColumnStep) {
        self.uoz += s.duoz;
        self.inv_z += s.dinvz;
    }

    /// Texture U at this column.
    #[inline]
    pub fn u(&self) -> f32 {
        self.uoz / self.inv_z
    }
}
