use std::ops::Range;

use glam::Vec2;

use crate::{
    renderer::{
        ColumnSpan, Fixed, NO_WRAP, Rasterizer,
        software::{MAX_VISWALLS, PortalRenderer, View, projection::Edge},
    },
    world::{Map, Portal, TextureId, Wall, WallId},
};

/// Bump allocator for per-column clip rows, reset every view.
#[derive(Default)]
pub struct FrameScratch {
    openings: Vec<i16>,
    cursor: usize,
}

impl FrameScratch {
    /// Allocate `len` consecutive i16 slots inside `openings`
    /// and return the index range that was handed out.
    pub fn alloc(&mut self, len: usize) -> Range<usize> {
        let start = self.cursor;
        self.cursor += len;

        if self.cursor > self.openings.len() {
            self.openings.resize(self.cursor.next_power_of_two(), 0);
        }
        start..start + len
    }

    #[inline]
    pub fn get(&self, r: Range<usize>) -> &[i16] {
        &self.openings[r]
    }

    #[inline]
    pub fn get_mut(&mut self, r: Range<usize>) -> &mut [i16] {
        &mut self.openings[r]
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// A drawn wall kept for sprite clipping.
///
/// For portals `bounds` holds `x_r - x_l` window tops followed by as many
/// bottoms, taken once the owning sector is finished. Solid walls need none.
#[derive(Clone, Debug)]
pub struct Viswall {
    pub wall: WallId,
    pub portal: bool,
    pub x_l: i32,
    pub x_r: i32,
    pub bounds: Range<usize>,
}

/// What the geometry in front of a sprite leaves of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnClip {
    Open,
    Window(i32, i32),
    Blocked,
}

/// A billboard in view space.
#[derive(Clone, Copy, Debug)]
struct VisSprite {
    pos: Vec2,
    z: f32,
    lateral: f32,
    depth: f32,
    sprite: TextureId,
}

impl PortalRenderer {
    pub(super) fn add_viswall(&mut self, wall: WallId, w: &Wall, edge: &Edge) {
        if self.viswalls.len() >= MAX_VISWALLS {
            if !self.viswall_overflow {
                log::warn!("viswall table full ({MAX_VISWALLS}); later sprites may overdraw");
                self.viswall_overflow = true;
            }
            return;
        }
        self.viswalls.push(Viswall {
            wall,
            portal: matches!(w.portal, Portal::Sector(_)),
            x_l: edge.x_l,
            x_r: edge.x_r,
            bounds: 0..0,
        });
    }

    /// Snapshot the windows left behind the portals of the sector just
    /// finished.
    pub(super) fn record_viswall_bounds(&mut self, first: usize) {
        for i in first..self.viswalls.len() {
            let v = &self.viswalls[i];
            if !v.portal {
                continue;
            }
            let (x_l, x_r) = (v.x_l as usize, v.x_r as usize);
            let n = x_r - x_l;
            let r = self.scratch.alloc(2 * n);
            let rows = self.scratch.get_mut(r.clone());
            for (k, x) in (x_l..x_r).enumerate() {
                rows[k] = self.bands.top[x] as i16;
                rows[n + k] = self.bands.bottom[x] as i16;
            }
            self.viswalls[i].bounds = r;
        }
    }

    /// Project, sort far to near and draw every billboard standing in a
    /// sector this view passed through.
    pub(super) fn draw_sprites<R: Rasterizer>(&mut self, view: &View<'_>, rast: &mut R) {
        let near = view.cam.near();
        let mut sprites: Vec<VisSprite> = view
            .scene
            .billboards
            .iter()
            .filter(|b| self.visited.get(b.sector as usize).copied().unwrap_or(false))
            .filter_map(|b| {
                let rel = view.cam.to_cam(b.pos);
                (rel.y >= near).then_some(VisSprite {
                    pos: b.pos,
                    z: b.z,
                    lateral: rel.x,
                    depth: rel.y,
                    sprite: b.sprite,
                })
            })
            .collect();
        sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut clip = vec![ColumnClip::Open; self.width];
        for vs in &sprites {
            if self.draw_sprite(view, vs, &mut clip, rast) {
                self.stats.sprites_drawn += 1;
            }
        }
    }

    fn draw_sprite<R: Rasterizer>(
        &self,
        view: &View<'_>,
        vs: &VisSprite,
        clip: &mut [ColumnClip],
        rast: &mut R,
    ) -> bool {
        let sprite = view.scene.bank.sprite_or_missing(vs.sprite);
        let focal = view.screen.focal;
        let half_w = view.screen.half_w;
        let scale = focal / vs.depth;

        let x1 = (vs.lateral - sprite.offset_x as f32) * scale;
        let x2 = x1 + sprite.width as f32 * scale;
        let sx1 = x1.floor() as i32 + half_w;
        let sx2 = x2.floor() as i32 + half_w;
        let sw = sx2 - sx1;
        let min_x = sx1.clamp(0, view.screen.width);
        let max_x = sx2.clamp(0, view.screen.width);
        if sw <= 0 || min_x >= max_x {
            return false;
        }

        self.clip_sprite(view.scene.map, vs.pos, min_x..max_x, clip);

        let height = view.height();
        let texel_scale = Fixed::from_f32(vs.depth / focal);
        let y_off = (view.eye - vs.z - sprite.offset_y as f32) * scale;
        let mut drawn = false;

        for x in min_x..max_x {
            let window = match clip[x as usize] {
                ColumnClip::Blocked => continue,
                ColumnClip::Open => (0, height),
                ColumnClip::Window(t, b) => (t, b),
            };
            let column = (sprite.width as i32 * (x - sx1) / sw) as usize;
            let Some(posts) = sprite.columns.get(column) else {
                continue;
            };
            for post in posts {
                let yh = y_off + scale * post.top as f32;
                let yl = yh + scale * post.texels.len() as f32;
                let y_top = (yh.floor() as i32 + view.half_h as i32).clamp(window.0, window.1);
                let y_bottom = (yl.floor() as i32 + view.half_h as i32).clamp(window.0, window.1);
                if y_top >= y_bottom {
                    continue;
                }
                rast.draw_column(&ColumnSpan {
                    source: &post.texels,
                    height: NO_WRAP,
                    scale: texel_scale,
                    offset: Fixed::from_f32(-yh * vs.depth / focal),
                    x,
                    y_top,
                    y_bottom,
                });
                drawn = true;
            }
        }
        drawn
    }

    /// Fill `clip[cols]` from the viswalls the sprite stands behind.
    ///
    /// Walls are walked far to near; the first one that hides a column
    /// decides it, since a deeper portal window already lies inside every
    /// nearer one.
    fn clip_sprite(&self, map: &Map, pos: Vec2, cols: Range<i32>, clip: &mut [ColumnClip]) {
        clip[cols.start as usize..cols.end as usize].fill(ColumnClip::Open);

        for v in self.viswalls.iter().rev() {
            if v.x_r <= cols.start || v.x_l >= cols.end {
                continue;
            }
            if map.walls[v.wall as usize].point_in_front(pos) {
                continue;
            }
            let lo = v.x_l.max(cols.start);
            let hi = v.x_r.min(cols.end);
            let rows = self.scratch.get(v.bounds.clone());
            let n = (v.x_r - v.x_l) as usize;
            for x in lo..hi {
                let c = &mut clip[x as usize];
                if *c != ColumnClip::Open {
                    continue;
                }
                *c = if v.portal {
                    let k = (x - v.x_l) as usize;
                    ColumnClip::Window(rows[k] as i32, rows[n + k] as i32)
                } else {
                    ColumnClip::Blocked
                };
            }
        }
    }
}

impl View<'_> {
    #[inline]
    fn height(&self) -> i32 {
        (self.half_h * 2.0) as i32
    }
}
