//! ---------------------------------------------------------------------------
//! Portal renderer
//!
//! * Starts in the viewer's sector with the whole screen as its window and
//!   walks neighbouring sectors through portals on an explicit stack.
//! * Every frame carries its own left/right screen bounds; walls are
//!   clipped against them, so nothing is drawn twice and no Z-buffer is
//!   needed.
//! * Per-column top/bottom bands narrow as portals are crossed; floors and
//!   ceilings fill the strip each sector newly covers.
//! * Walls drawn on the way are kept as viswalls so the sprite pass can
//!   clip billboards against the geometry in front of them.
//!
//! Termination on cyclic portal graphs is guaranteed by the depth cap
//! alone; a portal seen through itself keeps its bounds.
//! ---------------------------------------------------------------------------

use std::ops::Range;

use smallvec::{SmallVec, smallvec};

use crate::{
    renderer::{Billboard, Rasterizer},
    world::{Camera, Map, Portal, SectorId, TextureBank},
};

mod planes;
mod projection;
mod sprites;
mod walls;

use projection::{Screen, clip_wall};
use sprites::{FrameScratch, Viswall};

pub const MAX_SECTOR_DEPTH: usize = 32;
pub const MAX_VISWALLS: usize = 128;

/// Counters for one rendered view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Sector frames popped off the stack.
    pub frames: usize,
    /// Deepest frame processed; the start sector is depth 0.
    pub max_depth: usize,
    /// Wall sections that survived clipping.
    pub walls_drawn: usize,
    pub sprites_drawn: usize,
}

/// Everything a view is rendered from, apart from the camera.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub map: &'a Map,
    pub bank: &'a TextureBank,
    pub billboards: &'a [Billboard],
}

/// One pending sector and the screen window it is seen through.
#[derive(Clone, Copy, Debug)]
struct Frame {
    sector: SectorId,
    left: f32,
    right: f32,
    depth: usize,
}

/// Per-frame view constants.
#[derive(Clone, Copy)]
struct View<'a> {
    scene: Scene<'a>,
    cam: &'a Camera,
    screen: Screen,
    half_h: f32,
    eye: f32,
}

/// Per-column vertical state, in screen rows.
///
/// `top..bottom` is the part of the column still open to farther sectors.
/// `prev_*` hold the window the current sector was entered with and
/// `ceil_edge`/`floor_edge` where its walls start, so the flats fill
/// exactly the strips in between.
#[derive(Default)]
struct ClipBands {
    top: Vec<i32>,
    bottom: Vec<i32>,
    prev_top: Vec<i32>,
    prev_bottom: Vec<i32>,
    ceil_edge: Vec<i32>,
    floor_edge: Vec<i32>,
    height: i32,
}

impl ClipBands {
    fn reset(&mut self, width: usize, height: usize) {
        let h = height as i32;
        self.height = h;
        for band in [&mut self.top, &mut self.prev_top, &mut self.ceil_edge] {
            band.clear();
            band.resize(width, 0);
        }
        for band in [&mut self.bottom, &mut self.prev_bottom, &mut self.floor_edge] {
            band.clear();
            band.resize(width, h);
        }
    }

    fn enter_sector(&mut self, cols: Range<i32>) {
        for x in cols.map(|x| x as usize) {
            self.prev_top[x] = self.top[x];
            self.prev_bottom[x] = self.bottom[x];
            self.ceil_edge[x] = self.top[x];
            self.floor_edge[x] = self.bottom[x];
        }
    }

    #[inline]
    fn window(&self, x: usize) -> (i32, i32) {
        (self.top[x], self.bottom[x])
    }

    /// Lower the top of the window to `y`.
    #[inline]
    fn clip_ceil(&mut self, x: usize, y: i32) {
        let v = y.clamp(0, self.height).min(self.bottom[x]);
        self.top[x] = self.top[x].max(v);
    }

    /// Raise the bottom of the window to `y`.
    #[inline]
    fn clip_floor(&mut self, x: usize, y: i32) {
        let v = y.clamp(0, self.height).max(self.top[x]);
        self.bottom[x] = self.bottom[x].min(v);
    }

    /// Remember where this sector's flats end.
    #[inline]
    fn mark_flats(&mut self, x: usize) {
        self.ceil_edge[x] = self.top[x];
        self.floor_edge[x] = self.bottom[x];
    }

    #[inline]
    fn close(&mut self, x: usize) {
        self.top[x] = self.bottom[x];
    }
}

pub struct PortalRenderer {
    width: usize,
    height: usize,
    fov: f32,
    bands: ClipBands,
    viswalls: Vec<Viswall>,
    viswall_overflow: bool,
    scratch: FrameScratch,
    /// Sectors drawn this view; only their billboards can be visible.
    visited: Vec<bool>,
    /// Row → column where the open flat span on that row started.
    span_start: Vec<i32>,
    stats: RenderStats,
}

impl PortalRenderer {
    pub fn new(width: usize, height: usize, fov: f32) -> Self {
        Self {
            width,
            height,
            fov,
            bands: ClipBands::default(),
            viswalls: Vec::with_capacity(MAX_VISWALLS),
            viswall_overflow: false,
            scratch: FrameScratch::default(),
            visited: Vec::new(),
            span_start: vec![0; height],
            stats: RenderStats::default(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.span_start.resize(height, 0);
    }

    /// Draw the view from `cam`, standing in `sector`, then its sprites.
    ///
    /// The caller brackets this with `begin_frame`/`end_frame` on `rast`.
    pub fn render<R: Rasterizer>(
        &mut self,
        scene: &Scene<'_>,
        cam: &Camera,
        sector: SectorId,
        rast: &mut R,
    ) -> RenderStats {
        let half_w = (self.width / 2) as i32;
        let view = View {
            scene: *scene,
            cam,
            screen: Screen {
                width: self.width as i32,
                half_w,
                focal: cam.screen_scale(self.width),
            },
            half_h: (self.height / 2) as f32,
            eye: cam.eye_z(),
        };
        self.begin_view(scene.map.num_sectors());

        let mut stack: SmallVec<[Frame; MAX_SECTOR_DEPTH]> = smallvec![Frame {
            sector,
            left: -half_w as f32,
            right: (self.width as i32 - half_w) as f32,
            depth: 0,
        }];
        let mut capped = false;

        while let Some(frame) = stack.pop() {
            self.stats.frames += 1;
            self.stats.max_depth = self.stats.max_depth.max(frame.depth);
            if let Some(v) = self.visited.get_mut(frame.sector as usize) {
                *v = true;
            }

            let cols = view.screen.column(frame.left)..view.screen.column(frame.right);
            self.bands.enter_sector(cols.clone());
            let first_viswall = self.viswalls.len();
            let map = scene.map;

            for (i, wall) in map.walls_of(frame.sector).iter().enumerate() {
                let Some(edge) = clip_wall(cam, &view.screen, wall, frame.left, frame.right) else {
                    continue;
                };
                self.stats.walls_drawn += 1;
                let here = map.sector(frame.sector);

                match wall.portal {
                    Portal::Solid => self.draw_solid(&view, here, wall, &edge, rast),
                    Portal::Sector(next) => {
                        self.draw_portal(&view, here, map.sector(next), wall, &edge, rast);
                        if frame.depth + 1 < MAX_SECTOR_DEPTH {
                            stack.push(Frame {
                                sector: next,
                                left: edge.sx_l,
                                right: edge.sx_r,
                                depth: frame.depth + 1,
                            });
                        } else if !capped {
                            log::warn!(
                                "portal depth cap {MAX_SECTOR_DEPTH} reached at sector {next}"
                            );
                            capped = true;
                        }
                    }
                }
                self.add_viswall(map.wall_id(frame.sector, i), wall, &edge);
            }

            self.record_viswall_bounds(first_viswall);
            self.draw_flats(&view, map.sector(frame.sector), cols, rast);
        }

        self.draw_sprites(&view, rast);
        log::debug!("{:?}", self.stats);
        self.stats
    }

    fn begin_view(&mut self, num_sectors: usize) {
        self.bands.reset(self.width, self.height);
        self.viswalls.clear();
        self.viswall_overflow = false;
        self.scratch.reset();
        self.visited.clear();
        self.visited.resize(num_sectors, false);
        self.stats = RenderStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{NO_WRAP, testing::Recorder};
    use crate::world::samples;
    use glam::{Vec3, vec2, vec3};
    use std::f32::consts::FRAC_PI_2;

    const W: usize = 160;
    const H: usize = 100;

    fn render(
        map: &Map,
        billboards: &[Billboard],
        pos: Vec3,
        yaw: f32,
        sector: SectorId,
    ) -> (RenderStats, Recorder) {
        let bank = samples::demo_bank().unwrap();
        let scene = Scene {
            map,
            bank: &bank,
            billboards,
        };
        let mut r = PortalRenderer::new(W, H, FRAC_PI_2);
        let mut rec = Recorder::default();
        rec.begin_frame(W, H);
        let cam = Camera::new(pos, yaw, FRAC_PI_2);
        let stats = r.render(&scene, &cam, sector, &mut rec);
        (stats, rec)
    }

    #[test]
    fn closed_room_covers_every_pixel_once() {
        let map = samples::square(64.0).unwrap();
        let (stats, rec) = render(&map, &[], vec3(32.0, 24.0, 32.0), 0.3, 0);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.max_depth, 0);
        assert!(stats.walls_drawn >= 2);
        assert!(rec.coverage().iter().all(|&n| n == 1));
        assert!(!rec.spans.is_empty());
    }

    #[test]
    fn stepped_portal_covers_every_pixel_once() {
        let map = samples::two_rooms(16.0).unwrap();
        let (stats, rec) = render(&map, &[], vec3(20.0, 32.0, 32.0), 0.1, 0);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.max_depth, 1);
        assert!(rec.coverage().iter().all(|&n| n == 1));
    }

    #[test]
    fn courtyard_never_overdraws() {
        let map = samples::courtyard().unwrap();
        let start = samples::COURTYARD_START;
        let (stats, rec) = render(&map, &[], start.extend(32.0), 0.0, 0);
        assert!(stats.frames > 1);
        assert!(rec.coverage().iter().all(|&n| n <= 1));
    }

    #[test]
    fn looking_away_from_portal_draws_one_sector() {
        let map = samples::two_rooms(0.0).unwrap();
        let (stats, _) = render(&map, &[], vec3(32.0, 32.0, 32.0), std::f32::consts::PI, 0);
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn mirror_portal_stops_at_depth_cap() {
        let map = samples::mirror_rooms().unwrap();
        let (stats, rec) = render(&map, &[], vec3(32.0, 32.0, 32.0), 0.0, 0);
        assert_eq!(stats.max_depth, MAX_SECTOR_DEPTH - 1);
        assert!(stats.frames >= MAX_SECTOR_DEPTH);
        assert!(rec.coverage().iter().all(|&n| n <= 1));
    }

    #[test]
    fn three_way_cycle_terminates_without_overdraw() {
        let map = samples::triangle_fan().unwrap();
        // inside each fan sector, near the shared centre
        let eyes = [
            (vec2(32.0, 44.0), 0),
            (vec2(64.0, 44.0), 1),
            (vec2(48.0, 12.0), 2),
            (vec2(40.0, 36.0), 0),
        ];
        for (eye, sector) in eyes {
            assert!(map.sector_contains_point(sector, eye));
            for i in 0..16 {
                let yaw = i as f32 * std::f32::consts::TAU / 16.0;
                let (stats, rec) = render(&map, &[], eye.extend(32.0), yaw, sector);
                // a convex root is never re-entered; each neighbour at most twice
                assert!(stats.max_depth <= 2, "{stats:?} at {eye} yaw {yaw}");
                assert!(stats.frames <= 5, "{stats:?} at {eye} yaw {yaw}");
                assert!(!rec.columns.is_empty());
                assert!(rec.coverage().iter().all(|&n| n <= 1));
            }
        }
    }

    #[test]
    fn upper_and_lower_walls_frame_the_opening() {
        // hall (ceiling 128) looking into the first stair (16..112)
        let map = samples::courtyard().unwrap();
        let (_, rec) = render(&map, &[], vec3(150.0, 96.0, 32.0), 0.0, 0);
        let centre = (W / 2) as i32;
        let mut column: Vec<_> = rec.columns.iter().filter(|c| c.x == centre).collect();
        column.sort_by_key(|c| c.y_top);
        // upper step, lower step and farther walls; nothing overlaps
        assert!(column.len() >= 3);
        for pair in column.windows(2) {
            assert!(pair[0].y_bottom <= pair[1].y_top);
        }
    }

    #[test]
    fn billboard_in_view_is_drawn() {
        let map = samples::two_rooms(0.0).unwrap();
        let b = [Billboard {
            pos: vec2(96.0, 32.0),
            z: 0.0,
            sector: 1,
            sprite: samples::BARREL,
        }];
        let (stats, rec) = render(&map, &b, vec3(16.0, 32.0, 32.0), 0.0, 0);
        assert_eq!(stats.sprites_drawn, 1);
        let sprite_cols = rec.columns.iter().filter(|c| c.height == NO_WRAP).count();
        assert!(sprite_cols > 0);
    }

    #[test]
    fn billboard_in_unseen_sector_is_skipped() {
        let map = samples::two_rooms(0.0).unwrap();
        let b = [Billboard {
            pos: vec2(96.0, 32.0),
            z: 0.0,
            sector: 1,
            sprite: samples::BARREL,
        }];
        // facing west, room 1 is behind the viewer
        let (stats, _) = render(&map, &b, vec3(32.0, 32.0, 32.0), std::f32::consts::PI, 0);
        assert_eq!(stats.sprites_drawn, 0);
    }

    #[test]
    fn renderer_state_resets_between_views() {
        let map = samples::courtyard().unwrap();
        let bank = samples::demo_bank().unwrap();
        let scene = Scene {
            map: &map,
            bank: &bank,
            billboards: &[],
        };
        let mut r = PortalRenderer::new(W, H, FRAC_PI_2);
        let cam = Camera::new(samples::COURTYARD_START.extend(32.0), 0.0, FRAC_PI_2);
        let mut rec = Recorder::default();
        rec.begin_frame(W, H);
        let first = r.render(&scene, &cam, 0, &mut rec);
        let first_cols = rec.columns.len();
        rec.begin_frame(W, H);
        let second = r.render(&scene, &cam, 0, &mut rec);
        assert_eq!(first, second);
        assert_eq!(first_cols, rec.columns.len());
    }
}
