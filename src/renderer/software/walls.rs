use crate::{
    renderer::{
        ColumnSpan, Fixed, Rasterizer,
        software::{
            PortalRenderer, View,
            projection::{ColumnCursor, ColumnStep, Edge},
        },
    },
    world::{NO_TEXTURE, Patch, Sector, TextureId, Wall},
};

/// Texture placement shared by every column of one wall section.
#[derive(Clone, Copy)]
struct Section<'a> {
    patch: Option<&'a Patch>,
    /// World height that texture row `y_off` lines up with.
    anchor: f32,
    y_off: f32,
}

impl<'a> Section<'a> {
    fn new(view: &View<'a>, tex: TextureId, anchor: f32, wall: &Wall) -> Self {
        Self {
            patch: (tex != NO_TEXTURE).then(|| view.scene.bank.patch_or_missing(tex)),
            anchor,
            y_off: wall.y_off,
        }
    }
}

impl View<'_> {
    /// Screen row of world height `h` at depth `1 / inv_z`, rounded up.
    #[inline]
    fn row(&self, h: f32, inv_z: f32) -> i32 {
        (self.half_h + (self.eye - h) * self.screen.focal * inv_z).ceil() as i32
    }
}

impl PortalRenderer {
    /// Full-height wall: draws the middle texture and closes the columns.
    pub(super) fn draw_solid<R: Rasterizer>(
        &mut self,
        view: &View<'_>,
        sector: &Sector,
        wall: &Wall,
        edge: &Edge,
        rast: &mut R,
    ) {
        let mid = Section::new(view, wall.mid, sector.ceil_h, wall);
        let step = ColumnStep::from_edge(edge);
        let mut cur = ColumnCursor::from_edge(edge, &step, &view.screen);

        for x in edge.x_l..edge.x_r {
            let col = x as usize;
            let yc = view.row(sector.ceil_h, cur.inv_z);
            let yf = view.row(sector.floor_h, cur.inv_z);
            let (top, bottom) = self.bands.window(col);
            emit(view, &mid, &cur, x, yc.clamp(top, bottom), yf.clamp(top, bottom), rast);

            self.bands.clip_ceil(col, yc);
            self.bands.clip_floor(col, yf);
            self.bands.mark_flats(col);
            self.bands.close(col);
            cur.advance(&step);
        }
    }

    /// Portal: draws the upper wall where the neighbour's ceiling is lower
    /// and the lower wall where its floor is higher, leaving the opening in
    /// between as the window for the neighbour.
    pub(super) fn draw_portal<R: Rasterizer>(
        &mut self,
        view: &View<'_>,
        sector: &Sector,
        next: &Sector,
        wall: &Wall,
        edge: &Edge,
        rast: &mut R,
    ) {
        let upper = (next.ceil_h < sector.ceil_h)
            .then(|| Section::new(view, wall.top, next.ceil_h, wall));
        let lower = (next.floor_h > sector.floor_h)
            .then(|| Section::new(view, wall.bottom, next.floor_h, wall));
        let step = ColumnStep::from_edge(edge);
        let mut cur = ColumnCursor::from_edge(edge, &step, &view.screen);

        for x in edge.x_l..edge.x_r {
            let col = x as usize;
            let yc = view.row(sector.ceil_h, cur.inv_z);
            let yf = view.row(sector.floor_h, cur.inv_z);
            self.bands.clip_ceil(col, yc);
            self.bands.clip_floor(col, yf);
            self.bands.mark_flats(col);

            if let Some(s) = &upper {
                let (top, bottom) = self.bands.window(col);
                let y = view.row(next.ceil_h, cur.inv_z);
                emit(view, s, &cur, x, top, y.clamp(top, bottom), rast);
                self.bands.clip_ceil(col, y);
            }
            if let Some(s) = &lower {
                let (top, bottom) = self.bands.window(col);
                let y = view.row(next.floor_h, cur.inv_z);
                emit(view, s, &cur, x, y.clamp(top, bottom), bottom, rast);
                self.bands.clip_floor(col, y);
            }
            cur.advance(&step);
        }
    }
}

/// Hand one textured column to the rasterizer, if it covers any row.
fn emit<R: Rasterizer>(
    view: &View<'_>,
    s: &Section<'_>,
    cur: &ColumnCursor,
    x: i32,
    y_top: i32,
    y_bottom: i32,
    rast: &mut R,
) {
    let Some(patch) = s.patch else { return };
    if y_top >= y_bottom {
        return;
    }
    // texels per row = depth / focal
    let scale = 1.0 / (view.screen.focal * cur.inv_z);
    rast.draw_column(&ColumnSpan {
        source: patch.column(cur.u().floor() as i32),
        height: patch.height as u32,
        scale: Fixed::from_f32(scale),
        offset: Fixed::from_f32(s.y_off + s.anchor - view.eye),
        x,
        y_top,
        y_bottom,
    });
}

#[cfg(test)]
mod tests {
    use crate::renderer::software::{PortalRenderer, Scene};
    use crate::renderer::{Rasterizer, testing::Recorder};
    use crate::world::{Camera, samples};
    use glam::vec3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn wall_height_halves_with_distance() {
        let map = samples::square(256.0).unwrap();
        let bank = samples::demo_bank().unwrap();
        let scene = Scene {
            map: &map,
            bank: &bank,
            billboards: &[],
        };
        let mut r = PortalRenderer::new(200, 200, FRAC_PI_2);
        let mut rec = Recorder::default();
        let height_at = |r: &mut PortalRenderer, rec: &mut Recorder, x: f32| {
            rec.begin_frame(200, 200);
            let cam = Camera::new(vec3(x, 128.0, 64.0), 0.0, FRAC_PI_2);
            r.render(&scene, &cam, 0, rec);
            let c = rec.columns.iter().find(|c| c.x == 100).copied().unwrap();
            c.y_bottom - c.y_top
        };
        // the east wall at 64 and 128 units: 128 tall, eye half-way up
        let near = height_at(&mut r, &mut rec, 192.0);
        let far = height_at(&mut r, &mut rec, 128.0);
        assert!((near - 2 * far).abs() <= 2, "near {near} far {far}");
        assert_eq!(near, 200);
    }

    #[test]
    fn missing_texture_leaves_bands_intact() {
        let mut b = crate::world::MapBuilder::new("bare");
        b.walls(0, 0, 0).flats(samples::TILE, samples::PLASTER);
        b.sector(0.0, 64.0, &[
            glam::vec2(0.0, 0.0),
            glam::vec2(0.0, 64.0),
            glam::vec2(64.0, 64.0),
            glam::vec2(64.0, 0.0),
        ]);
        let map = b.build().unwrap();
        let bank = samples::demo_bank().unwrap();
        let scene = Scene {
            map: &map,
            bank: &bank,
            billboards: &[],
        };
        let mut r = PortalRenderer::new(64, 48, FRAC_PI_2);
        let mut rec = Recorder::default();
        rec.begin_frame(64, 48);
        let cam = Camera::new(vec3(32.0, 32.0, 32.0), 0.0, FRAC_PI_2);
        let stats = r.render(&scene, &cam, 0, &mut rec);
        assert!(stats.walls_drawn > 0);
        assert!(rec.columns.is_empty());
        assert!(!rec.spans.is_empty());
    }
}
