//! ---------------------------------------------------------------------------
//! CPU frame-buffer back-end
//!
//! * Fills a `Vec<u32>` in **0x00RRGGBB** format, row-major.
//! * Texels are shade indices; the [`Palette`] turns them into colours.
//! * Every write is bounds-checked against the buffer, so spans computed
//!   for a larger viewport are cropped rather than trusted.
//! ---------------------------------------------------------------------------

use crate::{
    renderer::{ColumnSpan, FlatSpan, Rasterizer, Rgba},
    world::{FLAT_SIZE, Palette},
};

const CLEAR_COLOUR: Rgba = 0x20_2020;

pub struct Framebuffer {
    pixels: Vec<Rgba>,
    width: usize,
    height: usize,
    palette: Palette,
}

impl Framebuffer {
    pub fn new(palette: Palette) -> Self {
        Self {
            pixels: Vec::new(),
            width: 0,
            height: 0,
            palette,
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
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn clear(&mut self, col: Rgba) {
        self.pixels.fill(col);
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, col: Rgba) {
        if (0..self.width as i32).contains(&x) && (0..self.height as i32).contains(&y) {
            self.pixels[y as usize * self.width + x as usize] = col;
        }
    }

    /// Bresenham line, clipped per pixel. Used by the map overview.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, col: Rgba) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x, y, col);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Filled axis-aligned square centred on (`x`, `y`).
    pub fn fill_square(&mut self, x: i32, y: i32, half: i32, col: Rgba) {
        for py in y - half..=y + half {
            for px in x - half..=x + half {
                self.put_pixel(px, py, col);
            }
        }
    }
}

impl Rasterizer for Framebuffer {
    fn begin_frame(&mut self, w: usize, h: usize) {
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.pixels.resize(w * h, 0);
        }
        self.pixels.fill(CLEAR_COLOUR);
    }

    fn draw_column(&mut self, dc: &ColumnSpan<'_>) {
        if dc.x < 0 || dc.x >= self.width as i32 || dc.source.is_empty() {
            return;
        }
        let y0 = dc.y_top.max(0);
        let y1 = dc.y_bottom.min(self.height as i32);
        let half = self.height as i32 / 2;

        let mut frac = dc.scale * (y0 - half) + dc.offset;
        for y in y0..y1 {
            if let Some(&t) = dc.source.get(frac.wrap(dc.height)) {
                self.pixels[y as usize * self.width + dc.x as usize] = self.palette[t];
            }
            frac += dc.scale;
        }
    }

    fn draw_span(&mut self, ds: &FlatSpan<'_>) {
        if ds.y < 0 || ds.y >= self.height as i32 {
            return;
        }
        let x0 = ds.x_left.max(0);
        let x1 = ds.x_right.min(self.width as i32);
        let skip = x0 - ds.x_left;
        let mut xf = ds.x_frac + ds.x_step * skip;
        let mut yf = ds.y_frac + ds.y_step * skip;
        let row = ds.y as usize * self.width;

        for x in x0..x1 {
            let i = yf.wrap(FLAT_SIZE as u32) * FLAT_SIZE + xf.wrap(FLAT_SIZE as u32);
            if let Some(&t) = ds.source.get(i) {
                self.pixels[row + x as usize] = self.palette[t];
            }
            xf += ds.x_step;
            yf += ds.y_step;
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.pixels, self.width, self.height);
    }
}
