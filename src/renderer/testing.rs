//! Rasterizer that records spans instead of pixels.

use super::{ColumnSpan, FlatSpan, Rasterizer, Rgba};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnRec {
    pub x: i32,
    pub y_top: i32,
    pub y_bottom: i32,
    pub texels: usize,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanRec {
    pub y: i32,
    pub x_left: i32,
    pub x_right: i32,
}

#[derive(Default)]
pub struct Recorder {
    pub width: usize,
    pub height: usize,
    pub columns: Vec<ColumnRec>,
    pub spans: Vec<SpanRec>,
}

impl Recorder {
    /// How many times each pixel was written, row-major.
    pub fn coverage(&self) -> Vec<u32> {
        let mut hits = vec![0u32; self.width * self.height];
        for c in &self.columns {
            for y in c.y_top..c.y_bottom {
                hits[y as usize * self.width + c.x as usize] += 1;
            }
        }
        for s in &self.spans {
            for x in s.x_left..s.x_right {
                hits[s.y as usize * self.width + x as usize] += 1;
            }
        }
        hits
    }
}

impl Rasterizer for Recorder {
    fn begin_frame(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.columns.clear();
        self.spans.clear();
    }

    fn draw_column(&mut self, span: &ColumnSpan<'_>) {
        assert!(span.y_top < span.y_bottom, "empty column {span:?}");
        assert!((0..self.width as i32).contains(&span.x));
        assert!(span.y_top >= 0 && span.y_bottom <= self.height as i32);
        self.columns.push(ColumnRec {
            x: span.x,
            y_top: span.y_top,
            y_bottom: span.y_bottom,
            texels: span.source.len(),
            height: span.height,
        });
    }

    fn draw_span(&mut self, span: &FlatSpan<'_>) {
        assert!(span.x_left < span.x_right, "empty span {span:?}");
        assert!(span.x_left >= 0 && span.x_right <= self.width as i32);
        assert!((0..self.height as i32).contains(&span.y));
        self.spans.push(SpanRec {
            y: span.y,
            x_left: span.x_left,
            x_right: span.x_right,
        });
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&[], self.width, self.height);
    }
}
