use std::ops::Range;

use crate::{
    renderer::{
        FlatSpan, Fixed, Rasterizer,
        software::{PortalRenderer, View},
    },
    world::{Flat, NO_TEXTURE, Sector},
};

/// Column interval that never opens or closes a row.
const EMPTY: (i32, i32) = (i32::MAX, i32::MIN);

impl PortalRenderer {
    /// Fill the ceiling strip `prev_top..ceil_edge` and the floor strip
    /// `floor_edge..prev_bottom` of every column in `cols`.
    pub(super) fn draw_flats<R: Rasterizer>(
        &mut self,
        view: &View<'_>,
        sector: &Sector,
        cols: Range<i32>,
        rast: &mut R,
    ) {
        let bank = view.scene.bank;
        let b = &self.bands;

        if sector.ceil_tex != NO_TEXTURE {
            let flat = bank.flat_or_missing(sector.ceil_tex);
            make_spans(cols.clone(), &b.prev_top, &b.ceil_edge, &mut self.span_start, |y, x0, x1| {
                flat_span(view, flat, sector.ceil_h, y, x0, x1, rast)
            });
        }
        if sector.floor_tex != NO_TEXTURE {
            let flat = bank.flat_or_missing(sector.floor_tex);
            make_spans(cols, &b.floor_edge, &b.prev_bottom, &mut self.span_start, |y, x0, x1| {
                flat_span(view, flat, sector.floor_h, y, x0, x1, rast)
            });
        }
    }
}

/// Turn per-column row intervals `tops[x]..bottoms[x]` into horizontal
/// spans: a row opens where it enters the interval and is emitted as
/// `(y, start, x)` when it leaves.
fn make_spans<F>(cols: Range<i32>, tops: &[i32], bottoms: &[i32], start: &mut [i32], mut emit: F)
where
    F: FnMut(i32, i32, i32),
{
    let mut old = EMPTY;
    for x in cols.start..=cols.end {
        let new = if x < cols.end {
            let (t, b) = (tops[x as usize], bottoms[x as usize]);
            if t < b { (t, b) } else { EMPTY }
        } else {
            EMPTY
        };

        let (mut t1, mut b1) = old;
        let (mut t2, mut b2) = new;
        while t1 < t2 && t1 < b1 {
            emit(t1, start[t1 as usize], x);
            t1 += 1;
        }
        while b1 > b2 && b1 > t1 {
            b1 -= 1;
            emit(b1, start[b1 as usize], x);
        }
        while t2 < t1 && t2 < b2 {
            start[t2 as usize] = x;
            t2 += 1;
        }
        while b2 > b1 && b2 > t2 {
            b2 -= 1;
            start[b2 as usize] = x;
        }
        old = new;
    }
}

/// Map row `y` of a plane at height `plane` to world-aligned flat texels.
fn flat_span<R: Rasterizer>(
    view: &View<'_>,
    flat: &Flat,
    plane: f32,
    y: i32,
    x_left: i32,
    x_right: i32,
    rast: &mut R,
) {
    let focal = view.screen.focal;
    let dy = y as f32 + 0.5 - view.half_h;
    let z = focal * (view.eye - plane) / dy;
    if !(z > 0.0 && z.is_finite()) {
        return;
    }
    let lateral = view.screen.offset(x_left) * z / focal;
    let cam = view.cam;
    let at = cam.pos().truncate() + cam.forward() * z + cam.right() * lateral;
    let step = cam.right() * (z / focal);

    rast.draw_span(&FlatSpan {
        source: &flat.texels,
        x_step: Fixed::from_f32(step.x),
        y_step: Fixed::from_f32(step.y),
        x_frac: Fixed::from_f32(at.x),
        y_frac: Fixed::from_f32(at.y),
        x_left,
        x_right,
        y,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(tops: &[i32], bottoms: &[i32]) -> Vec<(i32, i32, i32)> {
        let mut start = vec![0; 16];
        let mut out = Vec::new();
        make_spans(0..tops.len() as i32, tops, bottoms, &mut start, |y, a, b| {
            out.push((y, a, b))
        });
        out.sort();
        out
    }

    #[test]
    fn rectangle_becomes_one_span_per_row() {
        assert_eq!(spans(&[2, 2, 2], &[4, 4, 4]), vec![(2, 0, 3), (3, 0, 3)]);
    }

    #[test]
    fn staircase_edges() {
        // row 1 only in column 0, row 3 opens at column 1
        assert_eq!(
            spans(&[1, 2, 2], &[3, 4, 4]),
            vec![(1, 0, 1), (2, 0, 3), (3, 1, 3)]
        );
    }

    #[test]
    fn gaps_and_disjoint_runs() {
        let got = spans(&[0, 5, 5, 0], &[2, 5, 7, 2]);
        assert_eq!(got, vec![(0, 0, 1), (0, 3, 4), (1, 0, 1), (1, 3, 4), (5, 2, 3), (6, 2, 3)]);
    }

    #[test]
    fn every_cell_is_emitted_once() {
        let tops = [3, 1, 6, 0, 0, 4, 9, 2];
        let bottoms = [8, 2, 9, 12, 1, 4, 15, 3];
        let mut hits = vec![vec![0; 8]; 16];
        for (y, a, b) in spans(&tops, &bottoms) {
            for x in a..b {
                hits[y as usize][x as usize] += 1;
            }
        }
        for x in 0..8 {
            for y in 0..16 {
                let inside = (tops[x]..bottoms[x]).contains(&(y as i32));
                assert_eq!(hits[y][x], inside as i32, "x {x} y {y}");
            }
        }
    }
}
