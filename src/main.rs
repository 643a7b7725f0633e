//! Top-down map viewer; the sector under the mouse is highlighted.
//!
//! ```bash
//! cargo run --release --bin sectorcast -- [--pack maps.pack [--map NAME]]
//! cargo run --release --bin sectorcast -- --export demo.pack
//! ```

use anyhow::Context;
use clap::Parser;
use glam::{Vec2, vec2};
use minifb::{Key, MouseMode, Window, WindowOptions};
use std::path::PathBuf;

use sectorcast::{
    pack::{MAX_NODE_NAME, Pack, PackBuilder, load_map, map_names},
    renderer::{Framebuffer, Rasterizer, Rgba},
    world::{Map, Portal, SectorId, TextureBank, samples},
};

const WIDTH: usize = 1024;
const HEIGHT: usize = 768;

const SOLID: Rgba = 0x00_FFFFFF;
const PORTAL: Rgba = 0x00_4080FF;
const VERTEX: Rgba = 0x00_A0A0A0;
const HIGHLIGHT: Rgba = 0x00_FFD040;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Asset pack to load the map from; the built-in courtyard otherwise
    #[arg(long, value_name = "FILE")]
    pack: Option<PathBuf>,

    /// Map inside the pack (first one if omitted)
    #[arg(long, value_name = "NAME", requires = "pack")]
    map: Option<String>,

    /// Write the map and its textures to a new pack and exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let (map, bank) = match &opts.pack {
        Some(path) => {
            let pack = Pack::from_file(path).with_context(|| format!("opening {}", path.display()))?;
            let name = match &opts.map {
                Some(n) => n.clone(),
                None => map_names(&pack)?
                    .into_iter()
                    .next()
                    .context("pack holds no maps")?,
            };
            let mut bank = TextureBank::new();
            let map = load_map(&pack, &name, &mut bank).with_context(|| format!("loading map {name}"))?;
            (map, bank)
        }
        None => (samples::courtyard()?, samples::demo_bank()?),
    };

    if let Some(out) = &opts.export {
        let name: String = map.name.chars().take(MAX_NODE_NAME).collect();
        let mut b = PackBuilder::new();
        b.add_map(&name, &map, &bank)?;
        if let Some(id) = bank.sprite_id("BARREL") {
            b.add_sprite(bank.sprite(id)?)?;
        }
        b.write_to(out)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("wrote map `{name}` to {}", out.display());
        return Ok(());
    }

    let view = MapView::fit(&map);
    let mut fb = Framebuffer::new(bank.palette().clone());
    let mut win = Window::new(&format!("{} (overview)", map.name), WIDTH, HEIGHT, WindowOptions::default())?;
    win.set_target_fps(30);

    let mut shown_sector = None;

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let hovered = win.get_mouse_pos(MouseMode::Discard).and_then(|(x, y)| {
            let p = view.to_world(x, y);
            (0..map.num_sectors() as SectorId).find(|&s| map.sector_contains_point(s, p))
        });
        if hovered != shown_sector {
            match hovered {
                Some(s) => {
                    let sec = map.sector(s);
                    win.set_title(&format!(
                        "{}: sector {s} (floor {}, ceiling {})",
                        map.name, sec.floor_h, sec.ceil_h
                    ));
                }
                None => win.set_title(&format!("{} (overview)", map.name)),
            }
            shown_sector = hovered;
        }

        fb.begin_frame(WIDTH, HEIGHT);
        draw_map(&mut fb, &map, &view, hovered);
        let mut shown = Ok(());
        fb.end_frame(|px, w, h| shown = win.update_with_buffer(px, w, h));
        shown?;
    }
    Ok(())
}

/// Map space → window space, fitted with a 10 % margin, north up.
struct MapView {
    min: Vec2,
    scale: f32,
    offset: Vec2,
}

impl MapView {
    fn fit(map: &Map) -> Self {
        let (min, max) = map
            .vertices
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), v| {
                (lo.min(v.pos), hi.max(v.pos))
            });
        let size = (max - min).max(Vec2::ONE);
        let scale = (WIDTH as f32 / size.x).min(HEIGHT as f32 / size.y) * 0.9;
        let offset = (vec2(WIDTH as f32, HEIGHT as f32) - size * scale) / 2.0;
        Self { min, scale, offset }
    }

    fn to_screen(&self, p: Vec2) -> (i32, i32) {
        let s = (p - self.min) * self.scale + self.offset;
        (s.x as i32, HEIGHT as i32 - s.y as i32)
    }

    fn to_world(&self, x: f32, y: f32) -> Vec2 {
        (vec2(x, HEIGHT as f32 - y) - self.offset) / self.scale + self.min
    }
}

fn draw_map(fb: &mut Framebuffer, map: &Map, view: &MapView, hovered: Option<SectorId>) {
    for w in &map.walls {
        let (x0, y0) = view.to_screen(w.p1);
        let (x1, y1) = view.to_screen(w.p2);
        let col = match w.portal {
            Portal::Solid => SOLID,
            Portal::Sector(_) => PORTAL,
        };
        fb.draw_line(x0, y0, x1, y1, col);
    }
    if let Some(s) = hovered {
        for w in map.walls_of(s) {
            let (x0, y0) = view.to_screen(w.p1);
            let (x1, y1) = view.to_screen(w.p2);
            fb.draw_line(x0, y0, x1, y1, HIGHLIGHT);
        }
    }
    for v in &map.vertices {
        let (x, y) = view.to_screen(v.pos);
        fb.fill_square(x, y, 1, VERTEX);
    }
}
