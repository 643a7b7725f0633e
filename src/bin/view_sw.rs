//! First-person software view of a sector map.
//!
//! ```bash
//! cargo run --release --bin view_sw -- [--pack maps.pack [--map NAME]]
//! ```
//!
//! Arrows / WASD move and turn, Alt + arrows strafe, Shift runs,
//! E / Q fly up and down.

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use minifb::{Key, Scale, Window, WindowOptions};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use sectorcast::{
    pack::{Pack, load_map, load_textures, map_names},
    renderer::{
        DEFAULT_FOV, DEFAULT_HEIGHT, DEFAULT_WIDTH, Framebuffer, PortalRenderer, Rasterizer,
        Scene, render_viewpoint,
    },
    sim::{InputCmd, TicRunner},
    world::{Map, NO_TEXTURE, SectorId, TextureBank, samples},
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Asset pack to load the map from; the built-in courtyard otherwise
    #[arg(long, value_name = "FILE")]
    pack: Option<PathBuf>,

    /// Map inside the pack (first one if omitted)
    #[arg(long, value_name = "NAME", requires = "pack")]
    map: Option<String>,

    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,

    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,

    /// Window pixels per rendered pixel
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
    scale: u8,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let (map, bank, start) = match &opts.pack {
        Some(path) => {
            let pack = Pack::from_file(path).with_context(|| format!("opening {}", path.display()))?;
            let mut bank = TextureBank::new();
            load_textures(&pack, &mut bank)?;
            let name = match &opts.map {
                Some(n) => n.clone(),
                None => map_names(&pack)?
                    .into_iter()
                    .next()
                    .context("pack holds no maps")?,
            };
            let map = load_map(&pack, &name, &mut bank).with_context(|| format!("loading map {name}"))?;
            let start = centroid(&map, 0);
            (map, bank, start)
        }
        None => (samples::courtyard()?, samples::demo_bank()?, samples::COURTYARD_START),
    };
    println!("map: {} ({} sectors)", map.name, map.sectors.len());

    let mut sim = TicRunner::new(&map);
    let player = sim.spawn_player(&map, start, 0.0);
    let home = sim.actor(player).map_or(0, |a| a.sector);

    // one barrel in the middle of every other sector
    let barrel = bank.sprite_id("BARREL").unwrap_or(NO_TEXTURE);
    for s in 0..map.num_sectors() as SectorId {
        if s != home {
            sim.spawn_billboard(&map, centroid(&map, s), barrel);
        }
    }

    let (w, h) = (opts.width, opts.height);
    let mut renderer = PortalRenderer::new(w, h, DEFAULT_FOV);
    let mut fb = Framebuffer::new(bank.palette().clone());

    let scale = match opts.scale {
        1 => Scale::X1,
        2 => Scale::X2,
        _ => Scale::X4,
    };
    let mut win = Window::new(
        &format!("sectorcast: {}", map.name),
        w,
        h,
        WindowOptions {
            scale,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(35);

    // ────────────────── benchmarking state ──────────────────────────────
    let clock = Instant::now();
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let cmd = read_input(&win);
        sim.pump(&map, cmd);

        let Some(actor) = sim.actor(player) else {
            break;
        };
        let billboards = sim.billboards();
        let scene = Scene {
            map: &map,
            bank: &bank,
            billboards: &billboards,
        };

        let t0 = Instant::now();
        fb.begin_frame(w, h);
        render_viewpoint(
            &mut renderer,
            &scene,
            &actor,
            clock.elapsed().as_millis() as u64,
            &mut fb,
        );
        acc_time += t0.elapsed();
        acc_frames += 1;

        let mut shown = Ok(());
        fb.end_frame(|px, w, h| shown = win.update_with_buffer(px, w, h));
        shown?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            println!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// One `InputCmd` from the keys held right now.
fn read_input(win: &Window) -> InputCmd {
    let down = |k| win.is_key_down(k);
    let mut cmd = InputCmd::default();

    if down(Key::Up) || down(Key::W) {
        cmd.forward += 1.0;
    }
    if down(Key::Down) || down(Key::S) {
        cmd.forward -= 1.0;
    }

    if down(Key::LeftAlt) || down(Key::RightAlt) {
        /* Alt + ←/→  = strafe */
        if down(Key::Left) {
            cmd.strafe -= 1.0;
        }
        if down(Key::Right) {
            cmd.strafe += 1.0;
        }
    } else {
        if down(Key::Left) {
            cmd.turn += 1.0;
        }
        if down(Key::Right) {
            cmd.turn -= 1.0;
        }
    }
    if down(Key::A) {
        cmd.strafe -= 1.0;
    }
    if down(Key::D) {
        cmd.strafe += 1.0;
    }

    if down(Key::E) {
        cmd.fly += 1.0;
    }
    if down(Key::Q) {
        cmd.fly -= 1.0;
    }
    cmd.run = down(Key::LeftShift) || down(Key::RightShift);
    cmd
}

/// Mean of a sector's corners; inside it, since sectors are convex.
fn centroid(map: &Map, sector: SectorId) -> Vec2 {
    let walls = map.walls_of(sector);
    walls.iter().map(|w| w.p1).sum::<Vec2>() / walls.len() as f32
}
