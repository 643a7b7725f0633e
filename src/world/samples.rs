//! Built-in maps and a procedural texture bank, so the binaries and tests
//! run without a pack file.

use glam::{Vec2, vec2};

use super::{
    Map, MapBuilder, MapError, TextureId,
    texture::{FLAT_SIZE, Flat, Patch, Post, Sprite, TextureBank, TextureError},
};

pub const BRICK: TextureId = 1;
pub const TRIM: TextureId = 2;
pub const TILE: TextureId = 1;
pub const PLASTER: TextureId = 2;
pub const BARREL: TextureId = 1;

/// Inside the north arm of the courtyard's pillar loop.
pub const COURTYARD_GALLERY_CENTER: Vec2 = vec2(288.0, 480.0);
/// Where `view_sw` puts the player in the courtyard.
pub const COURTYARD_START: Vec2 = vec2(96.0, 96.0);

fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> [Vec2; 4] {
    [vec2(x0, y0), vec2(x0, y1), vec2(x1, y1), vec2(x1, y0)]
}

/// One closed square room `size` wide.
pub fn square(size: f32) -> Result<Map, MapError> {
    let mut b = MapBuilder::new("square");
    b.walls(TRIM, BRICK, TRIM).flats(TILE, PLASTER);
    b.sector(0.0, 128.0, &rect(0.0, 0.0, size, size));
    b.build()
}

/// Two 64x64 rooms joined along x = 64; the east one has its floor at
/// `step`.
pub fn two_rooms(step: f32) -> Result<Map, MapError> {
    let mut b = MapBuilder::new("two_rooms");
    b.walls(TRIM, BRICK, TRIM).flats(TILE, PLASTER);
    b.sector(0.0, 128.0, &rect(0.0, 0.0, 64.0, 64.0));
    b.sector(step, 128.0, &rect(64.0, 0.0, 128.0, 64.0));
    b.build()
}

/// Triangle split at its centroid: three sectors, each adjacent to both
/// others.
pub fn triangle_fan() -> Result<Map, MapError> {
    let (a, b, c) = (vec2(0.0, 0.0), vec2(48.0, 96.0), vec2(96.0, 0.0));
    let mid = vec2(48.0, 32.0);
    let mut mb = MapBuilder::new("triangle_fan");
    mb.walls(TRIM, BRICK, TRIM).flats(TILE, PLASTER);
    mb.sector(0.0, 64.0, &[a, b, mid]);
    mb.sector(0.0, 64.0, &[b, c, mid]);
    mb.sector(0.0, 64.0, &[c, a, mid]);
    mb.build()
}

/// Two rooms whose far portal leads back into the first one. Every view
/// through it repeats forever, so only the depth cap ends the walk.
pub fn mirror_rooms() -> Result<Map, MapError> {
    let mut b = MapBuilder::new("mirror_rooms");
    b.walls(TRIM, BRICK, TRIM).flats(TILE, PLASTER);
    b.sector(0.0, 128.0, &rect(0.0, 0.0, 64.0, 64.0));
    b.sector(0.0, 128.0, &rect(64.0, 0.0, 128.0, 64.0));
    // east wall of the second room
    b.portal(1, 2, 0);
    b.build()
}

/// Hall, a three-step stair, a low corridor and a four-sector loop around a
/// pillar.
///
/// ```text
///            +-----------------+ 512
///            |\      N       / |
///            | +-----------+   |
///            |W|  pillar   | E |
///            | +-----------+   |
///            |/      S      \  |
///            +-----+--+--------+ 320
///                  |C |
///  +--------+      |  |
///  |        +--+--+--+ 128
///  |  hall  |s1|s2|s3|
///  |        +--+--+--+ 64
///  +--------+
///  0       192        288     384
/// ```
pub fn courtyard() -> Result<Map, MapError> {
    let mut b = MapBuilder::new("courtyard");
    b.walls(TRIM, BRICK, TRIM).flats(TILE, PLASTER);

    // 0: hall, east edge split where the stair starts
    b.sector(
        0.0,
        128.0,
        &[
            vec2(0.0, 0.0),
            vec2(0.0, 192.0),
            vec2(192.0, 192.0),
            vec2(192.0, 128.0),
            vec2(192.0, 64.0),
            vec2(192.0, 0.0),
        ],
    );

    // 1..=3: stairs
    b.sector(16.0, 112.0, &rect(192.0, 64.0, 224.0, 128.0));
    b.sector(32.0, 112.0, &rect(224.0, 64.0, 256.0, 128.0));
    b.flats(TILE, TILE);
    b.sector(48.0, 176.0, &rect(256.0, 64.0, 288.0, 128.0));

    // 4: corridor north out of the top step
    b.flats(TILE, PLASTER);
    b.sector(48.0, 120.0, &rect(256.0, 128.0, 288.0, 320.0));

    // 5..=8: loop around the pillar (256..320, 384..448)
    let (o_sw, o_nw, o_ne, o_se) = (
        vec2(192.0, 320.0),
        vec2(192.0, 512.0),
        vec2(384.0, 512.0),
        vec2(384.0, 320.0),
    );
    let (p_sw, p_nw, p_ne, p_se) = (
        vec2(256.0, 384.0),
        vec2(256.0, 448.0),
        vec2(320.0, 448.0),
        vec2(320.0, 384.0),
    );
    b.flats(PLASTER, TILE);
    b.sector(
        48.0,
        176.0,
        &[o_sw, p_sw, p_se, o_se, vec2(288.0, 320.0), vec2(256.0, 320.0)],
    );
    b.sector(48.0, 176.0, &[o_se, p_se, p_ne, o_ne]);
    b.sector(48.0, 176.0, &[o_ne, p_ne, p_nw, o_nw]);
    b.sector(48.0, 176.0, &[o_nw, p_nw, p_sw, o_sw]);

    b.offset(0, 1, 32.0, 0.0);
    b.build()
}

/*──────────────────────── procedural textures ────────────────────────*/

/// Small integer hash for texel noise.
fn noise(x: usize, y: usize) -> u8 {
    let mut h = (x as u32).wrapping_mul(374_761_393) ^ (y as u32).wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 29) as u8
}

fn brick() -> Result<Patch, TextureError> {
    let (w, h) = (64, 64);
    let mut texels = vec![0u8; w * h];
    for x in 0..w {
        for y in 0..h {
            let row = y / 16;
            let shift = if row % 2 == 0 { 0 } else { 16 };
            let mortar = y % 16 == 0 || (x + shift) % 32 == 0;
            texels[x * h + y] = if mortar { 5 } else { 8 + noise(x, y) % 3 };
        }
    }
    Patch::new("BRICK", w, h, texels)
}

fn trim() -> Result<Patch, TextureError> {
    let (w, h) = (16, 16);
    let texels = (0..w * h)
        .map(|i| if (i % h) / 4 % 2 == 0 { 13 } else { 10 })
        .collect();
    Patch::new("TRIM", w, h, texels)
}

fn tile() -> Result<Flat, TextureError> {
    let texels = (0..FLAT_SIZE * FLAT_SIZE)
        .map(|i| {
            let (x, y) = (i % FLAT_SIZE, i / FLAT_SIZE);
            if x % 16 == 0 || y % 16 == 0 { 3 } else { 7 }
        })
        .collect();
    Flat::new("TILE", texels)
}

fn plaster() -> Result<Flat, TextureError> {
    let texels = (0..FLAT_SIZE * FLAT_SIZE)
        .map(|i| 11 + noise(i % FLAT_SIZE, i / FLAT_SIZE) % 3)
        .collect();
    Flat::new("PLASTER", texels)
}

/// 24x32 barrel with a see-through band across the middle.
fn barrel() -> Result<Sprite, TextureError> {
    let columns = (0..24usize)
        .map(|x| {
            let edge = x.min(23 - x);
            let shade = (6 + edge / 2).min(14) as u8;
            vec![
                Post {
                    top: 0,
                    texels: vec![shade; 12],
                },
                Post {
                    top: 16,
                    texels: vec![shade.saturating_sub(2); 16],
                },
            ]
        })
        .collect();
    Sprite::new("BARREL", 12, 32, 32, columns)
}

/// Bank holding everything the sample maps reference, at the ids the
/// constants above name.
pub fn demo_bank() -> Result<TextureBank, TextureError> {
    let mut bank = TextureBank::new();
    bank.insert_patch(brick()?)?;
    bank.insert_patch(trim()?)?;
    bank.insert_flat(tile()?)?;
    bank.insert_flat(plaster()?)?;
    bank.insert_sprite(barrel()?)?;
    Ok(bank)
}
