// Format-agnostic repository of wall patches, flats and sprites decoded by
// the pack loader. The renderer and world logic interact through ids only.

use std::collections::HashMap;
use std::ops::Index;

/// Runtime handle for a patch, flat or sprite in its shelf of the bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// Id whose pixels are the checkerboard fallback.
/// Always = 0 because every shelf inserts its fallback first.
pub const NO_TEXTURE: TextureId = 0;

/// Flats are always square with this edge length.
pub const FLAT_SIZE: usize = 64;

/// Number of grey levels a texel may index (0 = black, 16 = white).
pub const NUM_SHADES: usize = 17;

const LIGHT_IDX: u8 = 12;
const DARK_IDX: u8 = 4;

/// Things that can go wrong when filling or querying the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second entry with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. shelf.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    #[error("patch `{name}` is {width}x{height}, both sides must be powers of two")]
    NotPowerOfTwo {
        name: String,
        width: usize,
        height: usize,
    },

    #[error("`{name}` carries {got} texels, expected {expected}")]
    BadSize {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("sprite `{0}` has no columns")]
    EmptySprite(String),

    #[error("texel {texel} in `{name}` exceeds the shade range")]
    BadShade { name: String, texel: u8 },

    #[error("bitmap `{0}` is truncated")]
    Truncated(String),
}

/*──────────────────────────── bitmaps ─────────────────────────────*/

/// Wall texture, stored column-major so one screen column reads one slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub texels: Vec<u8>,
}

impl Patch {
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        texels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo {
                name,
                width,
                height,
            });
        }
        check_texels(&name, &texels, width * height)?;
        Ok(Self {
            name,
            width,
            height,
            texels,
        })
    }

    /// Column `u`, wrapped to the patch width.
    #[inline]
    pub fn column(&self, u: i32) -> &[u8] {
        let x = (u & (self.width as i32 - 1)) as usize;
        &self.texels[x * self.height..(x + 1) * self.height]
    }

    fn checker(name: &str) -> Self {
        let (w, h) = (8, 8);
        let mut texels = vec![0u8; w * h];
        for x in 0..w {
            for y in 0..h {
                texels[x * h + y] = if (x ^ y) & 1 == 0 { LIGHT_IDX } else { DARK_IDX };
            }
        }
        Self {
            name: name.into(),
            width: w,
            height: h,
            texels,
        }
    }
}

/// 64×64 floor/ceiling texture in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Flat {
    pub name: String,
    pub texels: Vec<u8>,
}

impl Flat {
    pub fn new(name: impl Into<String>, texels: Vec<u8>) -> Result<Self, TextureError> {
        let name = name.into();
        check_texels(&name, &texels, FLAT_SIZE * FLAT_SIZE)?;
        Ok(Self { name, texels })
    }

    fn checker(name: &str) -> Self {
        let mut texels = vec![0u8; FLAT_SIZE * FLAT_SIZE];
        for y in 0..FLAT_SIZE {
            for x in 0..FLAT_SIZE {
                texels[y * FLAT_SIZE + x] = if ((x >> 3) ^ (y >> 3)) & 1 == 0 {
                    LIGHT_IDX
                } else {
                    DARK_IDX
                };
            }
        }
        Self {
            name: name.into(),
            texels,
        }
    }
}

/// One opaque vertical run inside a sprite column.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// First row covered by this run, counted from the sprite top.
    pub top: u16,
    pub texels: Vec<u8>,
}

/// Billboard image: columns of opaque posts plus an anchor.
///
/// `offset_x` is the column that sits on the actor origin, `offset_y` the
/// height of the sprite top above the actor's feet.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub name: String,
    pub offset_x: i16,
    pub offset_y: i16,
    pub width: u16,
    pub height: u16,
    pub columns: Vec<Vec<Post>>,
}

impl Sprite {
    pub fn new(
        name: impl Into<String>,
        offset_x: i16,
        offset_y: i16,
        height: u16,
        columns: Vec<Vec<Post>>,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if columns.is_empty() {
            return Err(TextureError::EmptySprite(name));
        }
        for post in columns.iter().flatten() {
            check_texels(&name, &post.texels, post.texels.len())?;
        }
        Ok(Self {
            name,
            offset_x,
            offset_y,
            width: columns.len() as u16,
            height,
            columns,
        })
    }

    fn checker(name: &str) -> Self {
        let columns = (0..8u16)
            .map(|x| {
                vec![Post {
                    top: 0,
                    texels: (0..16u16)
                        .map(|y| if (x ^ y) & 1 == 0 { LIGHT_IDX } else { DARK_IDX })
                        .collect(),
                }]
            })
            .collect();
        Self {
            name: name.into(),
            offset_x: 4,
            offset_y: 16,
            width: 8,
            height: 16,
            columns,
        }
    }
}

fn check_texels(name: &str, texels: &[u8], expected: usize) -> Result<(), TextureError> {
    if texels.len() != expected {
        return Err(TextureError::BadSize {
            name: name.into(),
            expected,
            got: texels.len(),
        });
    }
    match texels.iter().find(|&&t| t as usize >= NUM_SHADES) {
        Some(&texel) => Err(TextureError::BadShade {
            name: name.into(),
            texel,
        }),
        None => Ok(()),
    }
}

/*──────────────────────────── palette ─────────────────────────────*/

/// Shade index → 0x00RRGGBB.
#[derive(Clone, Debug)]
pub struct Palette(pub [u32; NUM_SHADES]);

impl Default for Palette {
    /// Linear grey ramp.
    fn default() -> Self {
        let mut ramp = [0u32; NUM_SHADES];
        for (i, c) in ramp.iter_mut().enumerate() {
            let v = (i * 255 / (NUM_SHADES - 1)) as u32;
            *c = (v << 16) | (v << 8) | v;
        }
        Palette(ramp)
    }
}

impl Index<u8> for Palette {
    type Output = u32;
    fn index(&self, idx: u8) -> &u32 {
        &self.0[(idx as usize).min(NUM_SHADES - 1)]
    }
}

/*──────────────────────────── shelves ─────────────────────────────*/

/// Name-indexed storage for one kind of bitmap. Entry 0 is the fallback.
#[derive(Debug)]
struct Shelf<T> {
    by_name: HashMap<String, TextureId>,
    data: Vec<T>,
}

impl<T> Shelf<T> {
    fn new(missing: T) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing],
        }
    }

    fn insert(&mut self, name: String, item: T) -> Result<TextureId, TextureError> {
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        self.data.push(item);
        self.by_name.insert(name, id);
        Ok(id)
    }

    fn get(&self, id: TextureId) -> Result<&T, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    fn get_or_missing(&self, id: TextureId) -> &T {
        self.data.get(id as usize).unwrap_or(&self.data[0])
    }
}

/// A palette-agnostic, format-agnostic cache of patches, flats and sprites.
///
/// * Does **not** know about packs or files; that’s the loader’s job.
/// * Stores exactly one copy of every name per shelf.
/// * ID **0** of every shelf is a checkerboard fallback.
#[derive(Debug)]
pub struct TextureBank {
    patches: Shelf<Patch>,
    flats: Shelf<Flat>,
    sprites: Shelf<Sprite>,
    palette: Palette,
}

impl Default for TextureBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBank {
    pub fn new() -> Self {
        Self {
            patches: Shelf::new(Patch::checker("MISSING")),
            flats: Shelf::new(Flat::checker("MISSING")),
            sprites: Shelf::new(Sprite::checker("MISSING")),
            palette: Palette::default(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    pub fn insert_patch(&mut self, patch: Patch) -> Result<TextureId, TextureError> {
        self.patches.insert(patch.name.clone(), patch)
    }

    pub fn insert_flat(&mut self, flat: Flat) -> Result<TextureId, TextureError> {
        self.flats.insert(flat.name.clone(), flat)
    }

    pub fn insert_sprite(&mut self, sprite: Sprite) -> Result<TextureId, TextureError> {
        self.sprites.insert(sprite.name.clone(), sprite)
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    pub fn patch_id(&self, name: &str) -> Option<TextureId> {
        self.patches.by_name.get(name).copied()
    }

    pub fn flat_id(&self, name: &str) -> Option<TextureId> {
        self.flats.by_name.get(name).copied()
    }

    pub fn sprite_id(&self, name: &str) -> Option<TextureId> {
        self.sprites.by_name.get(name).copied()
    }

    pub fn patch(&self, id: TextureId) -> Result<&Patch, TextureError> {
        self.patches.get(id)
    }

    pub fn flat(&self, id: TextureId) -> Result<&Flat, TextureError> {
        self.flats.get(id)
    }

    pub fn sprite(&self, id: TextureId) -> Result<&Sprite, TextureError> {
        self.sprites.get(id)
    }

    /// Fallback-safe lookups used by the renderer.
    pub fn patch_or_missing(&self, id: TextureId) -> &Patch {
        self.patches.get_or_missing(id)
    }

    pub fn flat_or_missing(&self, id: TextureId) -> &Flat {
        self.flats.get_or_missing(id)
    }

    pub fn sprite_or_missing(&self, id: TextureId) -> &Sprite {
        self.sprites.get_or_missing(id)
    }

    pub fn num_patches(&self) -> usize {
        self.patches.data.len()
    }

    pub fn num_flats(&self) -> usize {
        self.flats.data.len()
    }

    pub fn num_sprites(&self) -> usize {
        self.sprites.data.len()
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn solid_patch(name: &str, shade: u8) -> Patch {
        Patch::new(name, 4, 2, vec![shade; 8]).unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let mut bank = TextureBank::new();
        let dark = bank.insert_patch(solid_patch("DARK", 0)).unwrap();
        let light = bank.insert_patch(solid_patch("LIGHT", 16)).unwrap();

        assert_ne!(dark, NO_TEXTURE);
        assert_ne!(light, dark);
        assert_eq!(bank.patch_id("DARK"), Some(dark));
        assert_eq!(bank.patch_id("LIGHT"), Some(light));
        assert_eq!(bank.patch_id("NOPE"), None);

        assert_eq!(bank.patch(dark).unwrap().texels[0], 0);
        assert_eq!(bank.patch(light).unwrap().texels[0], 16);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut bank = TextureBank::new();
        bank.insert_patch(solid_patch("WOOD", 1)).unwrap();
        let err = bank.insert_patch(solid_patch("WOOD", 2)).unwrap_err();
        assert_eq!(err, TextureError::Duplicate("WOOD".into()));
        // checker + first WOOD
        assert_eq!(bank.num_patches(), 2);
    }

    #[test]
    fn bad_id_guard_and_fallback() {
        let bank = TextureBank::new();
        let bad = TextureId::MAX;
        assert_eq!(bank.patch(bad).unwrap_err(), TextureError::BadId(bad));
        assert_eq!(bank.patch_or_missing(bad).name, "MISSING");
        assert_eq!(bank.flat_or_missing(bad).texels.len(), FLAT_SIZE * FLAT_SIZE);
    }

    #[test]
    fn patch_dimensions_must_be_powers_of_two() {
        let err = Patch::new("ODD", 3, 4, vec![0; 12]).unwrap_err();
        assert!(matches!(err, TextureError::NotPowerOfTwo { width: 3, .. }));
        let err = Patch::new("SHORT", 4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TextureError::BadSize { expected: 16, got: 15, .. }));
    }

    #[test]
    fn shade_range_is_enforced() {
        let err = Flat::new("HOT", vec![17; FLAT_SIZE * FLAT_SIZE]).unwrap_err();
        assert_eq!(
            err,
            TextureError::BadShade {
                name: "HOT".into(),
                texel: 17
            }
        );
    }

    #[test]
    fn patch_columns_wrap() {
        let texels = (0..8u8).collect::<Vec<_>>();
        let p = Patch::new("RAMP", 4, 2, texels).unwrap();
        assert_eq!(p.column(1), &[2, 3]);
        assert_eq!(p.column(5), &[2, 3]);
        assert_eq!(p.column(-1), &[6, 7]);
    }

    #[test]
    fn default_palette_is_a_grey_ramp() {
        let pal = Palette::default();
        assert_eq!(pal[0], 0x000000);
        assert_eq!(pal[16], 0xFFFFFF);
        assert_eq!(pal[200], 0xFFFFFF);
    }
}
