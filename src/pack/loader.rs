// ──────────────────────────────────────────────────────────────────────────
// pack/loader.rs
//
//  *   maps/<name>/{vertices,sectors,walls}    ──╮
//  *   maps/<name>/{patches,flats} name tables   │  --->  world::Map
//  *   patches/*, flats/*, sprites/*             │        + populated TextureBank
//                                                ╯
// ──────────────────────────────────────────────────────────────────────────

use byteorder::{LittleEndian as LE, ReadBytesExt};
use glam::vec2;
use thiserror::Error;

use super::container::{NodeId, Pack, PackError, ROOT};
use super::raw::{RawName, RawSector, RawVertex, RawWall};
use crate::world::{
    FLAT_SIZE, Flat, Map, MapDef, MapError, NO_TEXTURE, Patch, Post, SectorDef, Sprite,
    TextureBank, TextureError, TextureId, WallDef,
};

/*──────────────────────────── Error type ───────────────────────────*/

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("{kind} `{name}` is neither in the bank nor in the pack")]
    UnknownTexture { kind: &'static str, name: String },

    #[error("map `{map}` refers to {kind} #{index}, its table has {count}")]
    BadTextureIndex {
        map: String,
        kind: &'static str,
        index: u8,
        count: usize,
    },
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

/// Names of the maps under `maps/`, in pack order.
pub fn map_names(pack: &Pack) -> Result<Vec<String>, PackError> {
    let Some(maps) = pack.find(ROOT, "maps")? else {
        return Ok(Vec::new());
    };
    Ok(pack
        .children(maps)?
        .map(|(_, n)| n.name_str().to_owned())
        .collect())
}

/// Decode every bitmap under `patches/`, `flats/` and `sprites/` that the
/// bank does not hold yet. Returns how many were added.
pub fn load_textures(pack: &Pack, bank: &mut TextureBank) -> Result<usize, LoadError> {
    let mut added = 0;
    for kind in [Kind::Patch, Kind::Flat, Kind::Sprite] {
        let Some(dir) = pack.find(ROOT, kind.dir())? else {
            continue;
        };
        let names: Vec<String> = pack
            .children(dir)?
            .map(|(_, n)| n.name_str().to_owned())
            .collect();
        for name in names {
            if kind.lookup(bank, &name).is_none() {
                kind.load(pack, bank, &name)?;
                added += 1;
            }
        }
    }
    log::info!("pack: {added} textures added to the bank");
    Ok(added)
}

/// Load `maps/<name>` into a validated [`Map`], pulling every patch and
/// flat it names into `bank` (bank entries win over pack lumps).
pub fn load_map(pack: &Pack, name: &str, bank: &mut TextureBank) -> Result<Map, LoadError> {
    /*----- 1. Raw lumps --------------------------------------------------*/
    let dir = pack.get(pack.get(ROOT, "maps")?, name)?;
    let vertices: Vec<RawVertex> = pack.lump_to_vec(pack.get(dir, "vertices")?)?;
    let sectors: Vec<RawSector> = pack.lump_to_vec(pack.get(dir, "sectors")?)?;
    let walls: Vec<RawWall> = pack.lump_to_vec(pack.get(dir, "walls")?)?;

    /*----- 2. Texture tables → bank ids ----------------------------------*/
    let patch_ids = resolve_table(pack, bank, dir, Kind::Patch)?;
    let flat_ids = resolve_table(pack, bank, dir, Kind::Flat)?;
    let lookup = |ids: &[TextureId], kind: Kind, index: u8| -> Result<TextureId, LoadError> {
        match index {
            0 => Ok(NO_TEXTURE),
            i => ids
                .get(i as usize - 1)
                .copied()
                .ok_or_else(|| LoadError::BadTextureIndex {
                    map: name.into(),
                    kind: kind.label(),
                    index: i,
                    count: ids.len(),
                }),
        }
    };

    /*----- 3. Convert raw → definition -----------------------------------*/
    let def = MapDef {
        name: name.into(),
        vertices: vertices
            .iter()
            .map(|v| vec2(v.x as f32, v.y as f32))
            .collect(),
        sectors: sectors
            .iter()
            .map(|s| {
                Ok(SectorDef {
                    first_wall: s.first_wall,
                    num_walls: s.num_walls,
                    floor_h: s.floor as f32,
                    ceil_h: s.ceiling as f32,
                    floor_tex: lookup(&flat_ids, Kind::Flat, s.floor_flat)?,
                    ceil_tex: lookup(&flat_ids, Kind::Flat, s.ceil_flat)?,
                })
            })
            .collect::<Result<_, LoadError>>()?,
        walls: walls
            .iter()
            .map(|w| {
                Ok(WallDef {
                    vertex: w.vertex,
                    portal: w.portal,
                    x_off: w.x_off as f32,
                    y_off: w.y_off as f32,
                    top: lookup(&patch_ids, Kind::Patch, w.top)?,
                    mid: lookup(&patch_ids, Kind::Patch, w.mid)?,
                    bottom: lookup(&patch_ids, Kind::Patch, w.bottom)?,
                })
            })
            .collect::<Result<_, LoadError>>()?,
    };

    /*----- 4. Validate ----------------------------------------------------*/
    Ok(Map::from_def(def)?)
}

/*====================================================================*/
/*                       Texture plumbing                             */
/*====================================================================*/

#[derive(Clone, Copy, Debug)]
enum Kind {
    Patch,
    Flat,
    Sprite,
}

impl Kind {
    fn dir(self) -> &'static str {
        match self {
            Kind::Patch => "patches",
            Kind::Flat => "flats",
            Kind::Sprite => "sprites",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Patch => "patch",
            Kind::Flat => "flat",
            Kind::Sprite => "sprite",
        }
    }

    fn lookup(self, bank: &TextureBank, name: &str) -> Option<TextureId> {
        match self {
            Kind::Patch => bank.patch_id(name),
            Kind::Flat => bank.flat_id(name),
            Kind::Sprite => bank.sprite_id(name),
        }
    }

    /// Decode `<dir>/<name>` from the pack and insert it.
    fn load(self, pack: &Pack, bank: &mut TextureBank, name: &str) -> Result<TextureId, LoadError> {
        let Some(node) = pack
            .find(ROOT, self.dir())?
            .map(|dir| pack.find(dir, name))
            .transpose()?
            .flatten()
        else {
            return Err(LoadError::UnknownTexture {
                kind: self.label(),
                name: name.into(),
            });
        };
        let bytes = pack.lump_bytes(node)?;
        let id = match self {
            Kind::Patch => bank.insert_patch(decode_patch(name, bytes)?)?,
            Kind::Flat => bank.insert_flat(decode_flat(name, bytes)?)?,
            Kind::Sprite => bank.insert_sprite(decode_sprite(name, bytes)?)?,
        };
        Ok(id)
    }
}

/// Map the name table `<map>/<patches|flats>` (optional) to bank ids.
fn resolve_table(
    pack: &Pack,
    bank: &mut TextureBank,
    map: NodeId,
    kind: Kind,
) -> Result<Vec<TextureId>, LoadError> {
    let Some(table) = pack.find(map, kind.dir())? else {
        return Ok(Vec::new());
    };
    let names: Vec<RawName> = pack.lump_to_vec(table)?;
    names
        .iter()
        .map(|raw| {
            let name = raw.as_string();
            match kind.lookup(bank, &name) {
                Some(id) => Ok(id),
                None => kind.load(pack, bank, &name),
            }
        })
        .collect()
}

/*──────────────────────────── bitmaps ─────────────────────────────*/

/// Header byte `(log2 h << 4) | log2 w`, then column-major texels.
pub fn decode_patch(name: &str, bytes: &[u8]) -> Result<Patch, TextureError> {
    let (&header, texels) = bytes
        .split_first()
        .ok_or_else(|| TextureError::Truncated(name.into()))?;
    let width = 1usize << (header & 0x0f);
    let height = 1usize << (header >> 4);
    Patch::new(name, width, height, texels.to_vec())
}

pub fn decode_flat(name: &str, bytes: &[u8]) -> Result<Flat, TextureError> {
    if bytes.len() < FLAT_SIZE * FLAT_SIZE {
        return Err(TextureError::Truncated(name.into()));
    }
    Flat::new(name, bytes.to_vec())
}

/// `<hhHH>` header, `width` post offsets, then `[len, gap, texels…]` runs
/// per column closed by a zero length. `gap` counts rows from the end of
/// the previous run.
pub fn decode_sprite(name: &str, bytes: &[u8]) -> Result<Sprite, TextureError> {
    let truncated = |_| TextureError::Truncated(name.into());
    let mut cur = bytes;
    let offset_x = cur.read_i16::<LE>().map_err(truncated)?;
    let offset_y = cur.read_i16::<LE>().map_err(truncated)?;
    let width = cur.read_u16::<LE>().map_err(truncated)?;
    let height = cur.read_u16::<LE>().map_err(truncated)?;
    let offsets = (0..width)
        .map(|_| cur.read_u32::<LE>().map_err(truncated))
        .collect::<Result<Vec<_>, _>>()?;
    let posts = cur;

    let mut columns = Vec::with_capacity(width as usize);
    for off in offsets {
        let mut run = posts
            .get(off as usize..)
            .ok_or_else(|| TextureError::Truncated(name.into()))?;
        let mut column = Vec::new();
        let mut spot = 0u16;
        loop {
            let len = run.read_u8().map_err(truncated)?;
            if len == 0 {
                break;
            }
            spot += run.read_u8().map_err(truncated)? as u16;
            let texels = run
                .get(..len as usize)
                .ok_or_else(|| TextureError::Truncated(name.into()))?;
            column.push(Post {
                top: spot,
                texels: texels.to_vec(),
            });
            run = &run[len as usize..];
            spot += len as u16;
        }
        columns.push(column);
    }
    Sprite::new(name, offset_x, offset_y, height, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{PackBuilder, encode_sprite};
    use crate::world::{Portal, samples};

    fn courtyard_pack() -> Pack {
        let map = samples::courtyard().unwrap();
        let bank = samples::demo_bank().unwrap();
        let mut b = PackBuilder::new();
        b.add_map("court", &map, &bank).unwrap();
        b.add_sprite(bank.sprite(samples::BARREL).unwrap()).unwrap();
        Pack::from_bytes(b.to_bytes()).unwrap()
    }

    #[test]
    fn courtyard_survives_the_pack() {
        let original = samples::courtyard().unwrap();
        let demo = samples::demo_bank().unwrap();

        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        let mut b = PackBuilder::new();
        b.add_map("court", &original, &demo).unwrap();
        b.write_to(tmp.path()).unwrap();
        let pack = Pack::from_file(tmp.path()).unwrap();

        let mut bank = TextureBank::new();
        let map = load_map(&pack, "court", &mut bank).unwrap();

        assert_eq!(map.name, "court");
        assert_eq!(map.sectors.len(), original.sectors.len());
        assert_eq!(map.walls.len(), original.walls.len());
        for (a, b) in map.sectors.iter().zip(&original.sectors) {
            assert_eq!((a.floor_h, a.ceil_h), (b.floor_h, b.ceil_h));
            assert_eq!(
                bank.flat_or_missing(a.floor_tex).name,
                demo.flat_or_missing(b.floor_tex).name
            );
        }
        for (a, b) in map.walls.iter().zip(&original.walls) {
            assert_eq!(a.portal, b.portal);
            assert_eq!(a.p1, b.p1);
            assert_eq!(a.x_off, b.x_off);
            assert_eq!(
                bank.patch_or_missing(a.mid).name,
                demo.patch_or_missing(b.mid).name
            );
        }
        assert!(map.walls.iter().any(|w| matches!(w.portal, Portal::Sector(_))));
    }

    #[test]
    fn lists_maps_and_loads_sprites() {
        let pack = courtyard_pack();
        assert_eq!(map_names(&pack).unwrap(), ["court"]);

        let mut bank = TextureBank::new();
        // BRICK, TRIM, TILE, PLASTER, BARREL
        assert_eq!(load_textures(&pack, &mut bank).unwrap(), 5);
        assert_eq!(load_textures(&pack, &mut bank).unwrap(), 0);
        let id = bank.sprite_id("BARREL").unwrap();
        let demo = samples::demo_bank().unwrap();
        assert_eq!(bank.sprite(id).unwrap(), demo.sprite(samples::BARREL).unwrap());
    }

    #[test]
    fn bank_entries_win() {
        let pack = courtyard_pack();
        let mut bank = samples::demo_bank().unwrap();
        let before = bank.num_patches();
        let map = load_map(&pack, "court", &mut bank).unwrap();
        assert_eq!(bank.num_patches(), before);
        assert_eq!(map.walls[0].mid, samples::BRICK);
    }

    fn one_room(patch_table: &[&str], mid: u8) -> PackBuilder {
        let mut b = PackBuilder::new();
        let v = [(0, 0), (0, 64), (64, 64), (64, 0)].map(|(x, y)| RawVertex { x, y });
        let walls = [0u16, 1, 2, 3].map(|vertex| RawWall {
            vertex,
            portal: 0,
            x_off: 0,
            y_off: 0,
            top: 0,
            mid,
            bottom: 0,
        });
        let sector = RawSector {
            num_walls: 4,
            first_wall: 0,
            floor: 0,
            ceiling: 64,
            floor_flat: 0,
            ceil_flat: 0,
        };
        let names: Vec<_> = patch_table.iter().map(|n| RawName::new(n).unwrap()).collect();
        b.add_records("maps/room/vertices", &v)
            .unwrap()
            .add_records("maps/room/walls", &walls)
            .unwrap()
            .add_records("maps/room/sectors", &[sector])
            .unwrap()
            .add_records("maps/room/patches", &names)
            .unwrap();
        b
    }

    #[test]
    fn unknown_texture_name() {
        let pack = Pack::from_bytes(one_room(&["NOPE"], 1).to_bytes()).unwrap();
        let err = load_map(&pack, "room", &mut TextureBank::new()).unwrap_err();
        assert!(matches!(err, LoadError::UnknownTexture { kind: "patch", .. }));
    }

    #[test]
    fn texture_index_past_table() {
        let pack = Pack::from_bytes(one_room(&[], 3).to_bytes()).unwrap();
        let err = load_map(&pack, "room", &mut TextureBank::new()).unwrap_err();
        assert!(matches!(err, LoadError::BadTextureIndex { index: 3, count: 0, .. }));
    }

    #[test]
    fn invalid_geometry_is_fatal() {
        let mut b = one_room(&[], 0);
        let sector = RawSector {
            num_walls: 2,
            first_wall: 0,
            floor: 0,
            ceiling: 64,
            floor_flat: 0,
            ceil_flat: 0,
        };
        b.add_records("maps/room/sectors", &[sector]).unwrap();
        let pack = Pack::from_bytes(b.to_bytes()).unwrap();
        let err = load_map(&pack, "room", &mut TextureBank::new()).unwrap_err();
        assert!(matches!(err, LoadError::Map(MapError::NotAPolygon { sector: 0, count: 2 })));
    }

    #[test]
    fn missing_map() {
        let pack = courtyard_pack();
        let err = load_map(&pack, "e1m1", &mut TextureBank::new()).unwrap_err();
        assert!(matches!(err, LoadError::Pack(PackError::Missing(_))));
    }

    #[test]
    fn bitmap_decoders_reject_short_data() {
        assert!(matches!(decode_patch("P", &[]), Err(TextureError::Truncated(_))));
        assert!(matches!(
            decode_patch("P", &[0x11, 1, 2]),
            Err(TextureError::BadSize { expected: 4, got: 2, .. })
        ));
        assert!(matches!(decode_flat("F", &[0; 10]), Err(TextureError::Truncated(_))));

        let demo = samples::demo_bank().unwrap();
        let bytes = encode_sprite(demo.sprite(samples::BARREL).unwrap()).unwrap();
        assert!(decode_sprite("BARREL", &bytes).is_ok());
        assert!(matches!(
            decode_sprite("BARREL", &bytes[..bytes.len() - 3]),
            Err(TextureError::Truncated(_))
        ));
    }
}
