//! Pack writer and bitmap encoders, the inverse of the reader and loader.

use std::{collections::VecDeque, path::Path};

use bincode::config;

use super::container::{BRANCH_FLAG, MAX_NODE_NAME, NODE_SIZE, PackError};
use super::raw::{RawName, RawSector, RawVertex, RawWall, Record};
use crate::world::{Flat, Map, NO_TEXTURE, Patch, Portal, Sprite, TextureBank, TextureId};

enum Entry {
    Lump(Vec<u8>),
    Branch(Vec<(String, Entry)>),
}

/// Assembles a pack in memory; branches are created on demand from
/// `/`-separated paths.
#[derive(Default)]
pub struct PackBuilder {
    root: Vec<(String, Entry)>,
}

impl PackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` at `path`, replacing any lump already there.
    pub fn add_lump(&mut self, path: &str, bytes: Vec<u8>) -> Result<&mut Self, PackError> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.is_empty() {
            return Err(PackError::Missing(path.into()));
        }
        insert(&mut self.root, &parts, bytes)?;
        Ok(self)
    }

    pub fn add_records<T: Record>(&mut self, path: &str, records: &[T]) -> Result<&mut Self, PackError> {
        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        let mut bytes = Vec::with_capacity(records.len() * T::SIZE);
        for r in records {
            bytes.extend(bincode::encode_to_vec(r, cfg)?);
        }
        self.add_lump(path, bytes)
    }

    pub fn add_patch(&mut self, patch: &Patch) -> Result<&mut Self, PackError> {
        let bytes = encode_patch(patch)?;
        self.add_lump(&format!("patches/{}", patch.name), bytes)
    }

    pub fn add_flat(&mut self, flat: &Flat) -> Result<&mut Self, PackError> {
        self.add_lump(&format!("flats/{}", flat.name), flat.texels.clone())
    }

    pub fn add_sprite(&mut self, sprite: &Sprite) -> Result<&mut Self, PackError> {
        let bytes = encode_sprite(sprite)?;
        self.add_lump(&format!("sprites/{}", sprite.name), bytes)
    }

    /// Store `map` under `maps/<name>/` together with every patch and flat
    /// it references. Coordinates and heights are rounded to integers.
    pub fn add_map(&mut self, name: &str, map: &Map, bank: &TextureBank) -> Result<&mut Self, PackError> {
        let mut patches = NameTable::default();
        let mut flats = NameTable::default();

        let vertices: Vec<RawVertex> = map
            .vertices
            .iter()
            .map(|v| RawVertex {
                x: v.pos.x.round() as i16,
                y: v.pos.y.round() as i16,
            })
            .collect();

        let mut sectors = Vec::with_capacity(map.sectors.len());
        let mut walls = Vec::with_capacity(map.walls.len());
        for (si, s) in map.sectors.iter().enumerate() {
            sectors.push(RawSector {
                num_walls: s.num_walls,
                first_wall: s.first_wall,
                floor: s.floor_h.round() as i16,
                ceiling: s.ceil_h.round() as i16,
                floor_flat: flats.index(s.floor_tex, |id| &bank.flat_or_missing(id).name)?,
                ceil_flat: flats.index(s.ceil_tex, |id| &bank.flat_or_missing(id).name)?,
            });
            for w in map.walls_of(si as u16) {
                let mut patch = |id| patches.index(id, |id| &bank.patch_or_missing(id).name);
                walls.push(RawWall {
                    vertex: w.v1,
                    portal: match w.portal {
                        Portal::Solid => si as u16,
                        Portal::Sector(n) => n,
                    },
                    x_off: w.x_off.rem_euclid(256.0) as u8,
                    y_off: w.y_off.rem_euclid(256.0) as u8,
                    top: patch(w.top)?,
                    mid: patch(w.mid)?,
                    bottom: patch(w.bottom)?,
                });
            }
        }

        let dir = format!("maps/{name}");
        self.add_records(&format!("{dir}/vertices"), &vertices)?
            .add_records(&format!("{dir}/sectors"), &sectors)?
            .add_records(&format!("{dir}/walls"), &walls)?
            .add_records(&format!("{dir}/patches"), &patches.names)?
            .add_records(&format!("{dir}/flats"), &flats.names)?;

        for &id in &patches.ids {
            self.add_patch(bank.patch_or_missing(id))?;
        }
        for &id in &flats.ids {
            self.add_flat(bank.flat_or_missing(id))?;
        }
        Ok(self)
    }

    /// Serialise: node table (breadth first, so siblings are contiguous)
    /// followed by lump data in the same order.
    pub fn to_bytes(&self) -> Vec<u8> {
        struct Node {
            name: [u8; MAX_NODE_NAME],
            size: u32,
            offset: u32,
        }

        let mut nodes = vec![Node {
            name: [0; MAX_NODE_NAME],
            size: 0,
            offset: 0,
        }];
        let mut data = Vec::new();
        let mut lumps = Vec::new();
        let mut queue = VecDeque::from([(0usize, self.root.as_slice())]);

        while let Some((idx, children)) = queue.pop_front() {
            nodes[idx].size = BRANCH_FLAG | children.len() as u32;
            nodes[idx].offset = nodes.len() as u32;
            for (name, entry) in children {
                let mut raw = [0u8; MAX_NODE_NAME];
                raw[..name.len()].copy_from_slice(name.as_bytes());
                match entry {
                    Entry::Lump(bytes) => {
                        lumps.push(nodes.len());
                        nodes.push(Node {
                            name: raw,
                            size: bytes.len() as u32,
                            offset: data.len() as u32,
                        });
                        data.extend_from_slice(bytes);
                    }
                    Entry::Branch(sub) => {
                        queue.push_back((nodes.len(), sub.as_slice()));
                        nodes.push(Node {
                            name: raw,
                            size: BRANCH_FLAG,
                            offset: 0,
                        });
                    }
                }
            }
        }

        let table = (nodes.len() * NODE_SIZE) as u32;
        for i in lumps {
            nodes[i].offset += table;
        }

        let mut out = Vec::with_capacity(table as usize + data.len());
        for (i, n) in nodes.iter().enumerate() {
            if i == 0 {
                out.extend_from_slice(b"PACK");
                out.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
            } else {
                out.extend_from_slice(&n.name);
            }
            out.extend_from_slice(&n.size.to_le_bytes());
            out.extend_from_slice(&n.offset.to_le_bytes());
        }
        out.extend(data);
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), PackError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

fn insert(dir: &mut Vec<(String, Entry)>, parts: &[&str], bytes: Vec<u8>) -> Result<(), PackError> {
    let Some((&name, rest)) = parts.split_first() else {
        return Ok(());
    };
    if name.len() > MAX_NODE_NAME {
        return Err(PackError::NameTooLong(name.into()));
    }
    let pos = dir.iter().position(|(n, _)| n == name);

    if rest.is_empty() {
        match pos {
            Some(i) => dir[i].1 = Entry::Lump(bytes),
            None => dir.push((name.into(), Entry::Lump(bytes))),
        }
        return Ok(());
    }

    let i = match pos {
        Some(i) => i,
        None => {
            dir.push((name.into(), Entry::Branch(Vec::new())));
            dir.len() - 1
        }
    };
    match &mut dir[i].1 {
        Entry::Branch(children) => insert(children, rest, bytes),
        Entry::Lump(_) => Err(PackError::NotABranch {
            node: 0,
            name: name.into(),
        }),
    }
}

/// Per-map texture table: bank ids in first-use order and their names.
#[derive(Default)]
struct NameTable {
    ids: Vec<TextureId>,
    names: Vec<RawName>,
}

impl NameTable {
    /// 1-based table index of `id`, 0 for no texture.
    fn index<'a, F>(&mut self, id: TextureId, name_of: F) -> Result<u8, PackError>
    where
        F: FnOnce(TextureId) -> &'a String,
    {
        if id == NO_TEXTURE {
            return Ok(0);
        }
        let pos = match self.ids.iter().position(|&i| i == id) {
            Some(p) => p,
            None => {
                let name = name_of(id);
                let raw = RawName::new(name).ok_or_else(|| PackError::NameTooLong(name.clone()))?;
                self.ids.push(id);
                self.names.push(raw);
                self.ids.len() - 1
            }
        };
        u8::try_from(pos + 1).map_err(|_| PackError::Unencodable("texture table".into(), "over 255 entries"))
    }
}

/*──────────────────────────── bitmaps ─────────────────────────────*/

/// Header byte `(log2 h << 4) | log2 w`, then the column-major texels.
pub fn encode_patch(patch: &Patch) -> Result<Vec<u8>, PackError> {
    let (lw, lh) = (patch.width.trailing_zeros(), patch.height.trailing_zeros());
    if lw > 15 || lh > 15 {
        return Err(PackError::Unencodable(patch.name.clone(), "patch side over 32768"));
    }
    let mut out = Vec::with_capacity(1 + patch.texels.len());
    out.push(((lh << 4) | lw) as u8);
    out.extend_from_slice(&patch.texels);
    Ok(out)
}

/// `<hhHH>` header, one `u32` post offset per column, then each column as
/// `[len, gap, texels…]` runs closed by a zero length.
pub fn encode_sprite(sprite: &Sprite) -> Result<Vec<u8>, PackError> {
    let mut posts = Vec::new();
    let mut offsets = Vec::with_capacity(sprite.columns.len());
    for column in &sprite.columns {
        offsets.push(posts.len() as u32);
        let mut spot = 0u16;
        for post in column {
            let len = u8::try_from(post.texels.len())
                .ok()
                .filter(|&l| l > 0)
                .ok_or_else(|| PackError::Unencodable(sprite.name.clone(), "post length"))?;
            let gap = post
                .top
                .checked_sub(spot)
                .and_then(|g| u8::try_from(g).ok())
                .ok_or_else(|| PackError::Unencodable(sprite.name.clone(), "post gap"))?;
            posts.push(len);
            posts.push(gap);
            posts.extend_from_slice(&post.texels);
            spot = post.top + len as u16;
        }
        posts.push(0);
    }

    let mut out = Vec::with_capacity(8 + 4 * offsets.len() + posts.len());
    out.extend_from_slice(&sprite.offset_x.to_le_bytes());
    out.extend_from_slice(&sprite.offset_y.to_le_bytes());
    out.extend_from_slice(&sprite.width.to_le_bytes());
    out.extend_from_slice(&sprite.height.to_le_bytes());
    for off in offsets {
        out.extend_from_slice(&off.to_le_bytes());
    }
    out.extend(posts);
    Ok(out)
}
