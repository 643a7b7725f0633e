//! Code-side map assembly.
//!
//! Sectors are given as clockwise point lists. Identical points share one
//! vertex, and a wall whose reversed edge belongs to another sector becomes
//! a portal to it when the map is built.

use std::collections::HashMap;

use glam::Vec2;

use super::{Map, MapDef, MapError, SectorDef, SectorId, TextureId, VertexId, WallDef};
use crate::world::texture::NO_TEXTURE;

#[derive(Clone, Copy, Debug, Default)]
struct WallSkin {
    top: TextureId,
    mid: TextureId,
    bottom: TextureId,
}

#[derive(Debug)]
pub struct MapBuilder {
    def: MapDef,
    lookup: HashMap<(u32, u32), VertexId>,
    skin: WallSkin,
    floor_tex: TextureId,
    ceil_tex: TextureId,
    /// Walls whose portal was set explicitly; auto-linking leaves them alone.
    pinned: Vec<usize>,
}

impl MapBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: MapDef {
                name: name.into(),
                ..MapDef::default()
            },
            lookup: HashMap::new(),
            skin: WallSkin::default(),
            floor_tex: NO_TEXTURE,
            ceil_tex: NO_TEXTURE,
            pinned: Vec::new(),
        }
    }

    /// Wall textures for every sector added after this call.
    pub fn walls(&mut self, top: TextureId, mid: TextureId, bottom: TextureId) -> &mut Self {
        self.skin = WallSkin { top, mid, bottom };
        self
    }

    /// Floor and ceiling flats for every sector added after this call.
    pub fn flats(&mut self, floor: TextureId, ceil: TextureId) -> &mut Self {
        self.floor_tex = floor;
        self.ceil_tex = ceil;
        self
    }

    /// Append a sector bounded by `points` (clockwise, y up).
    pub fn sector(&mut self, floor_h: f32, ceil_h: f32, points: &[Vec2]) -> SectorId {
        let id = self.def.sectors.len() as SectorId;
        let first_wall = self.def.walls.len() as u16;
        for &p in points {
            let vertex = self.vertex(p);
            self.def.walls.push(WallDef {
                top: self.skin.top,
                mid: self.skin.mid,
                bottom: self.skin.bottom,
                ..WallDef::solid(vertex, id)
            });
        }
        self.def.sectors.push(SectorDef {
            first_wall,
            num_walls: points.len() as u16,
            floor_h,
            ceil_h,
            floor_tex: self.floor_tex,
            ceil_tex: self.ceil_tex,
        });
        id
    }

    /// Force wall `wall` of `sector` to open onto `neighbor`, even where the
    /// geometry does not match.
    pub fn portal(&mut self, sector: SectorId, wall: usize, neighbor: SectorId) -> &mut Self {
        if let Some(idx) = self.wall_index(sector, wall) {
            self.def.walls[idx].portal = neighbor;
            self.pinned.push(idx);
        }
        self
    }

    /// Texture offsets of one wall.
    pub fn offset(&mut self, sector: SectorId, wall: usize, x_off: f32, y_off: f32) -> &mut Self {
        if let Some(idx) = self.wall_index(sector, wall) {
            self.def.walls[idx].x_off = x_off;
            self.def.walls[idx].y_off = y_off;
        }
        self
    }

    pub fn build(mut self) -> Result<Map, MapError> {
        self.link_shared_edges();
        Map::from_def(self.def)
    }

    /// Def as it will be validated, after auto-linking.
    pub fn into_def(mut self) -> MapDef {
        self.link_shared_edges();
        self.def
    }

    fn vertex(&mut self, p: Vec2) -> VertexId {
        let key = (p.x.to_bits(), p.y.to_bits());
        if let Some(&v) = self.lookup.get(&key) {
            return v;
        }
        let v = self.def.vertices.len() as VertexId;
        self.def.vertices.push(p);
        self.lookup.insert(key, v);
        v
    }

    fn wall_index(&self, sector: SectorId, wall: usize) -> Option<usize> {
        let sd = self.def.sectors.get(sector as usize)?;
        (wall < sd.num_walls as usize).then(|| sd.first_wall as usize + wall)
    }

    /// Edge `(v1, v2)` of one sector and `(v2, v1)` of another become
    /// mutual portals.
    fn link_shared_edges(&mut self) {
        let mut edges: HashMap<(VertexId, VertexId), (SectorId, usize)> = HashMap::new();
        for (si, sd) in self.def.sectors.iter().enumerate() {
            let first = sd.first_wall as usize;
            let n = sd.num_walls as usize;
            for j in 0..n {
                let v1 = self.def.walls[first + j].vertex;
                let v2 = self.def.walls[first + (j + 1) % n].vertex;
                edges.insert((v1, v2), (si as SectorId, first + j));
            }
        }

        let mut linked = 0usize;
        for (&(v1, v2), &(sector, idx)) in &edges {
            if self.pinned.contains(&idx) {
                continue;
            }
            if let Some(&(other, _)) = edges.get(&(v2, v1)) {
                if other != sector {
                    self.def.walls[idx].portal = other;
                    linked += 1;
                }
            }
        }
        log::debug!("map `{}`: linked {linked} portal walls", self.def.name);
    }
}
