use glam::Vec2;
use thiserror::Error;

use crate::world::texture::{NO_TEXTURE, TextureId};

pub type VertexId = u16;
pub type WallId = u16;
pub type SectorId = u16;

/// Runtime snapshot of one map (immutable after load).
#[derive(Debug)]
pub struct Map {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub walls: Vec<Wall>,
    pub sectors: Vec<Sector>,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub pos: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

/*----------------------------- walls --------------------------------*/

/// What lies behind a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Portal {
    Solid,
    Sector(SectorId),
}

impl Portal {
    #[inline]
    pub fn neighbor(self) -> Option<SectorId> {
        match self {
            Portal::Solid => None,
            Portal::Sector(s) => Some(s),
        }
    }
}

/// One edge of a sector, walked clockwise (y up).
#[derive(Clone, Debug)]
pub struct Wall {
    pub v1: VertexId,
    pub v2: VertexId,
    /// Cached endpoint positions.
    pub p1: Vec2,
    pub p2: Vec2,
    pub delta: Vec2,
    /// Unit normal `(delta.y, -delta.x)`; points into the owning sector.
    pub normal: Vec2,
    pub length: f32,
    pub portal: Portal,
    pub x_off: f32,
    pub y_off: f32,
    pub top: TextureId,
    pub mid: TextureId,
    pub bottom: TextureId,
}

/*---------------------------- sectors -------------------------------*/

#[derive(Clone, Debug)]
pub struct Sector {
    pub first_wall: WallId,
    pub num_walls: u16,
    pub floor_h: f32,
    pub ceil_h: f32,
    pub floor_tex: TextureId,
    pub ceil_tex: TextureId,
    pub bounds: Aabb,
}

/*------------------------ unvalidated input -------------------------*/

/// Plain description of a map as read from disk or assembled in code.
/// Nothing is checked until [`Map::from_def`].
#[derive(Clone, Debug, Default)]
pub struct MapDef {
    pub name: String,
    pub vertices: Vec<Vec2>,
    pub sectors: Vec<SectorDef>,
    pub walls: Vec<WallDef>,
}

#[derive(Clone, Debug)]
pub struct SectorDef {
    pub first_wall: u16,
    pub num_walls: u16,
    pub floor_h: f32,
    pub ceil_h: f32,
    pub floor_tex: TextureId,
    pub ceil_tex: TextureId,
}

/// A wall starts at `vertex` and ends at the next wall's vertex.
/// `portal` equal to the owning sector index means solid.
#[derive(Clone, Debug)]
pub struct WallDef {
    pub vertex: u16,
    pub portal: u16,
    pub x_off: f32,
    pub y_off: f32,
    pub top: TextureId,
    pub mid: TextureId,
    pub bottom: TextureId,
}

impl WallDef {
    pub fn solid(vertex: u16, sector: u16) -> Self {
        Self {
            vertex,
            portal: sector,
            x_off: 0.0,
            y_off: 0.0,
            top: NO_TEXTURE,
            mid: NO_TEXTURE,
            bottom: NO_TEXTURE,
        }
    }
}

/// Fatal map validation failures.
#[derive(Error, Debug, PartialEq)]
pub enum MapError {
    #[error("map has no sectors")]
    NoSectors,

    #[error("sector {sector} has {count} walls, at least 3 required")]
    NotAPolygon { sector: usize, count: u16 },

    #[error("walls {first}+{count} of sector {sector} exceed the {total} walls in the map")]
    WallsOutOfRange {
        sector: usize,
        first: u16,
        count: u16,
        total: usize,
    },

    #[error("wall {wall} of sector {sector} references vertex {vertex} of {total}")]
    VertexOutOfRange {
        sector: usize,
        wall: usize,
        vertex: u16,
        total: usize,
    },

    #[error("wall {wall} of sector {sector} has zero length")]
    ZeroLengthWall { sector: usize, wall: usize },

    #[error("wall {wall} of sector {sector} is a portal to sector {portal} of {total}")]
    PortalOutOfRange {
        sector: usize,
        wall: usize,
        portal: u16,
        total: usize,
    },

    #[error("sector {sector} floor {floor} is not below its ceiling {ceiling}")]
    BadHeights {
        sector: usize,
        floor: f32,
        ceiling: f32,
    },

    #[error("wall {wall} is claimed by sector {sector} and sector {owner}")]
    SharedWall {
        sector: usize,
        wall: usize,
        owner: usize,
    },

    #[error("sector {sector} is not convex and clockwise at wall {wall}")]
    NotConvex { sector: usize, wall: usize },
}

/*--------------------------- construction ---------------------------*/

impl Map {
    /// Validate `def` and build the immutable runtime map.
    pub fn from_def(def: MapDef) -> Result<Map, MapError> {
        if def.sectors.is_empty() {
            return Err(MapError::NoSectors);
        }

        let vertices: Vec<Vertex> = def.vertices.iter().map(|&pos| Vertex { pos }).collect();
        let mut walls: Vec<Option<Wall>> = vec![None; def.walls.len()];
        let mut owners: Vec<Option<usize>> = vec![None; def.walls.len()];
        let mut sectors = Vec::with_capacity(def.sectors.len());

        for (si, sd) in def.sectors.iter().enumerate() {
            if sd.num_walls < 3 {
                return Err(MapError::NotAPolygon {
                    sector: si,
                    count: sd.num_walls,
                });
            }
            let first = sd.first_wall as usize;
            let end = first + sd.num_walls as usize;
            if end > def.walls.len() {
                return Err(MapError::WallsOutOfRange {
                    sector: si,
                    first: sd.first_wall,
                    count: sd.num_walls,
                    total: def.walls.len(),
                });
            }
            if sd.floor_h >= sd.ceil_h {
                return Err(MapError::BadHeights {
                    sector: si,
                    floor: sd.floor_h,
                    ceiling: sd.ceil_h,
                });
            }

            for (wall, owner) in owners[first..end].iter_mut().enumerate() {
                if let Some(owner) = *owner {
                    return Err(MapError::SharedWall {
                        sector: si,
                        wall: first + wall,
                        owner,
                    });
                }
                *owner = Some(si);
            }

            let mut bounds = Aabb::empty();
            for j in 0..sd.num_walls as usize {
                let wd = &def.walls[first + j];
                let next = &def.walls[first + (j + 1) % sd.num_walls as usize];
                let vertex_of = |v: u16| {
                    vertices
                        .get(v as usize)
                        .map(|vx| vx.pos)
                        .ok_or(MapError::VertexOutOfRange {
                            sector: si,
                            wall: j,
                            vertex: v,
                            total: vertices.len(),
                        })
                };
                let p1 = vertex_of(wd.vertex)?;
                let p2 = vertex_of(next.vertex)?;

                let delta = p2 - p1;
                let length = delta.length();
                if length == 0.0 {
                    return Err(MapError::ZeroLengthWall { sector: si, wall: j });
                }

                let portal = if wd.portal as usize == si {
                    Portal::Solid
                } else if (wd.portal as usize) < def.sectors.len() {
                    Portal::Sector(wd.portal)
                } else {
                    return Err(MapError::PortalOutOfRange {
                        sector: si,
                        wall: j,
                        portal: wd.portal,
                        total: def.sectors.len(),
                    });
                };

                bounds.expand_to_fit(p1);
                walls[first + j] = Some(Wall {
                    v1: wd.vertex,
                    v2: next.vertex,
                    p1,
                    p2,
                    delta,
                    normal: Vec2::new(delta.y, -delta.x) / length,
                    length,
                    portal,
                    x_off: wd.x_off,
                    y_off: wd.y_off,
                    top: wd.top,
                    mid: wd.mid,
                    bottom: wd.bottom,
                });
            }

            sectors.push(Sector {
                first_wall: sd.first_wall,
                num_walls: sd.num_walls,
                floor_h: sd.floor_h,
                ceil_h: sd.ceil_h,
                floor_tex: sd.floor_tex,
                ceil_tex: sd.ceil_tex,
                bounds,
            });
        }

        // Walls no sector claims are kept (degenerate) so indices stay stable.
        let walls = walls
            .into_iter()
            .zip(def.walls.iter())
            .map(|(w, wd)| w.unwrap_or_else(|| Wall::orphan(wd)))
            .collect();

        let map = Map {
            name: def.name,
            vertices,
            walls,
            sectors,
        };

        for si in 0..map.sectors.len() {
            map.check_convex(si as SectorId)?;
        }

        log::info!(
            "map `{}`: {} vertices, {} walls, {} sectors",
            map.name,
            map.vertices.len(),
            map.walls.len(),
            map.sectors.len()
        );
        Ok(map)
    }

    /// Every vertex of the sector must sit on or in front of every wall,
    /// and each wall must have at least one vertex strictly in front.
    fn check_convex(&self, id: SectorId) -> Result<(), MapError> {
        let walls = self.walls_of(id);
        for (wi, wall) in walls.iter().enumerate() {
            let mut strictly_inside = false;
            for other in walls {
                let d = wall.side_distance(other.p1);
                if d < 0.0 {
                    return Err(MapError::NotConvex {
                        sector: id as usize,
                        wall: wi,
                    });
                }
                strictly_inside |= d > 0.0;
            }
            if !strictly_inside {
                return Err(MapError::NotConvex {
                    sector: id as usize,
                    wall: wi,
                });
            }
        }
        Ok(())
    }

    /*----------------------------- access ----------------------------*/

    #[inline]
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id as usize]
    }

    /// The walls of sector `id`, in winding order.
    #[inline]
    pub fn walls_of(&self, id: SectorId) -> &[Wall] {
        let s = &self.sectors[id as usize];
        let first = s.first_wall as usize;
        &self.walls[first..first + s.num_walls as usize]
    }

    /// Global index of the `i`-th wall of sector `id`.
    #[inline]
    pub fn wall_id(&self, id: SectorId, i: usize) -> WallId {
        self.sectors[id as usize].first_wall + i as WallId
    }

    #[inline]
    pub fn num_sectors(&self) -> usize {
        self.sectors.len()
    }
}

impl Wall {
    fn orphan(wd: &WallDef) -> Self {
        Wall {
            v1: wd.vertex,
            v2: wd.vertex,
            p1: Vec2::ZERO,
            p2: Vec2::ZERO,
            delta: Vec2::ZERO,
            normal: Vec2::ZERO,
            length: 0.0,
            portal: Portal::Solid,
            x_off: wd.x_off,
            y_off: wd.y_off,
            top: wd.top,
            mid: wd.mid,
            bottom: wd.bottom,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
