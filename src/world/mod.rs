mod builder;
mod camera;
mod geometry;
mod helpers;
pub mod samples;
pub mod texture;
mod visitor;

pub use geometry::{
    Aabb, Map, MapDef, MapError, Portal, Sector, SectorDef, SectorId, Vertex, VertexId, Wall,
    WallDef, WallId,
};

pub use builder::MapBuilder;
pub use camera::Camera;
pub use visitor::SectorVisitor;

pub use texture::{
    FLAT_SIZE, Flat, NO_TEXTURE, Palette, Patch, Post, Sprite, TextureBank, TextureError,
    TextureId,
};
