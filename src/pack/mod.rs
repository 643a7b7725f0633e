mod container;
mod loader;
mod raw;
mod writer;

pub use container::{BRANCH_FLAG, MAX_NODE_NAME, NODE_SIZE, NodeId, Pack, PackError, PackNode, ROOT};
pub use loader::{LoadError, decode_flat, decode_patch, decode_sprite, load_map, load_textures, map_names};
pub use raw::{RawName, RawSector, RawVertex, RawWall, Record};
pub use writer::{PackBuilder, encode_patch, encode_sprite};
