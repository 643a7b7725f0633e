//! Hierarchical asset pack reader.
//!
//! A pack is a WAD-like file whose directory is a tree: every entry is a
//! 16-byte *node*, branches list a contiguous run of child nodes and lumps
//! point at a byte range of the file.
//!
//! ```text
//! node 0   "PACK" u32 count | u32 size | u32 offset
//! node n   name[8]          | u32 size | u32 offset
//! ```
//!
//! A size with [`BRANCH_FLAG`] set is a branch of `size & !BRANCH_FLAG`
//! children starting at node `offset`.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use bincode::{config, decode_from_slice};
use byteorder::{LittleEndian as LE, ReadBytesExt};
use thiserror::Error;

use super::raw::Record;

pub type NodeId = u32;

/// The root branch.
pub const ROOT: NodeId = 0;
pub const NODE_SIZE: usize = 16;
pub const BRANCH_FLAG: u32 = 0x8000_0000;
pub const MAX_NODE_NAME: usize = 8;

/// One directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackNode {
    pub name: [u8; MAX_NODE_NAME],
    pub size: u32,
    pub offset: u32,
}

impl PackNode {
    #[inline]
    pub fn is_branch(&self) -> bool {
        self.size & BRANCH_FLAG != 0
    }

    /// Child count for branches, byte size for lumps.
    #[inline]
    pub fn len(&self) -> u32 {
        self.size & !BRANCH_FLAG
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name up to the first NUL.
    pub fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(MAX_NODE_NAME);
        std::str::from_utf8(&self.name[..end]).unwrap_or("?")
    }
}

#[derive(Error, Debug)]
pub enum PackError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not a PACK")]
    BadMagic,

    #[error("pack has an empty node table")]
    Empty,

    #[error("node table of {count} entries extends beyond end of file")]
    TableOutOfBounds { count: u32 },

    #[error("node {0} out of range")]
    BadIndex(NodeId),

    #[error("node {name} (# {node}) is a lump, not a branch")]
    NotABranch { node: NodeId, name: String },

    #[error("node {name} (# {node}) is a branch, not a lump")]
    NotALump { node: NodeId, name: String },

    #[error("lump {name} (# {node}) slice {offset}+{size} past EOF ({file_size})")]
    BadOffset {
        node: NodeId,
        name: String,
        offset: u32,
        size: u32,
        file_size: usize,
    },

    #[error("lump {name} (# {node}) size {size} not multiple of element {elem_size}")]
    BadLumpSize {
        node: NodeId,
        name: String,
        size: usize,
        elem_size: usize,
    },

    #[error("lump {name} (# {node}) element {elem}: {source}")]
    BadElement {
        node: NodeId,
        name: String,
        elem: usize,
        source: bincode::error::DecodeError,
    },

    #[error("required node `{0}` not found")]
    Missing(String),

    #[error("node name `{0}` longer than {MAX_NODE_NAME} bytes")]
    NameTooLong(String),

    #[error("cannot store `{0}`: {1}")]
    Unencodable(String, &'static str),

    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),
}

/// Entire pack in memory (raw bytes + parsed node table).
#[derive(Debug)]
pub struct Pack {
    nodes: Vec<PackNode>,
    bytes: Vec<u8>,
}

impl Pack {
    // ------------------------------------------------------------------ //
    // Loading
    // ------------------------------------------------------------------ //

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PackError> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PackError> {
        if bytes.len() < NODE_SIZE || &bytes[..4] != b"PACK" {
            return Err(PackError::BadMagic);
        }
        let mut cur = &bytes[4..];
        let count = cur.read_u32::<LE>()?;
        if count == 0 {
            return Err(PackError::Empty);
        }
        let table_end = count as usize * NODE_SIZE;
        if table_end > bytes.len() {
            return Err(PackError::TableOutOfBounds { count });
        }

        let mut nodes = Vec::with_capacity(count as usize);
        let mut cur = &bytes[..table_end];
        for _ in 0..count {
            let mut name = [0u8; MAX_NODE_NAME];
            cur.read_exact(&mut name)?;
            let size = cur.read_u32::<LE>()?;
            let offset = cur.read_u32::<LE>()?;
            nodes.push(PackNode { name, size, offset });
        }
        // the root's name field holds the magic and count
        nodes[0].name = [0; MAX_NODE_NAME];

        let pack = Self { nodes, bytes };
        pack.branch(ROOT)?;
        log::info!("pack: {} nodes, {} bytes", pack.nodes.len(), pack.bytes.len());
        Ok(pack)
    }

    // ------------------------------------------------------------------ //
    // Directory
    // ------------------------------------------------------------------ //

    pub fn nodes(&self) -> &[PackNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&PackNode, PackError> {
        self.nodes.get(id as usize).ok_or(PackError::BadIndex(id))
    }

    fn branch(&self, id: NodeId) -> Result<&PackNode, PackError> {
        let node = self.node(id)?;
        if !node.is_branch() {
            return Err(PackError::NotABranch {
                node: id,
                name: node.name_str().into(),
            });
        }
        Ok(node)
    }

    /// Children of branch `parent`, in table order.
    pub fn children(
        &self,
        parent: NodeId,
    ) -> Result<impl Iterator<Item = (NodeId, &PackNode)> + '_, PackError> {
        let node = self.branch(parent)?;
        let first = node.offset;
        let end = first as u64 + node.len() as u64;
        if end > self.nodes.len() as u64 {
            return Err(PackError::BadIndex(end.saturating_sub(1) as NodeId));
        }
        Ok((first..end as NodeId).map(move |id| (id, &self.nodes[id as usize])))
    }

    /// Child of `parent` called `name`, if any.
    pub fn find(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>, PackError> {
        Ok(self
            .children(parent)?
            .find(|(_, n)| n.name_str() == name)
            .map(|(id, _)| id))
    }

    /// Like [`find`](Self::find) but the child must exist.
    pub fn get(&self, parent: NodeId, name: &str) -> Result<NodeId, PackError> {
        self.find(parent, name)?
            .ok_or_else(|| PackError::Missing(name.into()))
    }

    /// Walk a `/`-separated path from the root.
    pub fn resolve(&self, path: &str) -> Result<NodeId, PackError> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(ROOT, |node, part| {
                self.find(node, part)?
                    .ok_or_else(|| PackError::Missing(path.into()))
            })
    }

    // ------------------------------------------------------------------ //
    // Lumps
    // ------------------------------------------------------------------ //

    /// Raw bytes of lump `id` (slice into the file image).
    pub fn lump_bytes(&self, id: NodeId) -> Result<&[u8], PackError> {
        let node = self.node(id)?;
        if node.is_branch() {
            return Err(PackError::NotALump {
                node: id,
                name: node.name_str().into(),
            });
        }
        let start = node.offset as usize;
        let end = start + node.size as usize;
        if end > self.bytes.len() {
            return Err(PackError::BadOffset {
                node: id,
                name: node.name_str().into(),
                offset: node.offset,
                size: node.size,
                file_size: self.bytes.len(),
            });
        }
        Ok(&self.bytes[start..end])
    }

    /// Decode lump `id` as a packed array of `T`.
    pub fn lump_to_vec<T: Record>(&self, id: NodeId) -> Result<Vec<T>, PackError> {
        let bytes = self.lump_bytes(id)?;
        let name = || self.nodes[id as usize].name_str().to_owned();

        if bytes.len() % T::SIZE != 0 {
            return Err(PackError::BadLumpSize {
                node: id,
                name: name(),
                size: bytes.len(),
                elem_size: T::SIZE,
            });
        }

        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        bytes
            .chunks_exact(T::SIZE)
            .enumerate()
            .map(|(elem, chunk)| {
                decode_from_slice::<T, _>(chunk, cfg)
                    .map(|(val, _)| val)
                    .map_err(|source| PackError::BadElement {
                        node: id,
                        name: name(),
                        elem,
                        source,
                    })
            })
            .collect()
    }
}

// ==========================================================================
// Tests
// ==========================================================================
