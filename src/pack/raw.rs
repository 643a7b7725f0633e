use bincode::{Decode, Encode};

/*=======================================================================*/
/*                         Raw binary structs                            */
/*=======================================================================*/

/// Fixed-size little-endian record stored back to back in a lump.
///
/// `SIZE` is the on-disk size; records are packed, so it is not
/// `size_of::<Self>()`.
pub trait Record: Decode<()> + Encode {
    const SIZE: usize;
}

/// `maps/<name>/vertices`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Decode, Encode)]
pub struct RawVertex {
    pub x: i16,
    pub y: i16,
}

/// `maps/<name>/sectors`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Decode, Encode)]
pub struct RawSector {
    pub num_walls: u16,
    pub first_wall: u16,
    pub floor: i16,
    pub ceiling: i16,
    /// 1-based index into the map's flat table, 0 = none.
    pub floor_flat: u8,
    pub ceil_flat: u8,
}

/// `maps/<name>/walls`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Decode, Encode)]
pub struct RawWall {
    pub vertex: u16,
    /// Equal to the owning sector for solid walls.
    pub portal: u16,
    pub x_off: u8,
    pub y_off: u8,
    /// 1-based indices into the map's patch table, 0 = none.
    pub top: u8,
    pub mid: u8,
    pub bottom: u8,
}

/// Entry of the `patches` / `flats` name tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Decode, Encode)]
pub struct RawName(pub [u8; 8]);

impl Record for RawVertex {
    const SIZE: usize = 4;
}

impl Record for RawSector {
    const SIZE: usize = 10;
}

impl Record for RawWall {
    const SIZE: usize = 9;
}

impl Record for RawName {
    const SIZE: usize = 8;
}

impl RawName {
    /// NUL-padded; `None` if `name` does not fit.
    pub fn new(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() > 8 {
            return None;
        }
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        Some(Self(raw))
    }

    /// Upper-cased name up to the first NUL.
    pub fn as_string(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&self.0[..end]).to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincode::config;

    fn encoded_len<T: Record>(val: &T) -> usize {
        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        bincode::encode_to_vec(val, cfg).unwrap().len()
    }

    #[test]
    fn sizes_match_the_disk_layout() {
        assert_eq!(encoded_len(&RawVertex { x: -1, y: 2 }), RawVertex::SIZE);
        let s = RawSector {
            num_walls: 4,
            first_wall: 0,
            floor: 0,
            ceiling: 128,
            floor_flat: 1,
            ceil_flat: 2,
        };
        assert_eq!(encoded_len(&s), RawSector::SIZE);
        let w = RawWall {
            vertex: 0,
            portal: 0,
            x_off: 0,
            y_off: 0,
            top: 0,
            mid: 1,
            bottom: 0,
        };
        assert_eq!(encoded_len(&w), RawWall::SIZE);
        assert_eq!(encoded_len(&RawName([0; 8])), RawName::SIZE);
    }

    #[test]
    fn names() {
        let n = RawName::new("brick").unwrap();
        assert_eq!(&n.0, b"brick\0\0\0");
        assert_eq!(n.as_string(), "BRICK");
        assert!(RawName::new("NINECHARS").is_none());
        assert_eq!(RawName(*b"EIGHTCHR").as_string(), "EIGHTCHR");
    }
}
