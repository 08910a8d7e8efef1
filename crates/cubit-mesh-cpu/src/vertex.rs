use bytemuck::{Pod, Zeroable};
use cubit_blocks::Face;

const COORD_BITS: u32 = 6;
const COORD_MASK: u32 = (1 << COORD_BITS) - 1;
const TEXTURE_BITS: u32 = 29;
const TEXTURE_MASK: u32 = (1 << TEXTURE_BITS) - 1;

/// Packed chunk vertex.
///
/// `data1`: x, y, z, u, v (6 bits each, from bit 0) then AO in bits 30..32.
/// `data2`: texture index in bits 0..29, face index in bits 29..32.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ChunkVertex {
    pub data1: u32,
    pub data2: u32,
}

impl ChunkVertex {
    pub const MAX_COORD: u32 = COORD_MASK;
    pub const MAX_TEXTURE: u32 = TEXTURE_MASK;

    #[inline]
    pub fn new(pos: [u32; 3], uv: [u32; 2], ao: u8, texture: u32, face: Face) -> Self {
        debug_assert!(
            pos.iter().chain(uv.iter()).all(|c| *c <= COORD_MASK),
            "vertex coordinate out of range: pos={pos:?} uv={uv:?}"
        );
        debug_assert!(ao <= 3, "ao level out of range: {ao}");
        debug_assert!(texture <= TEXTURE_MASK, "texture index out of range: {texture}");
        let data1 = pos[0]
            | (pos[1] << 6)
            | (pos[2] << 12)
            | (uv[0] << 18)
            | (uv[1] << 24)
            | ((ao as u32) << 30);
        let data2 = texture | ((face.index() as u32) << TEXTURE_BITS);
        Self { data1, data2 }
    }

    #[inline]
    pub fn position(&self) -> [u32; 3] {
        [
            self.data1 & COORD_MASK,
            (self.data1 >> 6) & COORD_MASK,
            (self.data1 >> 12) & COORD_MASK,
        ]
    }

    #[inline]
    pub fn uv(&self) -> [u32; 2] {
        [(self.data1 >> 18) & COORD_MASK, (self.data1 >> 24) & COORD_MASK]
    }

    #[inline]
    pub fn ao(&self) -> u8 {
        (self.data1 >> 30) as u8
    }

    #[inline]
    pub fn texture_index(&self) -> u32 {
        self.data2 & TEXTURE_MASK
    }

    #[inline]
    pub fn face(&self) -> Option<Face> {
        Face::from_index((self.data2 >> TEXTURE_BITS) as usize)
    }
}

/// Packs an average colour into the texture field, as LOD vertices carry colour instead.
#[inline]
pub fn pack_rgb(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_unpack() {
        let v = ChunkVertex::new([32, 0, 17], [5, 63], 2, ChunkVertex::MAX_TEXTURE, Face::NegZ);
        assert_eq!(v.position(), [32, 0, 17]);
        assert_eq!(v.uv(), [5, 63]);
        assert_eq!(v.ao(), 2);
        assert_eq!(v.texture_index(), ChunkVertex::MAX_TEXTURE);
        assert_eq!(v.face(), Some(Face::NegZ));
        assert_eq!(std::mem::size_of::<ChunkVertex>(), 8);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn coordinate_overflow_is_caught() {
        let _ = ChunkVertex::new([64, 0, 0], [0, 0], 0, 0, Face::PosX);
    }

    #[test]
    fn rgb_fits_texture_field() {
        assert_eq!(pack_rgb([0x12, 0x34, 0x56]), 0x12_3456);
        assert!(pack_rgb([255, 255, 255]) <= ChunkVertex::MAX_TEXTURE);
    }
}
