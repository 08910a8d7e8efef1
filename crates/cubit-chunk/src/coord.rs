use serde::{Deserialize, Serialize};

use crate::CHUNK_LENGTH;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk containing the world block position (floor division).
    #[inline]
    pub fn from_world(wx: i32, wy: i32, wz: i32) -> Self {
        let l = CHUNK_LENGTH as i32;
        Self::new(wx.div_euclid(l), wy.div_euclid(l), wz.div_euclid(l))
    }

    #[inline]
    pub fn with_y(self, cy: i32) -> Self {
        Self { cy, ..self }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// World position of the chunk's minimum corner.
    #[inline]
    pub fn origin(self) -> [i32; 3] {
        let l = CHUNK_LENGTH as i32;
        [self.cx * l, self.cy * l, self.cz * l]
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }

    /// Horizontal ring distance, ignoring the vertical axis.
    #[inline]
    pub fn chebyshev_xz(self, other: ChunkCoord) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

/// Splits a world block position into its chunk and the local position inside it.
#[inline]
pub fn world_to_local(wx: i32, wy: i32, wz: i32) -> (ChunkCoord, [i32; 3]) {
    let coord = ChunkCoord::from_world(wx, wy, wz);
    let [ox, oy, oz] = coord.origin();
    (coord, [wx - ox, wy - oy, wz - oz])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_positions_floor() {
        assert_eq!(ChunkCoord::from_world(-1, 0, 31), ChunkCoord::new(-1, 0, 0));
        assert_eq!(ChunkCoord::from_world(-32, -33, 32), ChunkCoord::new(-1, -2, 1));
        let (c, local) = world_to_local(-1, 5, -64);
        assert_eq!(c, ChunkCoord::new(-1, 0, -2));
        assert_eq!(local, [31, 5, 0]);
    }

    #[test]
    fn chebyshev_ignores_height() {
        let a = ChunkCoord::new(0, 0, 0);
        assert_eq!(a.chebyshev_xz(ChunkCoord::new(3, 7, -5)), 5);
    }
}
