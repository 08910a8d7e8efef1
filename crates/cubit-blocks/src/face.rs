/// The six axis-aligned faces of a voxel, in mesh-data order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    #[inline]
    pub const fn from_index(i: usize) -> Option<Face> {
        match i {
            0 => Some(Face::PosX),
            1 => Some(Face::NegX),
            2 => Some(Face::PosY),
            3 => Some(Face::NegY),
            4 => Some(Face::PosZ),
            5 => Some(Face::NegZ),
            _ => None,
        }
    }

    /// Face built from an axis (0 = x, 1 = y, 2 = z) and a direction.
    #[inline]
    pub const fn from_axis(axis: usize, positive: bool) -> Face {
        let base = match axis {
            0 => 0,
            1 => 2,
            _ => 4,
        };
        match Face::from_index(base + if positive { 0 } else { 1 }) {
            Some(f) => f,
            None => Face::PosX,
        }
    }

    #[inline]
    pub const fn axis(self) -> usize {
        self.index() >> 1
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.index() & 1 == 0
    }

    #[inline]
    pub const fn opposite(self) -> Face {
        Face::from_axis(self.axis(), !self.is_positive())
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub const fn delta(self) -> (i32, i32, i32) {
        let step = if self.is_positive() { 1 } else { -1 };
        match self.axis() {
            0 => (step, 0, 0),
            1 => (0, step, 0),
            _ => (0, 0, step),
        }
    }
}
