//! Per-face lookup tables shared by the meshers and the AO calculator.

use cubit_blocks::Face;

/// Tangent axes `(u, v)` of a face axis; `u x v` points along the positive normal.
#[inline]
pub const fn tangent_axes(axis: usize) -> (usize, usize) {
    ((axis + 1) % 3, (axis + 2) % 3)
}

/// Quad corners as `(du, dv)` steps, counter-clockwise seen from outside a positive face.
pub const POS_CORNERS: [(u32, u32); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];
/// Same for negative faces, mirrored to keep the winding outward.
pub const NEG_CORNERS: [(u32, u32); 4] = [(0, 0), (0, 1), (1, 1), (1, 0)];

#[inline]
pub const fn corners(face: Face) -> &'static [(u32, u32); 4] {
    if face.is_positive() {
        &POS_CORNERS
    } else {
        &NEG_CORNERS
    }
}

/// Occluder offsets `[edge1, corner, edge2]` relative to the voxel, per face and corner.
pub const AO_OFFSETS: [[[[i32; 3]; 3]; 4]; 6] = build_ao_offsets();

const fn build_ao_offsets() -> [[[[i32; 3]; 3]; 4]; 6] {
    let mut table = [[[[0i32; 3]; 3]; 4]; 6];
    let mut f = 0;
    while f < 6 {
        let face = match Face::from_index(f) {
            Some(face) => face,
            None => Face::PosX,
        };
        let axis = face.axis();
        let (u, v) = tangent_axes(axis);
        let cs = corners(face);
        let mut k = 0;
        while k < 4 {
            let (du, dv) = cs[k];
            let su = if du == 0 { -1 } else { 1 };
            let sv = if dv == 0 { -1 } else { 1 };
            let mut base = [0i32; 3];
            base[axis] = if face.is_positive() { 1 } else { -1 };
            let mut edge1 = base;
            edge1[u] += su;
            let mut edge2 = base;
            edge2[v] += sv;
            let mut corner = base;
            corner[u] += su;
            corner[v] += sv;
            table[f][k] = [edge1, corner, edge2];
            k += 1;
        }
        f += 1;
    }
    table
}

/// Index pattern of one quad; flipped quads split along the 1-3 diagonal.
#[inline]
pub const fn quad_indices(flip: bool) -> [u32; 6] {
    if flip {
        [1, 2, 3, 3, 0, 1]
    } else {
        [0, 1, 2, 2, 3, 0]
    }
}
