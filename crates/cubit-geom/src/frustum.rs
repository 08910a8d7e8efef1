use crate::{Aabb, Mat4, Vec3};

/// Plane `normal . p + d = 0`; points with a non-negative signed distance are inside.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    #[inline]
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    fn from_row_sum(a: [f32; 4], b: [f32; 4], sign: f32) -> Self {
        let x = a[0] + sign * b[0];
        let y = a[1] + sign * b[1];
        let z = a[2] + sign * b[2];
        let w = a[3] + sign * b[3];
        let len = (x * x + y * y + z * z).sqrt();
        if len > 0.0 {
            Plane::new(Vec3::new(x / len, y / len, z / len), w / len)
        } else {
            Plane::new(Vec3::new(x, y, z), w)
        }
    }

    #[inline]
    pub fn to_array(&self) -> [f32; 4] {
        self.normal.extend(self.d)
    }
}

/// Index of each plane inside [`Frustum::planes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneSide {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
    Far = 4,
    Near = 5,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the six normalized clip planes from a view-projection matrix.
    pub fn from_clip_matrix(m: &Mat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);
        Self {
            planes: [
                Plane::from_row_sum(r3, r0, 1.0),
                Plane::from_row_sum(r3, r0, -1.0),
                Plane::from_row_sum(r3, r1, -1.0),
                Plane::from_row_sum(r3, r1, 1.0),
                Plane::from_row_sum(r3, r2, -1.0),
                Plane::from_row_sum(r3, r2, 1.0),
            ],
        }
    }

    #[inline]
    pub fn plane(&self, side: PlaneSide) -> Plane {
        self.planes[side as usize]
    }

    /// Conservative box test: rejects only when the box lies fully behind one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let n = plane.normal;
            let positive = Vec3::new(
                if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.signed_distance(positive) >= 0.0
        })
    }

    pub fn to_arrays(&self) -> [[f32; 4]; 6] {
        let mut out = [[0.0; 4]; 6];
        for (dst, plane) in out.iter_mut().zip(self.planes.iter()) {
            *dst = plane.to_array();
        }
        out
    }
}

/// Distance window used by the cull pass. A non-positive `max` disables the far limit.
#[inline]
pub fn within_distance(aabb: &Aabb, eye: Vec3, min: f32, max: f32) -> bool {
    let dist = aabb.distance_to_point(eye);
    if dist < min {
        return false;
    }
    max <= 0.0 || dist <= max
}

impl Frustum {
    /// Frustum plus distance window, the exact predicate the GPU cull pass evaluates.
    #[inline]
    pub fn accepts(&self, aabb: &Aabb, eye: Vec3, min_distance: f32, max_distance: f32) -> bool {
        within_distance(aabb, eye, min_distance, max_distance) && self.intersects_aabb(aabb)
    }
}
