use cubit_geom::{Aabb, Vec3};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f32> {
    -1_000.0f32..1_000.0
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_aabb() -> impl Strategy<Value = Aabb> {
    (arb_vec3(), 0.0f32..64.0).prop_map(|(min, size)| Aabb::from_origin_size(min, size))
}

proptest! {
    // Points inside the box have zero distance
    #[test]
    fn center_has_zero_distance(b in arb_aabb()) {
        prop_assert!(b.contains(b.center()));
        prop_assert_eq!(b.distance_to_point(b.center()), 0.0);
    }

    // Distance never exceeds the distance to the center
    #[test]
    fn distance_bounded_by_center_distance(b in arb_aabb(), p in arb_vec3()) {
        let d = b.distance_to_point(p);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= (p - b.center()).length() + 1e-3);
    }

    // Cross product is orthogonal to its inputs
    #[test]
    fn cross_is_orthogonal(a in arb_vec3(), b in arb_vec3()) {
        let c = a.cross(b);
        let scale = a.length() * b.length() * c.length() + 1.0;
        prop_assert!(a.dot(c).abs() / scale < 1e-3);
        prop_assert!(b.dot(c).abs() / scale < 1e-3);
    }
}
