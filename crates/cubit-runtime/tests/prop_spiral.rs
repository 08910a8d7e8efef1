use std::collections::HashSet;

use cubit_runtime::spiral_offsets;
use proptest::prelude::*;

proptest! {
    #[test]
    fn spiral_covers_square_once_in_ring_order(radius in 0i32..24) {
        let offsets = spiral_offsets(radius);
        let side = (2 * radius + 1) as usize;
        prop_assert_eq!(offsets.len(), side * side);
        prop_assert_eq!(offsets[0], (0, 0));

        let unique: HashSet<_> = offsets.iter().copied().collect();
        prop_assert_eq!(unique.len(), offsets.len());

        let mut last_ring = 0;
        for &(dx, dz) in &offsets {
            let ring = dx.abs().max(dz.abs());
            prop_assert!(ring <= radius);
            prop_assert!(ring >= last_ring, "ring {} after {}", ring, last_ring);
            last_ring = ring;
        }
    }

    #[test]
    fn consecutive_offsets_are_adjacent(radius in 1i32..16) {
        let offsets = spiral_offsets(radius);
        for pair in offsets.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert_eq!((a.0 - b.0).abs() + (a.1 - b.1).abs(), 1);
        }
    }
}
