use cubit_gpu::{GpuSubAllocator, HeadlessBackend};
use proptest::prelude::*;
use proptest::sample::Index;

const CAPACITY: u32 = 4096;

fn check_tiling(a: &GpuSubAllocator<u32>, live: &[u32]) {
    let blocks = a.blocks();
    let total: u32 = blocks.iter().map(|b| b.size).sum();
    assert_eq!(total, a.capacity());
    assert_eq!(blocks[0].offset, 0);
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].end(), pair[1].offset, "blocks must tile the buffer");
        assert!(
            !(pair[0].is_free() && pair[1].is_free()),
            "adjacent free blocks must be merged"
        );
    }
    assert!(blocks.iter().all(|b| b.size > 0));
    assert_eq!(a.num_allocs() as usize, live.len());
    assert_eq!(a.live().count(), live.len());
    for &h in live {
        let alloc = a.get(h).expect("live handle resolves");
        assert_eq!(alloc.offset % a.alignment(), 0);
        assert_eq!(alloc.user_data, Some(h));
    }
}

proptest! {
    #[test]
    fn random_alloc_free_keeps_buffer_tiled(
        ops in prop::collection::vec((any::<bool>(), 1usize..400, any::<Index>()), 0..150),
        order in prop::collection::vec(any::<Index>(), 150),
    ) {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<u32>::new(&mut gpu, CAPACITY, 16).unwrap();
        let mut live: Vec<u32> = Vec::new();

        for (alloc, size, pick) in ops {
            if alloc || live.is_empty() {
                let data = vec![0xABu8; size];
                if let Some(got) = a.allocate(&mut gpu, &data, None) {
                    prop_assert!(got.handle != 0);
                    prop_assert!(!live.contains(&got.handle));
                    a.set_user_data(got.handle, got.handle);
                    live.push(got.handle);
                }
            } else {
                let h = live.swap_remove(pick.index(live.len()));
                prop_assert!(a.free(h));
            }
            check_tiling(&a, &live);
        }

        let mut i = 0;
        while !live.is_empty() {
            let h = live.swap_remove(order[i % order.len()].index(live.len()));
            prop_assert!(a.free(h));
            check_tiling(&a, &live);
            i += 1;
        }
        prop_assert_eq!(a.blocks().len(), 1);
        prop_assert!(a.blocks()[0].is_free());
        prop_assert_eq!(a.blocks()[0].size, CAPACITY);
    }

    #[test]
    fn live_ranges_never_overlap(sizes in prop::collection::vec(1usize..600, 1..40)) {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<u32>::new(&mut gpu, CAPACITY, 16).unwrap();
        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for (i, size) in sizes.into_iter().enumerate() {
            if let Some(got) = a.allocate(&mut gpu, &vec![0u8; size], None) {
                let end = got.offset + a.get(got.handle).unwrap().size;
                for &(s, e) in &ranges {
                    prop_assert!(end <= s || got.offset >= e);
                }
                ranges.push((got.offset, end));
            }
            // Free every third allocation to create holes.
            if i % 3 == 2 {
                let first = a.live().next().map(|b| b.handle);
                if let Some(first) = first {
                    let alloc = *a.get(first).unwrap();
                    a.free(first);
                    ranges.retain(|&(s, _)| s != alloc.offset);
                }
            }
        }
    }
}
