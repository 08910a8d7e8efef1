//! Best-fit sub-allocator over one fixed-capacity GPU buffer.
//!
//! The buffer is tiled by an ordered list of blocks. A block with handle 0 is
//! free; every other block is a live allocation. Adjacent free blocks are
//! always coalesced, so after freeing everything a single free block remains.

use crate::backend::{BufferId, GpuBackend};
use crate::error::GpuError;

/// One tile of the buffer. `handle == 0` marks a free block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Allocation<U> {
    pub handle: u32,
    pub offset: u32,
    pub size: u32,
    pub user_data: Option<U>,
}

impl<U> Allocation<U> {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.handle == 0
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }
}

/// Result of a successful allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubAllocation {
    pub handle: u32,
    pub offset: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    pub capacity: u32,
    pub num_allocs: u32,
    pub used_bytes: u32,
    pub free_bytes: u32,
    pub largest_free_block: u32,
    pub num_blocks: usize,
}

pub struct GpuSubAllocator<U = ()> {
    buffer: BufferId,
    capacity: u32,
    alignment: u32,
    next_handle: u32,
    num_allocs: u32,
    blocks: Vec<Allocation<U>>,
}

#[inline]
fn align_up(value: u32, alignment: u32) -> Option<u32> {
    let mask = alignment - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

impl<U: Copy> GpuSubAllocator<U> {
    /// Creates the backing buffer. `size_bytes` is rounded up to `alignment`.
    pub fn new(
        backend: &mut impl GpuBackend,
        size_bytes: u32,
        alignment: u32,
    ) -> Result<Self, GpuError> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(GpuError::InvalidAlignment(alignment));
        }
        if size_bytes == 0 {
            return Err(GpuError::ZeroCapacity);
        }
        let capacity = align_up(size_bytes, alignment).ok_or(GpuError::ZeroCapacity)?;
        let buffer = backend.create_buffer(capacity as u64);
        Ok(Self {
            buffer,
            capacity,
            alignment,
            next_handle: 1,
            num_allocs: 0,
            blocks: vec![Allocation {
                handle: 0,
                offset: 0,
                size: capacity,
                user_data: None,
            }],
        })
    }

    /// Reserves `data.len()` bytes (rounded up to the alignment) in the smallest
    /// free block that fits and uploads `data` there. Returns `None` when the
    /// input is empty or no free block is large enough.
    pub fn allocate(
        &mut self,
        backend: &mut impl GpuBackend,
        data: &[u8],
        user_data: Option<U>,
    ) -> Option<SubAllocation> {
        if data.is_empty() {
            return None;
        }
        let Some(size) = u32::try_from(data.len())
            .ok()
            .and_then(|len| align_up(len, self.alignment))
        else {
            log::error!(target: "alloc", "allocation of {} bytes exceeds buffer addressing", data.len());
            return None;
        };

        let best = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_free() && b.size >= size)
            .min_by_key(|(_, b)| b.size)
            .map(|(i, _)| i);
        let Some(idx) = best else {
            log::error!(
                target: "alloc",
                "no space for {} bytes (free {} bytes, largest block {})",
                size,
                self.free_bytes(),
                self.largest_free_block()
            );
            return None;
        };

        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        let offset = self.blocks[idx].offset;
        let alloc = Allocation {
            handle,
            offset,
            size,
            user_data,
        };
        let free = &mut self.blocks[idx];
        free.size -= size;
        free.offset += size;
        if free.size == 0 {
            *free = alloc;
        } else {
            self.blocks.insert(idx, alloc);
        }
        self.num_allocs += 1;

        backend.upload_sub_data(self.buffer, offset as u64, data);
        Some(SubAllocation { handle, offset })
    }

    /// Releases `handle`, merging the block with free neighbours. Unknown handles
    /// are logged and ignored.
    pub fn free(&mut self, handle: u32) -> bool {
        let Some(mut idx) = self.position(handle) else {
            log::error!(target: "alloc", "free of unknown handle {handle}");
            return false;
        };
        self.blocks[idx].handle = 0;
        self.blocks[idx].user_data = None;

        if idx + 1 < self.blocks.len() && self.blocks[idx + 1].is_free() {
            let next = self.blocks.remove(idx + 1);
            self.blocks[idx].size += next.size;
        }
        if idx > 0 && self.blocks[idx - 1].is_free() {
            let cur = self.blocks.remove(idx);
            idx -= 1;
            self.blocks[idx].size += cur.size;
        }
        self.num_allocs -= 1;
        true
    }

    fn position(&self, handle: u32) -> Option<usize> {
        if handle == 0 {
            return None;
        }
        self.blocks.iter().position(|b| b.handle == handle)
    }

    pub fn get(&self, handle: u32) -> Option<&Allocation<U>> {
        self.position(handle).map(|i| &self.blocks[i])
    }

    pub fn set_user_data(&mut self, handle: u32, user_data: U) -> bool {
        match self.position(handle) {
            Some(i) => {
                self.blocks[i].user_data = Some(user_data);
                true
            }
            None => false,
        }
    }

    /// All blocks, free and live, in buffer order.
    pub fn blocks(&self) -> &[Allocation<U>] {
        &self.blocks
    }

    /// Live allocations in buffer order.
    pub fn live(&self) -> impl Iterator<Item = &Allocation<U>> {
        self.blocks.iter().filter(|b| !b.is_free())
    }

    #[inline]
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    #[inline]
    pub fn num_allocs(&self) -> u32 {
        self.num_allocs
    }

    pub fn free_bytes(&self) -> u32 {
        self.blocks.iter().filter(|b| b.is_free()).map(|b| b.size).sum()
    }

    pub fn largest_free_block(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> AllocatorStats {
        let free_bytes = self.free_bytes();
        AllocatorStats {
            capacity: self.capacity,
            num_allocs: self.num_allocs,
            used_bytes: self.capacity - free_bytes,
            free_bytes,
            largest_free_block: self.largest_free_block(),
            num_blocks: self.blocks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;

    #[test]
    fn rejects_bad_construction() {
        let mut gpu = HeadlessBackend::new();
        assert_eq!(
            GpuSubAllocator::<()>::new(&mut gpu, 0, 16).err(),
            Some(GpuError::ZeroCapacity)
        );
        assert_eq!(
            GpuSubAllocator::<()>::new(&mut gpu, 64, 0).err(),
            Some(GpuError::InvalidAlignment(0))
        );
        assert_eq!(
            GpuSubAllocator::<()>::new(&mut gpu, 64, 12).err(),
            Some(GpuError::InvalidAlignment(12))
        );
    }

    #[test]
    fn capacity_rounds_up() {
        let mut gpu = HeadlessBackend::new();
        let a = GpuSubAllocator::<()>::new(&mut gpu, 100, 16).unwrap();
        assert_eq!(a.capacity(), 112);
        assert_eq!(a.blocks().len(), 1);
        assert_eq!(a.free_bytes(), 112);
    }

    #[test]
    fn allocates_in_placement_order_and_uploads() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<u8>::new(&mut gpu, 256, 16).unwrap();
        let x = a.allocate(&mut gpu, &[1u8; 10], Some(7)).unwrap();
        let y = a.allocate(&mut gpu, &[2u8; 20], None).unwrap();
        assert_eq!((x.handle, x.offset), (1, 0));
        assert_eq!((y.handle, y.offset), (2, 16));
        assert_eq!(a.get(1).unwrap().size, 16);
        assert_eq!(a.get(2).unwrap().size, 32);
        assert_eq!(a.get(1).unwrap().user_data, Some(7));
        assert_eq!(&gpu.buffer(a.buffer())[0..10], &[1u8; 10]);
        assert_eq!(&gpu.buffer(a.buffer())[16..36], &[2u8; 20]);
        assert_eq!(a.num_allocs(), 2);
        assert_eq!(a.free_bytes(), 256 - 48);
    }

    #[test]
    fn empty_data_is_not_an_allocation() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 64, 16).unwrap();
        assert!(a.allocate(&mut gpu, &[], None).is_none());
        assert_eq!(a.num_allocs(), 0);
    }

    #[test]
    fn exhaustion_returns_none_without_corruption() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 64, 16).unwrap();
        assert!(a.allocate(&mut gpu, &[0u8; 48], None).is_some());
        assert!(a.allocate(&mut gpu, &[0u8; 32], None).is_none());
        assert_eq!(a.num_allocs(), 1);
        assert_eq!(a.free_bytes(), 16);
        assert!(a.allocate(&mut gpu, &[0u8; 16], None).is_some());
        assert_eq!(a.free_bytes(), 0);
    }

    #[test]
    fn best_fit_prefers_smallest_hole() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 256, 16).unwrap();
        let big = a.allocate(&mut gpu, &[0u8; 64], None).unwrap();
        let _sep1 = a.allocate(&mut gpu, &[0u8; 16], None).unwrap();
        let small = a.allocate(&mut gpu, &[0u8; 32], None).unwrap();
        let _sep2 = a.allocate(&mut gpu, &[0u8; 16], None).unwrap();
        a.free(big.handle);
        a.free(small.handle);
        // Holes: 64 @ 0, 32 @ 80, tail 128 @ 128.
        let got = a.allocate(&mut gpu, &[0u8; 20], None).unwrap();
        assert_eq!(got.offset, 80);
    }

    #[test]
    fn unknown_handle_free_is_a_noop() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 64, 16).unwrap();
        let x = a.allocate(&mut gpu, &[0u8; 16], None).unwrap();
        let before = a.blocks().to_vec();
        assert!(!a.free(0));
        assert!(!a.free(99));
        assert_eq!(a.blocks(), &before[..]);
        assert!(a.free(x.handle));
        assert!(!a.free(x.handle));
    }

    #[test]
    fn freeing_everything_coalesces() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 128, 16).unwrap();
        let hs: Vec<u32> = (0..4)
            .map(|_| a.allocate(&mut gpu, &[0u8; 16], None).unwrap().handle)
            .collect();
        a.free(hs[1]);
        a.free(hs[3]);
        a.free(hs[0]);
        a.free(hs[2]);
        assert_eq!(a.blocks().len(), 1);
        assert_eq!(a.blocks()[0].size, 128);
        assert!(a.blocks()[0].is_free());
        assert_eq!(a.num_allocs(), 0);
    }

    #[test]
    fn handles_keep_increasing_after_free() {
        let mut gpu = HeadlessBackend::new();
        let mut a = GpuSubAllocator::<()>::new(&mut gpu, 64, 16).unwrap();
        let x = a.allocate(&mut gpu, &[0u8; 16], None).unwrap();
        a.free(x.handle);
        let y = a.allocate(&mut gpu, &[0u8; 16], None).unwrap();
        assert!(y.handle > x.handle);
        assert_eq!(y.offset, 0);
    }
}
