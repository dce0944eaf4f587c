//! Access to adapter memory.
//!
//! Every store the output stage makes goes through `VideoMemory`. In a
//! protected-mode x86 kernel this is a far poke through a selector; on
//! anything with a flat address space it's a volatile store relative to a
//! mapped base. Tests use the simulated adapter in `sim`.

use core::ptr::NonNull;

/// Opaque handle naming a mapped memory segment: the linear framebuffer, or
/// the low-memory region containing the banked window.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Segment(pub u16);

/// Width of a single store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StoreWidth {
    Byte,
    Word,
    Dword,
}

impl StoreWidth {
    pub fn bytes(self) -> usize {
        match self {
            StoreWidth::Byte => 1,
            StoreWidth::Word => 2,
            StoreWidth::Dword => 4,
        }
    }

    /// Width of a single store carrying `n` bytes, if there is one.
    pub fn for_bytes(n: usize) -> Option<Self> {
        match n {
            1 => Some(StoreWidth::Byte),
            2 => Some(StoreWidth::Word),
            4 => Some(StoreWidth::Dword),
            _ => None,
        }
    }
}

/// The privileged store primitive.
///
/// `value` is written little-endian in `width` bytes starting at `offset`
/// within `segment`; bits of `value` above `width` are ignored.
/// Implementations are assumed to always succeed given a segment they were
/// set up with.
pub trait VideoMemory {
    fn write(&mut self, segment: Segment, offset: u32, value: u32, width: StoreWidth);
}

impl<M: VideoMemory + ?Sized> VideoMemory for &mut M {
    fn write(&mut self, segment: Segment, offset: u32, value: u32, width: StoreWidth) {
        (**self).write(segment, offset, value, width)
    }
}

/// Maximum number of distinct segments a `MappedMemory` can resolve.
pub const MAX_MAPPINGS: usize = 2;

/// `VideoMemory` over directly addressable mappings, using volatile stores.
pub struct MappedMemory {
    maps: [Option<(Segment, NonNull<u8>, usize)>; MAX_MAPPINGS],
}

impl MappedMemory {
    pub const fn new() -> Self {
        MappedMemory {
            maps: [None; MAX_MAPPINGS],
        }
    }

    /// Makes `segment` resolve to `len` bytes at `base`.
    ///
    /// # Safety
    ///
    /// `base..base + len` must be valid for volatile writes, and stay that way
    /// for as long as this `MappedMemory` exists. Nothing else may hold a
    /// reference into the region.
    ///
    /// # Panics
    ///
    /// If `MAX_MAPPINGS` segments are already mapped.
    pub unsafe fn map(&mut self, segment: Segment, base: NonNull<u8>, len: usize) {
        let slot = self
            .maps
            .iter_mut()
            .find(|m| m.map_or(true, |(s, _, _)| s == segment))
            .expect("too many mapped segments");
        *slot = Some((segment, base, len));
    }

    fn resolve(&self, segment: Segment) -> Option<(NonNull<u8>, usize)> {
        self.maps
            .iter()
            .flatten()
            .find(|(s, _, _)| *s == segment)
            .map(|&(_, base, len)| (base, len))
    }
}

impl Default for MappedMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoMemory for MappedMemory {
    /// # Panics
    ///
    /// If `segment` was never mapped, or the store would fall outside it.
    fn write(&mut self, segment: Segment, offset: u32, value: u32, width: StoreWidth) {
        let (base, len) = self
            .resolve(segment)
            .unwrap_or_else(|| panic!("store to unmapped segment {:?}", segment));
        let offset = offset as usize;
        assert!(
            offset
                .checked_add(width.bytes())
                .map_or(false, |end| end <= len),
            "store at {:#x} outside {:?}",
            offset,
            segment,
        );

        // Safety: in bounds by the check above, and `map`'s contract makes the
        // region writable. Volatile stores must be aligned; misaligned wide
        // stores go out a byte at a time.
        unsafe {
            let p = base.as_ptr().add(offset);
            match width {
                StoreWidth::Byte => p.write_volatile(value as u8),
                StoreWidth::Word if p as usize % 2 == 0 => {
                    (p as *mut u16).write_volatile((value as u16).to_le())
                }
                StoreWidth::Dword if p as usize % 4 == 0 => {
                    (p as *mut u32).write_volatile(value.to_le())
                }
                _ => {
                    for i in 0..width.bytes() {
                        p.add(i).write_volatile((value >> (i * 8)) as u8);
                    }
                }
            }
        }
    }
}
