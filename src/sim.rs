//! A simulated display adapter, for running the output stage on the host.
//!
//! The adapter has flat video RAM that can be reached two ways: directly
//! through the `LFB` segment, or through a bank window in `LOW_MEMORY` that
//! only shows one granularity-aligned slice at a time. Every store and every
//! bank switch is recorded so tests can check exactly what happened.

use std::cell::Cell;
use std::rc::Rc;

use crate::bank::{BankSelect, Window};
use crate::mem::{Segment, StoreWidth, VideoMemory};
use crate::mode::ModeDescriptor;

/// Segment through which the linear framebuffer is mapped.
pub const LFB: Segment = Segment(0x0010);
/// Segment covering the first megabyte, which holds the banked window.
pub const LOW_MEMORY: Segment = Segment(0x0008);

/// One store, as seen by the adapter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Store {
    pub segment: Segment,
    pub offset: u32,
    pub value: u32,
    pub width: StoreWidth,
    /// Bank selected at the time, for stores through the window.
    pub bank: Option<u16>,
    /// Index of the first byte written in video RAM.
    pub at: usize,
}

#[derive(Copy, Clone, Debug)]
struct BankWindow {
    base: u32,
    size: u32,
    granularity: u32,
}

/// Video RAM plus the store log. This is the adapter's `VideoMemory`.
#[derive(Debug)]
pub struct SimMemory {
    vram: Vec<u8>,
    window: Option<BankWindow>,
    bank: Rc<Cell<Option<u16>>>,
    stores: Vec<Store>,
}

impl SimMemory {
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Video RAM byte indices written so far, sorted and without repeats.
    pub fn touched(&self) -> Vec<usize> {
        let mut t: Vec<usize> = self
            .stores
            .iter()
            .flat_map(|s| s.at..s.at + s.width.bytes())
            .collect();
        t.sort_unstable();
        t.dedup();
        t
    }

    pub fn clear_log(&mut self) {
        self.stores.clear();
    }

    fn resolve(&self, segment: Segment, offset: u32) -> (usize, Option<u16>) {
        if segment == LFB {
            return (offset as usize, None);
        }
        assert_eq!(segment, LOW_MEMORY, "store to unknown segment");
        let w = self.window.expect("adapter has no bank window");
        let rel = offset
            .checked_sub(w.base)
            .filter(|&r| r < w.size)
            .unwrap_or_else(|| panic!("store at {:#x} misses the bank window", offset));
        let bank = self
            .bank
            .get()
            .expect("store through the window before any bank was selected");
        let at = bank as usize * w.granularity as usize + rel as usize;
        (at, Some(bank))
    }
}

impl VideoMemory for SimMemory {
    fn write(&mut self, segment: Segment, offset: u32, value: u32, width: StoreWidth) {
        let (at, bank) = self.resolve(segment, offset);
        let n = width.bytes();
        assert!(
            at + n <= self.vram.len(),
            "store at vram {:#x} past end {:#x}",
            at,
            self.vram.len()
        );
        for i in 0..n {
            self.vram[at + i] = (value >> (i * 8)) as u8;
        }
        self.stores.push(Store {
            segment,
            offset,
            value,
            width,
            bank,
            at,
        });
    }
}

/// The adapter's window-control firmware.
#[derive(Debug)]
pub struct SimFirmware {
    bank: Rc<Cell<Option<u16>>>,
    switches: Vec<u16>,
}

impl SimFirmware {
    /// Banks selected, in order, since creation or the last `clear`.
    pub fn switches(&self) -> &[u16] {
        &self.switches
    }

    pub fn clear(&mut self) {
        self.switches.clear();
    }
}

impl BankSelect for SimFirmware {
    fn set_window(&mut self, window: Window, bank: u16) {
        assert_eq!(window, Window::A, "only window A is implemented");
        self.bank.set(Some(bank));
        self.switches.push(bank);
    }
}

/// Memory and firmware halves of one simulated adapter. They share the
/// selected-bank register.
#[derive(Debug)]
pub struct SimAdapter {
    pub memory: SimMemory,
    pub firmware: SimFirmware,
}

impl SimAdapter {
    fn new(vram_size: usize, window: Option<BankWindow>) -> Self {
        let bank = Rc::new(Cell::new(None));
        SimAdapter {
            memory: SimMemory {
                vram: vec![0; vram_size],
                window,
                bank: bank.clone(),
                stores: Vec::new(),
            },
            firmware: SimFirmware {
                bank,
                switches: Vec::new(),
            },
        }
    }

    /// An adapter reachable only through the `LFB` segment.
    pub fn linear(vram_size: usize) -> Self {
        Self::new(vram_size, None)
    }

    /// An adapter with a bank window laid out as `mode` describes. The `LFB`
    /// segment works too, which is handy for reading back.
    pub fn banked(mode: &ModeDescriptor, vram_size: usize) -> Self {
        Self::new(
            vram_size,
            Some(BankWindow {
                base: mode.window_base(),
                size: u32::from(mode.window_size_kb) * 1024,
                granularity: mode.granularity_bytes(),
            }),
        )
    }
}
