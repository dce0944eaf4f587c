//! Bank switching for adapters without a linear framebuffer.
//!
//! In banked modes only one window of adapter memory is visible at a time,
//! anchored at a multiple of the window granularity. Moving it takes a
//! firmware call (VBE function 4F05h), which is slow, so `BankState` remembers
//! which bank is selected and skips the call when it already matches.

use crate::mode::ModeDescriptor;
use crate::Error;

/// VBE function number for display window control.
pub const VBE_WINDOW_CONTROL: u16 = 0x4F05;

/// Subfunction of 4F05h that moves a window. Goes in BH.
const SET_WINDOW: u16 = 0x00;

/// The two VBE memory windows. Only window A is ever moved here; B is listed
/// so register images can describe it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Window {
    A = 0,
    B = 1,
}

/// Register image of an `INT 10h` window-control call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BankRegs {
    pub ax: u16,
    pub bx: u16,
    pub dx: u16,
}

impl BankRegs {
    /// Registers that move `window` to `bank`, in granularity units.
    pub fn set_window(window: Window, bank: u16) -> Self {
        BankRegs {
            ax: VBE_WINDOW_CONTROL,
            bx: SET_WINDOW << 8 | window as u16,
            dx: bank,
        }
    }
}

/// The firmware bank-select service.
///
/// Implementations block until the adapter's window has moved. There is no
/// failure path: an adapter that doesn't respond is beyond saving at this
/// layer.
pub trait BankSelect {
    fn set_window(&mut self, window: Window, bank: u16);
}

impl<B: BankSelect + ?Sized> BankSelect for &mut B {
    fn set_window(&mut self, window: Window, bank: u16) {
        (**self).set_window(window, bank)
    }
}

/// Adapts a real-mode interrupt shim, which takes a register image and issues
/// `INT 10h` with it, into a `BankSelect`.
pub struct Int10<F>(pub F);

impl<F: FnMut(BankRegs)> BankSelect for Int10<F> {
    fn set_window(&mut self, window: Window, bank: u16) {
        (self.0)(BankRegs::set_window(window, bank))
    }
}

/// Stand-in firmware for setups that only ever use a linear mapping.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBankSwitch;

impl BankSelect for NoBankSwitch {
    /// # Panics
    ///
    /// Always. Getting here means a banked writer was selected without
    /// firmware to drive it.
    fn set_window(&mut self, window: Window, bank: u16) {
        panic!("bank switch to {:?}:{} with no firmware", window, bank)
    }
}

/// Bank-switching state for the active mode.
///
/// Created by `init` when a banked mode is activated and owned for the
/// lifetime of that mode. Only `ensure_bank` changes the selected bank.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BankState {
    base: u32,
    granularity: u32,
    current: Option<u16>,
    switches: usize,
}

impl BankState {
    /// Sets up bank state for `mode`: window A's linear address as the base,
    /// and no bank known to be selected, so the first `ensure_bank` will
    /// always reach the firmware.
    pub fn init(mode: &ModeDescriptor) -> Result<Self, Error> {
        let granularity = mode.granularity_bytes();
        if granularity == 0 {
            return Err(Error::ZeroGranularity);
        }
        Ok(BankState {
            base: mode.window_base(),
            granularity,
            current: None,
            switches: 0,
        })
    }

    /// Address of the window within its segment.
    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    /// The selected bank, or `None` before the first switch.
    pub fn current(&self) -> Option<u16> {
        self.current
    }

    /// Number of firmware calls made through this state.
    pub fn switch_count(&self) -> usize {
        self.switches
    }

    /// Splits an absolute framebuffer offset into bank index and offset
    /// within the bank.
    pub fn locate(&self, offset: u32) -> Result<(u16, u32), Error> {
        let bank = offset / self.granularity;
        let bank = if bank <= u32::from(u16::MAX) {
            bank as u16
        } else {
            return Err(Error::BankOutOfRange { bank });
        };
        Ok((bank, offset % self.granularity))
    }

    /// Selects `bank` in window A unless it's already selected.
    pub fn ensure_bank(&mut self, firmware: &mut impl BankSelect, bank: u16) {
        if self.current == Some(bank) {
            return;
        }
        log::trace!("bank {:?} -> {}", self.current, bank);
        firmware.set_window(Window::A, bank);
        self.current = Some(bank);
        self.switches += 1;
    }
}
