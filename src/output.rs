//! Pushing rectangles of pixels to the screen.
//!
//! An `Output` is created when a mode is activated and lives as long as the
//! mode does. It owns everything with mode lifetime: the memory and firmware
//! handles, the resolved pixel format, and (in banked modes) the bank state.
//! The writer variant is chosen once, in `activate`; after that, flushing a
//! rectangle is just one scanline write per row.

use pixfmt::{Pixel, PixelDepth, PixelFormat};

use crate::bank::{BankSelect, BankState};
use crate::mem::{Segment, VideoMemory};
use crate::mode::{AddressingRegime, Mapping, ModeDescriptor};
use crate::scanline::{scanline_address, write_scanline, Banked, Linear};
use crate::Error;

/// A screen rectangle. All four bounds are inclusive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }
}

/// Which of the ten scanline writers an `Output` uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Variant {
    pub depth: PixelDepth,
    pub regime: AddressingRegime,
}

enum Target {
    Linear(Linear),
    Banked {
        segment: Segment,
        stride: u32,
        bank: BankState,
    },
}

/// The output stage for one active mode.
pub struct Output<M, F> {
    memory: M,
    firmware: F,
    format: PixelFormat,
    width: u32,
    height: u32,
    target: Target,
}

impl<M: VideoMemory, F: BankSelect> Output<M, F> {
    /// Sets up output for `mode`, reached through `mapping`.
    ///
    /// For banked mappings this initializes the bank state, so the first
    /// write will select its bank through `firmware` whatever the adapter's
    /// window happens to show. Linear mappings never touch `firmware`.
    pub fn activate(
        mode: &ModeDescriptor,
        mapping: Mapping,
        memory: M,
        firmware: F,
    ) -> Result<Self, Error> {
        let format = mode.pixel_format()?;
        let target = match mapping {
            Mapping::Linear {
                segment,
                bytes_per_scanline,
            } => Target::Linear(Linear {
                segment,
                stride: bytes_per_scanline,
            }),
            Mapping::Banked { segment } => Target::Banked {
                segment,
                stride: u32::from(mode.bytes_per_scanline),
                bank: BankState::init(mode)?,
            },
        };

        log::debug!(
            "activating {}x{} {:?} {:?} ({:?}){}",
            mode.width,
            mode.height,
            format.depth,
            mapping.regime(),
            mode.memory_model,
            if mode.reported_layout().is_unreported() {
                ", default channel layout"
            } else {
                ""
            },
        );

        Ok(Output {
            memory,
            firmware,
            format,
            width: u32::from(mode.width),
            height: u32::from(mode.height),
            target,
        })
    }

    pub fn variant(&self) -> Variant {
        Variant {
            depth: self.format.depth,
            regime: match self.target {
                Target::Linear(_) => AddressingRegime::Linear,
                Target::Banked { .. } => AddressingRegime::Banked,
            },
        }
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// Bank state, in banked modes.
    pub fn bank_state(&self) -> Option<&BankState> {
        match &self.target {
            Target::Linear(_) => None,
            Target::Banked { bank, .. } => Some(bank),
        }
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn firmware(&self) -> &F {
        &self.firmware
    }

    /// Gives back the memory and firmware handles, ending the mode's output.
    pub fn into_parts(self) -> (M, F) {
        (self.memory, self.firmware)
    }

    /// Writes pixels `left..=right` of row `top`, starting from `pixels[0]`.
    pub fn write_scanline(
        &mut self,
        left: u32,
        top: u32,
        right: u32,
        pixels: &[Pixel],
    ) -> Result<(), Error> {
        self.check_point(right, top)?;
        self.write_row(left, top, right, pixels)
    }

    /// Pushes `rect` to the screen from `pixels`, a buffer holding the
    /// rectangle's rows `stride` pixels apart, starting at its top left.
    ///
    /// Everything is checked before the first store, so an error means
    /// nothing was drawn.
    pub fn flush(&mut self, rect: &Rect, pixels: &[Pixel], stride: usize) -> Result<(), Error> {
        if rect.is_inverted() {
            return Err(Error::InvertedRect);
        }
        self.check_point(rect.right, rect.bottom)?;

        let width = (rect.right - rect.left) as usize + 1;
        let rows = (rect.bottom - rect.top) as usize + 1;
        if stride < width {
            return Err(Error::SourceStride { stride, width });
        }
        let needed = (rows - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(width))
            .ok_or(Error::AddressOverflow)?;
        if pixels.len() < needed {
            return Err(Error::ShortSource {
                needed,
                available: pixels.len(),
            });
        }
        // The bottom right corner is the highest address touched.
        self.check_addressable(rect.right, rect.bottom)?;

        log::trace!("flush {:?}", rect);
        for (row, y) in (rect.top..=rect.bottom).enumerate() {
            let src = &pixels[row * stride..];
            self.write_row(rect.left, y, rect.right, src)?;
        }
        Ok(())
    }

    fn check_point(&self, x: u32, y: u32) -> Result<(), Error> {
        if x < self.width && y < self.height {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn check_addressable(&self, x: u32, y: u32) -> Result<(), Error> {
        let bpp = self.format.bytes_per_pixel() as u32;
        let stride = match &self.target {
            Target::Linear(lin) => lin.stride,
            Target::Banked { stride, .. } => *stride,
        };
        let last = scanline_address(y, x, stride, bpp)?
            .checked_add(bpp - 1)
            .ok_or(Error::AddressOverflow)?;
        if let Target::Banked { bank, .. } = &self.target {
            bank.locate(last)?;
        }
        Ok(())
    }

    fn write_row(&mut self, left: u32, y: u32, right: u32, pixels: &[Pixel]) -> Result<(), Error> {
        let Output {
            memory,
            firmware,
            format,
            target,
            ..
        } = self;
        match target {
            Target::Linear(lin) => write_scanline(memory, lin, format, left, y, right, pixels),
            Target::Banked {
                segment,
                stride,
                bank,
            } => {
                let mut addr = Banked {
                    segment: *segment,
                    stride: *stride,
                    bank,
                    firmware,
                };
                write_scanline(memory, &mut addr, format, left, y, right, pixels)
            }
        }
    }
}
