//! What the output stage needs to know about the active video mode.
//!
//! Mode enumeration and selection happen elsewhere; by the time we see a mode
//! it has been set, and the caller hands us the relevant subset of the VBE
//! mode information block along with how adapter memory was mapped.

use pixfmt::{ChannelField, ChannelLayout, PixelDepth, PixelFormat};
use smart_default::SmartDefault;

use crate::mem::Segment;
use crate::Error;

/// VBE memory model, as reported in the mode information block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum MemoryModel {
    /// Model 4. Mask and position fields are usually zero.
    #[default]
    PackedPixel,
    /// Model 6. Mask and position fields should be valid.
    DirectColor,
    Other(u8),
}

impl From<u8> for MemoryModel {
    fn from(raw: u8) -> Self {
        match raw {
            4 => MemoryModel::PackedPixel,
            6 => MemoryModel::DirectColor,
            n => MemoryModel::Other(n),
        }
    }
}

/// The parts of the VBE mode information block we consume.
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
pub struct ModeDescriptor {
    #[default = 640]
    pub width: u16,
    #[default = 480]
    pub height: u16,
    #[default = 16]
    pub bits_per_pixel: u8,
    pub memory_model: MemoryModel,
    /// Bytes per scanline for banked access. Linear access has its own stride;
    /// see `Mapping::Linear`.
    #[default = 1280]
    pub bytes_per_scanline: u16,
    /// Real-mode segment of window A.
    #[default = 0xA000]
    pub window_a_segment: u16,
    /// Bank switch granularity, in KiB.
    #[default = 64]
    pub window_granularity_kb: u16,
    /// Window size, in KiB.
    #[default = 64]
    pub window_size_kb: u16,
    pub red: ChannelField,
    pub green: ChannelField,
    pub blue: ChannelField,
    pub reserved: ChannelField,
}

impl ModeDescriptor {
    /// Channel layout as reported, zeroes and all.
    pub fn reported_layout(&self) -> ChannelLayout {
        ChannelLayout {
            red: self.red,
            green: self.green,
            blue: self.blue,
            reserved: self.reserved,
        }
    }

    /// Resolves the pixel format this mode expects, falling back on the
    /// default layout when the mode doesn't report one.
    pub fn pixel_format(&self) -> Result<PixelFormat, Error> {
        let reported = self.reported_layout();
        let depth = PixelDepth::from_mode(self.bits_per_pixel, &reported).ok_or(
            Error::UnsupportedDepth {
                bits: self.bits_per_pixel,
            },
        )?;
        Ok(PixelFormat::with_reported(depth, reported))
    }

    /// Linear address of window A.
    pub fn window_base(&self) -> u32 {
        u32::from(self.window_a_segment) << 4
    }

    pub fn granularity_bytes(&self) -> u32 {
        u32::from(self.window_granularity_kb) * 1024
    }
}

/// The two ways adapter memory can be reached.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AddressingRegime {
    Linear,
    Banked,
}

/// How adapter memory was mapped for us by mode setup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mapping {
    /// The whole framebuffer is visible through `segment`, with rows
    /// `bytes_per_scanline` apart.
    Linear {
        segment: Segment,
        bytes_per_scanline: u32,
    },
    /// Only window A is visible, at `ModeDescriptor::window_base` within
    /// `segment`. Rows are `ModeDescriptor::bytes_per_scanline` apart.
    Banked { segment: Segment },
}

impl Mapping {
    pub fn regime(&self) -> AddressingRegime {
        match self {
            Mapping::Linear { .. } => AddressingRegime::Linear,
            Mapping::Banked { .. } => AddressingRegime::Banked,
        }
    }
}
