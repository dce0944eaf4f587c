//! Pixel encoding for VESA direct-color and packed-pixel modes.
//!
//! This turns a logical pixel, with one byte per channel, into the exact
//! bytes a display adapter expects at a given depth. It knows nothing about
//! the adapter's memory, which keeps it testable on the host.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod layout;

use arrayvec::ArrayVec;
use byteorder::{ByteOrder, LittleEndian};

pub use layout::{ChannelField, ChannelLayout};

/// A logical pixel, as produced by the renderer.
///
/// The alpha channel is carried along for the renderer's benefit; none of the
/// display depths store it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b, a: 0 }
    }

    /// Packs as `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        u32::from(self.a) << 24
            | u32::from(self.r) << 16
            | u32::from(self.g) << 8
            | u32::from(self.b)
    }

    pub fn from_argb(v: u32) -> Self {
        Pixel {
            a: (v >> 24) as u8,
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }
}

impl From<u32> for Pixel {
    fn from(v: u32) -> Self {
        Pixel::from_argb(v)
    }
}

impl From<Pixel> for u32 {
    fn from(p: Pixel) -> Self {
        p.to_argb()
    }
}

/// Color depths the output stage can drive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelDepth {
    Bpp8,
    Bpp15,
    Bpp16,
    Bpp24,
    Bpp32,
}

impl PixelDepth {
    pub const ALL: [PixelDepth; 5] = [
        PixelDepth::Bpp8,
        PixelDepth::Bpp15,
        PixelDepth::Bpp16,
        PixelDepth::Bpp24,
        PixelDepth::Bpp32,
    ];

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(PixelDepth::Bpp8),
            15 => Some(PixelDepth::Bpp15),
            16 => Some(PixelDepth::Bpp16),
            24 => Some(PixelDepth::Bpp24),
            32 => Some(PixelDepth::Bpp32),
            _ => None,
        }
    }

    /// Works out the depth from a mode's reported bits-per-pixel and layout.
    ///
    /// Plenty of BIOSes report 5:5:5 modes as 16 bits per pixel and only
    /// reveal the truth through the channel masks, so a 16-bit mode whose
    /// color fields add up to 15 bits is treated as depth 15.
    pub fn from_mode(bits: u8, reported: &ChannelLayout) -> Option<Self> {
        match Self::from_bits(bits)? {
            PixelDepth::Bpp16
                if !reported.is_unreported() && reported.color_bits() == 15 =>
            {
                Some(PixelDepth::Bpp15)
            }
            d => Some(d),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            PixelDepth::Bpp8 => 8,
            PixelDepth::Bpp15 => 15,
            PixelDepth::Bpp16 => 16,
            PixelDepth::Bpp24 => 24,
            PixelDepth::Bpp32 => 32,
        }
    }

    /// Bytes occupied by one pixel in video memory: `ceil(bits / 8)`.
    pub fn bytes(self) -> usize {
        ((self.bits() + 7) / 8) as usize
    }
}

/// The bytes of one pixel, in the order they appear in video memory.
pub type EncodedPixel = ArrayVec<[u8; 4]>;

/// A depth together with the channel layout to use at that depth.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PixelFormat {
    pub depth: PixelDepth,
    pub layout: ChannelLayout,
}

impl PixelFormat {
    /// Format using the fallback layout for `depth`.
    pub const fn new(depth: PixelDepth) -> Self {
        PixelFormat {
            depth,
            layout: ChannelLayout::fallback(depth),
        }
    }

    /// Format using `reported` unless it's all zeroes.
    pub fn with_reported(depth: PixelDepth, reported: ChannelLayout) -> Self {
        PixelFormat {
            depth,
            layout: ChannelLayout::resolve(depth, reported),
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.depth.bytes()
    }

    /// Packs `p` into a little-endian word, without splitting it into bytes.
    /// Bits above the depth's width are always zero.
    pub fn pack(&self, p: Pixel) -> u32 {
        let l = &self.layout;
        let word = l.red.pack(p.r) | l.green.pack(p.g) | l.blue.pack(p.b);
        match self.depth.bytes() {
            4 => word,
            n => word & ((1 << (n * 8)) - 1),
        }
    }

    /// Encodes `p` into the bytes the adapter expects.
    pub fn encode(&self, p: Pixel) -> EncodedPixel {
        let word = self.pack(p);
        let mut raw = [0; 4];
        LittleEndian::write_u32(&mut raw, word);

        let mut out = EncodedPixel::new();
        for &b in &raw[..self.depth.bytes()] {
            out.push(b);
        }
        out
    }

    /// Recovers the channels from encoded bytes. Low bits lost to truncation
    /// come back as zero, as does alpha.
    ///
    /// # Panics
    ///
    /// If `bytes` is shorter than one pixel at this depth.
    pub fn decode(&self, bytes: &[u8]) -> Pixel {
        let bytes = &bytes[..self.depth.bytes()];
        let word = match bytes.len() {
            1 => u32::from(bytes[0]),
            2 => u32::from(LittleEndian::read_u16(bytes)),
            3 => LittleEndian::read_u24(bytes),
            _ => LittleEndian::read_u32(bytes),
        };
        let l = &self.layout;
        Pixel {
            r: l.red.unpack(word),
            g: l.green.unpack(word),
            b: l.blue.unpack(word),
            a: 0,
        }
    }
}

/// Encodes `p` at `depth` using the fallback layout.
pub fn encode(p: Pixel, depth: PixelDepth) -> EncodedPixel {
    PixelFormat::new(depth).encode(p)
}
