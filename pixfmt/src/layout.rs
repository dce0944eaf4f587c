//! Channel placement within an encoded pixel.
//!
//! Direct-color VBE modes describe their pixel layout as a (size, position)
//! pair per channel. Packed-pixel modes, and a depressing number of real
//! BIOSes, leave those fields zeroed; for them we fall back on a fixed table
//! of conventional layouts.

use crate::PixelDepth;

/// Placement of one channel: `size` bits, starting `position` bits above the
/// LSB of the encoded word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct ChannelField {
    pub size: u8,
    pub position: u8,
}

impl ChannelField {
    pub const fn new(size: u8, position: u8) -> Self {
        ChannelField { size, position }
    }

    /// Bitmask covering this field in the encoded word. Bits that would land
    /// above bit 31 are dropped.
    pub fn mask(self) -> u32 {
        let size = self.size.min(32);
        if size == 0 || self.position >= 32 {
            return 0;
        }
        let ones = if size == 32 {
            !0
        } else {
            (1u32 << size) - 1
        };
        ones << self.position
    }

    /// Scales an 8-bit channel value to this field and shifts it into place.
    /// Narrower fields keep the high bits of `value`; wider ones get it in
    /// their high bits with zeros below. Nothing is rounded.
    pub(crate) fn pack(self, value: u8) -> u32 {
        let size = self.size.min(32);
        if size == 0 || self.position >= 32 {
            return 0;
        }
        let scaled = if size <= 8 {
            u32::from(value) >> (8 - size)
        } else {
            u32::from(value) << (size - 8)
        };
        (scaled << self.position) & self.mask()
    }

    /// Inverse of `pack`: pulls the field out of `word` and rescales it to 8
    /// bits. Bits the field doesn't carry come back zero.
    pub(crate) fn unpack(self, word: u32) -> u8 {
        let size = self.size.min(32);
        if size == 0 || self.position >= 32 {
            return 0;
        }
        let raw = (word & self.mask()) >> self.position;
        if size <= 8 {
            (raw << (8 - size)) as u8
        } else {
            (raw >> (size - 8)) as u8
        }
    }
}

/// Placement of all four channels within an encoded pixel.
///
/// The `reserved` field is descriptive only: the encoder always leaves
/// reserved bits zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct ChannelLayout {
    pub red: ChannelField,
    pub green: ChannelField,
    pub blue: ChannelField,
    pub reserved: ChannelField,
}

impl ChannelLayout {
    /// The layout assumed when the mode doesn't tell us:
    ///
    /// - 8: `rrrgggbb`
    /// - 15: `xrrrrrgggggbbbbb`
    /// - 16: `rrrrrggggggbbbbb`
    /// - 24: `rrrrrrrrggggggggbbbbbbbb`, which lands in memory as B, G, R
    /// - 32: `xxxxxxxxrrrrrrrrggggggggbbbbbbbb`
    pub const fn fallback(depth: PixelDepth) -> Self {
        match depth {
            PixelDepth::Bpp8 => ChannelLayout {
                red: ChannelField::new(3, 5),
                green: ChannelField::new(3, 2),
                blue: ChannelField::new(2, 0),
                reserved: ChannelField::new(0, 0),
            },
            PixelDepth::Bpp15 => ChannelLayout {
                red: ChannelField::new(5, 10),
                green: ChannelField::new(5, 5),
                blue: ChannelField::new(5, 0),
                reserved: ChannelField::new(1, 15),
            },
            PixelDepth::Bpp16 => ChannelLayout {
                red: ChannelField::new(5, 11),
                green: ChannelField::new(6, 5),
                blue: ChannelField::new(5, 0),
                reserved: ChannelField::new(0, 0),
            },
            PixelDepth::Bpp24 => ChannelLayout {
                red: ChannelField::new(8, 16),
                green: ChannelField::new(8, 8),
                blue: ChannelField::new(8, 0),
                reserved: ChannelField::new(0, 0),
            },
            PixelDepth::Bpp32 => ChannelLayout {
                red: ChannelField::new(8, 16),
                green: ChannelField::new(8, 8),
                blue: ChannelField::new(8, 0),
                reserved: ChannelField::new(8, 24),
            },
        }
    }

    /// True if the color fields are all zero-sized, i.e. the mode didn't
    /// bother to describe itself.
    pub fn is_unreported(&self) -> bool {
        self.red.size == 0 && self.green.size == 0 && self.blue.size == 0
    }

    /// Picks the layout to use for `depth`: `reported` if the mode filled it
    /// in, the fallback table otherwise.
    pub fn resolve(depth: PixelDepth, reported: ChannelLayout) -> Self {
        if reported.is_unreported() {
            Self::fallback(depth)
        } else {
            reported
        }
    }

    /// Sum of the color field widths.
    pub fn color_bits(&self) -> u32 {
        u32::from(self.red.size) + u32::from(self.green.size) + u32::from(self.blue.size)
    }
}
