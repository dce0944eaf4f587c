use thiserror::Error;

/// Contract violations detected by the output stage.
///
/// All of these are checked before anything is stored, so a call that fails
/// leaves adapter memory as it was.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("scanline runs backwards: left {left} > right {right}")]
    InvertedSpan { left: u32, right: u32 },
    #[error("rectangle has negative extent")]
    InvertedRect,
    #[error("source holds {available} pixels, {needed} needed")]
    ShortSource { needed: usize, available: usize },
    #[error("source stride {stride} is narrower than the {width}-pixel rectangle")]
    SourceStride { stride: usize, width: usize },
    #[error("({x}, {y}) lies outside the {width}x{height} mode")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("framebuffer offset overflows")]
    AddressOverflow,
    #[error("bank {bank} exceeds what the firmware can select")]
    BankOutOfRange { bank: u32 },
    #[error("unsupported depth: {bits} bits per pixel")]
    UnsupportedDepth { bits: u8 },
    #[error("banked mode reports zero window granularity")]
    ZeroGranularity,
}
