//! VESA framebuffer output stage.
//!
//! Takes rows of logical pixels and writes them into display adapter memory in
//! whatever encoding the active mode uses (8, 15, 16, 24 or 32 bits per pixel),
//! through either a linear framebuffer or a bank-switched window.
//!
//! The pieces, bottom up:
//!
//! - `pixfmt` (re-exported) encodes single pixels.
//! - `mem` is the store primitive all adapter writes go through.
//! - `bank` tracks the selected bank and drives the firmware to move it.
//! - `scanline` walks a run of pixels through either addressing regime.
//! - `output` ties it together for one active mode and flushes rectangles.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod bank;
mod error;
pub mod mem;
pub mod mode;
pub mod output;
pub mod scanline;

pub use error::Error;
pub use output::{Output, Rect, Variant};
pub use pixfmt::{self, Pixel, PixelDepth, PixelFormat};

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "std"))] {
        pub mod sim;
    }
}
