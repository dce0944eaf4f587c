//! Scanline writers.
//!
//! A scanline write walks a horizontal run of pixels, encodes each one, and
//! stores the bytes at the right place in adapter memory. There are ten
//! combinations of depth and addressing regime; rather than ten loops, the
//! walk here is generic over an `Addressing` strategy, and the encoding is
//! whatever `PixelFormat` the mode resolved to.

use pixfmt::{EncodedPixel, Pixel, PixelFormat};

use crate::bank::{BankSelect, BankState};
use crate::mem::{Segment, StoreWidth, VideoMemory};
use crate::Error;

/// Commits one encoded pixel at an absolute framebuffer offset.
pub trait Addressing {
    /// Bytes from the start of one scanline to the start of the next.
    fn stride(&self) -> u32;

    fn store_pixel<M: VideoMemory>(
        &mut self,
        mem: &mut M,
        offset: u32,
        pixel: &EncodedPixel,
    ) -> Result<(), Error>;

    /// Checks that every byte in `start..=last` can be addressed, so a run
    /// can be rejected before any of it is stored.
    fn check_range(&self, _start: u32, _last: u32) -> Result<(), Error> {
        Ok(())
    }
}

/// The whole framebuffer visible at once through one segment.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Linear {
    pub segment: Segment,
    pub stride: u32,
}

impl Addressing for Linear {
    fn stride(&self) -> u32 {
        self.stride
    }

    /// Pixels go out as a single store where one exists for their width. At
    /// 24 bits there is none, so each of the three bytes is stored on its
    /// own; this is slow, and callers after throughput should avoid 24-bit
    /// modes.
    fn store_pixel<M: VideoMemory>(
        &mut self,
        mem: &mut M,
        offset: u32,
        pixel: &EncodedPixel,
    ) -> Result<(), Error> {
        match StoreWidth::for_bytes(pixel.len()) {
            Some(width) => {
                let mut value = 0;
                for (i, &b) in pixel.iter().enumerate() {
                    value |= u32::from(b) << (i * 8);
                }
                mem.write(self.segment, offset, value, width);
            }
            None => {
                for (i, &b) in pixel.iter().enumerate() {
                    mem.write(self.segment, offset + i as u32, u32::from(b), StoreWidth::Byte);
                }
            }
        }
        Ok(())
    }
}

/// A window onto the framebuffer that has to be moved by firmware.
///
/// Every byte resolves its own bank before it is stored, not every pixel: a
/// multi-byte pixel can straddle a bank boundary, with its offset wrapping to
/// zero partway through. The per-byte check is nearly always the no-op path
/// in `ensure_bank`.
pub struct Banked<'a, F> {
    pub segment: Segment,
    pub stride: u32,
    pub bank: &'a mut BankState,
    pub firmware: &'a mut F,
}

impl<'a, F: BankSelect> Addressing for Banked<'a, F> {
    fn stride(&self) -> u32 {
        self.stride
    }

    fn store_pixel<M: VideoMemory>(
        &mut self,
        mem: &mut M,
        offset: u32,
        pixel: &EncodedPixel,
    ) -> Result<(), Error> {
        for (i, &b) in pixel.iter().enumerate() {
            let off = offset.checked_add(i as u32).ok_or(Error::AddressOverflow)?;
            let (bank, bank_offset) = self.bank.locate(off)?;
            self.bank.ensure_bank(&mut *self.firmware, bank);
            mem.write(
                self.segment,
                self.bank.base() + bank_offset,
                u32::from(b),
                StoreWidth::Byte,
            );
        }
        Ok(())
    }

    fn check_range(&self, _start: u32, last: u32) -> Result<(), Error> {
        self.bank.locate(last).map(|_| ())
    }
}

/// Byte offset of pixel `x` on row `y`.
pub fn scanline_address(y: u32, x: u32, stride: u32, bpp: u32) -> Result<u32, Error> {
    y.checked_mul(stride)
        .and_then(|row| x.checked_mul(bpp).and_then(|col| row.checked_add(col)))
        .ok_or(Error::AddressOverflow)
}

/// Writes pixels `left..=right` of row `top` from `pixels`, which starts with
/// the pixel for column `left`.
///
/// The run is validated before anything is stored: `left` must not exceed
/// `right`, `pixels` must cover the run, and every offset in it must be
/// addressable.
pub fn write_scanline<M, A>(
    mem: &mut M,
    addressing: &mut A,
    format: &PixelFormat,
    left: u32,
    top: u32,
    right: u32,
    pixels: &[Pixel],
) -> Result<(), Error>
where
    M: VideoMemory,
    A: Addressing,
{
    if left > right {
        return Err(Error::InvertedSpan { left, right });
    }
    let count = (right - left) as usize + 1;
    if pixels.len() < count {
        return Err(Error::ShortSource {
            needed: count,
            available: pixels.len(),
        });
    }

    let bpp = format.bytes_per_pixel() as u32;
    let stride = addressing.stride();
    let start = scanline_address(top, left, stride, bpp)?;
    let end = scanline_address(top, right, stride, bpp)?;
    let last = end.checked_add(bpp - 1).ok_or(Error::AddressOverflow)?;
    addressing.check_range(start, last)?;

    for (i, &p) in pixels[..count].iter().enumerate() {
        let offset = start + i as u32 * bpp;
        addressing.store_pixel(mem, offset, &format.encode(p))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeDescriptor;
    use crate::sim::{SimAdapter, LFB, LOW_MEMORY};
    use pixfmt::PixelDepth;

    fn ramp(n: usize) -> Vec<Pixel> {
        (0..n)
            .map(|i| Pixel::rgb(i as u8, (i * 7) as u8, 255 - i as u8))
            .collect()
    }

    fn banked_mode(stride: u16) -> ModeDescriptor {
        ModeDescriptor {
            bytes_per_scanline: stride,
            window_granularity_kb: 64,
            window_size_kb: 64,
            ..ModeDescriptor::default()
        }
    }

    #[test]
    fn linear_touches_exactly_the_run() {
        for &depth in PixelDepth::ALL.iter() {
            let format = PixelFormat::new(depth);
            let bpp = depth.bytes() as u32;
            let stride = 100 * bpp + 12;
            let mut sim = SimAdapter::linear(stride as usize * 8);
            let mut lin = Linear { segment: LFB, stride };
            let px = ramp(40);

            write_scanline(&mut sim.memory, &mut lin, &format, 5, 3, 44, &px).unwrap();

            let start = (3 * stride + 5 * bpp) as usize;
            let n = 40 * bpp as usize;
            let touched = sim.memory.touched();
            assert_eq!(touched, (start..start + n).collect::<Vec<_>>(), "{:?}", depth);
            for (i, p) in px.iter().enumerate() {
                let at = start + i * bpp as usize;
                assert_eq!(&sim.memory.vram()[at..at + bpp as usize], &format.encode(*p)[..]);
            }
        }
    }

    #[test]
    fn linear_store_widths() {
        let expect = [
            (PixelDepth::Bpp8, vec![StoreWidth::Byte]),
            (PixelDepth::Bpp15, vec![StoreWidth::Word]),
            (PixelDepth::Bpp16, vec![StoreWidth::Word]),
            (PixelDepth::Bpp24, vec![StoreWidth::Byte; 3]),
            (PixelDepth::Bpp32, vec![StoreWidth::Dword]),
        ];
        for (depth, widths) in expect.iter() {
            let mut sim = SimAdapter::linear(64);
            let mut lin = Linear { segment: LFB, stride: 32 };
            write_scanline(
                &mut sim.memory,
                &mut lin,
                &PixelFormat::new(*depth),
                0,
                0,
                0,
                &[Pixel::rgb(10, 20, 30)],
            )
            .unwrap();
            let got: Vec<_> = sim.memory.stores().iter().map(|s| s.width).collect();
            assert_eq!(&got, widths, "{:?}", depth);
        }
    }

    #[test]
    fn linear_24_stores_blue_first() {
        let mut sim = SimAdapter::linear(16);
        let mut lin = Linear { segment: LFB, stride: 16 };
        let f = PixelFormat::new(PixelDepth::Bpp24);
        write_scanline(&mut sim.memory, &mut lin, &f, 1, 0, 1, &[Pixel::rgb(10, 20, 30)])
            .unwrap();
        let offsets: Vec<_> = sim.memory.stores().iter().map(|s| (s.offset, s.value)).collect();
        assert_eq!(offsets, vec![(3, 30), (4, 20), (5, 10)]);
    }

    #[test_log::test]
    fn banked_16_straddling_boundary() {
        // Row 1 of a 65535-byte stride starts one byte short of bank 1.
        let mode = banked_mode(65535);
        let mut sim = SimAdapter::banked(&mode, 4 * 65536);
        let mut bank = BankState::init(&mode).unwrap();
        let format = PixelFormat::new(PixelDepth::Bpp16);
        let px = [Pixel::rgb(255, 0, 0), Pixel::rgb(0, 0, 255)];
        {
            let mut addr = Banked {
                segment: LOW_MEMORY,
                stride: 65535,
                bank: &mut bank,
                firmware: &mut sim.firmware,
            };
            write_scanline(&mut sim.memory, &mut addr, &format, 0, 1, 1, &px).unwrap();
        }

        let stores = sim.memory.stores();
        let placed: Vec<_> = stores.iter().map(|s| (s.bank, s.offset - 0xA0000)).collect();
        assert_eq!(
            placed,
            vec![
                (Some(0), 65535),
                (Some(1), 0),
                (Some(1), 1),
                (Some(1), 2),
            ]
        );
        // One switch to get into bank 0, one to cross into bank 1.
        assert_eq!(sim.firmware.switches(), &[0, 1]);
        assert_eq!(&sim.memory.vram()[65535..65539], &[0x00, 0xF8, 0x1F, 0x00]);
    }

    #[test_log::test]
    fn banked_32_crossing_switches_once() {
        let mode = banked_mode(65530);
        let mut sim = SimAdapter::banked(&mode, 4 * 65536);
        let mut bank = BankState::init(&mode).unwrap();
        // Start out already in bank 0 so only the crossing counts.
        bank.ensure_bank(&mut sim.firmware, 0);
        sim.memory.write(LOW_MEMORY, 0xA0000, 0xEE, StoreWidth::Byte);
        sim.firmware.clear();
        sim.memory.clear_log();

        let format = PixelFormat::new(PixelDepth::Bpp32);
        let px = ramp(5);
        {
            let mut addr = Banked {
                segment: LOW_MEMORY,
                stride: 65530,
                bank: &mut bank,
                firmware: &mut sim.firmware,
            };
            write_scanline(&mut sim.memory, &mut addr, &format, 0, 1, 4, &px).unwrap();
        }

        assert_eq!(sim.firmware.switches(), &[1]);
        let stores = sim.memory.stores();
        assert_eq!(stores.len(), 20);
        for (i, s) in stores.iter().enumerate() {
            let abs = 65530 + i as u32;
            let expect_bank = if abs < 65536 { 0 } else { 1 };
            assert_eq!(s.bank, Some(expect_bank), "byte {}", abs);
            assert_eq!(s.offset - 0xA0000, abs % 65536, "byte {}", abs);
            assert_eq!(s.width, StoreWidth::Byte);
        }
        // The pixel at 65534 is split across banks and still reads back.
        let vram = sim.memory.vram();
        for (i, p) in px.iter().enumerate() {
            let at = 65530 + i * 4;
            assert_eq!(format.decode(&vram[at..at + 4]), *p);
        }
    }

    #[test]
    fn banked_matches_linear() {
        for &depth in PixelDepth::ALL.iter() {
            let format = PixelFormat::new(depth);
            let bpp = depth.bytes() as u32;
            // Odd stride and small granularity so rows cross banks at awkward
            // places.
            let stride = 333 * bpp + 1;
            let mode = ModeDescriptor {
                bytes_per_scanline: stride as u16,
                window_granularity_kb: 4,
                window_size_kb: 4,
                ..ModeDescriptor::default()
            };
            let size = stride as usize * 40;
            let mut lin_sim = SimAdapter::linear(size);
            let mut bank_sim = SimAdapter::banked(&mode, size);
            let mut bank = BankState::init(&mode).unwrap();
            let px = ramp(300);

            for y in 0..40 {
                let mut lin = Linear { segment: LFB, stride };
                write_scanline(&mut lin_sim.memory, &mut lin, &format, 17, y, 316, &px)
                    .unwrap();
                let mut addr = Banked {
                    segment: LOW_MEMORY,
                    stride,
                    bank: &mut bank,
                    firmware: &mut bank_sim.firmware,
                };
                write_scanline(&mut bank_sim.memory, &mut addr, &format, 17, y, 316, &px)
                    .unwrap();
            }
            assert!(lin_sim.memory.vram() == bank_sim.memory.vram(), "{:?}", depth);
            // Far fewer switches than bytes.
            assert!(bank.switch_count() < size / 1024, "{:?}", depth);
        }
    }

    #[test]
    fn inverted_span_rejected() {
        let mut sim = SimAdapter::linear(64);
        let mut lin = Linear { segment: LFB, stride: 16 };
        let f = PixelFormat::new(PixelDepth::Bpp8);
        assert_eq!(
            write_scanline(&mut sim.memory, &mut lin, &f, 5, 0, 4, &ramp(8)),
            Err(Error::InvertedSpan { left: 5, right: 4 })
        );
        assert!(sim.memory.stores().is_empty());
    }

    #[test]
    fn short_source_rejected() {
        let mut sim = SimAdapter::linear(64);
        let mut lin = Linear { segment: LFB, stride: 16 };
        let f = PixelFormat::new(PixelDepth::Bpp8);
        assert_eq!(
            write_scanline(&mut sim.memory, &mut lin, &f, 0, 0, 9, &ramp(8)),
            Err(Error::ShortSource {
                needed: 10,
                available: 8
            })
        );
        assert!(sim.memory.stores().is_empty());
    }

    #[test]
    fn unaddressable_bank_rejected_up_front() {
        let mode = ModeDescriptor {
            window_granularity_kb: 1,
            bytes_per_scanline: 4096,
            ..ModeDescriptor::default()
        };
        let mut sim = SimAdapter::banked(&mode, 4096);
        let mut bank = BankState::init(&mode).unwrap();
        let mut addr = Banked {
            segment: LOW_MEMORY,
            stride: 4096,
            bank: &mut bank,
            firmware: &mut sim.firmware,
        };
        let f = PixelFormat::new(PixelDepth::Bpp32);
        // Row 16384 * 4096 bytes puts the run in bank 65536.
        assert_eq!(
            write_scanline(&mut sim.memory, &mut addr, &f, 0, 16384, 0, &ramp(1)),
            Err(Error::BankOutOfRange { bank: 65536 })
        );
        assert!(sim.memory.stores().is_empty());
    }

    #[test]
    fn overflow_rejected() {
        let mut sim = SimAdapter::linear(16);
        let mut lin = Linear { segment: LFB, stride: u32::MAX };
        let f = PixelFormat::new(PixelDepth::Bpp8);
        assert_eq!(
            write_scanline(&mut sim.memory, &mut lin, &f, 0, 2, 0, &ramp(1)),
            Err(Error::AddressOverflow)
        );
    }
}
