//! Classic XOR pattern, pushed through every scanline writer on a simulated
//! adapter.
//!
//! For each depth, the pattern is flushed once through a linear mapping and
//! once through a bank-switched window, in a few overlapping rectangles. The
//! two framebuffers must come out byte-identical. Run with `RUST_LOG=debug`
//! (or `trace`, if you want to watch every bank switch).

use log::{error, info};

use vesa::mode::{Mapping, ModeDescriptor};
use vesa::sim::{SimAdapter, SimFirmware, SimMemory, LFB, LOW_MEMORY};
use vesa::{Error, Output, Pixel, PixelDepth, Rect};

const WIDTH: u16 = 640;
const HEIGHT: u16 = 480;

/// Mode with a 4 KiB bank granularity, so banks change often and at awkward
/// points within rows.
fn mode(depth: PixelDepth) -> ModeDescriptor {
    let bits = depth.bits() as u8;
    ModeDescriptor {
        width: WIDTH,
        height: HEIGHT,
        bits_per_pixel: bits,
        bytes_per_scanline: WIDTH * depth.bytes() as u16 + 2,
        window_granularity_kb: 4,
        window_size_kb: 64,
        ..ModeDescriptor::default()
    }
}

fn xor_pattern(frame: usize) -> Vec<Pixel> {
    let (w, h) = (usize::from(WIDTH), usize::from(HEIGHT));
    let mut px = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let v = ((x + frame) ^ y) as u8;
            px.push(Pixel::rgb(v, v.rotate_left(3), !v));
        }
    }
    px
}

type SimOutput = Output<SimMemory, SimFirmware>;

fn check(depth: PixelDepth) -> Result<bool, Error> {
    let m = mode(depth);
    let size = usize::from(m.bytes_per_scanline) * usize::from(HEIGHT);

    let sim = SimAdapter::linear(size);
    let mut linear: SimOutput = Output::activate(
        &m,
        Mapping::Linear {
            segment: LFB,
            bytes_per_scanline: u32::from(m.bytes_per_scanline),
        },
        sim.memory,
        sim.firmware,
    )?;
    let sim = SimAdapter::banked(&m, size);
    let mut banked: SimOutput = Output::activate(
        &m,
        Mapping::Banked {
            segment: LOW_MEMORY,
        },
        sim.memory,
        sim.firmware,
    )?;

    let stride = usize::from(WIDTH);
    let full = Rect::new(0, 0, u32::from(WIDTH) - 1, u32::from(HEIGHT) - 1);
    let rects = [full, Rect::new(100, 50, 539, 429), Rect::new(321, 0, 321, 479)];

    for (frame, rect) in rects.iter().enumerate() {
        let px = xor_pattern(frame);
        let origin = rect.top as usize * stride + rect.left as usize;
        linear.flush(rect, &px[origin..], stride)?;
        banked.flush(rect, &px[origin..], stride)?;
    }

    let same = linear.memory().vram() == banked.memory().vram();
    let switches = banked.bank_state().map_or(0, |b| b.switch_count());
    info!(
        "{:?}: {} bytes written, {} bank switches, {}",
        depth,
        banked.memory().stores().len(),
        switches,
        if same { "match" } else { "MISMATCH" },
    );
    Ok(same)
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut ok = true;
    for &depth in PixelDepth::ALL.iter() {
        ok &= check(depth)?;
    }
    if !ok {
        error!("banked and linear output differ");
        std::process::exit(1);
    }
    Ok(())
}
