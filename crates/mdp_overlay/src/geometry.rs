//! Buffer geometry and scaler constraints.
//!
//! Byte sizing has to agree with the hardware's addressing rules exactly.
//! The tiled 4:2:0 layouts allocate luma and chroma as separate
//! page-aligned plane regions; a size off by one rounding step means the
//! tiling unit reads past the end of the allocation.

use log::error;

use crate::format::PixelFormat;

/// Upscaling beyond this factor is a hardware fault.
pub const MAGNIFICATION_LIMIT: u32 = 8;

const TILE_PITCH_ALIGN: u32 = 128;
const TILE_HEIGHT_ALIGN: u32 = 32;
const TILE_PLANE_ALIGN: u32 = 8192;

/// Source buffer description: width, height, device format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Whf {
    pub w: u32,
    pub h: u32,
    pub format: PixelFormat,
}

impl Whf {
    pub const fn new(w: u32, h: u32, format: PixelFormat) -> Self {
        Self { w, h, format }
    }
}

/// Extent pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dim {
    pub w: u32,
    pub h: u32,
}

impl Dim {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Axis-aligned rectangle, origin plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn dim(&self) -> Dim {
        Dim { w: self.w, h: self.h }
    }
}

/// Rounds `value` up to the next multiple of `to`, a power of two.
#[inline]
pub const fn align(value: u32, to: u32) -> u32 {
    (value + to - 1) & !(to - 1)
}

/// Clears the low bit, shrinking an odd extent to the even value below it.
#[inline]
pub const fn even_out(value: u32) -> u32 {
    value & !1
}

/// Byte size of a buffer with the given geometry.
///
/// Returns 0 for formats the overlay engine has no size rule for; with
/// non-zero dimensions that is an allocation-impossible error, not an
/// empty buffer.
pub fn buffer_size(whf: &Whf) -> u32 {
    let size = whf.w * whf.h;
    match whf.format {
        PixelFormat::Rgba8888 | PixelFormat::Bgra8888 | PixelFormat::Rgbx8888 => size * 4,
        PixelFormat::Rgb565 | PixelFormat::YCbCr422Sp => size * 2,
        PixelFormat::YCbCr420Sp | PixelFormat::YCrCb420Sp => (size * 3) / 2,
        PixelFormat::YCbCr420SpTile | PixelFormat::YCrCb420SpTile => {
            let pitch = align(whf.w, TILE_PITCH_ALIGN);
            let luma_height = align(whf.h, TILE_HEIGHT_ALIGN);
            let chroma_height = align(whf.h >> 1, TILE_HEIGHT_ALIGN);
            let mut size = align(pitch * luma_height, TILE_PLANE_ALIGN);
            size += pitch * chroma_height;
            align(size, TILE_PLANE_ALIGN)
        }
        PixelFormat::YCrCb422Sp | PixelFormat::YCrCb420Planar => {
            error!("no overlay size rule for {}", whf.format.name());
            0
        }
    }
}

/// Shrinks one crop axis to an even offset and extent, in place.
///
/// Never grows the extent and never moves the far edge outward, so the
/// adjusted region always stays inside the original buffer. An empty
/// axis is left untouched.
pub fn normalize_crop(offset: &mut u32, extent: &mut u32) {
    if *extent == 0 {
        return;
    }
    if *offset & 1 != 0 {
        *offset += 1;
        if *extent & 1 != 0 {
            *extent = even_out(*extent);
        } else {
            *extent = extent.saturating_sub(2);
        }
    } else {
        *extent = even_out(*extent);
    }
}

/// Clamps a destination rectangle to the scaler's magnification limit,
/// width and height independently.
pub fn clamp_to_magnification(dst: &mut Rect, src: Dim) {
    let max_w = src.w.saturating_mul(MAGNIFICATION_LIMIT);
    if dst.w > max_w {
        dst.w = max_w;
    }
    let max_h = src.h.saturating_mul(MAGNIFICATION_LIMIT);
    if dst.h > max_h {
        dst.h = max_h;
    }
}
