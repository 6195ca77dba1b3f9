//! Pixel format model.
//!
//! Source buffers carry a raw ecosystem format code ([`BufferFormat`]); the
//! overlay engine speaks a small closed set of device formats
//! ([`PixelFormat`]). Translation between the two lives here, in one table,
//! so sizing and capability checks can never disagree about what a code
//! means.

use log::error;
use serde::{Deserialize, Serialize};

/// Raw format code attached to a source buffer by its allocator.
///
/// The low 12 bits carry the color format. Some producers pack stereo
/// layout metadata into the bits above that (see [`crate::stereo`]). The
/// planar YV12 code is a four-character-code literal and spills into the
/// high bits, which is why it gets exact-match treatment everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BufferFormat(u32);

impl BufferFormat {
    pub const RGBA_8888: Self = Self(0x1);
    pub const RGBX_8888: Self = Self(0x2);
    pub const RGB_565: Self = Self(0x4);
    pub const BGRA_8888: Self = Self(0x5);
    pub const YCBCR_422_SP: Self = Self(0x10);
    pub const YCRCB_420_SP: Self = Self(0x11);
    pub const YCBCR_420_SP: Self = Self(0x109);
    pub const YCRCB_422_SP: Self = Self(0x10B);
    pub const YCBCR_420_SP_TILED: Self = Self(0x7FA3_0C03);
    /// Planar YV12, a fourcc literal.
    pub const YV12: Self = Self(0x3231_5659);

    /// Color format codes occupy the low 12 bits.
    pub const COLOR_MASK: u32 = 0xFFF;

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The color format with any metadata bits stripped.
    pub const fn color_format(self) -> u32 {
        self.0 & Self::COLOR_MASK
    }

    /// True when the code names a recognized chroma-subsampled format.
    pub fn is_yuv(self) -> bool {
        PixelFormat::recognize(self).map(|f| f.is_yuv()).unwrap_or(false)
    }
}

/// Device pixel formats the overlay engine can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgba8888,
    Bgra8888,
    Rgbx8888,
    Rgb565,
    YCbCr422Sp,
    YCrCb422Sp,
    YCbCr420Sp,
    YCrCb420Sp,
    YCbCr420SpTile,
    YCrCb420SpTile,
    /// Planar YV12. Translates for classification purposes, but the
    /// overlay sizing path treats it as unsupported.
    YCrCb420Planar,
}

impl PixelFormat {
    /// Translates a raw buffer format code to its device format, logging
    /// unknown codes.
    ///
    /// Metadata bits above the color field are ignored for the linear
    /// codes; the fourcc-style codes must match exactly.
    pub fn from_buffer(format: BufferFormat) -> Option<Self> {
        let translated = Self::recognize(format);
        if translated.is_none() {
            error!("no device format for buffer format {:#x}", format.raw());
        }
        translated
    }

    /// Quiet form of [`PixelFormat::from_buffer`].
    pub fn recognize(format: BufferFormat) -> Option<Self> {
        Self::translate(format)
            .or_else(|| Self::translate(BufferFormat::from_raw(format.color_format())))
    }

    fn translate(format: BufferFormat) -> Option<Self> {
        match format {
            BufferFormat::RGBA_8888 => Some(Self::Rgba8888),
            BufferFormat::BGRA_8888 => Some(Self::Bgra8888),
            BufferFormat::RGB_565 => Some(Self::Rgb565),
            BufferFormat::RGBX_8888 => Some(Self::Rgbx8888),
            BufferFormat::YCBCR_422_SP => Some(Self::YCbCr422Sp),
            BufferFormat::YCRCB_422_SP => Some(Self::YCrCb422Sp),
            BufferFormat::YCBCR_420_SP => Some(Self::YCbCr420Sp),
            BufferFormat::YCRCB_420_SP => Some(Self::YCrCb420Sp),
            BufferFormat::YCBCR_420_SP_TILED => Some(Self::YCbCr420SpTile),
            BufferFormat::YV12 => Some(Self::YCrCb420Planar),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgba8888 => "rgba8888",
            Self::Bgra8888 => "bgra8888",
            Self::Rgbx8888 => "rgbx8888",
            Self::Rgb565 => "rgb565",
            Self::YCbCr422Sp => "ycbcr422sp",
            Self::YCrCb422Sp => "ycrcb422sp",
            Self::YCbCr420Sp => "ycbcr420sp",
            Self::YCrCb420Sp => "ycrcb420sp",
            Self::YCbCr420SpTile => "ycbcr420sp-tile",
            Self::YCrCb420SpTile => "ycrcb420sp-tile",
            Self::YCrCb420Planar => "ycrcb420p",
        }
    }

    /// True for chroma-subsampled (video) formats.
    pub fn is_yuv(&self) -> bool {
        matches!(
            self,
            Self::YCbCr422Sp
                | Self::YCrCb422Sp
                | Self::YCbCr420Sp
                | Self::YCrCb420Sp
                | Self::YCbCr420SpTile
                | Self::YCrCb420SpTile
                | Self::YCrCb420Planar
        )
    }

    /// True for the hardware-tiled layouts.
    pub fn is_tiled(&self) -> bool {
        matches!(self, Self::YCbCr420SpTile | Self::YCrCb420SpTile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_table() {
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::RGBA_8888),
            Some(PixelFormat::Rgba8888)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::BGRA_8888),
            Some(PixelFormat::Bgra8888)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::RGB_565),
            Some(PixelFormat::Rgb565)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::RGBX_8888),
            Some(PixelFormat::Rgbx8888)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YCBCR_422_SP),
            Some(PixelFormat::YCbCr422Sp)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YCRCB_422_SP),
            Some(PixelFormat::YCrCb422Sp)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YCBCR_420_SP),
            Some(PixelFormat::YCbCr420Sp)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YCRCB_420_SP),
            Some(PixelFormat::YCrCb420Sp)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YCBCR_420_SP_TILED),
            Some(PixelFormat::YCbCr420SpTile)
        );
        assert_eq!(
            PixelFormat::from_buffer(BufferFormat::YV12),
            Some(PixelFormat::YCrCb420Planar)
        );
    }

    #[test]
    fn test_unknown_code_is_unsupported() {
        assert_eq!(PixelFormat::from_buffer(BufferFormat::from_raw(0xDEAD)), None);
        assert_eq!(PixelFormat::from_buffer(BufferFormat::from_raw(0)), None);
    }

    #[test]
    fn test_metadata_bits_do_not_hide_the_color_format() {
        let flagged = BufferFormat::from_raw(BufferFormat::YCBCR_420_SP.raw() | 0x10000);
        assert_eq!(PixelFormat::from_buffer(flagged), Some(PixelFormat::YCbCr420Sp));
        assert!(flagged.is_yuv());
    }

    #[test]
    fn test_yuv_classification() {
        assert!(PixelFormat::YCbCr420Sp.is_yuv());
        assert!(PixelFormat::YCrCb420Planar.is_yuv());
        assert!(!PixelFormat::Rgba8888.is_yuv());
        assert!(PixelFormat::YCbCr420SpTile.is_tiled());
        assert!(!PixelFormat::YCbCr420Sp.is_tiled());
        assert!(BufferFormat::YV12.is_yuv());
        assert!(!BufferFormat::RGB_565.is_yuv());
        assert!(!BufferFormat::from_raw(0xDEAD).is_yuv());
    }

    #[test]
    fn test_format_serialization_roundtrip() {
        let json = serde_json::to_string(&PixelFormat::YCbCr420SpTile).unwrap();
        let back: PixelFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PixelFormat::YCbCr420SpTile);

        let raw = serde_json::to_string(&BufferFormat::YV12).unwrap();
        let back: BufferFormat = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, BufferFormat::YV12);
    }
}
