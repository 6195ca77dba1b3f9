//! Layer model handed to the composer each frame.
//!
//! The window system flattens its scene into a bottom-up list of layers.
//! The composer writes a routing decision back into each entry during
//! prepare; the window system then renders the framebuffer leftovers and
//! hands the same list to commit.

use serde::{Deserialize, Serialize};

use mdp_overlay::{BufferFormat, BufferHandle, Dim, OverlaySpec, Rect};

/// How a layer gets to the screen this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositionType {
    /// The GPU renders the layer into the framebuffer target.
    #[default]
    Framebuffer,
    /// A hardware overlay pipe carries the layer directly to scanout.
    Overlay,
}

impl CompositionType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Framebuffer => "framebuffer",
            Self::Overlay => "overlay",
        }
    }
}

/// Per-layer flags set by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LayerFlags(u32);

impl LayerFlags {
    /// The layer's contents are in an undefined state this frame and
    /// must not touch hardware.
    pub const SKIP: Self = Self(1 << 0);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl core::ops::BitOr for LayerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Source buffer attached to a layer: the producer's handle plus the
/// allocation geometry needed to size and crop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBuffer {
    pub handle: BufferHandle,
    pub dim: Dim,
    pub format: BufferFormat,
}

impl LayerBuffer {
    pub const fn new(handle: BufferHandle, w: u32, h: u32, format: BufferFormat) -> Self {
        Self {
            handle,
            dim: Dim::new(w, h),
            format,
        }
    }
}

/// One entry in the frame's layer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    pub buffer: LayerBuffer,
    pub flags: LayerFlags,
    /// Region of the source buffer to display.
    pub source_crop: Rect,
    /// Region of the screen the layer covers.
    pub display_frame: Rect,
    /// Routing decision, written during prepare.
    pub composition: CompositionType,
    /// Pipe programming, present once routed to an overlay.
    pub overlay: Option<OverlaySpec>,
}

impl Layer {
    pub fn new(buffer: LayerBuffer, source_crop: Rect, display_frame: Rect) -> Self {
        Self {
            buffer,
            flags: LayerFlags::empty(),
            source_crop,
            display_frame,
            composition: CompositionType::Framebuffer,
            overlay: None,
        }
    }

    pub fn with_flags(mut self, flags: LayerFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_skip(&self) -> bool {
        self.flags.contains(LayerFlags::SKIP)
    }
}

/// The window system's scene for one frame, bottom-up z order.
#[derive(Debug, Clone, Default)]
pub struct LayerList {
    pub layers: Vec<Layer>,
}

impl LayerList {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Frame statistics gathered before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerStats {
    pub total: usize,
    pub yuv: usize,
    pub skip: usize,
}

impl LayerStats {
    pub fn collect(list: &LayerList) -> Self {
        let mut stats = Self {
            total: list.len(),
            ..Self::default()
        };
        for layer in &list.layers {
            if layer.buffer.format.is_yuv() {
                stats.yuv += 1;
            }
            if layer.is_skip() {
                stats.skip += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_buffer() -> LayerBuffer {
        LayerBuffer::new(BufferHandle(1), 1280, 720, BufferFormat::YCBCR_420_SP)
    }

    fn ui_buffer() -> LayerBuffer {
        LayerBuffer::new(BufferHandle(2), 1080, 1920, BufferFormat::RGBA_8888)
    }

    fn full_screen(buffer: LayerBuffer) -> Layer {
        let frame = Rect::new(0, 0, buffer.dim.w, buffer.dim.h);
        Layer::new(buffer, frame, frame)
    }

    #[test]
    fn test_layer_starts_on_the_gpu() {
        let layer = full_screen(ui_buffer());
        assert_eq!(layer.composition, CompositionType::Framebuffer);
        assert!(layer.overlay.is_none());
        assert!(!layer.is_skip());
    }

    #[test]
    fn test_skip_flag() {
        let layer = full_screen(ui_buffer()).with_flags(LayerFlags::SKIP);
        assert!(layer.is_skip());
        assert!(LayerFlags::from_bits(layer.flags.bits()).contains(LayerFlags::SKIP));
        assert!(!LayerFlags::empty().contains(LayerFlags::SKIP));
    }

    #[test]
    fn test_stats_collection() {
        let list = LayerList::new(vec![
            full_screen(video_buffer()),
            full_screen(ui_buffer()),
            full_screen(ui_buffer()).with_flags(LayerFlags::SKIP),
        ]);
        let stats = LayerStats::collect(&list);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.yuv, 1);
        assert_eq!(stats.skip, 1);
    }

    #[test]
    fn test_composition_type_names() {
        assert_eq!(CompositionType::Framebuffer.name(), "framebuffer");
        assert_eq!(CompositionType::Overlay.name(), "overlay");
        assert_eq!(CompositionType::default(), CompositionType::Framebuffer);
    }
}
