//! # MDP Overlay
//!
//! Utilities for driving the MDP's overlay/scaler pipeline:
//! - Device pixel formats and the translation table from raw buffer codes
//! - Byte-exact buffer sizing, including the tiled 4:2:0 layouts
//! - Stereo (3D) format descriptors and the 3D panel interface
//! - Crop and destination normalization for the fixed-function scaler
//! - Framebuffer capability discovery
//!
//! ## Architecture
//!
//! ```text
//! Buffer (raw format code) ──► translate ──► PixelFormat ──► buffer_size
//!                                   │
//!                                   ▼
//!                            stereo::encode ──► panel 3D descriptor
//!
//! crop/dst rects ──► normalize_crop / clamp_to_magnification ──► OverlaySpec
//!                                                                     │
//!                                                                     ▼
//!                                                          DisplayDevice (ioctls)
//! ```
//!
//! Everything above the [`device::DisplayDevice`] and [`device::Platform`]
//! traits is pure computation; implementations of those traits own the
//! kernel-facing plumbing.

pub mod caps;
pub mod device;
pub mod format;
pub mod geometry;
pub mod pipe;
pub mod stereo;

pub use caps::{FrameBufferCaps, Panel3dCaps};
pub use device::{
    fb_device_path, flag_property, BufferHandle, DeviceError, DisplayDevice, DisplayId,
    FsPlatform, NullDevice, NullPlatform, OverlayCaps, PanelKind, Platform, ScreenInfo,
    SurfaceId, BARRIER_3D_PATH, EDID_3D_PATH, FORMAT_3D_PATH, HDMI_PROPERTY, PANEL_3D_PROPERTY,
};
pub use format::{BufferFormat, PixelFormat};
pub use geometry::{
    align, buffer_size, clamp_to_magnification, even_out, normalize_crop, Dim, Rect, Whf,
    MAGNIFICATION_LIMIT,
};
pub use pipe::{OverlaySpec, PipeId, PipeState};
