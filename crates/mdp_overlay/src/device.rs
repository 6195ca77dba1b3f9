//! Interfaces to the display device and platform services.
//!
//! Everything hardware-shaped sits behind two traits: [`DisplayDevice`]
//! for the opened composer/framebuffer device (mode queries, overlay pipe
//! programming, buffer posts) and [`Platform`] for sysfs files and system
//! properties. The rest of the crate computes; implementations of these
//! traits talk to the kernel.

use std::collections::HashMap;

use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipe::{OverlaySpec, PipeId};

/// Sysfs node carrying the external display's EDID 3D-present flag.
pub const EDID_3D_PATH: &str = "/sys/class/graphics/fb1/3d_present";
/// Sysfs node selecting the panel's 3D packing format.
pub const FORMAT_3D_PATH: &str = "/sys/class/graphics/fb1/format_3d";
/// Sysfs node toggling the 3D panel's parallax barrier.
pub const BARRIER_3D_PATH: &str = "/sys/devices/platform/mipi_novatek.0/enable_3d_barrier";
/// Property held at "1" by the HDMI service while a sink is attached.
pub const HDMI_PROPERTY: &str = "hw.hdmiON";
/// Property holding the user's 3D panel opt-in.
pub const PANEL_3D_PROPERTY: &str = "persist.user.panel3D";

/// Framebuffer device node for a display index.
pub fn fb_device_path(index: u32) -> String {
    format!("/dev/graphics/fb{index}")
}

/// Device and platform I/O errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Screen info query failed: {0}")]
    ScreenInfo(String),

    #[error("Overlay capability query failed: {0}")]
    OverlayQuery(String),

    #[error("Overlay rejected: {0}")]
    OverlayRejected(String),

    #[error("No such overlay pipe: {0}")]
    UnknownPipe(u32),

    #[error("Buffer post failed: {0}")]
    Post(String),

    #[error("Device is closed")]
    Closed,
}

/// Identifies a target display output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub u64);

/// Identifies the GPU-rendered surface presented on a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

/// Opaque handle to a producer's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferHandle(pub u64);

/// Current mode geometry of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
}

/// Physical panel variants the framebuffer driver reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PanelKind {
    #[default]
    Standard,
    /// Autostereoscopic panel with a switchable parallax barrier.
    Stereo3d,
}

/// Hardware feature bits reported by the overlay engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OverlayCaps(u32);

impl OverlayCaps {
    /// Pipes can emit solid border fill around scaled content.
    pub const BORDER_FILL: Self = Self(1 << 0);

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

impl core::ops::BitOr for OverlayCaps {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An opened composer/framebuffer device.
///
/// Implementations translate these calls into driver ioctls; the core only
/// ever hands them fully normalized geometry.
pub trait DisplayDevice {
    /// Current mode geometry of the primary display.
    fn screen_info(&self) -> Result<ScreenInfo, DeviceError>;

    /// Feature bits of the overlay engine.
    fn overlay_caps(&self) -> Result<OverlayCaps, DeviceError>;

    /// Physical panel variant, for 3D panel detection.
    fn panel_kind(&self) -> Result<PanelKind, DeviceError>;

    /// Programs an overlay pipe with the given source and destination
    /// geometry, returning the pipe that carries the layer.
    fn configure_overlay(&mut self, spec: &OverlaySpec) -> Result<PipeId, DeviceError>;

    /// Queues a buffer for display on a configured pipe.
    fn queue_buffer(&mut self, pipe: PipeId, buffer: BufferHandle) -> Result<(), DeviceError>;

    /// Releases a pipe back to the hardware.
    fn release_overlay(&mut self, pipe: PipeId) -> Result<(), DeviceError>;

    /// Returns a buffer to its producer once its retention window ends.
    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError>;

    /// Presents the GPU-composited surface for the frame.
    fn post(&mut self, display: DisplayId, surface: SurfaceId) -> Result<(), DeviceError>;
}

/// Sysfs and property access.
pub trait Platform {
    fn read_file(&self, path: &str) -> Option<String>;

    /// Writes `value` to a system file, returning false when the node is
    /// absent or rejects the write.
    fn write_file(&self, path: &str, value: &str) -> bool;

    fn property(&self, name: &str, default: &str) -> String;
}

/// Reads a numeric property and interprets it as a boolean flag.
pub fn flag_property(platform: &dyn Platform, name: &str) -> bool {
    platform
        .property(name, "0")
        .trim()
        .parse::<i64>()
        .map(|v| v != 0)
        .unwrap_or(false)
}

/// Platform backed by the local filesystem and process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPlatform;

impl Platform for FsPlatform {
    fn read_file(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn write_file(&self, path: &str, value: &str) -> bool {
        match std::fs::write(path, value) {
            Ok(()) => true,
            Err(err) => {
                warn!("write {path} failed: {err}");
                false
            }
        }
    }

    fn property(&self, name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.to_string())
    }
}

/// Inert device that accepts everything and records what it was asked to
/// do. Backs unit tests and headless operation.
#[derive(Debug, Default)]
pub struct NullDevice {
    screen: ScreenInfo,
    caps: OverlayCaps,
    panel: PanelKind,
    next_pipe: u32,
    configured: Vec<OverlaySpec>,
    queued: Vec<(PipeId, BufferHandle)>,
    released_pipes: Vec<PipeId>,
    released_buffers: Vec<BufferHandle>,
    posts: u32,
    closed: bool,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device reporting a fixed mode and capability set.
    pub fn with_mode(width: u32, height: u32, caps: OverlayCaps) -> Self {
        Self {
            screen: ScreenInfo { width, height },
            caps,
            ..Self::default()
        }
    }

    pub fn with_panel(mut self, panel: PanelKind) -> Self {
        self.panel = panel;
        self
    }

    /// Overlay specs accepted since creation, in order.
    pub fn configured(&self) -> &[OverlaySpec] {
        &self.configured
    }

    /// Buffers queued to pipes, in order.
    pub fn queued(&self) -> &[(PipeId, BufferHandle)] {
        &self.queued
    }

    pub fn released_pipes(&self) -> &[PipeId] {
        &self.released_pipes
    }

    pub fn released_buffers(&self) -> &[BufferHandle] {
        &self.released_buffers
    }

    pub fn posts(&self) -> u32 {
        self.posts
    }

    /// Marks the device closed; every later call fails with
    /// [`DeviceError::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        Ok(())
    }
}

impl DisplayDevice for NullDevice {
    fn screen_info(&self) -> Result<ScreenInfo, DeviceError> {
        self.ensure_open()?;
        Ok(self.screen)
    }

    fn overlay_caps(&self) -> Result<OverlayCaps, DeviceError> {
        self.ensure_open()?;
        Ok(self.caps)
    }

    fn panel_kind(&self) -> Result<PanelKind, DeviceError> {
        self.ensure_open()?;
        Ok(self.panel)
    }

    fn configure_overlay(&mut self, spec: &OverlaySpec) -> Result<PipeId, DeviceError> {
        self.ensure_open()?;
        self.configured.push(*spec);
        self.next_pipe += 1;
        Ok(PipeId(self.next_pipe))
    }

    fn queue_buffer(&mut self, pipe: PipeId, buffer: BufferHandle) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.queued.push((pipe, buffer));
        Ok(())
    }

    fn release_overlay(&mut self, pipe: PipeId) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.released_pipes.push(pipe);
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.released_buffers.push(buffer);
        Ok(())
    }

    fn post(&mut self, _display: DisplayId, _surface: SurfaceId) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.posts += 1;
        Ok(())
    }
}

/// Inert platform with in-memory files and properties; writes are
/// accepted and recorded.
#[derive(Debug, Default)]
pub struct NullPlatform {
    files: HashMap<String, String>,
    properties: HashMap<String, String>,
    writes: Mutex<Vec<(String, String)>>,
}

impl NullPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }

    /// Values written through the platform, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }
}

impl Platform for NullPlatform {
    fn read_file(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn write_file(&self, path: &str, value: &str) -> bool {
        self.writes.lock().push((path.to_string(), value.to_string()));
        true
    }

    fn property(&self, name: &str, default: &str) -> String {
        self.properties
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
