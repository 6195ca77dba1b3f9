//! Cached description of the primary display.

use log::{debug, warn};

use crate::device::{flag_property, DisplayDevice, OverlayCaps, Platform, PANEL_3D_PROPERTY};
use crate::stereo;

/// Optional 3D capability block, present only when some stereo output
/// path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel3dCaps {
    /// The primary panel itself is a 3D panel.
    pub panel_3d: bool,
    /// The user has opted in to 3D output on the panel.
    pub user_enabled: bool,
    /// An attached TV advertises 3D support in its EDID.
    pub tv_3d: bool,
}

/// Geometry and feature summary of the primary display, built once at
/// startup and passed by reference to everything that needs it.
///
/// A failed query leaves the safe defaults (zero geometry, no features)
/// so composition can still run fully on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBufferCaps {
    pub width: u32,
    pub height: u32,
    pub border_fill: bool,
    panel_3d: Option<Panel3dCaps>,
}

impl FrameBufferCaps {
    /// Interrogates the device once.
    pub fn query(device: &dyn DisplayDevice, platform: &dyn Platform) -> Self {
        let mut caps = Self::unavailable();

        let info = match device.screen_info() {
            Ok(info) => info,
            Err(err) => {
                warn!("screen info query failed: {err}");
                return caps;
            }
        };
        let overlay = match device.overlay_caps() {
            Ok(overlay) => overlay,
            Err(err) => {
                warn!("overlay capability query failed: {err}");
                return caps;
            }
        };

        caps.width = info.width;
        caps.height = info.height;
        caps.border_fill = overlay.contains(OverlayCaps::BORDER_FILL);
        caps.panel_3d = Self::query_panel_3d(device, platform);
        debug!(
            "framebuffer caps: {}x{}, border fill {}, 3d path {}",
            caps.width,
            caps.height,
            caps.border_fill,
            caps.panel_3d.is_some()
        );
        caps
    }

    /// Defaults used when the device cannot be interrogated.
    pub const fn unavailable() -> Self {
        Self {
            width: 0,
            height: 0,
            border_fill: false,
            panel_3d: None,
        }
    }

    fn query_panel_3d(device: &dyn DisplayDevice, platform: &dyn Platform) -> Option<Panel3dCaps> {
        let panel_3d = stereo::is_panel_3d(device);
        let tv_3d = stereo::is_3d_tv(platform);
        if !panel_3d && !tv_3d {
            return None;
        }
        Some(Panel3dCaps {
            panel_3d,
            user_enabled: flag_property(platform, PANEL_3D_PROPERTY),
            tv_3d,
        })
    }

    /// Border-fill hardware is what makes seamless output mirroring
    /// possible.
    pub fn supports_true_mirroring(&self) -> bool {
        self.border_fill
    }

    /// 3D capability block, when any stereo output path exists.
    pub fn panel_3d(&self) -> Option<&Panel3dCaps> {
        self.panel_3d.as_ref()
    }

    /// True when stereo content should be presented with a 3D descriptor.
    pub fn wants_stereo(&self) -> bool {
        match &self.panel_3d {
            Some(p) => (p.panel_3d && p.user_enabled) || p.tv_3d,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        BufferHandle, DeviceError, DisplayId, NullDevice, NullPlatform, PanelKind, ScreenInfo,
        SurfaceId, EDID_3D_PATH,
    };
    use crate::pipe::{OverlaySpec, PipeId};

    struct FailingDevice;

    impl DisplayDevice for FailingDevice {
        fn screen_info(&self) -> Result<ScreenInfo, DeviceError> {
            Err(DeviceError::ScreenInfo("ioctl failed".into()))
        }

        fn overlay_caps(&self) -> Result<OverlayCaps, DeviceError> {
            Err(DeviceError::OverlayQuery("ioctl failed".into()))
        }

        fn panel_kind(&self) -> Result<PanelKind, DeviceError> {
            Err(DeviceError::ScreenInfo("ioctl failed".into()))
        }

        fn configure_overlay(&mut self, _spec: &OverlaySpec) -> Result<PipeId, DeviceError> {
            Err(DeviceError::OverlayRejected("unavailable".into()))
        }

        fn queue_buffer(&mut self, pipe: PipeId, _buffer: BufferHandle) -> Result<(), DeviceError> {
            Err(DeviceError::UnknownPipe(pipe.0))
        }

        fn release_overlay(&mut self, pipe: PipeId) -> Result<(), DeviceError> {
            Err(DeviceError::UnknownPipe(pipe.0))
        }

        fn release_buffer(&mut self, _buffer: BufferHandle) -> Result<(), DeviceError> {
            Ok(())
        }

        fn post(&mut self, _display: DisplayId, _surface: SurfaceId) -> Result<(), DeviceError> {
            Err(DeviceError::Post("swap failed".into()))
        }
    }

    #[test]
    fn test_query_reads_mode_and_features() {
        let device = NullDevice::with_mode(1920, 1080, OverlayCaps::BORDER_FILL);
        let caps = FrameBufferCaps::query(&device, &NullPlatform::new());
        assert_eq!((caps.width, caps.height), (1920, 1080));
        assert!(caps.border_fill);
        assert!(caps.supports_true_mirroring());
        assert!(caps.panel_3d().is_none());
        assert!(!caps.wants_stereo());
    }

    #[test]
    fn test_failed_query_leaves_safe_defaults() {
        let caps = FrameBufferCaps::query(&FailingDevice, &NullPlatform::new());
        assert_eq!((caps.width, caps.height), (0, 0));
        assert!(!caps.border_fill);
        assert!(!caps.supports_true_mirroring());
        assert!(caps.panel_3d().is_none());
    }

    #[test]
    fn test_3d_panel_with_user_opt_in() {
        let device = NullDevice::with_mode(800, 480, OverlayCaps::empty())
            .with_panel(PanelKind::Stereo3d);
        let platform = NullPlatform::new().with_property(PANEL_3D_PROPERTY, "1");
        let caps = FrameBufferCaps::query(&device, &platform);

        let panel = caps.panel_3d().expect("3d block present");
        assert!(panel.panel_3d);
        assert!(panel.user_enabled);
        assert!(!panel.tv_3d);
        assert!(caps.wants_stereo());
    }

    #[test]
    fn test_3d_panel_without_opt_in_stays_2d() {
        let device = NullDevice::with_mode(800, 480, OverlayCaps::empty())
            .with_panel(PanelKind::Stereo3d);
        let caps = FrameBufferCaps::query(&device, &NullPlatform::new());
        assert!(caps.panel_3d().is_some());
        assert!(!caps.wants_stereo());
    }

    #[test]
    fn test_3d_tv_enables_stereo() {
        let device = NullDevice::with_mode(1920, 1080, OverlayCaps::empty());
        let platform = NullPlatform::new().with_file(EDID_3D_PATH, "1");
        let caps = FrameBufferCaps::query(&device, &platform);
        assert!(caps.wants_stereo());
    }
}
