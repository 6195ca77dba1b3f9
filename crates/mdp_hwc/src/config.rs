//! Composer configuration

use serde::{Deserialize, Serialize};

/// Lowest swap interval the display accepts (tearing post).
pub const MIN_SWAP_INTERVAL: u32 = 0;
/// Highest swap interval the display accepts (vsync-locked post).
pub const MAX_SWAP_INTERVAL: u32 = 1;
/// Buffers in the scanout rotation.
pub const DEFAULT_FRAMEBUFFER_COUNT: u32 = 2;

/// Configuration for the composer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwcConfig {
    /// Number of framebuffers in the swap chain
    pub framebuffer_count: u32,
    /// Requested swap interval, clamped to the supported range
    pub swap_interval: u32,
    /// Whether external-display mirroring may be engaged
    pub enable_mirroring: bool,
}

impl Default for HwcConfig {
    fn default() -> Self {
        Self {
            framebuffer_count: DEFAULT_FRAMEBUFFER_COUNT,
            swap_interval: MAX_SWAP_INTERVAL,
            enable_mirroring: true,
        }
    }
}

impl HwcConfig {
    /// Swap interval clamped to what the display supports.
    pub fn effective_swap_interval(&self) -> u32 {
        self.swap_interval.clamp(MIN_SWAP_INTERVAL, MAX_SWAP_INTERVAL)
    }
}
