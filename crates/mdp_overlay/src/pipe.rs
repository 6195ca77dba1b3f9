//! Overlay pipe handles and programming state.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Whf};

/// Handle to one hardware composition channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipeId(pub u32);

/// Whether the overlay path is carrying content this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipeState {
    Open,
    #[default]
    Closed,
}

impl PipeState {
    pub fn is_open(&self) -> bool {
        matches!(self, PipeState::Open)
    }
}

/// Complete programming for one overlay pipe: what to read, where to put
/// it, and how the panel should treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySpec {
    /// Full source buffer geometry.
    pub src: Whf,
    /// Normalized region of the source to read.
    pub crop: Rect,
    /// Clamped region of the display to cover.
    pub dst: Rect,
    pub z_order: u32,
    /// Packed stereo descriptor, 0 for monoscopic content.
    pub stereo: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_state() {
        assert!(PipeState::Open.is_open());
        assert!(!PipeState::Closed.is_open());
        assert_eq!(PipeState::default(), PipeState::Closed);
    }

    #[test]
    fn test_pipe_state_serialization_roundtrip() {
        let json = serde_json::to_string(&PipeState::Open).unwrap();
        let back: PipeState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PipeState::Open);
    }
}
