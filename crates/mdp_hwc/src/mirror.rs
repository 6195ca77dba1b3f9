//! External display mirroring state machine.
//!
//! Mirroring requests arrive from the hotplug path on another thread.
//! The composer owns the state machine and polls it once per frame, so
//! engaging and releasing the external path always happens at a frame
//! boundary, never mid-post. Each transition takes one full frame:
//!
//! ```text
//! Off ──start──► Starting ──frame──► Active ──stop──► Stopping ──frame──► Off
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use mdp_overlay::{flag_property, FrameBufferCaps, Platform, HDMI_PROPERTY};

/// Where the mirroring session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorState {
    /// No external output.
    #[default]
    Off,
    /// Start requested; engages at the next frame boundary.
    Starting,
    /// The external display is carrying the primary output.
    Active,
    /// Stop requested; releases at the next frame boundary.
    Stopping,
}

impl MirrorState {
    pub fn is_active(&self) -> bool {
        matches!(self, MirrorState::Active)
    }
}

/// Cross-thread request to change the mirroring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorRequest {
    Start,
    Stop,
}

/// Frame-boundary action the composer must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorTransition {
    /// Bring up the external path this frame.
    Engage,
    /// Tear down the external path this frame.
    Release,
}

/// Clonable sender half handed to hotplug listeners.
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    tx: Sender<MirrorRequest>,
}

impl MirrorHandle {
    pub fn request(&self, request: MirrorRequest) {
        let _ = self.tx.send(request);
    }
}

/// Owns the mirroring state and the request channel.
#[derive(Debug)]
pub struct MirrorController {
    state: MirrorState,
    tx: Sender<MirrorRequest>,
    rx: Receiver<MirrorRequest>,
}

impl MirrorController {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            state: MirrorState::Off,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> MirrorHandle {
        MirrorHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    /// Advances the machine one frame: completes the in-flight
    /// transition, then folds in requests that arrived since last poll.
    pub fn poll(&mut self, caps: &FrameBufferCaps) -> Option<MirrorTransition> {
        let transition = self.advance();
        while let Ok(request) = self.rx.try_recv() {
            self.apply(request, caps);
        }
        transition
    }

    fn advance(&mut self) -> Option<MirrorTransition> {
        match self.state {
            MirrorState::Starting => {
                self.state = MirrorState::Active;
                debug!("mirroring engaged");
                Some(MirrorTransition::Engage)
            }
            MirrorState::Stopping => {
                self.state = MirrorState::Off;
                debug!("mirroring released");
                Some(MirrorTransition::Release)
            }
            _ => None,
        }
    }

    fn apply(&mut self, request: MirrorRequest, caps: &FrameBufferCaps) {
        match (self.state, request) {
            (MirrorState::Off, MirrorRequest::Start) => {
                if !caps.supports_true_mirroring() {
                    warn!("mirroring requested but hardware lacks border fill");
                    return;
                }
                debug!("mirroring starting");
                self.state = MirrorState::Starting;
            }
            // A restart before the stop landed cancels the stop.
            (MirrorState::Stopping, MirrorRequest::Start) => {
                self.state = MirrorState::Active;
            }
            (MirrorState::Starting, MirrorRequest::Stop) => {
                self.state = MirrorState::Off;
            }
            (MirrorState::Active, MirrorRequest::Stop) => {
                debug!("mirroring stopping");
                self.state = MirrorState::Stopping;
            }
            _ => {}
        }
    }
}

impl Default for MirrorController {
    fn default() -> Self {
        Self::new()
    }
}

/// True while the HDMI service reports an attached sink.
pub fn is_hdmi_connected(platform: &dyn Platform) -> bool {
    flag_property(platform, HDMI_PROPERTY)
}
