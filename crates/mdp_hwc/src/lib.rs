//! # MDP Hardware Composer
//!
//! The composer is the per-frame brain of the display stack. It decides,
//! for every layer the window system hands it, whether the layer rides a
//! hardware overlay pipe or falls back to GPU composition, then programs
//! the pipes and posts the frame:
//!
//! ```text
//! Layer list ──► prepare (classify) ──► GPU renders leftovers
//!                      │
//!                      ▼
//!               commit (program pipes, queue buffers, post)
//!                      │
//!                      ▼
//!               retire queue releases last frame's buffers
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Prepare never fails** - a layer the hardware cannot take is simply
//!    left to the GPU
//! 2. **Buffers outlive the scanout that reads them** - a queued buffer is
//!    only released after the following frame is posted
//! 3. **Stale pipes are closed** - an empty frame tears down every overlay
//! 4. **Shutdown is terminal** - a closed composer refuses further frames

pub mod composer;
pub mod config;
pub mod error;
pub mod layer;
pub mod mirror;
pub mod retire;

pub use composer::{Composer, DisplayEvent};
pub use config::{HwcConfig, DEFAULT_FRAMEBUFFER_COUNT, MAX_SWAP_INTERVAL, MIN_SWAP_INTERVAL};
pub use error::{HwcError, HwcResult};
pub use layer::{CompositionType, Layer, LayerBuffer, LayerFlags, LayerList, LayerStats};
pub use mirror::{
    is_hdmi_connected, MirrorController, MirrorHandle, MirrorRequest, MirrorState,
    MirrorTransition,
};
pub use retire::RetireQueue;
