//! Per-frame composition driver.
//!
//! Each frame runs the same two-phase protocol the window system expects:
//! [`Composer::prepare`] walks the layer list and decides, per layer,
//! overlay pipe or GPU; after the GPU has rendered its share,
//! [`Composer::commit`] programs the pipes, queues the video buffers and
//! posts the frame. Cross-thread input (hotplug, vsync, mirroring
//! requests) lands between frames through [`Composer::handle_event`] and
//! the mirror handle; all shared state sits behind its own lock so the
//! composer can be shared with the device's callback threads.

use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};

use mdp_overlay::{
    buffer_size, clamp_to_magnification, normalize_crop, stereo, DisplayDevice, DisplayId,
    FrameBufferCaps, OverlaySpec, PipeId, PipeState, PixelFormat, Platform, SurfaceId, Whf,
};

use crate::config::HwcConfig;
use crate::error::{HwcError, HwcResult};
use crate::layer::{CompositionType, Layer, LayerList, LayerStats};
use crate::mirror::{MirrorController, MirrorHandle, MirrorRequest, MirrorState};
use crate::retire::RetireQueue;

/// Display events delivered by the device's callback threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Vertical sync pulse.
    Vsync { display: DisplayId, timestamp_ns: u64 },
    /// External display attach or detach.
    Hotplug { display: DisplayId, connected: bool },
}

/// Bookkeeping that changes at commit time.
#[derive(Debug, Default)]
struct CommitState {
    pipe_state: PipeState,
    open_pipes: Vec<PipeId>,
    retire: RetireQueue,
    frame: u64,
    sent_stereo: u32,
    closed: bool,
}

/// View of the display updated from the event path.
#[derive(Debug, Default)]
struct EventState {
    last_vsync_ns: u64,
    external_connected: bool,
}

/// Owns the display device and drives composition for it.
pub struct Composer<D: DisplayDevice, P: Platform> {
    device: Mutex<D>,
    platform: P,
    config: HwcConfig,
    caps: FrameBufferCaps,
    state: Mutex<CommitState>,
    events: Mutex<EventState>,
    mirror: Mutex<MirrorController>,
}

impl<D: DisplayDevice, P: Platform> Composer<D, P> {
    /// Opens the composer over an already-opened device, interrogating
    /// its capabilities once.
    pub fn new(device: D, platform: P, config: HwcConfig) -> Self {
        let caps = FrameBufferCaps::query(&device, &platform);
        debug!(
            "composer up: {}x{}, swap interval {}",
            caps.width,
            caps.height,
            config.effective_swap_interval()
        );
        Self {
            device: Mutex::new(device),
            platform,
            config,
            caps,
            state: Mutex::new(CommitState::default()),
            events: Mutex::new(EventState::default()),
            mirror: Mutex::new(MirrorController::new()),
        }
    }

    pub fn caps(&self) -> &FrameBufferCaps {
        &self.caps
    }

    pub fn config(&self) -> &HwcConfig {
        &self.config
    }

    /// Locked access to the underlying device.
    pub fn device(&self) -> MutexGuard<'_, D> {
        self.device.lock()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Sender half for mirroring requests, safe to hand to other threads.
    pub fn mirror_handle(&self) -> MirrorHandle {
        self.mirror.lock().handle()
    }

    pub fn mirror_state(&self) -> MirrorState {
        self.mirror.lock().state()
    }

    pub fn pipe_state(&self) -> PipeState {
        self.state.lock().pipe_state
    }

    /// Frames committed since the composer opened.
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }

    /// Buffers still inside their retention window.
    pub fn held_buffers(&self) -> usize {
        self.state.lock().retire.held()
    }

    pub fn last_vsync_ns(&self) -> u64 {
        self.events.lock().last_vsync_ns
    }

    pub fn external_connected(&self) -> bool {
        self.events.lock().external_connected
    }

    /// Classifies every layer in the list for this frame. Never fails; a
    /// layer the hardware cannot take stays on the GPU.
    ///
    /// The walk runs top-down and stops at the first skip layer, leaving
    /// everything beneath it untouched for the GPU pass.
    pub fn prepare(&self, list: Option<&mut LayerList>) {
        if self.state.lock().closed {
            return;
        }
        let list = match list {
            Some(list) => list,
            None => return,
        };

        let stats = LayerStats::collect(list);
        debug!(
            "prepare: {} layers, {} yuv, {} skip",
            stats.total, stats.yuv, stats.skip
        );

        for i in (0..list.layers.len()).rev() {
            if list.layers[i].is_skip() {
                break;
            }
            if list.layers[i].buffer.format.is_yuv() {
                self.assign_overlay(&mut list.layers[i], i as u32);
            } else {
                list.layers[i].composition = CompositionType::Framebuffer;
                list.layers[i].overlay = None;
            }
        }
    }

    /// Routes one video layer through an overlay pipe, computing the
    /// pipe programming it will need at commit.
    fn assign_overlay(&self, layer: &mut Layer, z_order: u32) {
        let format = match PixelFormat::from_buffer(layer.buffer.format) {
            Some(format) => format,
            None => {
                layer.composition = CompositionType::Framebuffer;
                layer.overlay = None;
                return;
            }
        };
        let src = Whf::new(layer.buffer.dim.w, layer.buffer.dim.h, format);
        if buffer_size(&src) == 0 {
            warn!("cannot size {} buffer, leaving layer on the gpu", format.name());
            layer.composition = CompositionType::Framebuffer;
            layer.overlay = None;
            return;
        }

        let mut crop = layer.source_crop;
        normalize_crop(&mut crop.x, &mut crop.w);
        normalize_crop(&mut crop.y, &mut crop.h);

        let mut dst = layer.display_frame;
        clamp_to_magnification(&mut dst, crop.dim());

        let stereo = if self.caps.wants_stereo() {
            stereo::encode(layer.buffer.format)
        } else {
            0
        };

        layer.composition = CompositionType::Overlay;
        layer.overlay = Some(OverlaySpec {
            src,
            crop,
            dst,
            z_order,
            stereo,
        });
    }

    /// Commits the frame the window system just finished: programs a pipe
    /// for every overlay layer, then posts the GPU surface.
    ///
    /// An empty or absent list means nothing is on screen; the overlay
    /// path is torn down and no post happens. Either way, buffers whose
    /// retention window ended this frame go back to their producers.
    pub fn commit(
        &self,
        display: DisplayId,
        surface: SurfaceId,
        list: Option<&LayerList>,
    ) -> HwcResult<()> {
        if self.state.lock().closed {
            return Err(HwcError::DeviceClosed);
        }
        if self.config.enable_mirroring {
            if let Some(transition) = self.mirror.lock().poll(&self.caps) {
                debug!("mirror transition: {transition:?}");
            }
        }

        let mut device = self.device.lock();
        let result = match list {
            Some(list) if !list.is_empty() => {
                self.commit_layers(&mut device, display, surface, list)
            }
            _ => {
                self.close_pipes(&mut device);
                Ok(())
            }
        };

        let released = {
            let mut state = self.state.lock();
            state.frame += 1;
            state.retire.end_frame()
        };
        for buffer in released {
            if let Err(err) = device.release_buffer(buffer) {
                warn!("release of buffer {buffer:?} failed: {err}");
            }
        }
        result
    }

    fn commit_layers(
        &self,
        device: &mut D,
        display: DisplayId,
        surface: SurfaceId,
        list: &LayerList,
    ) -> HwcResult<()> {
        let mut frame_pipes = Vec::new();
        let mut descriptor = 0;

        for layer in &list.layers {
            if layer.is_skip() || layer.composition != CompositionType::Overlay {
                continue;
            }
            let spec = match layer.overlay {
                Some(spec) => spec,
                None => {
                    warn!("overlay layer with no pipe programming, dropped");
                    continue;
                }
            };
            let pipe = match device.configure_overlay(&spec) {
                Ok(pipe) => pipe,
                Err(err) => {
                    warn!("overlay rejected, layer dropped this frame: {err}");
                    continue;
                }
            };
            if let Err(err) = device.queue_buffer(pipe, layer.buffer.handle) {
                warn!("queue to pipe {pipe:?} failed: {err}");
                if let Err(err) = device.release_overlay(pipe) {
                    warn!("release of pipe {pipe:?} failed: {err}");
                }
                continue;
            }
            frame_pipes.push(pipe);
            descriptor |= spec.stereo;
            self.state.lock().retire.retain(layer.buffer.handle);
        }

        self.update_stereo_panel(descriptor);
        self.rotate_pipes(device, frame_pipes);
        device.post(display, surface)?;
        Ok(())
    }

    /// Swaps in this frame's pipe set and releases whatever last frame
    /// left open that went unused.
    fn rotate_pipes(&self, device: &mut D, frame_pipes: Vec<PipeId>) {
        let stale = {
            let mut state = self.state.lock();
            let stale: Vec<PipeId> = state
                .open_pipes
                .iter()
                .copied()
                .filter(|pipe| !frame_pipes.contains(pipe))
                .collect();
            state.pipe_state = if frame_pipes.is_empty() {
                PipeState::Closed
            } else {
                PipeState::Open
            };
            state.open_pipes = frame_pipes;
            stale
        };
        for pipe in stale {
            if let Err(err) = device.release_overlay(pipe) {
                warn!("release of pipe {pipe:?} failed: {err}");
            }
        }
    }

    fn close_pipes(&self, device: &mut D) {
        let pipes = {
            let mut state = self.state.lock();
            state.pipe_state = PipeState::Closed;
            std::mem::take(&mut state.open_pipes)
        };
        if pipes.is_empty() {
            return;
        }
        debug!("closing {} overlay pipes", pipes.len());
        for pipe in pipes {
            if let Err(err) = device.release_overlay(pipe) {
                warn!("release of pipe {pipe:?} failed: {err}");
            }
        }
    }

    /// Tells the 3D panel what packing this frame carries, but only when
    /// it differs from what the panel was last told.
    fn update_stereo_panel(&self, descriptor: u32) {
        if !self.caps.wants_stereo() {
            return;
        }
        if self.state.lock().sent_stereo == descriptor {
            return;
        }
        if stereo::send_3d_config(&self.platform, descriptor) {
            let barrier = u32::from(descriptor != 0);
            stereo::enable_barrier(&self.platform, barrier);
            self.state.lock().sent_stereo = descriptor;
        }
    }

    /// Folds a display event into the composer's view. Safe to call from
    /// the device's callback threads.
    pub fn handle_event(&self, event: DisplayEvent) {
        match event {
            DisplayEvent::Vsync { timestamp_ns, .. } => {
                self.events.lock().last_vsync_ns = timestamp_ns;
            }
            DisplayEvent::Hotplug { display, connected } => {
                debug!(
                    "hotplug: display {} {}",
                    display.0,
                    if connected { "connected" } else { "disconnected" }
                );
                self.events.lock().external_connected = connected;
                if !connected {
                    // The sink is gone; mirroring cannot outlive it.
                    self.mirror.lock().handle().request(MirrorRequest::Stop);
                }
            }
        }
    }

    /// Tears the composer down: closes every pipe, drains the retention
    /// window and refuses all further frames.
    pub fn shutdown(&self) -> HwcResult<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(HwcError::DeviceClosed);
            }
            state.closed = true;
        }
        let mut device = self.device.lock();
        self.close_pipes(&mut device);
        // Both halves of the retention window still hold buffers.
        for _ in 0..2 {
            let released = self.state.lock().retire.end_frame();
            for buffer in released {
                if let Err(err) = device.release_buffer(buffer) {
                    warn!("release of buffer {buffer:?} failed: {err}");
                }
            }
        }
        Ok(())
    }
}
