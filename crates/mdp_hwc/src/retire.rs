//! Buffer retention across the scanout window.

use mdp_overlay::BufferHandle;

/// Holds buffers queued to hardware until the display stops reading them.
///
/// A buffer queued in frame N is on scanout until frame N+1 replaces it,
/// so it comes back out of [`RetireQueue::end_frame`] during frame N+1
/// and only then returns to its producer.
#[derive(Debug, Default)]
pub struct RetireQueue {
    current: Vec<BufferHandle>,
    previous: Vec<BufferHandle>,
}

impl RetireQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds a buffer queued to hardware this frame.
    pub fn retain(&mut self, buffer: BufferHandle) {
        self.current.push(buffer);
    }

    /// Closes the frame: returns the buffers whose scanout window just
    /// ended and starts the next retention window.
    pub fn end_frame(&mut self) -> Vec<BufferHandle> {
        std::mem::replace(&mut self.previous, std::mem::take(&mut self.current))
    }

    /// Number of buffers still held.
    pub fn held(&self) -> usize {
        self.current.len() + self.previous.len()
    }
}
