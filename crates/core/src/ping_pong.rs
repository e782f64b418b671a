//! Role tracking for the two trail buffers.
//!
//! `PingPong` records which of the two buffers is the render target
//! ("current") this frame; the other is the fade source ("previous").
//! Holding an index instead of swapping buffer handles keeps ownership of
//! both buffers with their container and rules out aliasing.

/// One of the two trail buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSlot {
    A,
    B,
}

impl BufferSlot {
    /// Index into a `[T; 2]` pair.
    pub fn index(self) -> usize {
        match self {
            BufferSlot::A => 0,
            BufferSlot::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            BufferSlot::A => BufferSlot::B,
            BufferSlot::B => BufferSlot::A,
        }
    }
}

/// Current/previous designator for a double-buffered pair.
///
/// Starts with A current. After N swaps, A is current iff N is even.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    current: BufferSlot,
}

impl PingPong {
    pub fn new() -> Self {
        Self {
            current: BufferSlot::A,
        }
    }

    /// Buffer written this frame.
    pub fn current(&self) -> BufferSlot {
        self.current
    }

    /// Buffer read as the faded background this frame.
    pub fn previous(&self) -> BufferSlot {
        self.current.other()
    }

    pub fn swap(&mut self) {
        self.current = self.current.other();
    }

    /// Returns to the initial state (A current).
    pub fn reset(&mut self) {
        self.current = BufferSlot::A;
    }
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}
