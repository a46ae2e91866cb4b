//! Thread-safe single-frame slot used to hand frames between pipeline stages.
//!
//! A [`FrameBuffer`] holds exactly one [`ColorGrid`] behind an `Arc`.  The only
//! mutation is replacing the whole frame, so a reader always sees a complete
//! frame, never one half-written.
//!
//! # Immutable snapshots (for beginners)
//!
//! [`FrameBuffer::get`] returns an `Arc<ColorGrid>`: a shared, read-only
//! pointer to the frame.  Swapping the pointer under the lock is O(1), so the
//! lock is held for a few nanoseconds regardless of the canvas size.  Because
//! `Arc` only hands out `&ColorGrid`, no caller can mutate a published frame in
//! place; new content always goes in through [`FrameBuffer::set`].
//!
//! Each `set` bumps a generation number and wakes waiters, so the frame writer
//! can sleep until a newer frame exists instead of polling.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lightwall_core::{ColorGrid, GridError, GridSize};

#[derive(Debug)]
struct Slot {
    frame: Arc<ColorGrid>,
    generation: u64,
}

/// A mutex-guarded slot holding the latest complete frame.
#[derive(Debug)]
pub struct FrameBuffer {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl FrameBuffer {
    /// Creates a buffer holding `initial` at generation 0.
    pub fn new(initial: ColorGrid) -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: Arc::new(initial),
                generation: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Creates a buffer holding an all-black frame of `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDimensions`] for a zero-sized canvas.
    pub fn blank(size: GridSize) -> Result<Self, GridError> {
        Ok(Self::new(ColorGrid::new(size)?))
    }

    /// Installs a brand-new frame.  Returns the new generation.
    pub fn set(&self, frame: ColorGrid) -> u64 {
        self.set_shared(Arc::new(frame))
    }

    /// Installs an already shared frame without copying it.
    pub fn set_shared(&self, frame: Arc<ColorGrid>) -> u64 {
        let mut slot = self.lock();
        slot.frame = frame;
        slot.generation = slot.generation.wrapping_add(1);
        self.changed.notify_all();
        slot.generation
    }

    /// Returns the current frame.
    pub fn get(&self) -> Arc<ColorGrid> {
        Arc::clone(&self.lock().frame)
    }

    /// Returns the current generation and frame, read atomically together.
    pub fn snapshot(&self) -> (u64, Arc<ColorGrid>) {
        let slot = self.lock();
        (slot.generation, Arc::clone(&slot.frame))
    }

    /// Size of the current frame.
    pub fn size(&self) -> GridSize {
        self.lock().frame.size()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Blocks until a frame newer than generation `seen` is installed, or
    /// `timeout` elapses.
    ///
    /// Returns the newest generation and frame, or `None` on timeout.  If a
    /// newer frame is already present it returns immediately.
    pub fn wait_newer(&self, seen: u64, timeout: Duration) -> Option<(u64, Arc<ColorGrid>)> {
        let guard = self.lock();
        let (slot, result) = self
            .changed
            .wait_timeout_while(guard, timeout, |slot| slot.generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() && slot.generation == seen {
            return None;
        }
        Some((slot.generation, Arc::clone(&slot.frame)))
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
