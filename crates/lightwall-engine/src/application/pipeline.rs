//! The three-stage animation pipeline: trigger, frame generator, frame writer.
//!
//! # Data flow
//!
//! ```text
//!  ┌─────────┐ raise  ┌────────┐ wait/clear ┌─────────────────┐ set ┌──────────────┐
//!  │ Trigger │──────▶│ Signal │───────────▶│ FrameGenerator  │────▶│ next buffer  │
//!  └─────────┘        └────────┘            └─────────────────┘     └──────┬───────┘
//!                                                                          │ wait_newer
//!                    ┌────────────────┐  promote  ┌─────────────┐   diff   ▼
//!                    │ current buffer │◀──────────│ FrameWriter │◀─────────┘
//!                    └────────────────┘           └──────┬──────┘
//!                                                        │ set/show
//!                                                        ▼
//!                                                 DeviceRegistry
//! ```
//!
//! Each stage runs on its own named OS thread.  The stages share nothing but
//! the [`Signal`], the two [`FrameBuffer`]s and the [`DeviceRegistry`], all of
//! which are internally synchronised.
//!
//! # Stopping (for beginners)
//!
//! Every stage loops `while running.load(..)`, and every blocking wait has a
//! bounded timeout ([`POLL_INTERVAL`]).  Storing `false` into the shared
//! `running` flag therefore stops all three threads within one poll interval.
//! When a stage hits a fatal error it clears the flag itself, so the other
//! stages wind down and [`PipelineHandle::stop`] reports the error.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lightwall_core::{ColorGrid, DeviceRegistry, GridError, ProgramError, ProgramSet, Tick};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::dispatch_frame::{dispatch_frame, DispatchError, DispatchReport};
use super::frame_buffer::FrameBuffer;
use super::select_mode::ModeSelector;
use super::signal::Signal;

/// Upper bound on every blocking wait inside a stage loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors that start or stop the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No device is registered, so there is nothing to animate.
    #[error("canvas is empty: no device is registered")]
    EmptyCanvas,

    #[error("invalid canvas: {0}")]
    Canvas(#[from] GridError),

    #[error(transparent)]
    Program(#[from] ProgramError),

    /// The frame writer stopped on a fatal device error.
    #[error("frame writer stopped: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("failed to spawn {stage} thread: {source}")]
    Spawn {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// Where the trigger's raises come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Raise the signal every `interval`.
    Timer { interval: Duration },
    /// Raise only through [`PipelineHandle::trigger_now`].
    Manual,
}

// ── Trigger ───────────────────────────────────────────────────────────────────

/// Fixed-interval timer that raises the shared signal.
#[derive(Debug)]
pub struct Trigger {
    signal: Arc<Signal>,
    interval: Duration,
}

impl Trigger {
    pub fn new(signal: Arc<Signal>, interval: Duration) -> Self {
        Self { signal, interval }
    }

    /// Runs until `running` is cleared.
    ///
    /// Deadlines advance by whole intervals, so the cadence does not drift
    /// with scheduling jitter.  If the thread falls behind by more than one
    /// interval the missed ticks are skipped, not replayed.
    pub fn run(self, running: Arc<AtomicBool>) {
        info!("timer trigger started, interval {:?}", self.interval);
        let mut deadline = Instant::now() + self.interval;
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < deadline {
                thread::sleep((deadline - now).min(POLL_INTERVAL));
                continue;
            }
            if self.signal.raise() {
                trace!("tick");
            } else {
                trace!("tick coalesced: generator has not consumed the previous one");
            }
            deadline += self.interval;
            if deadline <= now {
                deadline = now + self.interval;
            }
        }
        info!("timer trigger stopped");
    }
}

// ── Frame generator ───────────────────────────────────────────────────────────

/// Waits for the signal and renders the active program into the next buffer.
pub struct FrameGenerator {
    signal: Arc<Signal>,
    next: Arc<FrameBuffer>,
    registry: Arc<DeviceRegistry>,
    programs: ProgramSet,
    modes: Arc<ModeSelector>,
    frames: u64,
    started: Instant,
}

impl FrameGenerator {
    pub fn new(
        signal: Arc<Signal>,
        next: Arc<FrameBuffer>,
        registry: Arc<DeviceRegistry>,
        programs: ProgramSet,
        modes: Arc<ModeSelector>,
    ) -> Self {
        Self {
            signal,
            next,
            registry,
            programs,
            modes,
            frames: 0,
            started: Instant::now(),
        }
    }

    /// Number of frames installed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Waits up to `timeout` for the signal; when raised, renders one frame
    /// into the next buffer and clears the signal.
    ///
    /// Returns `Ok(true)` when a frame was installed.  A program failure or a
    /// wrongly sized frame is logged and the tick is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Program`] if the active mode names no
    /// program in the set.
    pub fn step(&mut self, timeout: Duration) -> Result<bool, PipelineError> {
        if !self.signal.wait_timeout(timeout) {
            return Ok(false);
        }
        let result = self.render();
        self.signal.clear();
        result
    }

    /// Runs [`FrameGenerator::step`] until `running` is cleared.
    ///
    /// # Errors
    ///
    /// Returns the first error from `step`, after clearing `running`.
    pub fn run(mut self, running: Arc<AtomicBool>) -> Result<(), PipelineError> {
        info!("frame generator started in mode {}", self.modes.active());
        while running.load(Ordering::Relaxed) {
            if let Err(e) = self.step(POLL_INTERVAL) {
                error!("frame generator failed: {e}");
                running.store(false, Ordering::Relaxed);
                return Err(e);
            }
        }
        info!("frame generator stopped after {} frames", self.frames);
        Ok(())
    }

    fn render(&mut self) -> Result<bool, PipelineError> {
        let size = self.registry.canvas_size();
        if size.is_empty() {
            warn!("canvas is empty; nothing to render");
            return Ok(false);
        }

        let mode = self.modes.active();
        self.programs.validate(&mode)?;
        let Some(program) = self.programs.get_mut(&mode) else {
            return Ok(false);
        };

        let tick = Tick {
            frame: self.frames,
            elapsed: self.started.elapsed(),
        };
        let frame = match program.next_frame(size, &tick) {
            Ok(frame) if frame.size() == size => frame,
            Ok(frame) => {
                error!(
                    "program {mode} returned a {} frame for a {size} canvas; frame skipped",
                    frame.size()
                );
                return Ok(false);
            }
            Err(e) => {
                error!("program {mode} failed: {e}; frame skipped");
                return Ok(false);
            }
        };

        let generation = self.next.set(frame);
        self.frames += 1;
        debug!("generated frame {} ({mode}, generation {generation})", tick.frame);
        Ok(true)
    }
}

// ── Frame writer ──────────────────────────────────────────────────────────────

/// Diffs the next buffer against the current one and dispatches the changes.
#[derive(Debug)]
pub struct FrameWriter {
    current: Arc<FrameBuffer>,
    next: Arc<FrameBuffer>,
    registry: Arc<DeviceRegistry>,
}

impl FrameWriter {
    pub fn new(
        current: Arc<FrameBuffer>,
        next: Arc<FrameBuffer>,
        registry: Arc<DeviceRegistry>,
    ) -> Self {
        Self {
            current,
            next,
            registry,
        }
    }

    /// Dispatches `next` if it differs from `current`, then promotes it.
    ///
    /// When the two buffers already match, blocks up to `timeout` for a newer
    /// next frame and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] on a fatal device error; `current` is left
    /// unchanged in that case.
    pub fn step(&mut self, timeout: Duration) -> Result<Option<DispatchReport>, DispatchError> {
        let current = self.current.get();
        let (generation, next) = self.next.snapshot();

        if Arc::ptr_eq(&current, &next) || *current == *next {
            self.next.wait_newer(generation, timeout);
            return Ok(None);
        }

        let report = dispatch_frame(&self.registry, &current, &next)?;
        self.current.set_shared(next);
        Ok(Some(report))
    }

    /// Runs [`FrameWriter::step`] until `running` is cleared.
    ///
    /// # Errors
    ///
    /// Returns the first fatal dispatch error, after clearing `running`.
    pub fn run(mut self, running: Arc<AtomicBool>) -> Result<(), DispatchError> {
        info!("frame writer started");
        let mut written = 0u64;
        while running.load(Ordering::Relaxed) {
            match self.step(POLL_INTERVAL) {
                Ok(Some(_)) => written += 1,
                Ok(None) => {}
                Err(e) => {
                    error!("frame writer failed: {e}");
                    running.store(false, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }
        info!("frame writer stopped after {written} frames");
        Ok(())
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Cloneable remote control for a running pipeline.
///
/// Handed to whatever feeds external stimuli in (the console, tests) while
/// the [`PipelineHandle`] itself stays with the owner that joins the threads.
#[derive(Debug, Clone)]
pub struct PipelineControl {
    running: Arc<AtomicBool>,
    signal: Arc<Signal>,
    modes: Arc<ModeSelector>,
}

impl PipelineControl {
    /// Raises the signal.  Returns `false` if the raise was coalesced.
    pub fn trigger_now(&self) -> bool {
        self.signal.raise()
    }

    /// # Errors
    ///
    /// Returns [`ProgramError::UnknownProgram`] and keeps the current mode if
    /// `mode` is not available.
    pub fn switch_mode(&self, mode: &str) -> Result<(), ProgramError> {
        self.modes.switch_to(mode)
    }

    pub fn active_mode(&self) -> String {
        self.modes.active()
    }

    pub fn available_modes(&self) -> &[String] {
        self.modes.available()
    }

    /// Asks every stage to stop; the owner still has to call
    /// [`PipelineHandle::stop`] to join them.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Handle to a running pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    signal: Arc<Signal>,
    modes: Arc<ModeSelector>,
    current: Arc<FrameBuffer>,
    next: Arc<FrameBuffer>,
    trigger: Option<JoinHandle<()>>,
    generator: JoinHandle<Result<(), PipelineError>>,
    writer: JoinHandle<Result<(), DispatchError>>,
}

impl PipelineHandle {
    /// Raises the signal as an external trigger would.
    ///
    /// Returns `false` if a raise was already pending (coalesced).
    pub fn trigger_now(&self) -> bool {
        self.signal.raise()
    }

    pub fn modes(&self) -> &Arc<ModeSelector> {
        &self.modes
    }

    pub fn control(&self) -> PipelineControl {
        PipelineControl {
            running: Arc::clone(&self.running),
            signal: Arc::clone(&self.signal),
            modes: Arc::clone(&self.modes),
        }
    }

    /// The frame most recently dispatched to the devices.
    pub fn current_frame(&self) -> Arc<ColorGrid> {
        self.current.get()
    }

    /// The frame most recently generated.
    pub fn next_frame(&self) -> Arc<ColorGrid> {
        self.next.get()
    }

    /// Blocks until the frame writer has promoted a frame newer than
    /// generation `seen` of the current buffer, or `timeout` elapses.
    pub fn wait_dispatched(&self, seen: u64, timeout: Duration) -> Option<(u64, Arc<ColorGrid>)> {
        self.current.wait_newer(seen, timeout)
    }

    /// Generation of the current buffer; increases once per dispatched frame.
    pub fn dispatched_generation(&self) -> u64 {
        self.current.generation()
    }

    /// `true` once any stage has exited, e.g. after a fatal error.
    pub fn is_finished(&self) -> bool {
        self.generator.is_finished()
            || self.writer.is_finished()
            || self.trigger.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Clears the running flag and joins all stages.
    ///
    /// # Errors
    ///
    /// Returns the writer's fatal error if it stopped on one, otherwise the
    /// generator's, or [`PipelineError::Panicked`] if a stage panicked.
    pub fn stop(self) -> Result<(), PipelineError> {
        self.running.store(false, Ordering::Relaxed);

        if let Some(trigger) = self.trigger {
            trigger.join().map_err(|_| PipelineError::Panicked("trigger"))?;
        }
        let generated = self
            .generator
            .join()
            .map_err(|_| PipelineError::Panicked("frame-generator"))?;
        let written = self
            .writer
            .join()
            .map_err(|_| PipelineError::Panicked("frame-writer"))?;

        written?;
        generated?;
        info!("pipeline stopped");
        Ok(())
    }
}

/// Starts the three pipeline stages on named threads.
///
/// Both frame buffers start as an all-black frame the size of the canvas.
///
/// # Errors
///
/// - [`PipelineError::EmptyCanvas`] when no device is registered.
/// - [`PipelineError::Program`] when `modes` offers a name `programs` lacks.
/// - [`PipelineError::Spawn`] when a thread cannot be created.
pub fn spawn_pipeline(
    registry: Arc<DeviceRegistry>,
    programs: ProgramSet,
    modes: Arc<ModeSelector>,
    source: TriggerSource,
) -> Result<PipelineHandle, PipelineError> {
    let canvas = registry.canvas_size();
    if canvas.is_empty() {
        return Err(PipelineError::EmptyCanvas);
    }
    for name in modes.available() {
        programs.validate(name)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let signal = Arc::new(Signal::new());
    let current = Arc::new(FrameBuffer::blank(canvas)?);
    let next = Arc::new(FrameBuffer::blank(canvas)?);

    let writer = {
        let worker = FrameWriter::new(Arc::clone(&current), Arc::clone(&next), Arc::clone(&registry));
        spawn_stage("frame-writer", &running, move |running| worker.run(running))?
    };

    let generator = {
        let worker = FrameGenerator::new(
            Arc::clone(&signal),
            Arc::clone(&next),
            Arc::clone(&registry),
            programs,
            Arc::clone(&modes),
        );
        spawn_stage("frame-generator", &running, move |running| worker.run(running))?
    };

    let trigger = match source {
        TriggerSource::Timer { interval } => {
            let worker = Trigger::new(Arc::clone(&signal), interval);
            Some(spawn_stage("trigger", &running, move |running| worker.run(running))?)
        }
        TriggerSource::Manual => {
            info!("manual trigger: frames are generated on demand");
            None
        }
    };

    info!("pipeline started on a {canvas} canvas");
    Ok(PipelineHandle {
        running,
        signal,
        modes,
        current,
        next,
        trigger,
        generator,
        writer,
    })
}

/// Spawns `body` on a thread named `stage`, handing it a clone of `running`.
///
/// On failure `running` is cleared so stages already started wind down.
fn spawn_stage<T: Send + 'static>(
    stage: &'static str,
    running: &Arc<AtomicBool>,
    body: impl FnOnce(Arc<AtomicBool>) -> T + Send + 'static,
) -> Result<JoinHandle<T>, PipelineError> {
    let flag = Arc::clone(running);
    thread::Builder::new()
        .name(stage.to_string())
        .spawn(move || body(flag))
        .map_err(|source| {
            running.store(false, Ordering::Relaxed);
            PipelineError::Spawn { stage, source }
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
