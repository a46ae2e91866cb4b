//! Integration tests for the frame pipeline.
//!
//! These tests run the real trigger / generator / writer threads against
//! recording and virtual devices, from configuration text down to the pixels
//! each device ends up showing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lightwall_core::effects::{builtin_programs, EffectOptions};
use lightwall_core::{
    Color, ColorGrid, DeviceRegistry, GridError, GridSize, Program, ProgramSet, Tick,
};
use lightwall_engine::application::build_registry::build_registry;
use lightwall_engine::application::pipeline::{
    spawn_pipeline, PipelineError, PipelineHandle, TriggerSource,
};
use lightwall_engine::application::select_mode::ModeSelector;
use lightwall_engine::infrastructure::devices::mock::{DeviceCall, RecordingDevice};
use lightwall_engine::infrastructure::devices::BuiltinDeviceFactory;
use lightwall_engine::infrastructure::storage::config::AppConfig;

const WAIT: Duration = Duration::from_secs(5);

/// Plays back a fixed list of frames, repeating the last one.
struct Script {
    frames: VecDeque<ColorGrid>,
}

impl Script {
    fn new(frames: Vec<ColorGrid>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl Program for Script {
    fn next_frame(&mut self, size: GridSize, _tick: &Tick) -> Result<ColorGrid, GridError> {
        if self.frames.len() > 1 {
            if let Some(frame) = self.frames.pop_front() {
                return Ok(frame);
            }
        }
        match self.frames.front() {
            Some(frame) => Ok(frame.clone()),
            None => ColorGrid::new(size),
        }
    }
}

fn start(registry: &Arc<DeviceRegistry>, programs: ProgramSet, mode: &str) -> PipelineHandle {
    let modes = Arc::new(ModeSelector::new(&programs, mode).expect("known mode"));
    spawn_pipeline(Arc::clone(registry), programs, modes, TriggerSource::Manual)
        .expect("pipeline starts")
}

fn script(frames: Vec<ColorGrid>) -> ProgramSet {
    let mut programs = ProgramSet::new();
    programs
        .register("script", Box::new(Script::new(frames)))
        .expect("unique name");
    programs
}

/// Triggers one frame and waits until the writer has promoted it.
fn trigger_and_wait(handle: &PipelineHandle) -> Arc<ColorGrid> {
    let seen = handle.dispatched_generation();
    handle.trigger_now();
    let (_, frame) = handle
        .wait_dispatched(seen, WAIT)
        .expect("frame must be dispatched");
    frame
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_changed_pixels_reach_their_devices_in_local_coordinates() {
    // Arrange: A at (0,0) and B at (1,0), both 1x1.
    let registry = Arc::new(DeviceRegistry::new());
    let a = RecordingDevice::new("A", GridSize::new(1, 1));
    let b = RecordingDevice::new("B", GridSize::new(1, 1));
    let (a_calls, b_calls) = (a.calls(), b.calls());
    registry.register(Box::new(a), (0, 0)).unwrap();
    registry.register(Box::new(b), (1, 0)).unwrap();

    let mut frame = ColorGrid::new(GridSize::new(2, 1)).unwrap();
    frame.set(0, 0, Color::RED).unwrap();
    frame.set(1, 0, Color::BLUE).unwrap();
    let handle = start(&registry, script(vec![frame.clone()]), "script");

    // Act
    let shown = trigger_and_wait(&handle);

    // Assert
    assert_eq!(*shown, frame);
    assert_eq!(
        a_calls.snapshot(),
        vec![DeviceCall::Set { color: Color::RED, x: 0, y: 0 }, DeviceCall::Show]
    );
    assert_eq!(
        b_calls.snapshot(),
        vec![DeviceCall::Set { color: Color::BLUE, x: 0, y: 0 }, DeviceCall::Show]
    );
    handle.stop().unwrap();
}

#[test]
fn test_only_the_changed_pixel_is_sent_on_the_second_frame() {
    let registry = Arc::new(DeviceRegistry::new());
    let device = RecordingDevice::new("panel", GridSize::new(2, 2));
    let calls = device.calls();
    registry.register(Box::new(device), (0, 0)).unwrap();

    let first = ColorGrid::filled(GridSize::new(2, 2), Color::WHITE).unwrap();
    let mut second = first.clone();
    second.set(1, 0, Color::GREEN).unwrap();
    let handle = start(&registry, script(vec![first, second]), "script");

    trigger_and_wait(&handle);
    calls.clear();
    trigger_and_wait(&handle);

    assert_eq!(calls.sets(), vec![(Color::GREEN, 1, 0)]);
    handle.stop().unwrap();
}

#[test]
fn test_frame_identical_to_current_causes_no_device_traffic() {
    // `off` renders black, which is exactly what the canvas starts as.
    let registry = Arc::new(DeviceRegistry::new());
    let device = RecordingDevice::new("panel", GridSize::new(4, 4));
    let calls = device.calls();
    registry.register(Box::new(device), (0, 0)).unwrap();
    let programs = builtin_programs(&EffectOptions::default()).unwrap();
    let handle = start(&registry, programs, "off");

    handle.trigger_now();
    let deadline = Instant::now() + Duration::from_millis(300);
    while Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }

    assert!(calls.snapshot().is_empty());
    assert_eq!(handle.dispatched_generation(), 0);
    handle.stop().unwrap();
}

#[test]
fn test_mirrored_placement_receives_the_same_pixels() {
    // One 2x1 device shown at (0,0) and mirrored at (0,1).
    let registry = Arc::new(DeviceRegistry::new());
    let device = RecordingDevice::new("strip", GridSize::new(2, 1));
    let calls = device.calls();
    registry.register(Box::new(device), (0, 0)).unwrap();
    registry.place("strip", (0, 1)).unwrap();

    let mut frame = ColorGrid::new(GridSize::new(2, 2)).unwrap();
    frame.set(0, 0, Color::RED).unwrap();
    frame.set(1, 1, Color::BLUE).unwrap();
    let handle = start(&registry, script(vec![frame]), "script");

    trigger_and_wait(&handle);

    let sets = calls.sets();
    assert!(sets.contains(&(Color::RED, 0, 0)));
    assert!(sets.contains(&(Color::BLUE, 1, 0)));
    handle.stop().unwrap();
}

#[test]
fn test_configured_virtual_devices_show_the_wash_frame() {
    // Arrange: two virtual panels side by side, one entry with a bad type.
    let config: AppConfig = toml::from_str(
        r#"
        [engine]
        mode = "wash"

        [[devices]]
        name = "left"
        type = "virtual"
        width = 2
        height = 2

        [[devices]]
        name = "ghost"
        type = "plasma"
        width = 2
        height = 2

        [[devices]]
        name = "right"
        type = "virtual"
        x = 2
        width = 2
        height = 2
        "#,
    )
    .unwrap();
    let registry = Arc::new(
        build_registry(&config.device_declarations(), &BuiltinDeviceFactory).unwrap(),
    );
    let programs = builtin_programs(&config.effect_options()).unwrap();

    // Act
    let handle = start(&registry, programs, &config.engine.mode);
    let frame = trigger_and_wait(&handle);
    handle.stop().unwrap();

    // Assert
    assert_eq!(registry.names(), vec!["left", "right"]);
    assert_eq!(frame.size(), GridSize::new(4, 2));
    let expected = frame.get(0, 0).unwrap();
    let left = registry.with_device("left", |d| d.get(1, 1)).unwrap();
    let right = registry.with_device("right", |d| d.get(1, 1)).unwrap();
    assert_eq!(left, Some(expected));
    assert_eq!(right, Some(expected));
}

#[test]
fn test_mode_switch_changes_the_next_frame() {
    let registry = Arc::new(DeviceRegistry::new());
    registry
        .register(Box::new(RecordingDevice::new("panel", GridSize::new(3, 3))), (0, 0))
        .unwrap();
    let options = EffectOptions {
        cross_color: Color::GREEN,
        ..EffectOptions::default()
    };
    let handle = start(&registry, builtin_programs(&options).unwrap(), "cross");

    let cross = trigger_and_wait(&handle);
    handle.control().switch_mode("wash").unwrap();
    let wash = trigger_and_wait(&handle);

    assert!(cross.iter().any(|(_, _, c)| c == Color::GREEN));
    assert!(cross.iter().any(|(_, _, c)| c == Color::BLACK));
    let first = wash.get(0, 0).unwrap();
    assert!(wash.iter().all(|(_, _, c)| c == first), "wash fills the whole canvas");
    handle.stop().unwrap();
}

#[test]
fn test_timer_trigger_keeps_frames_flowing() {
    let registry = Arc::new(DeviceRegistry::new());
    registry
        .register(Box::new(RecordingDevice::new("panel", GridSize::new(4, 4))), (0, 0))
        .unwrap();
    let programs = builtin_programs(&EffectOptions::default()).unwrap();
    let modes = Arc::new(ModeSelector::new(&programs, "cross").unwrap());
    let handle = spawn_pipeline(
        Arc::clone(&registry),
        programs,
        modes,
        TriggerSource::Timer {
            interval: Duration::from_millis(10),
        },
    )
    .unwrap();

    let deadline = Instant::now() + WAIT;
    while handle.dispatched_generation() < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert!(handle.dispatched_generation() >= 3);
    handle.stop().unwrap();
}

#[test]
fn test_fatal_device_error_stops_the_pipeline_with_an_error() {
    let registry = Arc::new(DeviceRegistry::new());
    let liar = RecordingDevice::new("liar", GridSize::new(2, 2))
        .with_accepted_size(GridSize::new(1, 1));
    registry.register(Box::new(liar), (0, 0)).unwrap();
    let frame = ColorGrid::filled(GridSize::new(2, 2), Color::WHITE).unwrap();
    let handle = start(&registry, script(vec![frame]), "script");

    handle.trigger_now();
    let deadline = Instant::now() + WAIT;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert!(handle.is_finished());
    assert!(matches!(handle.stop(), Err(PipelineError::Dispatch(_))));
}

#[test]
fn test_transient_show_failure_keeps_the_pipeline_running() {
    let registry = Arc::new(DeviceRegistry::new());
    let flaky = RecordingDevice::new("flaky", GridSize::new(1, 1));
    flaky.fail_show(true);
    let healthy = RecordingDevice::new("healthy", GridSize::new(1, 1));
    let healthy_calls = healthy.calls();
    registry.register(Box::new(flaky), (0, 0)).unwrap();
    registry.register(Box::new(healthy), (1, 0)).unwrap();
    let frame = ColorGrid::filled(GridSize::new(2, 1), Color::RED).unwrap();
    let handle = start(&registry, script(vec![frame]), "script");

    trigger_and_wait(&handle);

    assert!(!handle.is_finished());
    assert_eq!(healthy_calls.show_count(), 1);
    assert_eq!(registry.with_device("flaky", |d| d.get(0, 0)).unwrap(), Some(Color::BLACK));
    handle.stop().unwrap();
}
