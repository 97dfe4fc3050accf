//! The frame-rate-paced execution loop.
//!
//! Drives one [`Executor::apply`] per available input frame: pull the current
//! frame, read the current configuration, dispatch, present. Configuration
//! changes (filter, enable flag, backend) are picked up at the top of the
//! next iteration — never applied to a frame already in flight. A disposed
//! loop skips every subsequent iteration outright.

use crate::core::config::{ExecutionMode, FilterConfig};
use crate::core::error::ChitraResult;
use crate::core::tensor::FrameTensor;
use crate::execution::executor::Executor;
use crate::video::{FramePresenter, FrameSource};
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why an iteration rendered nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source had no frame available.
    NoFrame,
    /// The loop has been disposed.
    Disposed,
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was filtered and presented.
    Rendered,
    /// The iteration was skipped.
    Skipped(SkipReason),
}

/// Per-iteration telemetry handed to the loop observer.
#[derive(Debug, Clone, Copy)]
pub struct FrameUpdate {
    /// Number of frames rendered so far, counting this one.
    pub frame: u64,
    /// Instantaneous frames per second (`1 / elapsed` since the previous
    /// rendered frame).
    pub fps: f64,
    /// Wall-clock duration of this iteration.
    pub duration_ms: u64,
    /// Present when the iteration rendered nothing.
    pub skipped: Option<SkipReason>,
}

/// Callback type for per-frame telemetry.
pub type FrameObserver = Box<dyn Fn(FrameUpdate) + Send + Sync>;

/// Instantaneous frames-per-second, recomputed every rendered frame and
/// shared with read-only consumers.
struct FpsCounter {
    last: Instant,
    shared: Arc<RwLock<f64>>,
}

impl FpsCounter {
    fn new() -> Self {
        FpsCounter {
            last: Instant::now(),
            shared: Arc::new(RwLock::new(0.0)),
        }
    }

    fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        let fps = if delta > 0.0 { 1.0 / delta } else { f64::INFINITY };
        *self.shared.write() = fps;
        fps
    }

    fn handle(&self) -> FpsHandle {
        FpsHandle(self.shared.clone())
    }
}

/// Read-only view of the loop's frames-per-second telemetry.
#[derive(Clone)]
pub struct FpsHandle(Arc<RwLock<f64>>);

impl FpsHandle {
    /// The most recently computed frames-per-second value (0 before the
    /// first rendered frame).
    pub fn get(&self) -> f64 {
        *self.0.read()
    }
}

/// Shared write access to the loop's configuration.
///
/// Writes are picked up by the loop at the start of its next iteration.
#[derive(Clone)]
pub struct ControlHandle(Arc<RwLock<FilterConfig>>);

impl ControlHandle {
    /// Snapshot the current configuration.
    pub fn get(&self) -> FilterConfig {
        self.0.read().clone()
    }

    /// Replace the configuration.
    pub fn set(&self, config: FilterConfig) {
        *self.0.write() = config;
    }

    /// Modify the configuration in place.
    pub fn update(&self, f: impl FnOnce(&mut FilterConfig)) {
        f(&mut self.0.write());
    }

    /// Toggle the enable flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.update(|c| c.enabled = enabled);
    }

    /// Request an execution backend.
    pub fn set_backend(&self, backend: ExecutionMode) {
        self.update(|c| c.backend = backend);
    }
}

/// Aggregate counters for a bounded run.
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    /// Frames filtered and presented.
    pub frames_rendered: u64,
    /// Iterations skipped.
    pub frames_skipped: u64,
    /// Last instantaneous fps value.
    pub last_fps: f64,
    /// Total wall-clock time spent in `run`.
    pub total_duration: Duration,
}

/// The cooperative per-frame loop.
pub struct FrameLoop<S: FrameSource, P: FramePresenter> {
    source: S,
    presenter: P,
    executor: Executor,
    config: Arc<RwLock<FilterConfig>>,
    /// Backend most recently requested from the executor. Kept separately
    /// from the executor's live mode so an unavailable backend (which falls
    /// back to CPU) is not re-requested every frame.
    requested_backend: ExecutionMode,
    fps: FpsCounter,
    observer: Option<FrameObserver>,
    frames_rendered: u64,
    disposed: bool,
}

impl<S: FrameSource, P: FramePresenter> FrameLoop<S, P> {
    /// Create a loop over a source/presenter pair with an initial
    /// configuration. The executor starts on the configured backend,
    /// falling back to CPU if it is unavailable.
    pub fn new(source: S, presenter: P, config: FilterConfig) -> Self {
        let executor = Executor::with_fallback(config.backend);
        let requested_backend = config.backend;
        FrameLoop {
            source,
            presenter,
            executor,
            config: Arc::new(RwLock::new(config)),
            requested_backend,
            fps: FpsCounter::new(),
            observer: None,
            frames_rendered: 0,
            disposed: false,
        }
    }

    /// Attach a per-frame telemetry observer.
    pub fn with_observer(mut self, observer: FrameObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handle for changing the configuration from outside the loop.
    pub fn control(&self) -> ControlHandle {
        ControlHandle(self.config.clone())
    }

    /// Read-only frames-per-second telemetry.
    pub fn fps_handle(&self) -> FpsHandle {
        self.fps.handle()
    }

    /// The executor driving this loop.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Mutable access to the presenter (e.g. to take the last rendered
    /// frame after a bounded run).
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Tear the loop down: the executor's backend is released and every
    /// later iteration is skipped.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.executor.dispose();
    }

    /// Whether the loop has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run a single iteration.
    pub fn run_frame(&mut self) -> ChitraResult<FrameStatus> {
        // Hard gate: a disposed loop never dispatches.
        if self.disposed {
            self.notify_skip(SkipReason::Disposed);
            return Ok(FrameStatus::Skipped(SkipReason::Disposed));
        }

        let start = Instant::now();

        // Snapshot the configuration once; changes made while this frame is
        // in flight take effect next iteration.
        let config = self.config.read().clone();
        if config.backend != self.requested_backend {
            self.requested_backend = config.backend;
            self.executor.set_mode(config.backend)?;
        }

        let Some(frame) = self.source.next_frame()? else {
            debug!("no frame available, skipping iteration");
            self.notify_skip(SkipReason::NoFrame);
            return Ok(FrameStatus::Skipped(SkipReason::NoFrame));
        };

        let tensor = FrameTensor::from_raw(&frame.data, frame.width, frame.height, frame.layout)?;
        let filter = config.build(frame.height, frame.width)?;
        let output = self.executor.apply(filter.as_ref(), &tensor)?;
        self.presenter.present(&output)?;

        let fps = self.fps.tick();
        self.frames_rendered += 1;
        if let Some(observer) = &self.observer {
            observer(FrameUpdate {
                frame: self.frames_rendered,
                fps,
                duration_ms: start.elapsed().as_millis() as u64,
                skipped: None,
            });
        }
        Ok(FrameStatus::Rendered)
    }

    /// Run up to `max_frames` iterations, stopping early only if the loop is
    /// disposed. Source dropouts are skipped, not fatal.
    pub fn run(&mut self, max_frames: u64) -> ChitraResult<LoopStats> {
        let start = Instant::now();
        let mut stats = LoopStats::default();
        for _ in 0..max_frames {
            match self.run_frame()? {
                FrameStatus::Rendered => stats.frames_rendered += 1,
                FrameStatus::Skipped(SkipReason::NoFrame) => stats.frames_skipped += 1,
                FrameStatus::Skipped(SkipReason::Disposed) => {
                    stats.frames_skipped += 1;
                    break;
                }
            }
        }
        stats.last_fps = self.fps.handle().get();
        stats.total_duration = start.elapsed();
        Ok(stats)
    }

    fn notify_skip(&self, reason: SkipReason) {
        if let Some(observer) = &self.observer {
            observer(FrameUpdate {
                frame: self.frames_rendered,
                fps: self.fps.handle().get(),
                duration_ms: 0,
                skipped: Some(reason),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FilterKind;
    use crate::core::error::StreamError;
    use crate::core::tensor::{RawLayout, RGBA_CHANNELS};
    use crate::video::RawFrame;
    use parking_lot::Mutex;

    /// Source producing a solid-intensity frame, optionally dropping out.
    struct SolidSource {
        value: u8,
        width: usize,
        height: usize,
        dropout: bool,
    }

    impl SolidSource {
        fn new(value: u8) -> Self {
            SolidSource {
                value,
                width: 8,
                height: 8,
                dropout: false,
            }
        }
    }

    impl FrameSource for SolidSource {
        fn next_frame(&mut self) -> Result<Option<RawFrame>, StreamError> {
            if self.dropout {
                return Ok(None);
            }
            Ok(Some(RawFrame {
                data: vec![self.value; self.width * self.height * RGBA_CHANNELS],
                width: self.width,
                height: self.height,
                layout: RawLayout::default(),
            }))
        }
    }

    /// Presenter recording the center pixel of every presented frame.
    #[derive(Clone, Default)]
    struct RecordingPresenter {
        red_values: Arc<Mutex<Vec<f32>>>,
    }

    impl FramePresenter for RecordingPresenter {
        fn present(&mut self, frame: &FrameTensor) -> Result<(), StreamError> {
            self.red_values.lock().push(frame.get(0, 4, 4));
            Ok(())
        }
    }

    fn disabled_blue_cast() -> FilterConfig {
        FilterConfig::new(FilterKind::BlueCast).with_enabled(false)
    }

    #[test]
    fn test_renders_and_counts_frames() {
        let presenter = RecordingPresenter::default();
        let values = presenter.red_values.clone();
        let mut frame_loop = FrameLoop::new(SolidSource::new(128), presenter, disabled_blue_cast());

        let stats = frame_loop.run(3).unwrap();
        assert_eq!(stats.frames_rendered, 3);
        assert_eq!(stats.frames_skipped, 0);
        // Disabled filter: the presenter sees the source intensity.
        for &v in values.lock().iter() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_config_change_applies_from_next_frame() {
        let presenter = RecordingPresenter::default();
        let values = presenter.red_values.clone();
        let mut frame_loop = FrameLoop::new(SolidSource::new(128), presenter, disabled_blue_cast());
        let control = frame_loop.control();

        frame_loop.run_frame().unwrap();
        control.set_enabled(true);
        frame_loop.run_frame().unwrap();

        let seen = values.lock();
        // Frame 1 predates the toggle: pass-through.
        assert!((seen[0] - 0.5).abs() < 1e-6);
        // Frame 2 has the blue cast applied: 255/256 - 0.5.
        assert!((seen[1] - (255.0 / 256.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_backend_swap_happens_between_frames() {
        let presenter = RecordingPresenter::default();
        let mut frame_loop = FrameLoop::new(SolidSource::new(64), presenter, disabled_blue_cast());
        let control = frame_loop.control();

        frame_loop.run_frame().unwrap();
        assert_eq!(frame_loop.executor().mode(), ExecutionMode::Cpu);
        assert_eq!(frame_loop.executor().teardown_count(), 0);

        control.set_backend(ExecutionMode::Gpu);
        // The already-dispatched frame ran on CPU; the swap happens at the
        // top of the next iteration, and exactly once.
        frame_loop.run_frame().unwrap();
        assert_eq!(frame_loop.executor().mode(), ExecutionMode::Gpu);
        assert_eq!(frame_loop.executor().teardown_count(), 1);

        frame_loop.run_frame().unwrap();
        assert_eq!(frame_loop.executor().teardown_count(), 1);
    }

    #[test]
    fn test_disposed_loop_skips_everything() {
        let presenter = RecordingPresenter::default();
        let values = presenter.red_values.clone();
        let mut frame_loop = FrameLoop::new(SolidSource::new(200), presenter, disabled_blue_cast());

        frame_loop.run_frame().unwrap();
        frame_loop.dispose();
        assert!(frame_loop.is_disposed());

        let status = frame_loop.run_frame().unwrap();
        assert_eq!(status, FrameStatus::Skipped(SkipReason::Disposed));
        assert_eq!(values.lock().len(), 1);
        // The executor's resources were released exactly once.
        assert_eq!(frame_loop.executor().teardown_count(), 1);
    }

    #[test]
    fn test_source_dropout_skips_iteration() {
        let mut source = SolidSource::new(10);
        source.dropout = true;
        let mut frame_loop =
            FrameLoop::new(source, RecordingPresenter::default(), disabled_blue_cast());
        let status = frame_loop.run_frame().unwrap();
        assert_eq!(status, FrameStatus::Skipped(SkipReason::NoFrame));
    }

    #[test]
    fn test_fps_telemetry_updates() {
        let mut frame_loop = FrameLoop::new(
            SolidSource::new(30),
            RecordingPresenter::default(),
            disabled_blue_cast(),
        );
        let fps = frame_loop.fps_handle();
        assert_eq!(fps.get(), 0.0);

        frame_loop.run_frame().unwrap();
        assert!(fps.get() > 0.0);
    }

    #[test]
    fn test_observer_sees_updates_and_skips() {
        let updates: Arc<Mutex<Vec<FrameUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let mut frame_loop = FrameLoop::new(
            SolidSource::new(50),
            RecordingPresenter::default(),
            disabled_blue_cast(),
        )
        .with_observer(Box::new(move |u| sink.lock().push(u)));

        frame_loop.run_frame().unwrap();
        frame_loop.dispose();
        frame_loop.run_frame().unwrap();

        let seen = updates.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].skipped.is_none());
        assert_eq!(seen[0].frame, 1);
        assert_eq!(seen[1].skipped, Some(SkipReason::Disposed));
    }
}
