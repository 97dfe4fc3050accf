//! Backend dispatch.
//!
//! The [`Executor`] is a two-state machine over [`ExecutionMode`]: CPU mode
//! evaluates the filter at every `(channel, y, x)` in deterministic row-major
//! order; GPU mode evaluates every coordinate data-parallel on an
//! executor-owned worker pool, with no ordering guarantee and no shared
//! mutable state between coordinates. Both modes run the same filter
//! definition, so their outputs are identical.
//!
//! Mode switches happen only between frames: the previous backend's resources
//! are released in full before the new backend is constructed, and a disposed
//! executor refuses further dispatches.

use crate::core::config::ExecutionMode;
use crate::core::error::{ExecResult, ExecutorError};
use crate::core::tensor::FrameTensor;
use crate::filters::PixelFilter;
use log::{debug, warn};
use rayon::prelude::*;

/// Backend-held resources. The GPU backend owns its worker pool; dropping
/// the value releases it.
enum Backend {
    Cpu,
    Gpu { pool: rayon::ThreadPool },
}

impl Backend {
    fn build(mode: ExecutionMode) -> ExecResult<Self> {
        match mode {
            ExecutionMode::Cpu => Ok(Backend::Cpu),
            ExecutionMode::Gpu => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .thread_name(|i| format!("chitra-gpu-{i}"))
                    .build()
                    .map_err(|e| ExecutorError::BackendUnavailable {
                        mode: ExecutionMode::Gpu,
                        reason: e.to_string(),
                    })?;
                Ok(Backend::Gpu { pool })
            }
        }
    }
}

/// Applies a filter function to every element of an output tensor on the
/// selected backend.
pub struct Executor {
    backend: Option<Backend>,
    mode: ExecutionMode,
    teardowns: usize,
}

impl Executor {
    /// Construct an executor for `mode`.
    ///
    /// Fails with [`ExecutorError::BackendUnavailable`] when the backend
    /// cannot be constructed; use [`with_fallback`](Self::with_fallback) to
    /// degrade to CPU instead.
    pub fn new(mode: ExecutionMode) -> ExecResult<Self> {
        let backend = Backend::build(mode)?;
        debug!("executor ready on {mode} backend");
        Ok(Executor {
            backend: Some(backend),
            mode,
            teardowns: 0,
        })
    }

    /// Construct an executor for `mode`, falling back to CPU with a warning
    /// when the requested backend is unavailable.
    pub fn with_fallback(mode: ExecutionMode) -> Self {
        match Self::new(mode) {
            Ok(executor) => executor,
            Err(err) => {
                warn!("{mode} backend unavailable, falling back to cpu: {err}");
                Executor {
                    backend: Some(Backend::Cpu),
                    mode: ExecutionMode::Cpu,
                    teardowns: 0,
                }
            }
        }
    }

    /// The mode the live backend is running in.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.backend.is_none()
    }

    /// Number of times a backend's resources have been released.
    pub fn teardown_count(&self) -> usize {
        self.teardowns
    }

    /// Switch backends between frames.
    ///
    /// Tears down the current backend completely, then constructs the new
    /// one. When the requested backend cannot be constructed the executor
    /// falls back to CPU with a warning. Returns the mode actually in
    /// effect.
    pub fn set_mode(&mut self, mode: ExecutionMode) -> ExecResult<ExecutionMode> {
        if self.backend.is_none() {
            return Err(ExecutorError::Disposed);
        }
        if mode == self.mode {
            return Ok(self.mode);
        }

        // Release the previous backend in full before any new setup begins.
        self.backend = None;
        self.teardowns += 1;

        match Backend::build(mode) {
            Ok(backend) => {
                debug!("executor rebuilt on {mode} backend");
                self.backend = Some(backend);
                self.mode = mode;
            }
            Err(err) => {
                warn!("{mode} backend unavailable, falling back to cpu: {err}");
                self.backend = Some(Backend::Cpu);
                self.mode = ExecutionMode::Cpu;
            }
        }
        Ok(self.mode)
    }

    /// Release the backend's resources. Idempotent; later dispatches return
    /// [`ExecutorError::Disposed`].
    pub fn dispose(&mut self) {
        if self.backend.take().is_some() {
            self.teardowns += 1;
            debug!("executor disposed");
        }
    }

    /// Evaluate `filter` at every element, producing a fresh output tensor
    /// of the input's shape.
    pub fn apply(
        &self,
        filter: &dyn PixelFilter,
        src: &FrameTensor,
    ) -> ExecResult<FrameTensor> {
        let backend = self.backend.as_ref().ok_or(ExecutorError::Disposed)?;
        let mut out = FrameTensor::new(src.channels(), src.height(), src.width())
            .map_err(ExecutorError::Config)?;

        match backend {
            Backend::Cpu => {
                for (i, slot) in out.as_mut_slice().iter_mut().enumerate() {
                    let (c, y, x) = src.coords_of(i);
                    *slot = filter.eval(src, c, y, x);
                }
            }
            Backend::Gpu { pool } => {
                pool.install(|| {
                    out.as_mut_slice()
                        .par_iter_mut()
                        .enumerate()
                        .for_each(|(i, slot)| {
                            let (c, y, x) = src.coords_of(i);
                            *slot = filter.eval(src, c, y, x);
                        });
                });
            }
        }
        Ok(out)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{
        BlueCast, EdgeDetect3x3, Emboss3x3, Gaussian5x5, GaussianWeights, LightTunnel, Passthrough,
    };
    use proptest::prelude::*;

    fn test_tensor(channels: usize, height: usize, width: usize) -> FrameTensor {
        // Deterministic pseudo-random content.
        FrameTensor::from_fn(channels, height, width, |c, y, x| {
            let n = (c * 31 + y * 17 + x * 7) % 97;
            n as f32 / 97.0
        })
        .unwrap()
    }

    fn assert_tensors_equal(a: &FrameTensor, b: &FrameTensor, eps: f32) {
        assert_eq!(a.len(), b.len());
        for (i, (&va, &vb)) in a.as_slice().iter().zip(b.as_slice()).enumerate() {
            assert!(
                (va - vb).abs() <= eps,
                "element {i} differs: {va} vs {vb}"
            );
        }
    }

    #[test]
    fn test_backend_equivalence_all_filters() {
        let src = test_tensor(4, 24, 32);
        let cpu = Executor::new(ExecutionMode::Cpu).unwrap();
        let gpu = Executor::new(ExecutionMode::Gpu).unwrap();

        let filters: Vec<Box<dyn PixelFilter>> = vec![
            Box::new(Passthrough),
            Box::new(BlueCast),
            Box::new(EdgeDetect3x3::default()),
            Box::new(Emboss3x3::default()),
            Box::new(Gaussian5x5::new(GaussianWeights::default()).unwrap()),
            Box::new(LightTunnel::new(8.0)),
        ];

        for filter in &filters {
            let a = cpu.apply(filter.as_ref(), &src).unwrap();
            let b = gpu.apply(filter.as_ref(), &src).unwrap();
            assert_tensors_equal(&a, &b, 1e-5);
        }
    }

    #[test]
    fn test_cpu_scan_is_deterministic() {
        let src = test_tensor(4, 16, 16);
        let executor = Executor::new(ExecutionMode::Cpu).unwrap();
        let filter = EdgeDetect3x3::default();
        let a = executor.apply(&filter, &src).unwrap();
        let b = executor.apply(&filter, &src).unwrap();
        assert_tensors_equal(&a, &b, 0.0);
    }

    #[test]
    fn test_input_tensor_is_not_mutated() {
        let src = test_tensor(4, 8, 8);
        let before = src.clone();
        let executor = Executor::new(ExecutionMode::Cpu).unwrap();
        executor.apply(&Emboss3x3::default(), &src).unwrap();
        assert_tensors_equal(&src, &before, 0.0);
    }

    #[test]
    fn test_disposed_executor_rejects_dispatch() {
        let src = test_tensor(4, 4, 4);
        let mut executor = Executor::new(ExecutionMode::Cpu).unwrap();
        executor.dispose();
        assert!(executor.is_disposed());
        assert!(matches!(
            executor.apply(&Passthrough, &src),
            Err(ExecutorError::Disposed)
        ));
        assert!(matches!(
            executor.set_mode(ExecutionMode::Gpu),
            Err(ExecutorError::Disposed)
        ));
    }

    #[test]
    fn test_dispose_releases_exactly_once() {
        let mut executor = Executor::new(ExecutionMode::Gpu).unwrap();
        executor.dispose();
        executor.dispose();
        assert_eq!(executor.teardown_count(), 1);
    }

    #[test]
    fn test_mode_switch_tears_down_and_rebuilds() {
        let src = test_tensor(4, 8, 8);
        let mut executor = Executor::new(ExecutionMode::Cpu).unwrap();
        assert_eq!(executor.teardown_count(), 0);

        let mode = executor.set_mode(ExecutionMode::Gpu).unwrap();
        assert_eq!(mode, ExecutionMode::Gpu);
        assert_eq!(executor.teardown_count(), 1);
        assert!(executor.apply(&BlueCast, &src).is_ok());

        // Same-mode switch is a no-op.
        executor.set_mode(ExecutionMode::Gpu).unwrap();
        assert_eq!(executor.teardown_count(), 1);

        let mode = executor.set_mode(ExecutionMode::Cpu).unwrap();
        assert_eq!(mode, ExecutionMode::Cpu);
        assert_eq!(executor.teardown_count(), 2);
        assert!(executor.apply(&BlueCast, &src).is_ok());
    }

    #[test]
    fn test_with_fallback_always_yields_live_executor() {
        let executor = Executor::with_fallback(ExecutionMode::Gpu);
        assert!(!executor.is_disposed());
        let src = test_tensor(4, 4, 4);
        assert!(executor.apply(&Passthrough, &src).is_ok());
    }

    proptest! {
        // Each case constructs a fresh worker pool; keep the case count low.
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// CPU and GPU backends agree element-for-element on arbitrary
        /// frames.
        #[test]
        fn prop_backend_equivalence(values in proptest::collection::vec(0.0f32..1.0, 4 * 12 * 16)) {
            let mut src = FrameTensor::new(4, 12, 16).unwrap();
            src.as_mut_slice().copy_from_slice(&values);

            let cpu = Executor::new(ExecutionMode::Cpu).unwrap();
            let gpu = Executor::new(ExecutionMode::Gpu).unwrap();
            let filter = Gaussian5x5::new(GaussianWeights::default()).unwrap();

            let a = cpu.apply(&filter, &src).unwrap();
            let b = gpu.apply(&filter, &src).unwrap();
            for (&va, &vb) in a.as_slice().iter().zip(b.as_slice()) {
                prop_assert!((va - vb).abs() < 1e-5);
            }
        }
    }
}
