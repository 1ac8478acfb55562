//! Shared sampling machinery: the sampler trait, the context every sampler
//! reads through, and delta sampling of cumulative CPU counters.

use std::num::NonZeroU32;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::warn;

use super::error::SampleError;
use super::traits::{Clock, FileSystem};
use crate::query::{CpuOptions, MemoryOptions, MemoryUsage};

/// Default wait between the two CPU samples.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// A resource sampler for one scope (host, or one process's cgroup).
pub trait ResourceSampler {
    /// CPU utilization in percent, measured over one sampling window.
    fn cpu_usage(&self, options: &CpuOptions, core_count: NonZeroU32) -> Result<f64, SampleError>;

    /// Current memory total and availability in bytes.
    fn memory_usage(&self, options: &MemoryOptions) -> Result<MemoryUsage, SampleError>;
}

/// Everything a sampler needs from its environment.
pub struct SamplerContext<'a, F: FileSystem, C: Clock> {
    pub fs: &'a F,
    pub clock: &'a C,
    /// Base path of the proc filesystem (usually "/proc").
    pub proc_path: &'a Path,
    pub window: Duration,
}

impl<F: FileSystem, C: Clock> Clone for SamplerContext<'_, F, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: FileSystem, C: Clock> Copy for SamplerContext<'_, F, C> {}

impl<F: FileSystem, C: Clock> SamplerContext<'_, F, C> {
    /// Reads a file, mapping failures to `StatRead`.
    pub(crate) fn read_stat(&self, path: &Path) -> Result<String, SampleError> {
        self.fs
            .read_to_string(path)
            .map_err(|e| SampleError::stat_read(path, e))
    }

    /// Takes one sample, waits out the window, takes another.
    pub(crate) fn sample_twice<T>(
        &self,
        mut read: impl FnMut() -> Result<T, SampleError>,
    ) -> Result<(T, T), SampleError> {
        let pre = read()?;
        self.clock.sleep(self.window);
        let next = read()?;
        Ok((pre, next))
    }
}

/// Cumulative CPU time of a cgroup at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    pub usage: Duration,
    pub taken_at: Instant,
}

impl CpuSample {
    pub fn new(usage: Duration, taken_at: Instant) -> Self {
        Self { usage, taken_at }
    }

    /// Utilization between `earlier` and `self`, as a percentage of
    /// `core_count` CPUs, clamped to `[0, 100 * core_count]`.
    pub fn percent_since(&self, earlier: &CpuSample, core_count: NonZeroU32) -> f64 {
        let Some(delta) = self.usage.checked_sub(earlier.usage) else {
            warn!(
                "cpu counter went backwards ({:?} -> {:?}), reporting 0",
                earlier.usage, self.usage
            );
            return 0.0;
        };

        let elapsed = self.taken_at.saturating_duration_since(earlier.taken_at);
        if elapsed.is_zero() {
            return 0.0;
        }

        let cores = f64::from(core_count.get());
        let percent = delta.as_secs_f64() * 100.0 / elapsed.as_secs_f64() / cores;
        percent.clamp(0.0, 100.0 * cores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cores(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_percent_since_four_cores() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::from_secs(10), t0);
        let next = CpuSample::new(Duration::from_millis(10_400), t0 + Duration::from_secs(1));

        let percent = next.percent_since(&pre, cores(4));
        assert!((percent - 10.0).abs() < 1e-9, "got {percent}");
    }

    #[test]
    fn test_percent_since_idle_group_is_zero() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::from_secs(3), t0);
        let next = CpuSample::new(Duration::from_secs(3), t0 + Duration::from_secs(1));
        assert_eq!(next.percent_since(&pre, cores(2)), 0.0);
    }

    #[test]
    fn test_percent_since_counter_reset() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::from_secs(50), t0);
        let next = CpuSample::new(Duration::from_secs(1), t0 + Duration::from_secs(1));
        assert_eq!(next.percent_since(&pre, cores(1)), 0.0);
    }

    #[test]
    fn test_percent_since_clamps_to_core_budget() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::ZERO, t0);
        // 8 CPU-seconds in one second, but only 2 cores configured.
        let next = CpuSample::new(Duration::from_secs(8), t0 + Duration::from_secs(1));
        assert_eq!(next.percent_since(&pre, cores(2)), 200.0);
    }

    #[test]
    fn test_percent_since_scales_by_elapsed() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::ZERO, t0);
        let next = CpuSample::new(Duration::from_secs(1), t0 + Duration::from_secs(2));
        let percent = next.percent_since(&pre, cores(1));
        assert!((percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_since_zero_elapsed() {
        let t0 = Instant::now();
        let pre = CpuSample::new(Duration::ZERO, t0);
        let next = CpuSample::new(Duration::from_secs(1), t0);
        assert_eq!(next.percent_since(&pre, cores(1)), 0.0);
    }
}
