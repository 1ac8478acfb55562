//! Query dispatcher: picks the host or a cgroup sampler once per query.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::cgroup::{CgroupV1Sampler, CgroupV2Sampler, HierarchyDetector, HierarchyMode};
use super::error::SampleError;
use super::procfs::HostSampler;
use super::sampler::{DEFAULT_WINDOW, ResourceSampler, SamplerContext};
use super::traits::{Clock, FileSystem, SystemClock};
use crate::query::{CpuOptions, MemoryOptions, MemoryUsage, Metric, Usage, UsageQuery};

/// Where a measurement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleSource {
    Host,
    CgroupV1,
    CgroupV2,
}

/// The sampler chosen for one query.
pub enum Sampler<'a, F: FileSystem, C: Clock> {
    Host(HostSampler<'a, F, C>),
    V1(CgroupV1Sampler<'a, F, C>),
    V2(CgroupV2Sampler<'a, F, C>),
}

impl<F: FileSystem, C: Clock> Sampler<'_, F, C> {
    pub fn source(&self) -> SampleSource {
        match self {
            Sampler::Host(_) => SampleSource::Host,
            Sampler::V1(_) => SampleSource::CgroupV1,
            Sampler::V2(_) => SampleSource::CgroupV2,
        }
    }

    /// Runs the measurement the query asks for.
    pub fn measure(&self, query: &UsageQuery) -> Result<Usage, SampleError> {
        match query.metric {
            Metric::Cpu => self
                .cpu_usage(&query.cpu, query.core_count)
                .map(|percent| Usage::Cpu { percent }),
            Metric::Memory => self.memory_usage(&query.memory).map(Usage::Memory),
        }
    }

    fn inner(&self) -> &dyn ResourceSampler {
        match self {
            Sampler::Host(s) => s,
            Sampler::V1(s) => s,
            Sampler::V2(s) => s,
        }
    }
}

impl<F: FileSystem, C: Clock> ResourceSampler for Sampler<'_, F, C> {
    fn cpu_usage(&self, options: &CpuOptions, core_count: NonZeroU32) -> Result<f64, SampleError> {
        self.inner().cpu_usage(options, core_count)
    }

    fn memory_usage(&self, options: &MemoryOptions) -> Result<MemoryUsage, SampleError> {
        self.inner().memory_usage(options)
    }
}

/// Answers usage queries against a filesystem and a clock.
///
/// Holds no counters between calls; every query re-reads the kernel files.
pub struct UsageProbe<F: FileSystem, C: Clock = SystemClock> {
    fs: F,
    clock: C,
    proc_path: PathBuf,
    window: Duration,
}

impl<F: FileSystem> UsageProbe<F, SystemClock> {
    /// Creates a probe reading `/proc` with a one-second CPU window.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            clock: SystemClock,
            proc_path: PathBuf::from("/proc"),
            window: DEFAULT_WINDOW,
        }
    }
}

impl<F: FileSystem, C: Clock> UsageProbe<F, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> UsageProbe<F, C2> {
        UsageProbe {
            fs: self.fs,
            clock,
            proc_path: self.proc_path,
            window: self.window,
        }
    }

    pub fn with_proc_path(mut self, proc_path: impl Into<PathBuf>) -> Self {
        self.proc_path = proc_path.into();
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Hierarchy mode mounted at `root`.
    pub fn detect(&self, root: &Path) -> HierarchyMode {
        HierarchyDetector::new(&self.fs, &self.proc_path).detect(root)
    }

    /// Chooses the sampler for `query`: host when no target is set,
    /// otherwise the cgroup sampler matching the detected hierarchy.
    pub fn select<'a>(&'a self, query: &'a UsageQuery) -> Sampler<'a, F, C> {
        let ctx = SamplerContext {
            fs: &self.fs,
            clock: &self.clock,
            proc_path: &self.proc_path,
            window: self.window,
        };

        let Some(pid) = query.target else {
            debug!("no target process, sampling host");
            return Sampler::Host(HostSampler::new(ctx));
        };

        let root = query.cgroup_root.as_path();
        debug!("sampling pid {} by cgroup, root path: {}", pid, root.display());
        match self.detect(root) {
            HierarchyMode::V2 => Sampler::V2(CgroupV2Sampler::new(ctx, root, pid)),
            HierarchyMode::V1 => Sampler::V1(CgroupV1Sampler::new(ctx, root, pid)),
        }
    }

    /// Runs `query` end to end. Failures are returned as-is, never retried.
    pub fn sample(&self, query: &UsageQuery) -> Result<Usage, SampleError> {
        self.select(query).measure(query)
    }
}
