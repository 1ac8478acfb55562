//! Sampler for the unified (v2) hierarchy.
//!
//! The group of a process comes straight from the `0::<path>` line of
//! `/proc/<pid>/cgroup`; every controller's files live in that one directory:
//!
//! ```text
//! <root>/<path>/cpu.stat        usage_usec (cumulative)
//! <root>/<path>/memory.max      bytes or "max"
//! <root>/<path>/memory.current
//! <root>/<path>/memory.stat     file
//! ```

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::parser::{parse_cpu_usage_usec, parse_keyed, parse_limit, parse_u64};
use super::{group_dir, load_membership, memory_from_counters};
use crate::collector::error::SampleError;
use crate::collector::sampler::{CpuSample, ResourceSampler, SamplerContext};
use crate::collector::traits::{Clock, FileSystem};
use crate::query::{CpuOptions, MemoryOptions, MemoryUsage};

/// Reads a process's resource accounting from a unified hierarchy.
pub struct CgroupV2Sampler<'a, F: FileSystem, C: Clock> {
    ctx: SamplerContext<'a, F, C>,
    root: &'a Path,
    pid: u32,
}

impl<'a, F: FileSystem, C: Clock> CgroupV2Sampler<'a, F, C> {
    pub fn new(ctx: SamplerContext<'a, F, C>, root: &'a Path, pid: u32) -> Self {
        Self { ctx, root, pid }
    }

    /// Resolves the unified group directory of `pid`.
    fn load(&self) -> Result<PathBuf, SampleError> {
        let membership = load_membership(&self.ctx, self.pid)?;
        let entry = membership
            .iter()
            .find(|m| m.is_unified())
            .ok_or_else(|| SampleError::hierarchy(self.pid, "no unified (0::) entry"))?;
        let dir = group_dir(&self.ctx, self.pid, self.root, &entry.path)?;
        debug!("pid {} group: {}", self.pid, dir.display());
        Ok(dir)
    }

    fn cpu_sample(&self, stat_path: &Path) -> Result<CpuSample, SampleError> {
        let content = self.ctx.read_stat(stat_path)?;
        let usec =
            parse_cpu_usage_usec(&content).map_err(|e| SampleError::stat_parse(stat_path, e))?;
        Ok(CpuSample::new(Duration::from_micros(usec), self.ctx.clock.now()))
    }
}

impl<F: FileSystem, C: Clock> ResourceSampler for CgroupV2Sampler<'_, F, C> {
    fn cpu_usage(&self, _options: &CpuOptions, core_count: NonZeroU32) -> Result<f64, SampleError> {
        let stat_path = self.load()?.join("cpu.stat");
        let (pre, next) = self.ctx.sample_twice(|| self.cpu_sample(&stat_path))?;
        debug!("cpu.stat usage_usec: {:?} -> {:?}", pre.usage, next.usage);
        Ok(next.percent_since(&pre, core_count))
    }

    fn memory_usage(&self, options: &MemoryOptions) -> Result<MemoryUsage, SampleError> {
        let dir = self.load()?;

        let max_path = dir.join("memory.max");
        let limit = parse_limit(&self.ctx.read_stat(&max_path)?)
            .map_err(|e| SampleError::stat_parse(&max_path, e))?;

        let current_path = dir.join("memory.current");
        let usage = parse_u64(&self.ctx.read_stat(&current_path)?)
            .map_err(|e| SampleError::stat_parse(&current_path, e))?;

        let stat = self.ctx.read_stat(&dir.join("memory.stat"))?;
        let file = parse_keyed(&stat, "file").unwrap_or(0);

        debug!("memory max={} current={} file={}", limit, usage, file);
        memory_from_counters(limit, usage, file, options)
    }
}
