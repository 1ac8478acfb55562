//! Sampler for the legacy (v1) hierarchy.
//!
//! Each controller is mounted in its own tree under the root, so the group
//! of a process is resolved per controller:
//!
//! ```text
//! /proc/<pid>/cgroup            4:cpu,cpuacct:/docker/abc
//!                               9:memory:/docker/abc
//! <root>/cpuacct/docker/abc/    cpuacct.usage          (ns, cumulative)
//! <root>/memory/docker/abc/     memory.limit_in_bytes
//!                               memory.usage_in_bytes
//!                               memory.stat            (cache)
//! ```

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::parser::{parse_keyed, parse_limit, parse_u64};
use super::{group_dir, load_membership, memory_from_counters};
use crate::collector::error::SampleError;
use crate::collector::sampler::{CpuSample, ResourceSampler, SamplerContext};
use crate::collector::traits::{Clock, FileSystem};
use crate::query::{CpuOptions, MemoryOptions, MemoryUsage};

const CPUACCT: &str = "cpuacct";
const MEMORY: &str = "memory";

/// Reads a process's resource accounting from a legacy hierarchy.
pub struct CgroupV1Sampler<'a, F: FileSystem, C: Clock> {
    ctx: SamplerContext<'a, F, C>,
    root: &'a Path,
    pid: u32,
}

impl<'a, F: FileSystem, C: Clock> CgroupV1Sampler<'a, F, C> {
    pub fn new(ctx: SamplerContext<'a, F, C>, root: &'a Path, pid: u32) -> Self {
        Self { ctx, root, pid }
    }

    /// Resolves the group directory of `pid` in the tree of `controller`.
    fn load(&self, controller: &str) -> Result<PathBuf, SampleError> {
        let membership = load_membership(&self.ctx, self.pid)?;
        let entry = membership
            .iter()
            .find(|m| m.has_controller(controller))
            .ok_or_else(|| {
                SampleError::hierarchy(self.pid, format!("no {} controller entry", controller))
            })?;
        let dir = group_dir(&self.ctx, self.pid, &self.root.join(controller), &entry.path)?;
        debug!("pid {} {} group: {}", self.pid, controller, dir.display());
        Ok(dir)
    }

    fn read_u64(&self, path: &Path) -> Result<u64, SampleError> {
        let content = self.ctx.read_stat(path)?;
        parse_u64(&content).map_err(|e| SampleError::stat_parse(path, e))
    }

    fn cpu_sample(&self, usage_path: &Path) -> Result<CpuSample, SampleError> {
        let nanos = self.read_u64(usage_path)?;
        Ok(CpuSample::new(Duration::from_nanos(nanos), self.ctx.clock.now()))
    }
}

impl<F: FileSystem, C: Clock> ResourceSampler for CgroupV1Sampler<'_, F, C> {
    fn cpu_usage(&self, _options: &CpuOptions, core_count: NonZeroU32) -> Result<f64, SampleError> {
        let usage_path = self.load(CPUACCT)?.join("cpuacct.usage");
        let (pre, next) = self.ctx.sample_twice(|| self.cpu_sample(&usage_path))?;
        debug!("cpuacct.usage: {:?} -> {:?}", pre.usage, next.usage);
        Ok(next.percent_since(&pre, core_count))
    }

    fn memory_usage(&self, options: &MemoryOptions) -> Result<MemoryUsage, SampleError> {
        let dir = self.load(MEMORY)?;

        let limit_path = dir.join("memory.limit_in_bytes");
        let limit = parse_limit(&self.ctx.read_stat(&limit_path)?)
            .map_err(|e| SampleError::stat_parse(&limit_path, e))?;
        let usage = self.read_u64(&dir.join("memory.usage_in_bytes"))?;
        let stat = self.ctx.read_stat(&dir.join("memory.stat"))?;
        let cache = parse_keyed(&stat, "cache").unwrap_or(0);

        debug!("memory limit={} usage={} cache={}", limit, usage, cache);
        memory_from_counters(limit, usage, cache, options)
    }
}
