//! Whole-machine sampler reading `/proc/stat` and `/proc/meminfo`.

use std::num::NonZeroU32;

use tracing::debug;

use super::parser::{CpuStat, GlobalStat, MemInfo, ParseError, parse_global_stat, parse_meminfo};
use crate::collector::error::SampleError;
use crate::collector::sampler::{ResourceSampler, SamplerContext};
use crate::collector::traits::{Clock, FileSystem};
use crate::query::{CpuOptions, MemoryOptions, MemoryUsage};

/// Reads host-wide CPU and memory counters; no cgroup involvement.
pub struct HostSampler<'a, F: FileSystem, C: Clock> {
    ctx: SamplerContext<'a, F, C>,
}

impl<'a, F: FileSystem, C: Clock> HostSampler<'a, F, C> {
    pub fn new(ctx: SamplerContext<'a, F, C>) -> Self {
        Self { ctx }
    }

    fn read_stat(&self) -> Result<GlobalStat, SampleError> {
        let path = self.ctx.proc_path.join("stat");
        let content = self.ctx.read_stat(&path)?;
        parse_global_stat(&content).map_err(|e| SampleError::stat_parse(path, e))
    }

    /// Picks the aggregate line, or the core at `index` in file order.
    fn select(stat: &GlobalStat, per_core: bool, index: usize) -> Result<&CpuStat, SampleError> {
        if !per_core {
            return Ok(&stat.total);
        }
        stat.per_cpu.get(index).ok_or(SampleError::IndexOutOfRange {
            index,
            cores: stat.per_cpu.len(),
        })
    }
}

/// Busy share of the ticks elapsed between two readings, in `[0, 100]`.
/// `None` if a tick sum overflows.
fn busy_percent(pre: &CpuStat, next: &CpuStat) -> Option<f64> {
    let total = next.total()?.saturating_sub(pre.total()?);
    if total == 0 {
        return Some(0.0);
    }
    let busy = next.busy()?.saturating_sub(pre.busy()?);
    Some((busy as f64 * 100.0 / total as f64).clamp(0.0, 100.0))
}

/// `(total, available)` in bytes; `None` if a sum or the kB conversion
/// overflows.
fn memory_bytes(info: &MemInfo, reclaims_cache: bool) -> Option<(u64, u64)> {
    let mut available_kb = info.mem_free;
    if reclaims_cache {
        available_kb = available_kb
            .checked_add(info.buffers)?
            .checked_add(info.cache_kb()?)?;
    }
    Some((
        info.mem_total.checked_mul(1024)?,
        available_kb.checked_mul(1024)?,
    ))
}

impl<F: FileSystem, C: Clock> ResourceSampler for HostSampler<'_, F, C> {
    fn cpu_usage(&self, options: &CpuOptions, _core_count: NonZeroU32) -> Result<f64, SampleError> {
        let index = options.core_index.unwrap_or(0);

        let pre = self.read_stat()?;
        // Reject a bad index before spending the sampling window.
        Self::select(&pre, options.per_core, index)?;
        self.ctx.clock.sleep(self.ctx.window);
        let next = self.read_stat()?;

        let percent = busy_percent(
            Self::select(&pre, options.per_core, index)?,
            Self::select(&next, options.per_core, index)?,
        )
        .ok_or_else(|| {
            SampleError::stat_parse(
                self.ctx.proc_path.join("stat"),
                ParseError::new("tick counters overflow"),
            )
        })?;
        debug!(
            "host cpu usage {:.2}% (per_core={}, index={})",
            percent, options.per_core, index
        );
        Ok(percent)
    }

    fn memory_usage(&self, options: &MemoryOptions) -> Result<MemoryUsage, SampleError> {
        let path = self.ctx.proc_path.join("meminfo");
        let content = self.ctx.read_stat(&path)?;
        let info = parse_meminfo(&content).map_err(|e| SampleError::stat_parse(&path, e))?;

        debug!(
            "host memory total={}kB free={}kB buffers={}kB cached={}kB sreclaimable={}kB",
            info.mem_total, info.mem_free, info.buffers, info.cached, info.s_reclaimable
        );
        let (total, available) = memory_bytes(&info, options.reclaims_cache()).ok_or_else(|| {
            SampleError::stat_parse(&path, ParseError::new("meminfo values overflow"))
        })?;

        Ok(MemoryUsage {
            total,
            available: available.min(total),
        })
    }
}
