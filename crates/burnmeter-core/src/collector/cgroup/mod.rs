//! Per-process cgroup samplers for the legacy (v1) and unified (v2) hierarchies.

mod detect;
pub mod parser;
mod v1;
mod v2;

pub use detect::{HierarchyDetector, HierarchyMode};
pub use v1::CgroupV1Sampler;
pub use v2::CgroupV2Sampler;

use std::path::{Path, PathBuf};

use crate::collector::error::SampleError;
use crate::collector::procfs::parser::{CgroupMembership, parse_pid_cgroup};
use crate::collector::sampler::SamplerContext;
use crate::collector::traits::{Clock, FileSystem};
use crate::query::{MemoryOptions, MemoryUsage};

/// Largest value of a kernel page counter: `LONG_MAX` rounded down to a
/// 4 KiB page. The kernel reports it when no memory limit is set.
pub const PAGE_COUNTER_MAX: u64 = 0x7FFF_FFFF_FFFF_F000;

/// Reads the cgroup membership lines of `pid`.
fn load_membership<F: FileSystem, C: Clock>(
    ctx: &SamplerContext<'_, F, C>,
    pid: u32,
) -> Result<Vec<CgroupMembership>, SampleError> {
    let path = ctx.proc_path.join(pid.to_string()).join("cgroup");
    let content = ctx
        .fs
        .read_to_string(&path)
        .map_err(|e| SampleError::hierarchy(pid, format!("read {}: {}", path.display(), e)))?;
    parse_pid_cgroup(&content).map_err(|e| SampleError::hierarchy(pid, e.to_string()))
}

/// Joins a group path from `/proc/[pid]/cgroup` under `base` and checks
/// that the directory is present.
fn group_dir<F: FileSystem, C: Clock>(
    ctx: &SamplerContext<'_, F, C>,
    pid: u32,
    base: &Path,
    group: &str,
) -> Result<PathBuf, SampleError> {
    let dir = base.join(group.trim_start_matches('/'));
    if !ctx.fs.exists(&dir) {
        return Err(SampleError::hierarchy(
            pid,
            format!("{} does not exist", dir.display()),
        ));
    }
    Ok(dir)
}

/// Turns raw cgroup memory counters into a total/available pair.
///
/// `cache` is added back to `available` when the options treat page cache
/// as reclaimable.
fn memory_from_counters(
    limit: u64,
    usage: u64,
    cache: u64,
    options: &MemoryOptions,
) -> Result<MemoryUsage, SampleError> {
    if limit >= PAGE_COUNTER_MAX {
        return Err(SampleError::InvalidLimit { limit });
    }

    let mut available = limit.saturating_sub(usage);
    if options.reclaims_cache() {
        available = available.saturating_add(cache);
    }

    Ok(MemoryUsage {
        total: limit,
        available: available.min(limit),
    })
}
