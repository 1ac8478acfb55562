//! Typed usage query and its results.

use std::num::NonZeroU32;
use std::path::PathBuf;

use serde::Serialize;

use crate::collector::SampleError;

/// Default mount point of the cgroup filesystem.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup/";

/// Which resource a query measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
}

/// CPU measurement options. Only the host sampler looks at them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuOptions {
    pub per_core: bool,
    /// Core to report when `per_core` is set; defaults to 0.
    pub core_index: Option<usize>,
}

/// How the memory being burned is accounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    #[default]
    Ram,
    Cache,
}

impl From<&str> for MemoryMode {
    fn from(s: &str) -> Self {
        if s == "ram" {
            MemoryMode::Ram
        } else {
            MemoryMode::Cache
        }
    }
}

/// Memory measurement options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryOptions {
    pub mode: MemoryMode,
    /// Keep buffer/page-cache bytes out of `available` ("truly free" accounting).
    pub include_buffer_cache: bool,
}

impl MemoryOptions {
    /// Whether reclaimable cache bytes count as available.
    pub fn reclaims_cache(&self) -> bool {
        self.mode == MemoryMode::Ram && !self.include_buffer_cache
    }
}

/// A single point-in-time measurement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageQuery {
    /// Process whose cgroup is measured; `None` measures the whole host.
    pub target: Option<u32>,
    pub metric: Metric,
    pub cgroup_root: PathBuf,
    pub cpu: CpuOptions,
    pub memory: MemoryOptions,
    /// Divisor for cgroup CPU percentages.
    pub core_count: NonZeroU32,
}

impl UsageQuery {
    /// Host-wide query.
    pub fn host(metric: Metric) -> Self {
        Self {
            target: None,
            metric,
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            cpu: CpuOptions::default(),
            memory: MemoryOptions::default(),
            core_count: default_core_count(),
        }
    }

    /// Query scoped to the cgroup of `pid`.
    pub fn for_process(pid: u32, metric: Metric) -> Self {
        Self {
            target: Some(pid),
            ..Self::host(metric)
        }
    }

    /// Sets the target from its textual form.
    pub fn with_target_str(mut self, pid: &str) -> Result<Self, SampleError> {
        self.target = Some(parse_pid(pid)?);
        Ok(self)
    }

    /// Overrides the cgroup root; an empty path keeps the default.
    pub fn with_cgroup_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if !root.as_os_str().is_empty() {
            self.cgroup_root = root;
        }
        self
    }

    pub fn with_cpu_options(mut self, cpu: CpuOptions) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn with_memory_options(mut self, memory: MemoryOptions) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_core_count(mut self, core_count: NonZeroU32) -> Self {
        self.core_count = core_count;
        self
    }

    /// Sets the core count from its textual form; zero is rejected.
    pub fn with_core_count_str(self, count: &str) -> Result<Self, SampleError> {
        let parsed = count
            .trim()
            .parse::<NonZeroU32>()
            .map_err(|_| SampleError::InvalidCoreCount(count.to_string()))?;
        Ok(self.with_core_count(parsed))
    }
}

/// Parses a process id.
pub fn parse_pid(pid: &str) -> Result<u32, SampleError> {
    pid.trim()
        .parse()
        .map_err(|_| SampleError::InvalidTarget(pid.to_string()))
}

/// Number of CPUs the current process may run on, at least 1.
pub fn default_core_count() -> NonZeroU32 {
    std::thread::available_parallelism()
        .ok()
        .and_then(|n| NonZeroU32::new(u32::try_from(n.get()).unwrap_or(u32::MAX)))
        .unwrap_or(NonZeroU32::MIN)
}

/// Memory totals in bytes. Always `available <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub available: u64,
}

/// Result of a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "metric", rename_all = "lowercase")]
pub enum Usage {
    Cpu { percent: f64 },
    Memory(MemoryUsage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_query_defaults() {
        let q = UsageQuery::host(Metric::Cpu);
        assert_eq!(q.target, None);
        assert_eq!(q.cgroup_root, PathBuf::from("/sys/fs/cgroup/"));
        assert!(!q.cpu.per_core);
        assert_eq!(q.memory.mode, MemoryMode::Ram);
        assert!(q.core_count.get() >= 1);
    }

    #[test]
    fn test_with_target_str() {
        let q = UsageQuery::host(Metric::Memory).with_target_str("4321").unwrap();
        assert_eq!(q.target, Some(4321));

        let err = UsageQuery::host(Metric::Memory)
            .with_target_str("nginx")
            .unwrap_err();
        assert!(matches!(err, SampleError::InvalidTarget(ref s) if s == "nginx"));
        assert!(parse_pid("-1").is_err());
    }

    #[test]
    fn test_empty_cgroup_root_keeps_default() {
        let q = UsageQuery::for_process(1, Metric::Cpu).with_cgroup_root("");
        assert_eq!(q.cgroup_root, PathBuf::from(DEFAULT_CGROUP_ROOT));

        let q = q.with_cgroup_root("/host/sys/fs/cgroup");
        assert_eq!(q.cgroup_root, PathBuf::from("/host/sys/fs/cgroup"));
    }

    #[test]
    fn test_core_count_str_rejects_zero() {
        let q = UsageQuery::host(Metric::Cpu).with_core_count_str("4").unwrap();
        assert_eq!(q.core_count.get(), 4);
        assert!(matches!(
            UsageQuery::host(Metric::Cpu).with_core_count_str("0"),
            Err(SampleError::InvalidCoreCount(_))
        ));
    }

    #[test]
    fn test_memory_mode_and_reclaim_policy() {
        assert_eq!(MemoryMode::from("ram"), MemoryMode::Ram);
        assert_eq!(MemoryMode::from("cache"), MemoryMode::Cache);
        assert_eq!(MemoryMode::from("anything"), MemoryMode::Cache);
        assert_eq!(MemoryMode::from("RAM"), MemoryMode::Cache);

        let ram = MemoryOptions {
            mode: MemoryMode::Ram,
            include_buffer_cache: false,
        };
        assert!(ram.reclaims_cache());
        assert!(
            !MemoryOptions {
                include_buffer_cache: true,
                ..ram
            }
            .reclaims_cache()
        );
        assert!(
            !MemoryOptions {
                mode: MemoryMode::Cache,
                ..ram
            }
            .reclaims_cache()
        );
    }

    #[test]
    fn test_usage_serializes_with_metric_tag() {
        let cpu = serde_json::to_value(Usage::Cpu { percent: 12.5 }).unwrap();
        assert_eq!(cpu["metric"], "cpu");
        assert_eq!(cpu["percent"], 12.5);

        let mem = serde_json::to_value(Usage::Memory(MemoryUsage {
            total: 10,
            available: 4,
        }))
        .unwrap();
        assert_eq!(mem["metric"], "memory");
        assert_eq!(mem["total"], 10);
        assert_eq!(mem["available"], 4);
    }
}
