//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub buffers: u64,
    pub cached: u64,
    pub s_reclaimable: u64,
}

impl MemInfo {
    /// Page cache as most tooling reports it: `Cached` plus reclaimable slab.
    /// `None` if the sum overflows.
    pub fn cache_kb(&self) -> Option<u64> {
        self.cached.checked_add(self.s_reclaimable)
    }
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
            seen_total = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line);
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line);
        } else if line.starts_with("SReclaimable:") {
            info.s_reclaimable = parse_kb(line);
        }
    }

    if !seen_total {
        return Err(ParseError::new("meminfo has no MemTotal line"));
    }

    Ok(info)
}

/// Single CPU line from `/proc/stat`, in clock ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// All accounted ticks; `None` on overflow. Guest time is already part
    /// of user/nice.
    pub fn total(&self) -> Option<u64> {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .try_fold(self.user, u64::checked_add)
    }

    /// Ticks spent doing work (neither idle nor waiting on I/O).
    pub fn busy(&self) -> Option<u64> {
        let waiting = self.idle.checked_add(self.iowait)?;
        self.total().map(|total| total.saturating_sub(waiting))
    }
}

/// CPU lines from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    /// Aggregate `cpu` line.
    pub total: CpuStat,
    /// `cpuN` lines in file order.
    pub per_cpu: Vec<CpuStat>,
}

/// Parses the CPU lines of `/proc/stat`.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();
    let mut seen_aggregate = false;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() || !parts[0].starts_with("cpu") {
            continue;
        }

        let aggregate = parts[0] == "cpu";
        if !aggregate
            && parts[0]
                .strip_prefix("cpu")
                .and_then(|s| s.parse::<u32>().ok())
                .is_none()
        {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        let cpu = CpuStat {
            user: get_val(1),
            nice: get_val(2),
            system: get_val(3),
            idle: get_val(4),
            iowait: get_val(5),
            irq: get_val(6),
            softirq: get_val(7),
            steal: get_val(8),
        };
        if cpu.total().is_none() {
            return Err(ParseError::new(format!("{} tick counters overflow", parts[0])));
        }

        if aggregate {
            stat.total = cpu;
            seen_aggregate = true;
        } else {
            stat.per_cpu.push(cpu);
        }
    }

    if !seen_aggregate {
        return Err(ParseError::new("stat has no aggregate cpu line"));
    }

    Ok(stat)
}

/// One line of `/proc/[pid]/cgroup`: `hierarchy-id:controllers:path`.
#[derive(Debug, Clone, PartialEq)]
pub struct CgroupMembership {
    pub hierarchy_id: u32,
    /// Comma-separated controller list split apart; empty for the v2 line.
    pub controllers: Vec<String>,
    pub path: String,
}

impl CgroupMembership {
    /// Whether this is the unified (`0::`) entry.
    pub fn is_unified(&self) -> bool {
        self.hierarchy_id == 0 && self.controllers.is_empty()
    }

    /// Whether this v1 entry carries the given controller.
    pub fn has_controller(&self, name: &str) -> bool {
        self.controllers.iter().any(|c| c == name)
    }
}

/// Parses `/proc/[pid]/cgroup`.
///
/// The path may itself contain `:`, so only the first two separators split.
pub fn parse_pid_cgroup(content: &str) -> Result<Vec<CgroupMembership>, ParseError> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(3, ':');
        let (Some(id), Some(controllers), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::new(format!("malformed cgroup line: {line}")));
        };

        let hierarchy_id = id
            .parse()
            .map_err(|_| ParseError::new(format!("bad hierarchy id: {id}")))?;

        let controllers = controllers
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        entries.push(CgroupMembership {
            hierarchy_id,
            controllers,
            path: path.to_string(),
        });
    }

    Ok(entries)
}

/// Returns mount points of every `cgroup2` filesystem listed in `/proc/[pid]/mounts`.
pub fn parse_cgroup2_mounts(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _source = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            (fs_type == "cgroup2").then(|| mount_point.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:         1000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Slab:             512000 kB
SReclaimable:     256000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, 8192000);
        assert_eq!(info.buffers, 512000);
        assert_eq!(info.cached, 2048000);
        assert_eq!(info.s_reclaimable, 256000);
        assert_eq!(info.cache_kb(), Some(2304000));
    }

    #[test]
    fn test_parse_meminfo_without_total() {
        assert!(parse_meminfo("MemFree: 10 kB\n").is_err());
    }

    #[test]
    fn test_parse_global_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
intr 12345 0 0
ctxt 500000
btime 1700000000
";
        let stat = parse_global_stat(content).unwrap();

        assert_eq!(stat.total.user, 10000);
        assert_eq!(stat.total.total(), Some(94800));
        assert_eq!(stat.per_cpu.len(), 2);
        assert_eq!(stat.per_cpu[0].idle, 20000);
    }

    #[test]
    fn test_parse_global_stat_rejects_overflowing_ticks() {
        let content = format!("cpu  {} {} 0 0\n", u64::MAX, u64::MAX);
        assert!(parse_global_stat(&content).is_err());
    }

    #[test]
    fn test_cpu_stat_busy_excludes_idle_and_iowait() {
        let cpu = CpuStat {
            user: 100,
            nice: 10,
            system: 50,
            idle: 800,
            iowait: 20,
            irq: 5,
            softirq: 5,
            steal: 10,
        };
        assert_eq!(cpu.total(), Some(1000));
        assert_eq!(cpu.busy(), Some(180));
    }

    #[test]
    fn test_parse_global_stat_without_aggregate() {
        assert!(parse_global_stat("cpu0 1 2 3 4\n").is_err());
    }

    #[test]
    fn test_parse_pid_cgroup_v1() {
        let content = "\
12:memory:/docker/abc
4:cpu,cpuacct:/docker/abc
1:name=systemd:/docker/abc
";
        let entries = parse_pid_cgroup(content).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].has_controller("memory"));
        assert!(entries[1].has_controller("cpuacct"));
        assert!(entries[1].has_controller("cpu"));
        assert!(!entries[1].has_controller("cpuset"));
        assert_eq!(entries[1].path, "/docker/abc");
        assert!(!entries[0].is_unified());
    }

    #[test]
    fn test_parse_pid_cgroup_v2_path_with_colon() {
        let entries = parse_pid_cgroup("0::/system.slice/weird:name.service\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_unified());
        assert_eq!(entries[0].path, "/system.slice/weird:name.service");
    }

    #[test]
    fn test_parse_pid_cgroup_malformed() {
        assert!(parse_pid_cgroup("garbage\n").is_err());
        assert!(parse_pid_cgroup("x:memory:/\n").is_err());
    }

    #[test]
    fn test_parse_cgroup2_mounts() {
        let content = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
tmpfs /sys/fs/cgroup tmpfs ro,nosuid,nodev,noexec,mode=755 0 0
cgroup2 /sys/fs/cgroup/unified cgroup2 rw,nosuid,nodev,noexec,relatime 0 0
cgroup /sys/fs/cgroup/memory cgroup rw,nosuid,nodev,noexec,relatime,memory 0 0
";
        assert_eq!(parse_cgroup2_mounts(content), vec!["/sys/fs/cgroup/unified"]);
    }
}
