//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys/fs/cgroup` states
//! for the host and cgroup samplers.

use super::filesystem::MockFs;

/// Memory counters shared by the cgroup scenarios: 512 MiB used, 100 MiB cache.
const GROUP_USAGE: &str = "536870912\n";
const GROUP_CACHE: u64 = 104_857_600;

impl MockFs {
    /// Creates a 4-core host whose `/proc/stat` moves between two reads.
    ///
    /// Between the samples the aggregate line gains 400 ticks of which 100
    /// are busy (25%); cpu0 gains 100 ticks of which 50 are busy (50%) and
    /// cpu1..cpu3 gain 100 ticks of which 16.67 are busy on average.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Slab:             512000 kB
SReclaimable:     256000 kB
",
        );
        fs.add_file_sequence(
            "/proc/stat",
            [
                "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
",
                "\
cpu  10080 500 3020 80300 1000 200 100 0 0 0
cpu0 2540 125 760 20050 250 50 25 0 0 0
cpu1 2513 125 754 20083 250 50 25 0 0 0
cpu2 2513 125 753 20084 250 50 25 0 0 0
cpu3 2514 125 753 20083 250 50 25 0 0 0
intr 1000400 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 501000
btime 1700000000
",
            ],
        );
        fs.add_file(
            "/proc/self/mounts",
            "cgroup2 /sys/fs/cgroup cgroup2 rw,nosuid,nodev,noexec,relatime 0 0\n",
        );

        fs
    }

    /// Creates a legacy-hierarchy host with `pid` in `/docker/abc`.
    ///
    /// `cpuacct_usage` holds successive `cpuacct.usage` values in nanoseconds.
    pub fn cgroup_v1_process(pid: u32, cpuacct_usage: &[&str], memory_limit: &str) -> Self {
        let mut fs = Self::new();

        fs.add_process_cgroup(
            "/proc",
            pid,
            "\
12:pids:/docker/abc
9:memory:/docker/abc
4:cpu,cpuacct:/docker/abc
1:name=systemd:/docker/abc
",
        );
        fs.add_file(
            "/proc/self/mounts",
            "\
tmpfs /sys/fs/cgroup tmpfs ro,nosuid,nodev,noexec,mode=755 0 0
cgroup /sys/fs/cgroup/memory cgroup rw,nosuid,nodev,noexec,relatime,memory 0 0
cgroup /sys/fs/cgroup/cpu,cpuacct cgroup rw,nosuid,nodev,noexec,relatime,cpu,cpuacct 0 0
",
        );

        let cpu_dir = "/sys/fs/cgroup/cpuacct/docker/abc";
        fs.add_file_sequence(
            format!("{cpu_dir}/cpuacct.usage"),
            cpuacct_usage.iter().map(|v| format!("{v}\n")),
        );

        let mem_dir = "/sys/fs/cgroup/memory/docker/abc";
        fs.add_file(format!("{mem_dir}/memory.limit_in_bytes"), format!("{memory_limit}\n"));
        fs.add_file(format!("{mem_dir}/memory.usage_in_bytes"), GROUP_USAGE);
        fs.add_file(
            format!("{mem_dir}/memory.stat"),
            format!(
                "cache {GROUP_CACHE}\nrss 431915008\nmapped_file 0\ntotal_cache {GROUP_CACHE}\n"
            ),
        );

        fs
    }

    /// Creates a unified-hierarchy host with `pid` in
    /// `/system.slice/docker-abc.scope`.
    ///
    /// `usage_usec` holds successive `cpu.stat` usage values in microseconds.
    pub fn cgroup_v2_process(pid: u32, usage_usec: &[&str], memory_max: &str) -> Self {
        let mut fs = Self::new();

        fs.add_process_cgroup("/proc", pid, "0::/system.slice/docker-abc.scope\n");
        fs.add_file(
            "/sys/fs/cgroup/cgroup.controllers",
            "cpuset cpu io memory hugetlb pids rdma\n",
        );

        let dir = "/sys/fs/cgroup/system.slice/docker-abc.scope";
        fs.add_file_sequence(
            format!("{dir}/cpu.stat"),
            usage_usec
                .iter()
                .map(|v| format!("usage_usec {v}\nuser_usec 0\nsystem_usec 0\nnr_throttled 0\n")),
        );
        fs.add_file(format!("{dir}/memory.max"), format!("{memory_max}\n"));
        fs.add_file(format!("{dir}/memory.current"), GROUP_USAGE);
        fs.add_file(
            format!("{dir}/memory.stat"),
            format!("anon 431915008\nfile {GROUP_CACHE}\nkernel 0\nshmem 0\n"),
        );

        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_host_stat_changes_between_reads() {
        let fs = MockFs::typical_host();
        let first = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        let second = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        assert_ne!(first, second);
        assert!(fs.exists(Path::new("/proc/meminfo")));
    }

    #[test]
    fn test_cgroup_v1_process_layout() {
        let fs = MockFs::cgroup_v1_process(7, &["1", "2"], "1073741824");
        assert!(fs.exists(Path::new("/proc/7/cgroup")));
        assert!(fs.exists(Path::new("/sys/fs/cgroup/cpuacct/docker/abc/cpuacct.usage")));
        assert!(fs.exists(Path::new("/sys/fs/cgroup/memory/docker/abc")));
        assert!(!fs.exists(Path::new("/sys/fs/cgroup/cgroup.controllers")));
    }

    #[test]
    fn test_cgroup_v2_process_layout() {
        let fs = MockFs::cgroup_v2_process(7, &["1"], "max");
        assert!(fs.exists(Path::new("/sys/fs/cgroup/cgroup.controllers")));
        let max = fs
            .read_to_string(Path::new("/sys/fs/cgroup/system.slice/docker-abc.scope/memory.max"))
            .unwrap();
        assert_eq!(max, "max\n");
    }
}
