//! Legacy vs unified cgroup hierarchy detection.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::procfs::parser::parse_cgroup2_mounts;
use crate::collector::traits::FileSystem;

/// Cgroup layout exposed by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyMode {
    /// Legacy: one tree per controller. Hybrid setups count as legacy.
    V1,
    /// Unified: a single tree for every controller.
    V2,
}

/// Determines which hierarchy is mounted at a cgroup root.
pub struct HierarchyDetector<'a, F: FileSystem> {
    fs: &'a F,
    proc_path: &'a Path,
}

impl<'a, F: FileSystem> HierarchyDetector<'a, F> {
    pub fn new(fs: &'a F, proc_path: &'a Path) -> Self {
        Self { fs, proc_path }
    }

    /// Never fails: anything that is not recognizably unified is legacy.
    pub fn detect(&self, root: &Path) -> HierarchyMode {
        let unified =
            self.fs.exists(&root.join("cgroup.controllers")) || self.mounted_as_cgroup2(root);
        let mode = if unified {
            HierarchyMode::V2
        } else {
            HierarchyMode::V1
        };
        debug!("cgroup hierarchy at {}: {:?}", root.display(), mode);
        mode
    }

    fn mounted_as_cgroup2(&self, root: &Path) -> bool {
        let mounts_path = self.proc_path.join("self").join("mounts");
        let Ok(content) = self.fs.read_to_string(&mounts_path) else {
            return false;
        };
        let root = normalize(root);
        parse_cgroup2_mounts(&content)
            .iter()
            .any(|mount_point| normalize(Path::new(mount_point)) == root)
    }
}

/// Drops trailing separators so "/sys/fs/cgroup/" matches "/sys/fs/cgroup".
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    fn detect(fs: &MockFs, root: &str) -> HierarchyMode {
        HierarchyDetector::new(fs, Path::new("/proc")).detect(Path::new(root))
    }

    #[test]
    fn test_detect_unified_by_controllers_file() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/fs/cgroup/cgroup.controllers", "cpuset cpu io memory pids\n");
        assert_eq!(detect(&fs, "/sys/fs/cgroup/"), HierarchyMode::V2);
    }

    #[test]
    fn test_detect_unified_by_mounts() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/self/mounts",
            "cgroup2 /sys/fs/cgroup cgroup2 rw,nosuid,nodev,noexec,relatime 0 0\n",
        );
        assert_eq!(detect(&fs, "/sys/fs/cgroup/"), HierarchyMode::V2);
    }

    #[test]
    fn test_detect_hybrid_is_legacy() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/self/mounts",
            "tmpfs /sys/fs/cgroup tmpfs ro 0 0\ncgroup2 /sys/fs/cgroup/unified cgroup2 rw 0 0\n",
        );
        fs.add_file("/sys/fs/cgroup/unified/cgroup.controllers", "");
        assert_eq!(detect(&fs, "/sys/fs/cgroup/"), HierarchyMode::V1);
    }

    #[test]
    fn test_detect_defaults_to_legacy() {
        let fs = MockFs::new();
        assert_eq!(detect(&fs, "/sys/fs/cgroup/"), HierarchyMode::V1);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/fs/cgroup/cgroup.controllers", "memory\n");
        let detector = HierarchyDetector::new(&fs, Path::new("/proc"));
        let first = detector.detect(Path::new("/sys/fs/cgroup"));
        let second = detector.detect(Path::new("/sys/fs/cgroup"));
        assert_eq!(first, second);
    }
}
