//! Failure kinds for a single usage query.

use std::io;
use std::path::PathBuf;

use super::procfs::parser::ParseError;

/// Error type for sampling failures.
///
/// Every variant is terminal for the query that produced it.
#[derive(Debug)]
pub enum SampleError {
    /// The target process identifier is not a valid integer.
    InvalidTarget(String),
    /// The configured core count is zero or not a number.
    InvalidCoreCount(String),
    /// The control group of the target process could not be located.
    HierarchyLoad { pid: u32, reason: String },
    /// A counter file could not be read or parsed.
    StatRead { path: PathBuf, source: io::Error },
    /// The memory limit is at or above the "no limit" sentinel.
    InvalidLimit { limit: u64 },
    /// A per-core index past the cores the host reports.
    IndexOutOfRange { index: usize, cores: usize },
}

impl SampleError {
    pub(crate) fn hierarchy(pid: u32, reason: impl Into<String>) -> Self {
        SampleError::HierarchyLoad {
            pid,
            reason: reason.into(),
        }
    }

    pub(crate) fn stat_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SampleError::StatRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn stat_parse(path: impl Into<PathBuf>, err: ParseError) -> Self {
        Self::stat_read(path, io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::InvalidTarget(pid) => write!(f, "invalid target pid '{}'", pid),
            SampleError::InvalidCoreCount(count) => write!(f, "invalid core count '{}'", count),
            SampleError::HierarchyLoad { pid, reason } => {
                write!(f, "load cgroup of pid {} failed: {}", pid, reason)
            }
            SampleError::StatRead { path, source } => {
                write!(f, "read {} failed: {}", path.display(), source)
            }
            SampleError::InvalidLimit { limit } => {
                write!(f, "cgroup memory limit {} is unset or invalid", limit)
            }
            SampleError::IndexOutOfRange { index, cores } => {
                write!(f, "illegal cpu index {} (host reports {} cores)", index, cores)
            }
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::StatRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_stat_parse_keeps_source() {
        let err = SampleError::stat_parse(
            "/sys/fs/cgroup/cpu.stat",
            ParseError::new("no usage_usec"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/sys/fs/cgroup/cpu.stat"));
        assert!(err.to_string().contains("no usage_usec"));
    }

    #[test]
    fn test_display_index_out_of_range() {
        let err = SampleError::IndexOutOfRange { index: 8, cores: 4 };
        assert_eq!(err.to_string(), "illegal cpu index 8 (host reports 4 cores)");
        assert!(err.source().is_none());
    }
}
