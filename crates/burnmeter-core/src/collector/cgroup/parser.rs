//! Parsers for cgroup v1 and v2 counter files.

use crate::collector::procfs::parser::ParseError;

/// Parses a file holding a single integer, such as `memory.current`,
/// `memory.usage_in_bytes` or `cpuacct.usage`.
pub fn parse_u64(content: &str) -> Result<u64, ParseError> {
    let trimmed = content.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::new(format!("expected integer, got '{}'", trimmed)))
}

/// Parses a limit file (`memory.max`, `memory.limit_in_bytes`).
/// Format: number or "max"; "max" maps to `u64::MAX`.
pub fn parse_limit(content: &str) -> Result<u64, ParseError> {
    let trimmed = content.trim();
    if trimmed == "max" {
        Ok(u64::MAX)
    } else {
        parse_u64(trimmed)
    }
}

/// Looks up one key in a flat-keyed file (`cpu.stat`, `memory.stat`).
/// Format: key value pairs, one per line.
pub fn parse_keyed(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        if parts.next()? != key {
            return None;
        }
        parts.next()?.parse().ok()
    })
}

/// Cumulative CPU time from a v2 `cpu.stat`, in microseconds.
///
/// Only `usage_usec` is accepted: both samples of a delta must come from
/// the same field.
pub fn parse_cpu_usage_usec(content: &str) -> Result<u64, ParseError> {
    parse_keyed(content, "usage_usec").ok_or_else(|| ParseError::new("cpu.stat has no usage_usec"))
}
