//! Formatting helpers for printing usage results.

use crate::query::{MemoryUsage, Usage};

/// Controls compact vs verbose output.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FmtStyle {
    /// Compact: no spaces, short suffixes ("1.5G")
    Compact,
    /// Detail: spaces, full suffixes ("1.5 GiB")
    Detail,
}

/// Format byte count as human-readable size.
///
/// Compact: `"1.5G"`, `"100.3M"`, `"50.0K"`, `"512B"`
/// Detail:  `"1.5 GiB"`, `"100.3 MiB"`, `"50.0 KiB"`, `"512 B"`
pub fn format_bytes(bytes: u64, style: FmtStyle) -> String {
    let (g, m, k, b) = match style {
        FmtStyle::Compact => ("G", "M", "K", "B"),
        FmtStyle::Detail => (" GiB", " MiB", " KiB", " B"),
    };
    let f = bytes as f64;
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}{}", f / (1024.0 * 1024.0 * 1024.0), g)
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}{}", f / (1024.0 * 1024.0), m)
    } else if bytes >= 1024 {
        format!("{:.1}{}", f / 1024.0, k)
    } else {
        format!("{}{}", bytes, b)
    }
}

/// Format a CPU percentage with two decimals.
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// One-line summary of a memory result.
pub fn format_memory(usage: &MemoryUsage, style: FmtStyle) -> String {
    format!(
        "available {} of {}",
        format_bytes(usage.available, style),
        format_bytes(usage.total, style)
    )
}

/// One-line summary of any usage result.
pub fn format_usage(usage: &Usage, style: FmtStyle) -> String {
    match usage {
        Usage::Cpu { percent } => format!("cpu {}", format_percent(*percent)),
        Usage::Memory(memory) => format!("memory {}", format_memory(memory, style)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512, FmtStyle::Compact), "512B");
        assert_eq!(format_bytes(512, FmtStyle::Detail), "512 B");
        assert_eq!(format_bytes(1536, FmtStyle::Compact), "1.5K");
        assert_eq!(format_bytes(104_857_600, FmtStyle::Detail), "100.0 MiB");
        assert_eq!(format_bytes(1_073_741_824, FmtStyle::Compact), "1.0G");
    }

    #[test]
    fn test_format_usage() {
        assert_eq!(
            format_usage(&Usage::Cpu { percent: 10.0 }, FmtStyle::Compact),
            "cpu 10.00%"
        );
        let memory = Usage::Memory(MemoryUsage {
            total: 1_073_741_824,
            available: 641_728_512,
        });
        assert_eq!(
            format_usage(&memory, FmtStyle::Detail),
            "memory available 612.0 MiB of 1.0 GiB"
        );
    }
}
