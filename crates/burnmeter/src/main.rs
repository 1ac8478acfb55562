//! burnmeter - point-in-time CPU and memory usage of the host or of a
//! process's cgroup.
//!
//! Prints the measurement a stress experiment would plan against, either as
//! text or as a single JSON object.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

use burnmeter_core::collector::{RealFs, SampleError, SampleSource, UsageProbe};
use burnmeter_core::fmt::{FmtStyle, format_usage};
use burnmeter_core::query::{
    CpuOptions, DEFAULT_CGROUP_ROOT, MemoryMode, MemoryOptions, Metric, Usage, UsageQuery,
    default_core_count,
};

/// Resource usage sampler.
#[derive(Parser)]
#[command(name = "burnmeter", about = "Host and cgroup resource usage sampler", version)]
struct Args {
    /// Target process id. Without it the whole host is measured.
    #[arg(short, long, env = "BURNMETER_PID")]
    pid: Option<String>,

    /// Path to cgroup filesystem.
    #[arg(long, env = "BURNMETER_CGROUP_ROOT", default_value = DEFAULT_CGROUP_ROOT)]
    cgroup_root: String,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Number of cores the cgroup CPU percentage is divided by.
    /// Defaults to the cores this process may run on.
    #[arg(long)]
    core_count: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    metric: MetricArgs,
}

#[derive(Subcommand)]
enum MetricArgs {
    /// CPU utilization over a one-second window.
    Cpu {
        /// Report a single core instead of the aggregate (host only).
        #[arg(long)]
        per_core: bool,

        /// Core to report with --per-core.
        #[arg(long, requires = "per_core")]
        core_index: Option<usize>,
    },
    /// Memory total and availability.
    Mem {
        /// Burn mode the availability is computed for.
        #[arg(long, value_enum, default_value_t = ModeArg::Ram)]
        mode: ModeArg,

        /// Keep buffer/page cache out of the available amount.
        #[arg(long)]
        include_buffer_cache: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Ram,
    Cache,
}

impl From<ModeArg> for MemoryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ram => MemoryMode::Ram,
            ModeArg::Cache => MemoryMode::Cache,
        }
    }
}

/// JSON output line.
#[derive(Serialize)]
struct Report {
    timestamp: String,
    source: SampleSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u32>,
    #[serde(flatten)]
    usage: Usage,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is WARN so stdout stays machine-readable; stderr carries logs.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for crate_name in ["burnmeter", "burnmeter_core"] {
        if let Ok(directive) = format!("{}={}", crate_name, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the query from command-line arguments.
fn build_query(args: &Args) -> Result<UsageQuery, SampleError> {
    let metric = match args.metric {
        MetricArgs::Cpu { .. } => Metric::Cpu,
        MetricArgs::Mem { .. } => Metric::Memory,
    };

    let mut query = UsageQuery::host(metric).with_cgroup_root(&args.cgroup_root);
    if let Some(pid) = &args.pid {
        query = query.with_target_str(pid)?;
    }

    query = match &args.core_count {
        Some(count) => query.with_core_count_str(count)?,
        None => query.with_core_count(default_core_count()),
    };

    query = match args.metric {
        MetricArgs::Cpu {
            per_core,
            core_index,
        } => query.with_cpu_options(CpuOptions {
            per_core,
            core_index,
        }),
        MetricArgs::Mem {
            mode,
            include_buffer_cache,
        } => query.with_memory_options(MemoryOptions {
            mode: mode.into(),
            include_buffer_cache,
        }),
    };

    Ok(query)
}

fn run(args: &Args) -> Result<(), SampleError> {
    let query = build_query(args)?;
    let probe = UsageProbe::new(RealFs::new()).with_proc_path(&args.proc_path);

    let sampler = probe.select(&query);
    let source = sampler.source();
    debug!(
        "query: metric={:?}, pid={:?}, source={:?}, core_count={}",
        query.metric,
        query.target,
        source,
        query.core_count
    );

    let usage = sampler.measure(&query)?;
    info!("measured {:?} via {:?}", usage, source);

    if args.json {
        let report = Report {
            timestamp: Utc::now().to_rfc3339(),
            source,
            pid: query.target,
            usage,
        };
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("failed to encode report: {}", e),
        }
    } else {
        println!("{}", format_usage(&usage, FmtStyle::Detail));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("burnmeter: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_host_cpu() {
        let args = Args::parse_from(["burnmeter", "cpu", "--per-core", "--core-index", "2"]);
        let query = build_query(&args).unwrap();
        assert_eq!(query.target, None);
        assert_eq!(query.metric, Metric::Cpu);
        assert_eq!(
            query.cpu,
            CpuOptions {
                per_core: true,
                core_index: Some(2)
            }
        );
    }

    #[test]
    fn test_build_query_cgroup_memory() {
        let args = Args::parse_from([
            "burnmeter",
            "--pid",
            "5449",
            "--cgroup-root",
            "/host/sys/fs/cgroup",
            "--core-count",
            "4",
            "mem",
            "--mode",
            "cache",
            "--include-buffer-cache",
        ]);
        let query = build_query(&args).unwrap();
        assert_eq!(query.target, Some(5449));
        assert_eq!(query.metric, Metric::Memory);
        assert_eq!(query.core_count.get(), 4);
        assert_eq!(query.cgroup_root.to_str(), Some("/host/sys/fs/cgroup"));
        assert_eq!(query.memory.mode, MemoryMode::Cache);
        assert!(query.memory.include_buffer_cache);
    }

    #[test]
    fn test_build_query_rejects_bad_pid() {
        let args = Args::parse_from(["burnmeter", "--pid", "nginx", "mem"]);
        assert!(matches!(
            build_query(&args),
            Err(SampleError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_build_query_rejects_zero_cores() {
        let args = Args::parse_from(["burnmeter", "--core-count", "0", "cpu"]);
        assert!(matches!(
            build_query(&args),
            Err(SampleError::InvalidCoreCount(_))
        ));
    }

    #[test]
    fn test_core_index_requires_per_core() {
        assert!(Args::try_parse_from(["burnmeter", "cpu", "--core-index", "1"]).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            source: SampleSource::CgroupV2,
            pid: Some(7),
            usage: Usage::Cpu { percent: 10.0 },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["source"], "cgroup-v2");
        assert_eq!(value["pid"], 7);
        assert_eq!(value["metric"], "cpu");
        assert_eq!(value["percent"], 10.0);
    }
}
