//! Resource usage samplers for Linux.
//!
//! This module measures CPU and memory usage of the whole host or of one
//! process's control group, with support for mocking for testing on macOS.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UsageProbe                           │
//! │                  select(query) -> Sampler                    │
//! │   ┌──────────────┐  ┌──────────────────┐  ┌───────────────┐  │
//! │   │ HostSampler  │  │ CgroupV1Sampler  │  │CgroupV2Sampler│  │
//! │   │ /proc/stat   │  │ cpuacct.usage    │  │ cpu.stat      │  │
//! │   │ /proc/meminfo│  │ memory.*_in_bytes│  │ memory.max    │  │
//! │   └──────┬───────┘  └────────┬─────────┘  └───────┬───────┘  │
//! │          └───────────────────┼────────────────────┘          │
//! │                    ┌─────────▼─────────┐                     │
//! │                    │ FileSystem, Clock │ (traits)            │
//! │                    └─────────┬─────────┘                     │
//! └──────────────────────────────┼───────────────────────────────┘
//!                  ┌─────────────┼──────────────┐
//!           ┌──────▼──────┐ ┌────▼────┐ ┌───────▼──────┐
//!           │ RealFs      │ │ MockFs  │ │ ManualClock  │
//!           │ SystemClock │ │         │ │ (no sleeping)│
//!           └─────────────┘ └─────────┘ └──────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use burnmeter_core::collector::{RealFs, UsageProbe};
//! use burnmeter_core::query::{Metric, UsageQuery};
//!
//! let probe = UsageProbe::new(RealFs::new());
//! let usage = probe.sample(&UsageQuery::for_process(1234, Metric::Cpu))?;
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use burnmeter_core::collector::{ManualClock, MockFs, UsageProbe};
//! use burnmeter_core::query::{Metric, Usage, UsageQuery};
//!
//! let probe = UsageProbe::new(MockFs::typical_host()).with_clock(ManualClock::new());
//! let usage = probe.sample(&UsageQuery::host(Metric::Cpu)).unwrap();
//! assert_eq!(usage, Usage::Cpu { percent: 25.0 });
//! ```

pub mod cgroup;
mod error;
pub mod mock;
mod probe;
pub mod procfs;
pub mod sampler;
pub mod traits;

pub use cgroup::{HierarchyMode, PAGE_COUNTER_MAX};
pub use error::SampleError;
pub use mock::MockFs;
pub use probe::{SampleSource, Sampler, UsageProbe};
pub use sampler::{CpuSample, ResourceSampler};
pub use traits::{Clock, FileSystem, ManualClock, RealFs, SystemClock};
