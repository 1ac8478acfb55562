//! burnmeter-core — point-in-time CPU and memory usage sampling.
//!
//! Provides:
//! - `collector` — host and cgroup (v1/v2) samplers, hierarchy detection,
//!   the query dispatcher, and filesystem/clock abstractions
//! - `query` — typed usage queries and their results
//! - `fmt` — formatting helpers for reporting results

pub mod collector;
pub mod fmt;
pub mod query;
