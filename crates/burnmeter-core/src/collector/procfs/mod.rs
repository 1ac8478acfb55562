//! Host-wide sampling from the Linux `/proc` filesystem.
//!
//! This module provides parsers for `/proc` files and the sampler that turns
//! them into host CPU and memory usage.

mod host;
pub mod parser;

pub use host::HostSampler;
