//! Policy synthesis for bouheki.
//!
//! [`classify`] decides whether a single endpoint is a CIDR or a domain,
//! [`builder`] turns the whole comma-separated endpoint list into a
//! [`config::PolicyConfig`], and [`config`] is the serde model of the YAML
//! document bouheki reads.

pub mod builder;
pub mod classify;
pub mod config;

pub use builder::{validate, PolicyConfigBuilder, PolicyDefaults};
pub use classify::{classify, Classification};
pub use config::{Mode, PolicyConfig, Target};
