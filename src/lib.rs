//! # bouheki-setup
//!
//! **Installs the bouheki network-policy agent on a Linux runner.**
//!
//! bouheki-setup turns a comma-separated list of allowed endpoints into a
//! bouheki policy document, installs the agent binary and its systemd unit,
//! and starts or stops the service.
//!
//! ## Architecture
//!
//! - **[`policy`]**: endpoint classification and policy document synthesis
//! - **[`config`]**: installer settings (paths, release, default domains)
//! - **[`install`]**: release download and binary installation
//! - **[`service`]**: systemd unit rendering and service control
//! - **[`exec`]**: privileged command execution (`sudo`)
//! - **[`output`]**: writing the rendered policy to disk
//! - **[`runner`]**: orchestration of a single run
//! - **[`cli`]**: command-line interface (clap) and failure reporting
//! - **[`error`]**: unified error types using `thiserror`
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview the policy
//! bouheki-setup --allowed-endpoints "10.0.0.0/8,example.com" render
//!
//! # Install and start the agent
//! bouheki-setup --allowed-endpoints "10.0.0.0/8,example.com" --mode block --target host
//!
//! # Stop it again
//! bouheki-setup stop
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod install;
pub mod output;
pub mod policy;
pub mod runner;
pub mod service;
