//! Infrastructure shared by every crate in the workspace: command line and
//! environment configuration, and logger initialization.

pub mod config;
pub mod logging;
