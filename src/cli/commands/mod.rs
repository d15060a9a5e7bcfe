//! CLI command implementations.
//!
//! Each submodule exposes an `Args` struct and a `run` function.

pub mod capture;
pub mod completions;
pub mod config;
pub mod list;
pub mod observe;
pub mod schema;
pub mod search;
pub mod show;
pub mod stats;
pub mod suggest;
pub mod tags;
pub mod validate;
