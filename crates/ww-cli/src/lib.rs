//! workwinder terminal front end.
//!
//! This crate wires a [`ww_core::Chronometer`] to a JSON store and a
//! line-oriented shell.

mod cli;
pub mod commands;
mod config;
mod render;
pub mod shell;

pub use cli::{Cli, Commands};
pub use config::Config;
