//! Command-line interface
//!
//! Argument definitions and command handlers for the `cybersim` binary.

pub mod args;
pub mod commands;
pub mod render;
