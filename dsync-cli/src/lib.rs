//! dsync CLI - Command-line interface for dsync.
//!
//! This crate provides the `dsync` binary: pulling and pushing a database
//! between a remote host and a local compose stack, and mirroring the
//! configured file trees.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
