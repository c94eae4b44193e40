//! CLI module for vigil - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for listing games, playing a session
//! against a simulated participant, and browsing saved results.

pub mod commands;

pub use commands::Cli;
