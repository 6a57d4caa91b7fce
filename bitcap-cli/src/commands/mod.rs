//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Batch run over every configured folder.
pub mod run;

/// Local transcode of a sample file.
pub mod preflight;

/// Read-only bitrate probe of individual keys.
pub mod probe;
