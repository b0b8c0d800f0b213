//! Playlist deduplication library - shared modules for the CLI.

pub mod dedup;
pub mod io;
pub mod models;
pub mod progress;
pub mod safety;
