//! Persistence layer for the session collection.
//!
//! # Overview
//!
//! The whole collection lives in one JSON document at a fixed file under
//! the archive directory:
//!
//! ```text
//! {archive_dir}/
//! └── sessions.json    # Every session, with full message history
//! ```
//!
//! # Design Principles
//!
//! - **Atomic writes**: write to a temp file, then rename
//! - **Eager writes**: every store mutation saves the full collection;
//!   there is no debouncing, so a delete can never be lost to a later write
//! - **Forgiving reads**: an absent or corrupt file is "no prior history",
//!   logged and swallowed, never surfaced to the user

pub mod archive;

pub use archive::{ArchiveError, SessionArchive, ARCHIVE_FILE};
