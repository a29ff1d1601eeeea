//! Session collection file persistence.

use std::fs;
use std::path::PathBuf;

use crate::session::ChatSession;

/// File name the collection is stored under, inside the archive directory.
pub const ARCHIVE_FILE: &str = "sessions.json";

/// Error type for archive operations.
#[derive(Debug)]
pub enum ArchiveError {
    /// IO error (permission denied, disk full, etc.)
    Io(std::io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io(e) => write!(f, "IO error: {e}"),
            ArchiveError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Io(e)
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Json(e)
    }
}

/// Reads and writes the full session collection at a fixed location.
///
/// The archive never owns sessions; it only serializes and rehydrates
/// what the store holds.
pub struct SessionArchive {
    dir: PathBuf,
}

impl SessionArchive {
    /// An archive rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the collection file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(ARCHIVE_FILE)
    }

    /// Load the stored collection.
    ///
    /// An absent or unparsable file is treated as "no prior history": the
    /// parse failure is logged and swallowed. Sessions come back sorted
    /// newest first, with timestamps reconstructed from their serialized
    /// form. A streaming flag left behind by an interrupted run is cleared
    /// on the way in: an in-flight reply cannot survive a restart, and the
    /// partial content it accumulated is kept as a finalized message.
    pub fn load(&self) -> Vec<ChatSession> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(err) => {
                log::warn!("discarding unreadable session archive: {err}");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<ChatSession>, ArchiveError> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        let mut sessions: Vec<ChatSession> = serde_json::from_str(&contents)?;

        for session in &mut sessions {
            for message in &mut session.messages {
                if message.is_streaming {
                    log::debug!(
                        "finalizing stale in-flight message {} from a previous run",
                        message.id
                    );
                    message.is_streaming = false;
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Write the full collection.
    ///
    /// # Atomic Write Strategy
    ///
    /// 1. Write to `sessions.json.tmp`
    /// 2. Rename to `sessions.json`
    ///
    /// This prevents data corruption if the write is interrupted.
    pub fn save(&self, sessions: &[ChatSession]) -> Result<(), ArchiveError> {
        fs::create_dir_all(&self.dir)?;

        let file_path = self.path();
        let temp_path = self.dir.join(format!("{ARCHIVE_FILE}.tmp"));

        let json = serde_json::to_string_pretty(sessions)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
