//! Transcript persistence for captured sessions
//!
//! A transcript is a point-in-time JSON snapshot of the session log. Loading
//! one back replays its events through the normal `record` path, so attached
//! observers see a replayed capture exactly like live traffic (with fresh
//! ids but the original timestamps).

use crate::error::{Result, ResultExt};
use crate::session::SessionLog;
use crate::types::LogEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Transcript format version for future migration support
pub const TRANSCRIPT_VERSION: u32 = 1;

fn default_version() -> u32 {
    TRANSCRIPT_VERSION
}

/// A saved capture of a session log's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// When the transcript was written
    pub saved_at: DateTime<Utc>,

    /// The captured events, oldest first
    pub events: Vec<LogEvent>,
}

impl Transcript {
    /// Snapshot the log's current content
    pub fn capture(log: &SessionLog) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            saved_at: Utc::now(),
            events: log.events().iter().cloned().collect(),
        }
    }

    /// Write the transcript as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create transcript at {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Read a transcript back from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open transcript at {}", path.display()))?;
        let transcript: Transcript = serde_json::from_reader(BufReader::new(file))?;
        Ok(transcript)
    }

    /// Feed the captured events back into a log.
    ///
    /// Events are re-recorded in order with fresh ids and their original
    /// timestamps; every attached observer is notified per event. Returns
    /// the number of events replayed.
    pub fn replay_into(&self, log: &mut SessionLog) -> usize {
        for event in &self.events {
            log.record_stamped(event.direction, event.payload.clone(), event.timestamp);
        }
        self.events.len()
    }

    /// Number of captured events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the transcript holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
