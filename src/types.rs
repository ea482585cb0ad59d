//! Core data types shared across the WaveScope pipeline
//!
//! This module defines the event model produced by the connection layer and
//! consumed by the streaming pipeline.
//!
//! # Main Types
//!
//! - [`Direction`] - Which side of the serial link produced a byte batch
//! - [`EventId`] - Opaque, monotonically assigned event identifier
//! - [`LogEvent`] - One directional, timestamped batch of bytes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the serial link produced an event.
///
/// Transmitted traffic renders on the lower waveform lane, received traffic
/// on the upper lane; the two lanes share one numeric axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Outbound bytes, written to the port
    Tx,
    /// Inbound bytes, read from the port
    Rx,
}

impl Direction {
    /// Base level of this direction's waveform lane.
    ///
    /// Lane levels occupy `[base, base + 1.0]` with the idle level at
    /// `base + 0.5`, so TX at 0.0 and RX at 2.0 never overlap.
    pub fn lane_base(&self) -> f64 {
        match self {
            Direction::Tx => 0.0,
            Direction::Rx => 2.0,
        }
    }

    /// The other direction
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Tx => Direction::Rx,
            Direction::Rx => Direction::Tx,
        }
    }

    /// Short display name for UI labels
    pub fn display_name(&self) -> &'static str {
        match self {
            Direction::Tx => "TX",
            Direction::Rx => "RX",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Opaque identifier of a [`LogEvent`].
///
/// Assigned by the session log in strictly increasing order of arrival and
/// never reused, including across `clear()`. Comparing two ids orders the
/// events they name by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One directional, timestamped batch of bytes from the connection layer.
///
/// Immutable once created. Owned by the session log, which may drop it from
/// the front of its buffer when capacity is exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Identifier assigned by the session log
    pub id: EventId,
    /// Which side of the link produced the bytes
    pub direction: Direction,
    /// Wall-clock arrival time
    pub timestamp: DateTime<Utc>,
    /// The raw bytes, in wire order
    pub payload: Vec<u8>,
}

impl LogEvent {
    /// Create a new event stamped with the current time
    pub fn new(id: EventId, direction: Direction, payload: Vec<u8>) -> Self {
        Self {
            id,
            direction,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Override the timestamp (used when replaying a saved transcript)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Number of payload bytes
    pub fn byte_count(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
