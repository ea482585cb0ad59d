//! Session log module
//!
//! This module owns the append-only event log of a terminal session: every
//! byte batch read from or written to the port lands here, in arrival order,
//! with a stable id. The log is the single source the streaming pipeline
//! observes.
//!
//! # Features
//!
//! - Ring-buffered storage with front truncation at capacity
//! - Monotonic event ids that survive truncation and `clear()`
//! - Observer registration with immediate catch-up on attach
//! - Transcript save/load/replay for captured sessions
//!
//! # Observer Contract
//!
//! Observers are invoked synchronously after every mutation (`record`,
//! `clear`, `replay`) on whatever thread owns the log. An observer that
//! returns [`ObserverStatus::Detached`] is pruned and never called again;
//! this is how a downstream consumer that has shut down unhooks itself
//! without needing a reference back to the log.

pub mod transcript;

pub use transcript::Transcript;

use crate::config::DEFAULT_LOG_CAPACITY;
use crate::error::Result;
use crate::types::{Direction, EventId, LogEvent};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Identifies an attached observer so it can be detached later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Whether an observer stays attached after a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStatus {
    /// Keep delivering notifications
    Active,
    /// Remove the observer; it will never be called again
    Detached,
}

/// Receives a notification each time the session log mutates.
///
/// The observer sees the log's full current content and must work out the
/// delta itself; see [`LogFollower`](crate::pipeline::LogFollower) for the
/// change-detection implementation the pipeline uses.
#[cfg_attr(test, automock)]
pub trait LogObserver: Send {
    /// Called after every log mutation with the current content
    fn on_change(&mut self, events: &VecDeque<LogEvent>) -> ObserverStatus;
}

/// Append-only, capacity-bounded log of one terminal session.
///
/// Events receive strictly increasing [`EventId`]s. When the buffer exceeds
/// its capacity the oldest events are dropped from the front; ids are never
/// reassigned, so an observer can always tell where it left off.
pub struct SessionLog {
    events: VecDeque<LogEvent>,
    capacity: usize,
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn LogObserver>)>,
    next_observer_id: u64,
    truncated_total: u64,
}

impl SessionLog {
    /// Create a log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create a log holding at most `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 0,
            observers: Vec::new(),
            next_observer_id: 0,
            truncated_total: 0,
        }
    }

    /// Append one directional byte batch stamped with the current time.
    ///
    /// Returns the id assigned to the new event. Observers are notified
    /// before this call returns.
    pub fn record(&mut self, direction: Direction, payload: impl Into<Vec<u8>>) -> EventId {
        let id = self.assign_id();
        self.push_event(LogEvent::new(id, direction, payload.into()));
        id
    }

    /// Append one event with an explicit timestamp (transcript replay)
    pub fn record_stamped(
        &mut self,
        direction: Direction,
        payload: Vec<u8>,
        timestamp: DateTime<Utc>,
    ) -> EventId {
        let id = self.assign_id();
        self.push_event(LogEvent::new(id, direction, payload).with_timestamp(timestamp));
        id
    }

    /// Drop all events. Ids keep counting up afterwards.
    pub fn clear(&mut self) {
        if self.events.is_empty() {
            return;
        }
        self.events.clear();
        tracing::debug!("session log cleared");
        self.notify();
    }

    /// Save the current content as a transcript at `path`
    pub fn save_transcript(&self, path: impl AsRef<Path>) -> Result<()> {
        Transcript::capture(self).save(path)
    }

    /// Replay a saved transcript through the normal `record` path.
    ///
    /// Returns the number of events replayed.
    pub fn replay(&mut self, transcript: &Transcript) -> usize {
        transcript.replay_into(self)
    }

    /// The current content, oldest first
    pub fn events(&self) -> &VecDeque<LogEvent> {
        &self.events
    }

    /// Number of events currently held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events held before front truncation
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id of the newest event, if any
    pub fn last_id(&self) -> Option<EventId> {
        self.events.back().map(|e| e.id)
    }

    /// Total events dropped by front truncation over the log's lifetime
    pub fn truncated_total(&self) -> u64 {
        self.truncated_total
    }

    /// Register an observer.
    ///
    /// The observer is caught up immediately: it receives one notification
    /// with the log's current content before `attach` returns, so a follower
    /// attached mid-session streams the existing history right away.
    pub fn attach(&mut self, mut observer: Box<dyn LogObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        match observer.on_change(&self.events) {
            ObserverStatus::Active => {
                tracing::debug!(%id, "log observer attached");
                self.observers.push((id, observer));
            }
            ObserverStatus::Detached => {
                tracing::debug!(%id, "log observer detached during attach");
            }
        }
        id
    }

    /// Remove an observer. Returns false if it was already gone.
    pub fn detach(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        before != self.observers.len()
    }

    /// Number of currently attached observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn assign_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_event(&mut self, event: LogEvent) {
        self.events.push_back(event);
        while self.events.len() > self.capacity {
            self.events.pop_front();
            self.truncated_total += 1;
        }
        self.notify();
    }

    fn notify(&mut self) {
        let events = &self.events;
        self.observers.retain_mut(|(id, observer)| {
            match observer.on_change(events) {
                ObserverStatus::Active => true,
                ObserverStatus::Detached => {
                    tracing::debug!(%id, "log observer detached");
                    false
                }
            }
        });
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
