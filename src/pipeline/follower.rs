//! Change detection between the session log and the scheduler
//!
//! The session log only says "something changed"; the follower turns that
//! into an exactly-once, in-order stream of [`StreamItem`]s. It tolerates
//! the log's two destructive behaviors:
//!
//! - **Front truncation**: when the last seen id has been dropped past the
//!   bounded lookback window, continuity is lost; the follower forwards only
//!   the newest event and logs the gap. This is a documented policy, not an
//!   error.
//! - **Clear**: an empty log after events were seen emits a [`StreamItem::
//!   Clear`] so downstream state resets; the clear marker travels in-band,
//!   keeping the stream strictly ordered around it.

use crate::session::{LogObserver, ObserverStatus};
use crate::types::{EventId, LogEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

/// Items flowing from the follower to the scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A log event not yet folded into the waveform
    Event(LogEvent),
    /// The source log was emptied; downstream waveform state must reset
    Clear,
}

/// Create the unbounded channel pair connecting a [`LogFollower`] (producer)
/// to a [`FrameScheduler`](crate::pipeline::FrameScheduler) (consumer).
///
/// The producer side is unbounded on purpose: backpressure is applied by the
/// scheduler's per-tick chunk budget, never by dropping events here.
pub fn stream_channel() -> (Sender<StreamItem>, Receiver<StreamItem>) {
    unbounded()
}

/// Follows the tail of a session log, emitting each new event exactly once.
///
/// Attach it to a log with
/// [`SessionLog::attach`](crate::session::SessionLog::attach); when the
/// receiving side of its channel is gone the follower reports itself
/// detached and the log prunes it.
pub struct LogFollower {
    last_seen: Option<EventId>,
    lookback: usize,
    tx: Sender<StreamItem>,
    gap_count: u64,
}

impl LogFollower {
    /// Create a follower scanning at most `lookback` entries for its last
    /// seen id on each notification
    pub fn new(lookback: usize, tx: Sender<StreamItem>) -> Self {
        Self {
            last_seen: None,
            lookback,
            tx,
            gap_count: 0,
        }
    }

    /// Id of the newest event forwarded so far
    pub fn last_seen(&self) -> Option<EventId> {
        self.last_seen
    }

    /// Number of truncation gaps encountered
    pub fn gap_count(&self) -> u64 {
        self.gap_count
    }

    fn forward(&self, item: StreamItem) -> bool {
        self.tx.send(item).is_ok()
    }
}

impl LogObserver for LogFollower {
    fn on_change(&mut self, events: &VecDeque<LogEvent>) -> ObserverStatus {
        if events.is_empty() {
            if self.last_seen.take().is_some() && !self.forward(StreamItem::Clear) {
                return ObserverStatus::Detached;
            }
            return ObserverStatus::Active;
        }

        let Some(newest_id) = events.back().map(|e| e.id) else {
            return ObserverStatus::Active;
        };

        match self.last_seen {
            // First observation, or first after a clear: take everything.
            None => {
                for event in events {
                    if !self.forward(StreamItem::Event(event.clone())) {
                        return ObserverStatus::Detached;
                    }
                }
            }
            Some(last) => {
                let mut fresh: Vec<&LogEvent> = Vec::new();
                let mut found = false;
                for event in events.iter().rev().take(self.lookback) {
                    if event.id == last {
                        found = true;
                        break;
                    }
                    fresh.push(event);
                }

                if found {
                    // `fresh` was collected newest-first.
                    for event in fresh.into_iter().rev() {
                        if !self.forward(StreamItem::Event(event.clone())) {
                            return ObserverStatus::Detached;
                        }
                    }
                } else {
                    // The log truncated past the lookback horizon; the delta
                    // is unknowable, so resume from the newest event only.
                    self.gap_count += 1;
                    tracing::warn!(
                        last_seen = %last,
                        lookback = self.lookback,
                        "continuity gap: last seen event no longer visible, resuming from newest"
                    );
                    if let Some(newest) = events.back() {
                        if !self.forward(StreamItem::Event(newest.clone())) {
                            return ObserverStatus::Detached;
                        }
                    }
                }
            }
        }

        self.last_seen = Some(newest_id);
        ObserverStatus::Active
    }
}
