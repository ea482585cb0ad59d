//! Frame-budgeted scheduler
//!
//! The sole consumer of the pending stream. Each tick it throttles itself
//! to the configured frame rate, folds a bounded chunk of queued events
//! into the waveform, and pushes at most one batched update plus one
//! viewport command to the sink. Tick callbacks may fire far more often
//! than the target rate; the throttle makes effective work independent of
//! callback frequency.
//!
//! Per-tick cost is bounded by the chunk size, never by the queue depth.
//! Under sustained overload the queue grows and latency rises, but no data
//! is dropped here.
//!
//! # States
//!
//! `Idle -> (tick fires) -> [throttle check] -> dirty? -> rendering -> Idle`

use crate::config::PipelineConfig;
use crate::pipeline::builder::WaveformState;
use crate::pipeline::follower::StreamItem;
use crate::pipeline::sink::{InteractionFlag, ViewportCommand, WaveformBatch, WaveformSink};
use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};
use tracing::debug;

/// What one tick call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Rejected by the frame throttle, nothing happened
    Throttled,
    /// Accepted, but no new data and nothing pending to render
    Idle,
    /// Accepted and folded, but no sink is attached; render retried next tick
    Deferred,
    /// Accepted, sink received a batched update
    Updated,
}

/// Counters describing scheduler activity since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks that passed the frame throttle
    pub ticks_accepted: u64,
    /// Ticks rejected by the frame throttle
    pub ticks_throttled: u64,
    /// Events folded into the waveform
    pub events_folded: u64,
    /// Batched updates pushed to the sink
    pub batches_pushed: u64,
    /// Clear signals processed
    pub clears: u64,
}

/// Drains the pending stream at a capped rate and drives the sink.
///
/// Owns the [`WaveformState`] outright; all folding happens inside
/// [`tick`], so the waveform is never mutated concurrently.
///
/// [`tick`]: FrameScheduler::tick
pub struct FrameScheduler {
    stream_rx: Receiver<StreamItem>,
    state: WaveformState,
    sink: Option<Box<dyn WaveformSink>>,
    frame_interval: Duration,
    chunk_size: usize,
    window_size: usize,
    auto_follow: bool,
    interaction: InteractionFlag,
    last_tick: Option<Instant>,
    pending_render: bool,
    stats: SchedulerStats,
}

impl FrameScheduler {
    /// Create a scheduler draining `stream_rx`, with no sink attached yet
    pub fn new(config: &PipelineConfig, stream_rx: Receiver<StreamItem>) -> Self {
        Self {
            stream_rx,
            state: WaveformState::with_idle_gap(config.idle_gap_samples),
            sink: None,
            frame_interval: config.frame_interval(),
            chunk_size: config.chunk_size,
            window_size: config.window_size,
            auto_follow: true,
            interaction: InteractionFlag::new(),
            last_tick: None,
            pending_render: false,
            stats: SchedulerStats::default(),
        }
    }

    /// Attach the sink updates are pushed to.
    ///
    /// If the waveform already holds samples, the next accepted tick pushes
    /// a full batch even when no new events arrive.
    pub fn attach_sink(&mut self, sink: Box<dyn WaveformSink>) {
        self.sink = Some(sink);
        if !self.state.is_empty() {
            self.pending_render = true;
        }
        debug!("sink attached");
    }

    /// Shared flag a sink raises on manual viewport interaction
    pub fn interaction(&self) -> InteractionFlag {
        self.interaction.clone()
    }

    /// Whether the viewport currently follows the newest samples
    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    /// Enable or disable auto-follow directly
    pub fn set_auto_follow(&mut self, enabled: bool) {
        self.auto_follow = enabled;
    }

    /// Re-enable auto-follow and discard any unconsumed interaction signal,
    /// so the viewport snaps back to the live edge on the next update
    pub fn jump_to_live(&mut self) {
        self.auto_follow = true;
        self.interaction.take();
        self.pending_render = true;
        debug!("jump to live requested");
    }

    /// The waveform folded so far
    pub fn state(&self) -> &WaveformState {
        &self.state
    }

    /// Activity counters
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Run one tick now. See [`tick_at`].
    ///
    /// [`tick_at`]: FrameScheduler::tick_at
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    /// Run one tick at an explicit timestamp, letting embedders drive the
    /// throttle from their own clock.
    ///
    /// An accepted tick consumes the interaction flag, folds up to
    /// `chunk_size` queued events (clear signals cost no budget), and if
    /// anything changed pushes exactly one batch and, with auto-follow on,
    /// one programmatic viewport command.
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.frame_interval {
                self.stats.ticks_throttled += 1;
                return TickOutcome::Throttled;
            }
        }
        self.last_tick = Some(now);
        self.stats.ticks_accepted += 1;

        if self.interaction.take() {
            if self.auto_follow {
                debug!("manual interaction, auto-follow disabled");
            }
            self.auto_follow = false;
        }

        let mut dirty = false;
        let mut folded = 0usize;
        while folded < self.chunk_size {
            match self.stream_rx.try_recv() {
                Ok(StreamItem::Event(event)) => {
                    self.state.fold_event(&event);
                    self.stats.events_folded += 1;
                    folded += 1;
                    dirty = true;
                }
                Ok(StreamItem::Clear) => {
                    self.state.clear();
                    self.stats.clears += 1;
                    dirty = true;
                    debug!("clear received, waveform reset");
                }
                Err(_) => break,
            }
        }

        if !dirty && !self.pending_render {
            return TickOutcome::Idle;
        }

        let Some(sink) = self.sink.as_mut() else {
            self.pending_render = true;
            return TickOutcome::Deferred;
        };
        self.pending_render = false;

        sink.push_batch(WaveformBatch {
            tx: self.state.tx_lane(),
            rx: self.state.rx_lane(),
            annotations: self.state.annotations(),
            axis_max: self.state.axis_max(),
        });
        self.stats.batches_pushed += 1;

        if self.auto_follow && !self.state.is_empty() {
            let cursor = self.state.cursor();
            sink.set_viewport(ViewportCommand {
                start: cursor.saturating_sub(self.window_size),
                end: cursor - 1,
                programmatic: true,
            });
        }
        TickOutcome::Updated
    }
}
