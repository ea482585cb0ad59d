//! Visualization sink abstraction
//!
//! The scheduler hands finished waveform data to a [`WaveformSink`], which
//! is whatever surface actually draws it. Sinks receive at most one batch
//! and one viewport command per accepted tick, so a sink never has to
//! coalesce updates itself.
//!
//! [`ChannelSink`] is the stock implementation: it serializes sink calls
//! into a bounded crossbeam channel so a UI thread can drain them at its
//! own pace. [`InteractionFlag`] travels the other way, letting the UI
//! report manual viewport interaction back to the scheduler.

use crate::config::SINK_CHANNEL_CAPACITY;
use crate::pipeline::builder::ByteAnnotation;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// One tick's worth of waveform data, borrowed from the scheduler's state.
///
/// Valid only for the duration of the [`WaveformSink::push_batch`] call;
/// sinks that need to keep the data copy it, typically via
/// [`WaveformFrame::from`].
#[derive(Debug, Clone, Copy)]
pub struct WaveformBatch<'a> {
    /// TX lane samples, one level per sample index
    pub tx: &'a [f64],
    /// RX lane samples, same length as `tx`
    pub rx: &'a [f64],
    /// Byte annotations ordered by start sample
    pub annotations: &'a [ByteAnnotation],
    /// Last valid sample index, for sizing the plot axis
    pub axis_max: usize,
}

/// Owned copy of a [`WaveformBatch`], suitable for crossing threads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformFrame {
    /// TX lane samples
    pub tx: Vec<f64>,
    /// RX lane samples
    pub rx: Vec<f64>,
    /// Byte annotations ordered by start sample
    pub annotations: Vec<ByteAnnotation>,
    /// Last valid sample index
    pub axis_max: usize,
}

impl From<WaveformBatch<'_>> for WaveformFrame {
    fn from(batch: WaveformBatch<'_>) -> Self {
        Self {
            tx: batch.tx.to_vec(),
            rx: batch.rx.to_vec(),
            annotations: batch.annotations.to_vec(),
            axis_max: batch.axis_max,
        }
    }
}

/// A viewport move requested by the scheduler.
///
/// `programmatic` distinguishes auto-follow moves from user-driven ones so
/// a sink can avoid feeding scheduler-initiated moves back into its
/// interaction reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportCommand {
    /// First visible sample index
    pub start: usize,
    /// Last visible sample index
    pub end: usize,
    /// True when the move originates from auto-follow, not the user
    pub programmatic: bool,
}

/// Shared edge-triggered flag for reporting manual viewport interaction.
///
/// The drawing surface calls [`set`] whenever the user pans or zooms; the
/// scheduler consumes the flag with [`take`] at the start of each accepted
/// tick and disables auto-follow if it was raised.
///
/// [`set`]: InteractionFlag::set
/// [`take`]: InteractionFlag::take
#[derive(Debug, Clone, Default)]
pub struct InteractionFlag(Arc<AtomicBool>);

impl InteractionFlag {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Idempotent until the next [`take`].
    ///
    /// [`take`]: InteractionFlag::take
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Lower the flag and return whether it was raised
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// Destination for scheduler output.
///
/// Implementations must tolerate being called from the pipeline thread.
pub trait WaveformSink: Send {
    /// Replace the displayed waveform with this tick's batched state
    fn push_batch(&mut self, batch: WaveformBatch<'_>);

    /// Move the visible sample range
    fn set_viewport(&mut self, command: ViewportCommand);
}

/// Sink call serialized for consumption on another thread
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A full waveform snapshot from an accepted tick
    Batch(WaveformFrame),
    /// A viewport move
    Viewport(ViewportCommand),
}

/// [`WaveformSink`] that forwards calls into a bounded channel.
///
/// When the consumer falls behind and the channel fills up, events are
/// dropped rather than blocking the pipeline thread; the scheduler sends a
/// fresh full snapshot on the next accepted tick anyway.
pub struct ChannelSink {
    tx: Sender<SinkEvent>,
    dropped: u64,
}

impl ChannelSink {
    /// Create a sink with the default channel capacity and the receiver its
    /// events arrive on
    pub fn new() -> (Self, Receiver<SinkEvent>) {
        Self::with_capacity(SINK_CHANNEL_CAPACITY)
    }

    /// Create a sink over a channel of the given capacity
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<SinkEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Number of events dropped because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn forward(&mut self, event: SinkEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!(
                    dropped = self.dropped,
                    "sink channel full, dropping event"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }
}

impl WaveformSink for ChannelSink {
    fn push_batch(&mut self, batch: WaveformBatch<'_>) {
        self.forward(SinkEvent::Batch(WaveformFrame::from(batch)));
    }

    fn set_viewport(&mut self, command: ViewportCommand) {
        self.forward(SinkEvent::Viewport(command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch<'a>(tx: &'a [f64], rx: &'a [f64]) -> WaveformBatch<'a> {
        WaveformBatch {
            tx,
            rx,
            annotations: &[],
            axis_max: tx.len().saturating_sub(1),
        }
    }

    #[test]
    fn test_channel_sink_forwards_batches_and_viewports() {
        let (mut sink, rx) = ChannelSink::with_capacity(8);
        let tx_lane = [0.5, 0.0, 1.0];
        let rx_lane = [2.5, 2.5, 2.5];

        sink.push_batch(sample_batch(&tx_lane, &rx_lane));
        sink.set_viewport(ViewportCommand {
            start: 0,
            end: 2,
            programmatic: true,
        });

        match rx.recv().unwrap() {
            SinkEvent::Batch(frame) => {
                assert_eq!(frame.tx, vec![0.5, 0.0, 1.0]);
                assert_eq!(frame.rx, vec![2.5, 2.5, 2.5]);
                assert_eq!(frame.axis_max, 2);
            }
            other => panic!("expected batch, got {:?}", other),
        }
        match rx.recv().unwrap() {
            SinkEvent::Viewport(command) => {
                assert!(command.programmatic);
                assert_eq!(command.start, 0);
                assert_eq!(command.end, 2);
            }
            other => panic!("expected viewport, got {:?}", other),
        }
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (mut sink, rx) = ChannelSink::with_capacity(1);
        let tx_lane = [0.5];
        let rx_lane = [2.5];

        sink.push_batch(sample_batch(&tx_lane, &rx_lane));
        sink.push_batch(sample_batch(&tx_lane, &rx_lane));
        assert_eq!(sink.dropped(), 1);

        // The first event is still delivered.
        assert!(matches!(rx.recv().unwrap(), SinkEvent::Batch(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_interaction_flag_is_edge_triggered() {
        let flag = InteractionFlag::new();
        assert!(!flag.take());

        flag.set();
        flag.set();
        assert!(flag.take());
        assert!(!flag.take());

        let shared = flag.clone();
        shared.set();
        assert!(flag.take());
    }

    #[test]
    fn test_frame_copies_borrowed_batch() {
        let tx_lane = [0.0, 1.0];
        let rx_lane = [2.5, 2.5];
        let annotations = vec![ByteAnnotation {
            start: 0,
            end: 2,
            mid: 1,
            channel: crate::types::Direction::Tx,
            label: "41 'A'".to_string(),
        }];
        let batch = WaveformBatch {
            tx: &tx_lane,
            rx: &rx_lane,
            annotations: &annotations,
            axis_max: 1,
        };

        let frame = WaveformFrame::from(batch);
        assert_eq!(frame.annotations, annotations);
        assert_eq!(frame.tx.len(), 2);
    }
}
