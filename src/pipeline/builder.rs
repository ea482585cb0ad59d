//! Incremental waveform construction
//!
//! Folds byte events into a two-lane, UART-framed logic waveform. Each byte
//! becomes ten samples on its direction's lane: one LOW start bit, eight
//! data bits least-significant first, one HIGH stop bit; the opposite lane
//! idles for the duration. After every event both lanes get a short idle
//! gap so consecutive frames stay visually separated.
//!
//! The fold is append-only and costs O(bytes folded): samples already
//! emitted are never recomputed, reordered, or rewritten. Folding a batch
//! of events is byte-identical to folding them one at a time, which is what
//! lets the scheduler pick its chunk size freely.
//!
//! # Lanes
//!
//! Both lanes share one numeric axis. TX occupies `[0.0, 1.0]`, RX
//! `[2.0, 3.0]`; within a lane LOW/IDLE/HIGH map to base + 0.0/0.5/1.0.

use crate::config::IDLE_GAP_SAMPLES;
use crate::types::{Direction, LogEvent};
use serde::{Deserialize, Serialize};

/// Discrete line levels of a waveform lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    /// Driven low (start bit, 0 data bit)
    Low,
    /// Resting between frames
    Idle,
    /// Driven high (1 data bit, stop bit)
    High,
}

impl LineLevel {
    /// Offset of this level above the lane base
    pub fn offset(&self) -> f64 {
        match self {
            LineLevel::Low => 0.0,
            LineLevel::Idle => 0.5,
            LineLevel::High => 1.0,
        }
    }

    /// Numeric sample value of this level on the given lane
    pub fn on_lane(&self, direction: Direction) -> f64 {
        direction.lane_base() + self.offset()
    }
}

/// Render label for one byte: two-digit uppercase hex plus the ASCII
/// character when printable, `.` otherwise. `0x41` becomes `41 'A'`.
pub fn byte_label(byte: u8) -> String {
    let ch = if (0x20..=0x7E).contains(&byte) {
        byte as char
    } else {
        '.'
    };
    format!("{:02X} '{}'", byte, ch)
}

/// A labeled span over waveform samples identifying one byte frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByteAnnotation {
    /// First sample of the frame (the start bit)
    pub start: usize,
    /// One past the last sample of the frame
    pub end: usize,
    /// Sample the label anchors to (middle of the data bits)
    pub mid: usize,
    /// Which lane carried the byte
    pub channel: Direction,
    /// Formatted label, e.g. `41 'A'`
    pub label: String,
}

/// Append-only logic-level waveform derived from log events.
///
/// Invariants: both lanes always hold exactly `cursor` samples; annotation
/// indices lie strictly within `[0, cursor)` and annotations are ordered by
/// their start sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformState {
    tx_lane: Vec<f64>,
    rx_lane: Vec<f64>,
    annotations: Vec<ByteAnnotation>,
    cursor: usize,
    bootstrapped: bool,
    idle_gap: usize,
}

impl WaveformState {
    /// Create an empty waveform with the default inter-frame gap
    pub fn new() -> Self {
        Self::with_idle_gap(IDLE_GAP_SAMPLES)
    }

    /// Create an empty waveform appending `idle_gap` idle samples after
    /// each folded event
    pub fn with_idle_gap(idle_gap: usize) -> Self {
        Self {
            tx_lane: Vec::new(),
            rx_lane: Vec::new(),
            annotations: Vec::new(),
            cursor: 0,
            bootstrapped: false,
            idle_gap,
        }
    }

    /// Fold a batch of events. Equivalent to calling [`fold_event`]
    /// once per event.
    ///
    /// [`fold_event`]: WaveformState::fold_event
    pub fn fold(&mut self, events: &[LogEvent]) {
        self.ensure_bootstrap();
        for event in events {
            self.fold_event(event);
        }
    }

    /// Fold one event: ten samples per payload byte on its lane, then the
    /// inter-frame idle gap on both lanes
    pub fn fold_event(&mut self, event: &LogEvent) {
        self.ensure_bootstrap();
        for &byte in &event.payload {
            self.fold_byte(event.direction, byte);
        }
        for _ in 0..self.idle_gap {
            self.push_idle_both();
        }
    }

    /// Reset to the bootstrap-pending empty form
    pub fn clear(&mut self) {
        self.tx_lane.clear();
        self.rx_lane.clear();
        self.annotations.clear();
        self.cursor = 0;
        self.bootstrapped = false;
    }

    /// Next sample index to be written; equals the length of each lane
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether no samples have been emitted yet
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Upper axis bound for plotting: the last written sample index
    pub fn axis_max(&self) -> usize {
        self.cursor.saturating_sub(1)
    }

    /// Sample levels of the TX lane
    pub fn tx_lane(&self) -> &[f64] {
        &self.tx_lane
    }

    /// Sample levels of the RX lane
    pub fn rx_lane(&self) -> &[f64] {
        &self.rx_lane
    }

    /// Sample levels of one lane by direction
    pub fn lane(&self, direction: Direction) -> &[f64] {
        match direction {
            Direction::Tx => &self.tx_lane,
            Direction::Rx => &self.rx_lane,
        }
    }

    /// Byte annotations, ordered by start sample
    pub fn annotations(&self) -> &[ByteAnnotation] {
        &self.annotations
    }

    /// One lane as render-ready `[sample_index, level]` pairs
    pub fn lane_points(&self, direction: Direction) -> Vec<[f64; 2]> {
        self.lane(direction)
            .iter()
            .enumerate()
            .map(|(i, level)| [i as f64, *level])
            .collect()
    }

    fn ensure_bootstrap(&mut self) {
        if self.bootstrapped {
            return;
        }
        self.push_idle_both();
        self.bootstrapped = true;
    }

    fn fold_byte(&mut self, direction: Direction, byte: u8) {
        let start = self.cursor;
        self.push_bit(direction, LineLevel::Low); // start bit
        for k in 0..8 {
            let level = if (byte >> k) & 1 == 1 {
                LineLevel::High
            } else {
                LineLevel::Low
            };
            self.push_bit(direction, level);
        }
        self.push_bit(direction, LineLevel::High); // stop bit
        self.annotations.push(ByteAnnotation {
            start,
            end: self.cursor,
            mid: start + 5,
            channel: direction,
            label: byte_label(byte),
        });
    }

    fn push_bit(&mut self, active: Direction, level: LineLevel) {
        match active {
            Direction::Tx => {
                self.tx_lane.push(level.on_lane(Direction::Tx));
                self.rx_lane.push(LineLevel::Idle.on_lane(Direction::Rx));
            }
            Direction::Rx => {
                self.rx_lane.push(level.on_lane(Direction::Rx));
                self.tx_lane.push(LineLevel::Idle.on_lane(Direction::Tx));
            }
        }
        self.cursor += 1;
    }

    fn push_idle_both(&mut self) {
        self.tx_lane.push(LineLevel::Idle.on_lane(Direction::Tx));
        self.rx_lane.push(LineLevel::Idle.on_lane(Direction::Rx));
        self.cursor += 1;
    }
}

impl Default for WaveformState {
    fn default() -> Self {
        Self::new()
    }
}
