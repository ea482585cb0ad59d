//! End-to-end stream semantics, driven deterministically
//!
//! Wires the real session log, follower, and scheduler together and drives
//! ticks from an explicit clock, so every assertion is timing-independent.

mod common;

use common::builders::expected_samples;
use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};
use wavescope_rs::config::PipelineConfig;
use wavescope_rs::pipeline::{
    stream_channel, ChannelSink, FrameScheduler, LogFollower, SinkEvent, StreamItem, TickOutcome,
    WaveformFrame,
};
use wavescope_rs::session::{LogObserver, SessionLog, Transcript};
use wavescope_rs::types::{Direction, EventId};

fn wired(config: &PipelineConfig) -> (SessionLog, FrameScheduler, Receiver<SinkEvent>) {
    common::init_tracing();
    let mut log = SessionLog::with_capacity(config.log_capacity);
    let (stream_tx, stream_rx) = stream_channel();
    log.attach(Box::new(LogFollower::new(config.lookback, stream_tx)));

    let mut scheduler = FrameScheduler::new(config, stream_rx);
    let (sink, sink_rx) = ChannelSink::with_capacity(1024);
    scheduler.attach_sink(Box::new(sink));
    (log, scheduler, sink_rx)
}

fn batches(sink_rx: &Receiver<SinkEvent>) -> Vec<WaveformFrame> {
    sink_rx
        .try_iter()
        .filter_map(|event| match event {
            SinkEvent::Batch(frame) => Some(frame),
            SinkEvent::Viewport(_) => None,
        })
        .collect()
}

#[test]
fn test_recorded_bytes_reach_sink_as_waveform() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);

    log.record(Direction::Tx, vec![0x41]);
    assert_eq!(scheduler.tick_at(Instant::now()), TickOutcome::Updated);

    match sink_rx.try_recv().unwrap() {
        SinkEvent::Batch(frame) => {
            assert_eq!(frame.tx.len(), expected_samples(&[1], 4));
            assert_eq!(frame.annotations.len(), 1);
            assert_eq!(frame.annotations[0].label, "41 'A'");
            assert_eq!(frame.axis_max, 14);
        }
        other => panic!("expected batch, got {:?}", other),
    }
    match sink_rx.try_recv().unwrap() {
        SinkEvent::Viewport(command) => {
            assert_eq!(command.start, 0);
            assert_eq!(command.end, 14);
            assert!(command.programmatic);
        }
        other => panic!("expected viewport, got {:?}", other),
    }
}

#[test]
fn test_many_records_one_tick_one_batch() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);

    log.record(Direction::Tx, vec![0x48]);
    log.record(Direction::Rx, vec![0x49]);
    log.record(Direction::Tx, vec![0x21]);
    scheduler.tick_at(Instant::now());

    let frames = batches(&sink_rx);
    assert_eq!(frames.len(), 1, "one dirty tick, one sink update");
    assert_eq!(frames[0].tx.len(), expected_samples(&[1, 1, 1], 4));
    assert_eq!(frames[0].annotations.len(), 3);
}

#[test]
fn test_clear_resets_downstream_and_ids_stay_monotonic() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);
    let t0 = Instant::now();
    let step = Duration::from_millis(100);

    log.record(Direction::Tx, vec![0x41]);
    log.record(Direction::Rx, vec![0x42]);
    scheduler.tick_at(t0);
    while sink_rx.try_recv().is_ok() {}

    log.clear();
    assert_eq!(scheduler.tick_at(t0 + step), TickOutcome::Updated);
    match sink_rx.try_recv().unwrap() {
        SinkEvent::Batch(frame) => {
            assert!(frame.tx.is_empty());
            assert!(frame.annotations.is_empty());
        }
        other => panic!("expected batch, got {:?}", other),
    }
    assert!(sink_rx.try_recv().is_err(), "no viewport for empty waveform");

    // Ids keep counting after a clear; the waveform restarts from scratch.
    let id = log.record(Direction::Tx, vec![0x43]);
    assert_eq!(id, EventId(2));
    scheduler.tick_at(t0 + 2 * step);
    let frames = batches(&sink_rx);
    assert_eq!(frames[0].tx.len(), expected_samples(&[1], 4));
}

#[test]
fn test_log_truncation_gap_forwards_newest_only() {
    let mut log = SessionLog::with_capacity(3);
    let (stream_tx, stream_rx) = stream_channel();
    let mut follower = LogFollower::new(2, stream_tx);

    // First observation sees event 0.
    log.record(Direction::Tx, vec![0x01]);
    follower.on_change(log.events());

    // The source races ahead while unobserved; capacity 3 drops event 0.
    for byte in [0x02, 0x03, 0x04, 0x05, 0x06] {
        log.record(Direction::Tx, vec![byte]);
    }
    assert_eq!(log.truncated_total(), 3);

    follower.on_change(log.events());
    assert_eq!(follower.gap_count(), 1);

    let items: Vec<StreamItem> = stream_rx.try_iter().collect();
    // Event 0 from the first observation, then exactly one survivor.
    assert_eq!(items.len(), 2);
    match &items[1] {
        StreamItem::Event(event) => assert_eq!(event.id, EventId(5)),
        other => panic!("expected event, got {:?}", other),
    }
}

#[test]
fn test_chunk_budget_spreads_folding_across_ticks() {
    let config = PipelineConfig {
        chunk_size: 2,
        ..PipelineConfig::default()
    };
    let (mut log, mut scheduler, sink_rx) = wired(&config);
    for byte in 0u8..5 {
        log.record(Direction::Rx, vec![byte]);
    }

    let t0 = Instant::now();
    let step = Duration::from_millis(100);
    scheduler.tick_at(t0);
    assert_eq!(scheduler.stats().events_folded, 2);
    scheduler.tick_at(t0 + step);
    assert_eq!(scheduler.stats().events_folded, 4);
    scheduler.tick_at(t0 + 2 * step);
    assert_eq!(scheduler.stats().events_folded, 5);
    assert_eq!(scheduler.tick_at(t0 + 3 * step), TickOutcome::Idle);

    assert_eq!(batches(&sink_rx).len(), 3);
}

#[test]
fn test_fast_tick_source_is_throttled_to_target_fps() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);

    // A 240 Hz tick source over one second, with fresh data before every
    // tick so each accepted tick has work to do.
    let t0 = Instant::now();
    let step = Duration::from_micros(4167);
    for k in 0u32..240 {
        log.record(Direction::Tx, vec![k as u8]);
        scheduler.tick_at(t0 + k * step);
    }

    let stats = scheduler.stats();
    assert_eq!(
        stats.batches_pushed, 15,
        "at most target_fps updates per second"
    );
    assert_eq!(batches(&sink_rx).len(), 15);

    // Throttling delays folding but never drops: one late tick drains the
    // backlog the 240 Hz burst left behind.
    scheduler.tick_at(t0 + Duration::from_secs(2));
    assert_eq!(scheduler.stats().events_folded, 240);
}

#[test]
fn test_sink_attached_late_receives_full_backlog() {
    let config = PipelineConfig::default();
    let mut log = SessionLog::with_capacity(config.log_capacity);
    let (stream_tx, stream_rx) = stream_channel();
    log.attach(Box::new(LogFollower::new(config.lookback, stream_tx)));
    let mut scheduler = FrameScheduler::new(&config, stream_rx);

    log.record(Direction::Tx, vec![0x41]);
    log.record(Direction::Rx, vec![0x42]);
    let t0 = Instant::now();
    assert_eq!(scheduler.tick_at(t0), TickOutcome::Deferred);
    assert_eq!(scheduler.state().cursor(), expected_samples(&[1, 1], 4));

    let (sink, sink_rx) = ChannelSink::new();
    scheduler.attach_sink(Box::new(sink));
    assert_eq!(
        scheduler.tick_at(t0 + Duration::from_millis(100)),
        TickOutcome::Updated
    );

    let frames = batches(&sink_rx);
    assert_eq!(frames[0].tx.len(), expected_samples(&[1, 1], 4));
    assert_eq!(frames[0].annotations.len(), 2);
}

#[test]
fn test_manual_interaction_stops_follow_until_jump_to_live() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);
    let t0 = Instant::now();
    let step = Duration::from_millis(100);

    log.record(Direction::Tx, vec![0x01]);
    scheduler.tick_at(t0);
    let first: Vec<SinkEvent> = sink_rx.try_iter().collect();
    assert_eq!(first.len(), 2, "batch plus viewport while following");

    scheduler.interaction().set();
    log.record(Direction::Tx, vec![0x02]);
    scheduler.tick_at(t0 + step);
    let second: Vec<SinkEvent> = sink_rx.try_iter().collect();
    assert_eq!(second.len(), 1, "batch only after a manual pan");

    scheduler.jump_to_live();
    log.record(Direction::Tx, vec![0x03]);
    scheduler.tick_at(t0 + 2 * step);
    let third: Vec<SinkEvent> = sink_rx.try_iter().collect();
    assert_eq!(third.len(), 2, "viewport commands resume");
}

#[test]
fn test_transcript_replay_rebuilds_identical_waveform() {
    let config = PipelineConfig::default();
    let (mut log, mut scheduler, sink_rx) = wired(&config);

    log.record(Direction::Tx, b"Hi".to_vec());
    log.record(Direction::Rx, vec![0x06]);
    scheduler.tick_at(Instant::now());
    let live_frame = batches(&sink_rx).pop().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    Transcript::capture(&log).save(&path).unwrap();

    let (mut replay_log, mut replay_scheduler, replay_rx) = wired(&config);
    let restored = Transcript::load(&path).unwrap();
    assert_eq!(restored.replay_into(&mut replay_log), 2);
    replay_scheduler.tick_at(Instant::now());

    let replay_frame = batches(&replay_rx).pop().unwrap();
    assert_eq!(replay_frame.tx, live_frame.tx);
    assert_eq!(replay_frame.rx, live_frame.rx);
    assert_eq!(replay_frame.annotations, live_frame.annotations);
    assert_eq!(replay_frame.axis_max, live_frame.axis_max);
}
