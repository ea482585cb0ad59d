//! Log-to-waveform streaming pipeline.
//!
//! Byte events flow one direction from the session log to the drawing
//! surface. The pipeline runs on a dedicated thread and communicates with
//! the UI via crossbeam channels.
//!
//! # Architecture
//!
//! ```text
//! [SessionLog] ──► [LogFollower] ──► [FrameScheduler] ──► [WaveformSink]
//!    (source)       (observer)    │    (tick thread)   │     (UI side)
//!                                 │                    │
//!                          unbounded stream     batches + viewport
//! ```
//!
//! Interaction signals flow backward only as an edge-triggered flag
//! ([`InteractionFlag`]) consumed by the scheduler.
//!
//! # Design
//!
//! - **Incremental folding**: samples are appended, never recomputed
//! - **Bounded tick cost**: at most `chunk_size` events folded per tick
//! - **Throttled updates**: at most `target_fps` sink updates per second,
//!   however fast events arrive or the tick source fires
//! - **Lock-free hand-off**: single producer appends, single consumer
//!   drains; neither side ever blocks the other

pub mod builder;
pub mod follower;
pub mod scheduler;
pub mod sink;

pub use builder::{byte_label, ByteAnnotation, LineLevel, WaveformState};
pub use follower::{stream_channel, LogFollower, StreamItem};
pub use scheduler::{FrameScheduler, SchedulerStats, TickOutcome};
pub use sink::{
    ChannelSink, InteractionFlag, SinkEvent, ViewportCommand, WaveformBatch, WaveformFrame,
    WaveformSink,
};

use crate::config::{PipelineConfig, CMD_CHANNEL_CAPACITY};
use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Control messages from the owning UI to the pipeline thread
pub enum PipelineCommand {
    /// Attach the sink scheduler output is pushed to
    AttachSink(Box<dyn WaveformSink>),
    /// Enable or disable viewport auto-follow
    SetAutoFollow(bool),
    /// Re-enable auto-follow and snap the viewport to the live edge
    JumpToLive,
    /// Stop the pipeline thread
    Shutdown,
}

/// The pipeline thread: owns the scheduler and drives it from a
/// fixed-interval tick source.
///
/// Constructed together with its [`PipelineFrontend`]; the frontend stays
/// with the UI while the pipeline moves onto its own thread via [`spawn`].
///
/// [`spawn`]: WaveformPipeline::spawn
pub struct WaveformPipeline {
    scheduler: FrameScheduler,
    cmd_rx: Receiver<PipelineCommand>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
}

/// UI-side handle to a running [`WaveformPipeline`].
///
/// All methods are non-blocking; commands an exited pipeline never reads
/// are silently discarded.
#[derive(Clone)]
pub struct PipelineFrontend {
    cmd_tx: Sender<PipelineCommand>,
    running: Arc<AtomicBool>,
    interaction: InteractionFlag,
}

impl WaveformPipeline {
    /// Create a pipeline draining `stream_rx` and the frontend controlling
    /// it. Validates the configuration up front.
    pub fn new(
        config: &PipelineConfig,
        stream_rx: Receiver<StreamItem>,
    ) -> Result<(Self, PipelineFrontend)> {
        config.validate()?;
        let (cmd_tx, cmd_rx) = bounded(CMD_CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let scheduler = FrameScheduler::new(config, stream_rx);

        let frontend = PipelineFrontend {
            cmd_tx,
            running: Arc::clone(&running),
            interaction: scheduler.interaction(),
        };
        let pipeline = Self {
            scheduler,
            cmd_rx,
            running,
            tick_interval: config.tick_interval(),
        };
        Ok((pipeline, frontend))
    }

    /// Run until `Shutdown` is received or the frontend flips the running
    /// flag. The loop iterates at the configured tick rate; the scheduler
    /// throttles itself down to the target frame rate internally.
    pub fn run(mut self) {
        tracing::info!("waveform pipeline thread started");

        while self.running.load(Ordering::Relaxed) {
            let loop_started = Instant::now();

            self.process_commands();
            self.scheduler.tick();
            self.rate_limit(loop_started);
        }

        tracing::info!(stats = ?self.scheduler.stats(), "waveform pipeline thread exiting");
    }

    /// Move the pipeline onto its own named thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let handle = std::thread::Builder::new()
            .name("waveform-pipeline".to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    fn process_commands(&mut self) {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: PipelineCommand) {
        match cmd {
            PipelineCommand::AttachSink(sink) => {
                self.scheduler.attach_sink(sink);
            }
            PipelineCommand::SetAutoFollow(enabled) => {
                self.scheduler.set_auto_follow(enabled);
            }
            PipelineCommand::JumpToLive => {
                self.scheduler.jump_to_live();
            }
            PipelineCommand::Shutdown => {
                self.running.store(false, Ordering::Relaxed);
            }
        }
    }

    fn rate_limit(&self, loop_started: Instant) {
        let elapsed = loop_started.elapsed();
        if elapsed < self.tick_interval {
            std::thread::sleep(self.tick_interval - elapsed);
        }
    }
}

impl PipelineFrontend {
    /// Attach the sink updates are pushed to
    pub fn attach_sink(&self, sink: Box<dyn WaveformSink>) {
        let _ = self.cmd_tx.send(PipelineCommand::AttachSink(sink));
    }

    /// Enable or disable viewport auto-follow
    pub fn set_auto_follow(&self, enabled: bool) {
        let _ = self.cmd_tx.send(PipelineCommand::SetAutoFollow(enabled));
    }

    /// Re-enable auto-follow after a manual pan or zoom
    pub fn jump_to_live(&self) {
        let _ = self.cmd_tx.send(PipelineCommand::JumpToLive);
    }

    /// Shared flag the drawing surface raises on manual viewport
    /// interaction
    pub fn interaction(&self) -> InteractionFlag {
        self.interaction.clone()
    }

    /// Whether the pipeline thread is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the pipeline thread. Safe to call more than once.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.cmd_tx.send(PipelineCommand::Shutdown);
    }
}
