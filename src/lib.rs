//! # WaveScope-RS: Serial Log Waveform Streamer
//!
//! The real-time core of a serial-port terminal: it follows a live,
//! append-only log of directional byte events and incrementally derives a
//! render-ready, UART-framed logic waveform with byte annotations,
//! delivering batched updates to a visualization sink at a capped rate
//! regardless of how fast bytes arrive.
//!
//! ## Architecture
//!
//! - **Session**: owns the bounded event log and notifies observers on
//!   every mutation
//! - **Pipeline**: follows the log, folds events into waveform samples and
//!   pushes throttled updates from a dedicated thread
//! - **Render**: pure annotation-to-primitive geometry for whatever chart
//!   widget the UI embeds
//! - **Communication**: crossbeam channels for thread-safe hand-off
//!
//! ## Configuration
//!
//! Pipeline settings are stored in the platform-appropriate data directory
//! under `dev.hxyulin.wavescope-rs`:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.wavescope-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.wavescope-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.wavescope-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use wavescope_rs::{
//!     config::PipelineConfig,
//!     pipeline::{stream_channel, ChannelSink, LogFollower, WaveformPipeline},
//!     session::SessionLog,
//!     types::Direction,
//! };
//!
//! fn main() -> wavescope_rs::Result<()> {
//!     let config = PipelineConfig::load_or_default();
//!     let mut log = SessionLog::with_capacity(config.log_capacity);
//!
//!     let (stream_tx, stream_rx) = stream_channel();
//!     log.attach(Box::new(LogFollower::new(config.lookback, stream_tx)));
//!
//!     let (pipeline, frontend) = WaveformPipeline::new(&config, stream_rx)?;
//!     let handle = pipeline.spawn()?;
//!
//!     // The UI thread drains sink_rx and draws the frames.
//!     let (sink, sink_rx) = ChannelSink::new();
//!     frontend.attach_sink(Box::new(sink));
//!
//!     // The connection layer records traffic as it arrives.
//!     log.record(Direction::Rx, b"OK\r\n".to_vec());
//!
//!     frontend.shutdown();
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{Result, ResultExt, WavescopeError};
pub use pipeline::{
    ByteAnnotation, ChannelSink, FrameScheduler, InteractionFlag, LogFollower, PipelineFrontend,
    SinkEvent, StreamItem, ViewportCommand, WaveformFrame, WaveformPipeline, WaveformSink,
    WaveformState,
};
pub use session::{LogObserver, ObserverStatus, SessionLog, Transcript};
pub use types::{Direction, EventId, LogEvent};
