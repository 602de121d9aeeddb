pub mod cpal_backend;
pub mod mock;
mod queue;

use thiserror::Error;

/// A fallible audio device boundary: opening a stream, or an IO failure
/// mid-stream. Per the error handling design, every variant here is fatal
/// at the process level.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no default audio device available")]
    NoDevice,
    #[error("unsupported stream configuration: {0}")]
    UnsupportedConfig(String),
    #[error("failed to build audio stream: {0}")]
    BuildStream(String),
    #[error("failed to start audio stream: {0}")]
    PlayStream(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture stream closed unexpectedly")]
    StreamClosed,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback stream closed unexpectedly")]
    StreamClosed,
}

/// Blocking mono capture of 16-bit PCM at the protocol's fixed chunk size.
pub trait AudioCapture {
    fn read_chunk(&mut self) -> Result<Vec<i16>, CaptureError>;
}

/// Blocking mono playback of 32-bit float PCM. `write_samples` only
/// returns once every sample has been handed off to the device, so the
/// caller's notion of "audio playback is synchronous" holds.
pub trait AudioPlayback {
    fn write_samples(&mut self, samples: &[f32]) -> Result<(), PlaybackError>;
}
