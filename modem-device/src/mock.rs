use std::collections::VecDeque;

use crate::{AudioCapture, AudioPlayback, CaptureError, PlaybackError};

/// Deterministic in-memory capture backend: returns pre-scripted chunks
/// (e.g. synthesized tones) in order, and a trailing silent chunk
/// thereafter so a state machine under test idles rather than panicking
/// on exhaustion.
pub struct ScriptedCapture {
    chunks: VecDeque<Vec<i16>>,
    silence: Vec<i16>,
}

impl ScriptedCapture {
    pub fn new(chunks: Vec<Vec<i16>>, chunk_len: usize) -> Self {
        ScriptedCapture {
            chunks: chunks.into(),
            silence: vec![0; chunk_len],
        }
    }
}

impl AudioCapture for ScriptedCapture {
    fn read_chunk(&mut self) -> Result<Vec<i16>, CaptureError> {
        Ok(self.chunks.pop_front().unwrap_or_else(|| self.silence.clone()))
    }
}

/// Records every sample handed to it, for assertions in tests.
#[derive(Default)]
pub struct RecordingPlayback {
    pub written: Vec<f32>,
}

impl AudioPlayback for RecordingPlayback {
    fn write_samples(&mut self, samples: &[f32]) -> Result<(), PlaybackError> {
        self.written.extend_from_slice(samples);
        Ok(())
    }
}
