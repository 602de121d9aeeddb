use std::sync::{Mutex, MutexGuard};

use modem_core::ToneCodec;
use modem_device::{AudioCapture, AudioPlayback, CaptureError, PlaybackError};
use modem_protocol::symbol::Symbol;

struct DeviceInner {
    capture: Box<dyn AudioCapture + Send>,
    playback: Box<dyn AudioPlayback + Send>,
}

/// The one shared capture stream and one shared playback stream for this
/// node, guarded by a single lock so the Receiver and the Transmitter never
/// touch the device at the same instant: a role acquires the device for the
/// length of its whole turn (one CSMA/CA transmit attempt including all its
/// retries, or one hunt-and-decode pass) rather than per chunk, matching
/// the "only one input/output stream active at any moment" requirement.
pub struct Device {
    inner: Mutex<DeviceInner>,
}

impl Device {
    pub fn new(capture: Box<dyn AudioCapture + Send>, playback: Box<dyn AudioPlayback + Send>) -> Self {
        Device {
            inner: Mutex::new(DeviceInner { capture, playback }),
        }
    }

    /// Acquires exclusive ownership of the device for the duration of one
    /// role's turn. Held across many chunk reads/writes, not reacquired
    /// per chunk, so the other role can't interleave mid-turn.
    pub fn acquire(&self) -> DeviceGuard<'_> {
        DeviceGuard {
            inner: self.inner.lock().unwrap(),
        }
    }
}

pub struct DeviceGuard<'a> {
    inner: MutexGuard<'a, DeviceInner>,
}

impl DeviceGuard<'_> {
    fn read_chunk(&mut self) -> Result<Vec<i16>, CaptureError> {
        self.inner.capture.read_chunk()
    }

    fn play(&mut self, samples: &[f32]) -> Result<(), PlaybackError> {
        self.inner.playback.write_samples(samples)
    }
}

/// Reads one chunk and classifies it. The basic suspension point shared
/// by carrier sense, the main receiver, and the ACK receiver.
pub fn read_symbol(device: &mut DeviceGuard, tone: &ToneCodec) -> Symbol {
    match device.read_chunk() {
        Ok(chunk) => tone.classify(&chunk),
        Err(err) => {
            log::error!("audio capture failed: {err}");
            Symbol::None
        }
    }
}

/// Plays a full bit sequence through the line coder and tone codec:
/// every bit bracketed by its delimiter, synchronous playback.
pub fn transmit_bits(device: &mut DeviceGuard, tone: &ToneCodec, line: &modem_core::LineCoder, bits: &[u8]) {
    use modem_protocol::BIT_DURATION;

    for symbol in line.encode(bits) {
        let freq = match symbol {
            Symbol::Zero => modem_protocol::FREQ_ZERO,
            Symbol::One => modem_protocol::FREQ_ONE,
            Symbol::Delimiter => modem_protocol::FREQ_DELIMITER,
            Symbol::None => continue,
        };
        let samples = tone.synthesize(freq, BIT_DURATION);
        if let Err(err) = device.play(&samples) {
            log::error!("audio playback failed: {err}");
        }
    }
}
