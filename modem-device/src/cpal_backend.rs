use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use modem_protocol::{CHUNK_SIZE, SAMPLE_RATE};

use crate::queue::Queue;
use crate::{AudioCapture, AudioPlayback, CaptureError, OpenError, PlaybackError};

fn config_for(channels: u16) -> StreamConfig {
    StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    }
}

/// cpal-backed capture: the callback thread accumulates raw frames into a
/// chunk of exactly [`CHUNK_SIZE`] samples before handing it to the
/// bounded queue, so `read_chunk` always returns a classify-ready buffer.
pub struct Capture {
    _stream: Stream,
    queue: Arc<Queue<Vec<i16>, 4>>,
}

fn find_input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, OpenError> {
    match name {
        None => host.default_input_device().ok_or(OpenError::NoDevice),
        Some(name) => host
            .input_devices()
            .map_err(|e| OpenError::UnsupportedConfig(e.to_string()))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or(OpenError::NoDevice),
    }
}

fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, OpenError> {
    match name {
        None => host.default_output_device().ok_or(OpenError::NoDevice),
        Some(name) => host
            .output_devices()
            .map_err(|e| OpenError::UnsupportedConfig(e.to_string()))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or(OpenError::NoDevice),
    }
}

impl Capture {
    pub fn open_default() -> Result<Self, OpenError> {
        Self::open(None)
    }

    /// Opens the named input device, or the host default if `name` is
    /// `None`. Device names come from `cpal::Device::name()`, matched
    /// exactly.
    pub fn open(name: Option<&str>) -> Result<Self, OpenError> {
        let host = cpal::default_host();
        let device = find_input_device(&host, name)?;
        let supported = device
            .default_input_config()
            .map_err(|e| OpenError::UnsupportedConfig(e.to_string()))?;
        let channels = supported.channels();
        let config = config_for(channels);
        let sample_format = supported.sample_format();

        let queue = Arc::new(Queue::<Vec<i16>, 4>::new());
        let pending = Arc::new(Mutex::new(Vec::<i16>::with_capacity(CHUNK_SIZE)));

        let stream = build_input_stream(&device, &config, sample_format, channels, &queue, &pending)?;
        stream.play().map_err(|e| OpenError::PlayStream(e.to_string()))?;

        Ok(Capture { _stream: stream, queue })
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    channels: u16,
    queue: &Arc<Queue<Vec<i16>, 4>>,
    pending: &Arc<Mutex<Vec<i16>>>,
) -> Result<Stream, OpenError> {
    let queue = Arc::clone(queue);
    let pending = Arc::clone(pending);
    let err_fn = |err| log::warn!("audio capture stream error: {err}");

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _| push_mono(data.iter().step_by(channels as usize).copied(), &queue, &pending),
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _| {
                push_mono(
                    data.iter().step_by(channels as usize).map(|&s| (s * i16::MAX as f32) as i16),
                    &queue,
                    &pending,
                )
            },
            err_fn,
            None,
        ),
        other => return Err(OpenError::UnsupportedConfig(format!("{other:?}"))),
    };

    stream.map_err(|e| OpenError::BuildStream(e.to_string()))
}

fn push_mono(samples: impl Iterator<Item = i16>, queue: &Arc<Queue<Vec<i16>, 4>>, pending: &Arc<Mutex<Vec<i16>>>) {
    let mut buf = pending.lock().unwrap();
    for sample in samples {
        buf.push(sample);
        if buf.len() == CHUNK_SIZE {
            queue.force_push(std::mem::replace(&mut *buf, Vec::with_capacity(CHUNK_SIZE)));
        }
    }
}

impl AudioCapture for Capture {
    fn read_chunk(&mut self) -> Result<Vec<i16>, CaptureError> {
        Ok(self.queue.read())
    }
}

/// cpal-backed playback. `write_samples` blocks until the output callback
/// has drained everything handed to it, which is as close to "last sample
/// emitted" as the device boundary (out of scope for this protocol) lets
/// us observe.
pub struct Playback {
    _stream: Stream,
    pending: Arc<(Mutex<VecDeque<f32>>, Condvar)>,
}

impl Playback {
    pub fn open_default() -> Result<Self, OpenError> {
        Self::open(None)
    }

    /// Opens the named output device, or the host default if `name` is
    /// `None`.
    pub fn open(name: Option<&str>) -> Result<Self, OpenError> {
        let host = cpal::default_host();
        let device = find_output_device(&host, name)?;
        let supported = device
            .default_output_config()
            .map_err(|e| OpenError::UnsupportedConfig(e.to_string()))?;
        let channels = supported.channels();
        let config = config_for(channels);

        let pending = Arc::new((Mutex::new(VecDeque::<f32>::new()), Condvar::new()));
        let cb_pending = Arc::clone(&pending);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| {
                    let (lock, cvar) = &*cb_pending;
                    let mut queue = lock.lock().unwrap();
                    for frame in data.chunks_mut(channels as usize) {
                        let sample = queue.pop_front().unwrap_or(0.0);
                        for out in frame {
                            *out = sample;
                        }
                    }
                    if queue.is_empty() {
                        cvar.notify_all();
                    }
                },
                |err| log::warn!("audio playback stream error: {err}"),
                None,
            )
            .map_err(|e| OpenError::BuildStream(e.to_string()))?;
        stream.play().map_err(|e| OpenError::PlayStream(e.to_string()))?;

        Ok(Playback { _stream: stream, pending })
    }
}

impl AudioPlayback for Playback {
    fn write_samples(&mut self, samples: &[f32]) -> Result<(), PlaybackError> {
        let (lock, cvar) = &*self.pending;
        {
            let mut queue = lock.lock().unwrap();
            queue.extend(samples.iter().copied());
        }
        let guard = lock.lock().unwrap();
        let _unused = cvar.wait_while(guard, |queue| !queue.is_empty()).unwrap();
        Ok(())
    }
}
