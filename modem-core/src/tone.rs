use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex32, Fft, FftPlanner};

use modem_protocol::symbol::Symbol;
use modem_protocol::{CHUNK_SIZE, FREQ_DELIMITER, FREQ_ONE, FREQ_ZERO, SAMPLE_RATE, TOLERANCE};

/// Synthesizes and classifies tones. Stateless beyond a cached FFT plan,
/// since `rustfft` amortizes planning cost across calls of the same size.
pub struct ToneCodec {
    fft: Arc<dyn Fft<f32>>,
}

impl Default for ToneCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneCodec {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        ToneCodec {
            fft: planner.plan_fft_forward(CHUNK_SIZE),
        }
    }

    /// Returns a sampled sinusoid of frequency `freq` Hz and duration
    /// `duration` seconds, at the protocol's fixed sample rate, amplitude
    /// in `[-1.0, 1.0]`.
    pub fn synthesize(&self, freq: f32, duration: f32) -> Vec<f32> {
        let sample_count = (SAMPLE_RATE as f32 * duration).round() as usize;
        let step = 2.0 * PI * freq / SAMPLE_RATE as f32;
        (0..sample_count).map(|n| (step * n as f32).sin()).collect()
    }

    /// Classifies a captured chunk of exactly [`CHUNK_SIZE`] integer PCM
    /// samples by locating the dominant frequency bin in the first half of
    /// the spectrum and comparing it against the three known tones within
    /// [`TOLERANCE`] Hz. A buffer of the wrong length is a programmer
    /// error, not a runtime condition to recover from.
    pub fn classify(&self, frame: &[i16]) -> Symbol {
        assert_eq!(
            frame.len(),
            CHUNK_SIZE,
            "classify requires exactly {CHUNK_SIZE} samples, got {}",
            frame.len()
        );

        let mut spectrum: Vec<Complex32> = frame
            .iter()
            .map(|&sample| Complex32::new(sample as f32, 0.0))
            .collect();
        self.fft.process(&mut spectrum);

        let half = spectrum.len() / 2;
        let (peak_index, _) = spectrum[..half]
            .iter()
            .map(|c| c.norm())
            .enumerate()
            .fold((0usize, f32::MIN), |best, (i, mag)| {
                if mag > best.1 {
                    (i, mag)
                } else {
                    best
                }
            });

        let freq = peak_index as f32 * SAMPLE_RATE as f32 / spectrum.len() as f32;

        if (freq - FREQ_ZERO).abs() < TOLERANCE {
            Symbol::Zero
        } else if (freq - FREQ_ONE).abs() < TOLERANCE {
            Symbol::One
        } else if (freq - FREQ_DELIMITER).abs() < TOLERANCE {
            Symbol::Delimiter
        } else {
            Symbol::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_i16(samples: &[f32]) -> Vec<i16> {
        samples.iter().map(|&s| (s * i16::MAX as f32) as i16).collect()
    }

    #[test]
    fn classifies_each_tone() {
        let codec = ToneCodec::new();
        for (freq, expected) in [
            (FREQ_ZERO, Symbol::Zero),
            (FREQ_ONE, Symbol::One),
            (FREQ_DELIMITER, Symbol::Delimiter),
        ] {
            let samples = codec.synthesize(freq, 0.2);
            let pcm = to_i16(&samples);
            assert_eq!(codec.classify(&pcm), expected);
        }
    }

    #[test]
    fn classifies_off_tone_as_none() {
        let codec = ToneCodec::new();
        let samples = codec.synthesize(2000.0, 0.2);
        let pcm = to_i16(&samples);
        assert_eq!(codec.classify(&pcm), Symbol::None);
    }

    #[test]
    #[should_panic]
    fn classify_panics_on_wrong_length() {
        let codec = ToneCodec::new();
        codec.classify(&[0i16; 10]);
    }
}
