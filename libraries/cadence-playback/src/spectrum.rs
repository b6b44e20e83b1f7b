//! Software frequency analyser
//!
//! A native stand-in for the browser's analyser node, used as the routing
//! graph of endpoints that decode audio themselves. The platform pushes the
//! mono mix of whatever it sends to the output; the visualizer reads byte
//! spectra with the same scaling the Web Audio API uses:
//!
//! 1. Blackman window over the last `fft_size` samples
//! 2. Magnitude of the first `fft_size / 2` bins, divided by `fft_size`
//! 3. Exponential smoothing against the previous frame
//! 4. Conversion to dB, mapped linearly from `min_decibels..max_decibels`
//!    onto 0-255

use crate::analysis::RoutingGraph;
use crate::engine::EngineFuture;
use crate::error::Result;
use crate::types::AnalyserSettings;
use futures::future::{self, FutureExt};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

struct AnalyserState {
    /// Ring buffer of the most recent samples
    samples: Vec<f32>,
    write_pos: usize,
    /// Smoothed linear magnitudes of the previous frame
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

/// FFT analyser fed with pushed PCM
pub struct SpectrumAnalyser {
    settings: AnalyserSettings,
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    state: RefCell<AnalyserState>,
    running: Cell<bool>,
}

impl SpectrumAnalyser {
    /// Fails with [`crate::PlaybackError::InvalidConfig`] for settings a
    /// browser analyser would reject
    pub fn new(settings: AnalyserSettings, sample_rate: u32) -> Result<Self> {
        settings.validate()?;
        let size = settings.fft_size as usize;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(size);

        Ok(Self {
            window: blackman_window(size),
            fft,
            state: RefCell::new(AnalyserState {
                samples: vec![0.0; size],
                write_pos: 0,
                smoothed: vec![0.0; size / 2],
                scratch: vec![Complex::new(0.0, 0.0); size],
            }),
            running: Cell::new(false),
            settings,
            sample_rate,
        })
    }

    /// Feed mono samples in playback order
    pub fn push_samples(&self, samples: &[f32]) {
        let mut state = self.state.borrow_mut();
        let size = state.samples.len();
        for &sample in samples {
            let pos = state.write_pos;
            state.samples[pos] = sample;
            state.write_pos = (pos + 1) % size;
        }
    }

    /// Feed interleaved frames, mixed down to mono
    pub fn push_interleaved(&self, samples: &[f32], channels: usize) {
        if channels <= 1 {
            self.push_samples(samples);
            return;
        }
        let mono: Vec<f32> = samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        self.push_samples(&mono);
    }

    /// Whether `resume` has been called
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Centre frequency of `bin` in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.settings.fft_size as f32
    }

    /// Analyse the buffered samples and update the smoothed frame
    fn analyse(&self, state: &mut AnalyserState) {
        let size = state.samples.len();
        let AnalyserState {
            samples,
            write_pos,
            smoothed,
            scratch,
        } = state;

        // Oldest sample first
        for (i, slot) in scratch.iter_mut().enumerate() {
            let sample = samples[(*write_pos + i) % size];
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(scratch);

        let smoothing = self.settings.smoothing as f32;
        let scale = 1.0 / size as f32;
        for (bin, value) in smoothed.iter_mut().enumerate() {
            let magnitude = scratch[bin].norm() * scale;
            *value = smoothing * *value + (1.0 - smoothing) * magnitude;
        }
    }

    fn to_byte(&self, magnitude: f32) -> u8 {
        let min = self.settings.min_decibels;
        let max = self.settings.max_decibels;
        if magnitude <= 0.0 {
            return 0;
        }
        let db = 20.0 * f64::from(magnitude).log10();
        let scaled = (255.0 / (max - min) * (db - min)).floor();
        scaled.clamp(0.0, 255.0) as u8
    }
}

impl RoutingGraph for SpectrumAnalyser {
    fn resume(&self) -> EngineFuture {
        self.running.set(true);
        future::ready(Ok(())).boxed_local()
    }

    fn frequency_bin_count(&self) -> usize {
        self.settings.frequency_bin_count()
    }

    fn byte_frequency_data(&self, out: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        self.analyse(&mut state);
        for (byte, &magnitude) in out.iter_mut().zip(state.smoothed.iter()) {
            *byte = self.to_byte(magnitude);
        }
    }
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("settings", &self.settings)
            .field("sample_rate", &self.sample_rate)
            .field("running", &self.running.get())
            .finish()
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..size)
        .map(|n| {
            let x = n as f32 / size as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn analyser(fft_size: u32, smoothing: f64) -> SpectrumAnalyser {
        SpectrumAnalyser::new(
            AnalyserSettings {
                fft_size,
                smoothing,
                ..Default::default()
            },
            48000,
        )
        .unwrap()
    }

    fn sine(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn silence_reads_as_zero() {
        let analyser = analyser(256, 0.0);
        let mut bins = vec![0xffu8; 128];
        analyser.byte_frequency_data(&mut bins);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let analyser = analyser(1024, 0.0);
        // 48000 / 1024 = 46.875 Hz per bin; bin 64 = 3000 Hz. Quiet enough
        // that the main lobe stays below the 255 ceiling.
        let quiet: Vec<f32> = sine(3000.0, 48000, 1024).iter().map(|s| s * 0.01).collect();
        analyser.push_samples(&quiet);

        let mut bins = vec![0u8; 512];
        analyser.byte_frequency_data(&mut bins);

        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 64);
        assert!(bins[64] > bins[63]);
        assert!(bins[64] > bins[65]);
        assert!(bins[300] < bins[64]);
        assert_eq!(analyser.bin_frequency(64), 3000.0);
    }

    #[test]
    fn smoothing_decays_towards_new_frame() {
        let analyser = analyser(512, 0.8);
        analyser.push_samples(&sine(6000.0, 48000, 512));

        let mut first = vec![0u8; 256];
        analyser.byte_frequency_data(&mut first);
        let mut second = vec![0u8; 256];
        analyser.byte_frequency_data(&mut second);

        // 6000 Hz is bin 64 at 93.75 Hz per bin; the smoothed value grows
        assert!(second[64] >= first[64]);
    }

    #[test]
    fn short_output_buffer_gets_leading_bins() {
        let short = analyser(64, 0.0);
        // 750 Hz per bin; 1500 Hz lands on bin 2
        let quiet: Vec<f32> = sine(1500.0, 48000, 64).iter().map(|s| s * 0.01).collect();
        short.push_samples(&quiet);
        assert_eq!(short.frequency_bin_count(), 32);

        let mut bins = [0u8; 4];
        short.byte_frequency_data(&mut bins);
        assert!(bins[2] > 0);
        assert!(bins[2] > bins[0]);

        // Same frame through a full-size buffer agrees on the shared prefix
        let reference = analyser(64, 0.0);
        reference.push_samples(&quiet);
        let mut full = vec![0u8; 32];
        reference.byte_frequency_data(&mut full);
        assert_eq!(&full[..4], &bins[..]);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        for fft_size in [0, 100, 16, 65536] {
            let settings = AnalyserSettings {
                fft_size,
                ..Default::default()
            };
            assert!(matches!(
                SpectrumAnalyser::new(settings, 48000),
                Err(crate::PlaybackError::InvalidConfig(_))
            ));
        }

        let settings = AnalyserSettings {
            min_decibels: f64::NAN,
            ..Default::default()
        };
        assert!(SpectrumAnalyser::new(settings, 48000).is_err());
    }

    #[test]
    fn interleaved_input_is_mixed_down() {
        let analyser = analyser(64, 0.0);
        analyser.push_interleaved(&[1.0, -1.0, 0.5, 0.5], 2);
        let state = analyser.state.borrow();
        assert_eq!(state.samples[0], 0.0);
        assert_eq!(state.samples[1], 0.5);
        assert_eq!(state.write_pos, 2);
    }

    #[test]
    fn resume_marks_running() {
        let analyser = analyser(64, 0.0);
        assert!(!analyser.is_running());
        block_on(analyser.resume()).unwrap();
        assert!(analyser.is_running());
    }
}
