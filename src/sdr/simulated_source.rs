// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simulated acquisition for sweeps without hardware.
//!
//! Produces a decaying complex resonance at a fixed line frequency, mixed
//! down to the tuned frequency, plus a deterministic noise floor. Results
//! are delivered on a background task after a short latency, the same way a
//! hardware receiver reports back.

use std::f64::consts::PI;
use std::time::Duration;

use log::{debug, warn};
use num_complex::Complex;
use sweep_core::{Acquisition, Frequency, SingleFrequencyMeasurement};
use tokio::sync::mpsc;

use crate::config::SimulationConfig;
use crate::sdr::spectrum::magnitude_spectrum;

/// Acquisition collaborator backed by synthetic signals.
#[derive(Debug)]
pub struct SimulatedAcquisition {
    config: SimulationConfig,
    tuned: Option<Frequency>,
    results_tx: mpsc::Sender<SingleFrequencyMeasurement>,
}

impl SimulatedAcquisition {
    /// Create a simulated receiver that sends results to `results_tx`.
    #[must_use]
    pub fn new(config: SimulationConfig, results_tx: mpsc::Sender<SingleFrequencyMeasurement>) -> Self {
        Self {
            config,
            tuned: None,
            results_tx,
        }
    }
}

impl Acquisition for SimulatedAcquisition {
    fn set_frequency(&mut self, frequency: Frequency) {
        self.tuned = Some(frequency);
    }

    fn start_measurement(&mut self) {
        let Some(frequency) = self.tuned else {
            warn!("Measurement started before a frequency was set, ignoring");
            return;
        };

        let config = self.config.clone();
        let tx = self.results_tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
            let measurement = simulate(&config, frequency);
            debug!("Simulated measurement at {} ready", frequency);
            if tx.send(measurement).await.is_err() {
                warn!("Sweep stopped listening, dropping measurement at {}", frequency);
            }
        });
    }
}

/// Synthesise one measurement at the tuned frequency.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "sample indices are far below f64 precision limits"
)]
pub fn simulate(config: &SimulationConfig, tuned: Frequency) -> SingleFrequencyMeasurement {
    let sample_rate_hz = config.sample_rate_mhz * 1e6;
    let dwell_us = 1e6 / sample_rate_hz;
    let offset_hz = config.line_frequency_mhz * 1e6 - tuned.hz();

    let tdx: Vec<f64> = (0..config.fft_size).map(|i| i as f64 * dwell_us).collect();
    let samples: Vec<Complex<f64>> = tdx
        .iter()
        .enumerate()
        .map(|(i, &t_us)| {
            let t = t_us * 1e-6;
            let envelope = (-t_us / config.decay_time_us).exp();
            let signal = Complex::from_polar(envelope, 2.0 * PI * offset_hz * t);
            signal + config.noise_level * pseudo_noise(tuned, i)
        })
        .collect();

    let tdy = samples.iter().map(|c| c.re).collect();
    let spectrum = magnitude_spectrum(&samples, sample_rate_hz);

    SingleFrequencyMeasurement::new(tuned, tdx, tdy, spectrum.offsets_mhz, spectrum.magnitudes)
}

/// Repeatable noise sample in `[-0.5, 0.5)` for both quadratures.
#[allow(
    clippy::cast_precision_loss,
    reason = "sample indices are far below f64 precision limits"
)]
fn pseudo_noise(tuned: Frequency, index: usize) -> Complex<f64> {
    let seed = index as f64 * 12.9898 + tuned.mhz() * 78.233;
    let re = (seed.sin() * 43_758.545_3).fract().abs() - 0.5;
    let im = (seed.cos() * 24_634.634_1).fract().abs() - 0.5;
    Complex::new(re, im)
}
