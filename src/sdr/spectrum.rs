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

//! Conversion of complex baseband samples into a centred magnitude spectrum.

use num_complex::Complex;
use rustfft::FftPlanner;

/// Centred magnitude spectrum of one block of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeSpectrum {
    /// Offset of each bin from the tuned frequency, in MHz.
    pub offsets_mhz: Vec<f64>,
    /// Normalised magnitude of each bin.
    pub magnitudes: Vec<f64>,
}

/// Compute the FFT of `samples` and reorder it so the zero-offset bin sits in
/// the middle.
///
/// Negative offsets come first, then zero, then positive offsets, matching
/// the layout the sweep assembler expects. The zero bin's offset is exactly
/// `0.0`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    reason = "FFT sizes are far below the precision limits of f64 and isize"
)]
pub fn magnitude_spectrum(samples: &[Complex<f64>], sample_rate_hz: f64) -> MagnitudeSpectrum {
    let n = samples.len();
    if n == 0 {
        return MagnitudeSpectrum {
            offsets_mhz: Vec::new(),
            magnitudes: Vec::new(),
        };
    }

    let mut buffer = samples.to_vec();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    // DC moves from index 0 to index n/2
    buffer.rotate_right(n / 2);

    let bin_width_mhz = sample_rate_hz / n as f64 / 1e6;
    let offsets_mhz = (0..n)
        .map(|j| (j as isize - (n / 2) as isize) as f64 * bin_width_mhz)
        .collect();
    let magnitudes = buffer.iter().map(|c| c.norm() / n as f64).collect();

    MagnitudeSpectrum {
        offsets_mhz,
        magnitudes,
    }
}
