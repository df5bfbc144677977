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

//! Broadband spectrum assembly.
//!
//! Every filled slot contributes a three-point segment cut from its
//! frequency-domain data: the amplitudes at half a step below the target
//! frequency, at the target frequency itself and half a step above it.
//! Segments are stitched edge to edge in ascending frequency order. The
//! composite is rebuilt from scratch on every pass.

use log::debug;

use crate::error::SweepError;
use crate::measurement::{Frequency, SingleFrequencyMeasurement};
use crate::state::SweepState;

/// One point of a spectrum: absolute frequency in hertz and amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    pub frequency: f64,
    pub amplitude: f64,
}

/// The three-point slice extracted from a single measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub lower: SpectrumPoint,
    pub center: SpectrumPoint,
    pub upper: SpectrumPoint,
}

/// Stitched spectrum spanning every measurement assembled so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeSpectrum {
    fdx: Vec<f64>,
    fdy: Vec<f64>,
}

impl CompositeSpectrum {
    /// Absolute frequencies in hertz.
    #[must_use]
    pub fn fdx(&self) -> &[f64] {
        &self.fdx
    }

    /// Amplitudes matching [`Self::fdx`].
    #[must_use]
    pub fn fdy(&self) -> &[f64] {
        &self.fdy
    }

    pub fn points(&self) -> impl Iterator<Item = SpectrumPoint> + '_ {
        self.fdx
            .iter()
            .zip(&self.fdy)
            .map(|(&frequency, &amplitude)| SpectrumPoint {
                frequency,
                amplitude,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fdx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fdx.is_empty()
    }

    fn push(&mut self, point: SpectrumPoint) {
        self.fdx.push(point.frequency);
        self.fdy.push(point.amplitude);
    }

    /// Merge the trailing point into the lower edge of the next segment.
    ///
    /// The trailing point takes the edge frequency and the mean of both
    /// amplitudes; the edge itself is still appended by the caller.
    fn blend_tail(&mut self, edge: SpectrumPoint) {
        if let (Some(x), Some(y)) = (self.fdx.last_mut(), self.fdy.last_mut()) {
            *y = (*y + edge.amplitude) / 2.0;
            *x = edge.frequency;
        }
    }
}

/// Builds [`CompositeSpectrum`]s from completed measurements.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumAssembler {
    offset_unit: Frequency,
}

impl Default for SpectrumAssembler {
    fn default() -> Self {
        Self::new(Frequency::MHZ)
    }
}

impl SpectrumAssembler {
    /// Create an assembler for measurements whose `fdx` offsets are expressed
    /// in multiples of `offset_unit` (megahertz by default).
    #[must_use]
    pub fn new(offset_unit: Frequency) -> Self {
        Self { offset_unit }
    }

    /// Assemble every filled slot of a sweep.
    pub fn assemble(&self, state: &SweepState) -> Result<CompositeSpectrum, SweepError> {
        self.assemble_measurements(state.filled(), state.step())
    }

    /// Assemble measurements that are already in ascending frequency order.
    ///
    /// A single malformed measurement fails the whole pass.
    pub fn assemble_measurements<'a, I>(
        &self,
        measurements: I,
        step: Frequency,
    ) -> Result<CompositeSpectrum, SweepError>
    where
        I: IntoIterator<Item = &'a SingleFrequencyMeasurement>,
    {
        let mut composite = CompositeSpectrum::default();

        for measurement in measurements {
            let segment = self.segment(measurement, step)?;

            composite.blend_tail(segment.lower);
            composite.push(segment.lower);
            composite.push(segment.center);
            composite.push(segment.upper);
        }

        Ok(composite)
    }

    /// Cut the three-point segment around a measurement's center bin.
    pub fn segment(
        &self,
        measurement: &SingleFrequencyMeasurement,
        step: Frequency,
    ) -> Result<Segment, SweepError> {
        let center = measurement.center_bin()?;
        let fdx = measurement.fdx();
        let fdy = measurement.fdy();

        let half = step.hz() / 2.0;
        let half_offset = half / self.offset_unit.hz();

        let idx_lower = nearest_index(fdx, -half_offset);
        let idx_upper = nearest_index(fdx, half_offset);

        let center_point = (fdx[center], fdy[center]);
        let lower_point = (fdx[idx_lower], fdy[idx_lower]);

        let y_lower = interpolate(-half_offset, lower_point, center_point);
        // The upper edge is taken from the lower neighbour as well, which
        // always lands past the last point and yields its amplitude.
        // Downstream consumers rely on this shape.
        let y_upper = interpolate(half_offset, center_point, lower_point);

        debug!(
            "Segment at {}: center bin {}, edge bins {}/{}",
            measurement.target_frequency(),
            center,
            idx_lower,
            idx_upper
        );

        let target = measurement.target_frequency().hz();
        Ok(Segment {
            lower: SpectrumPoint {
                frequency: target - half,
                amplitude: y_lower,
            },
            center: SpectrumPoint {
                frequency: target,
                amplitude: fdy[center],
            },
            upper: SpectrumPoint {
                frequency: target + half,
                amplitude: y_upper,
            },
        })
    }
}

/// Index of the value closest to `target`; ties go to the lower index.
fn nearest_index(values: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, value) in values.iter().enumerate() {
        let distance = (value - target).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}

/// Linear interpolation through two points taken in the given order.
///
/// Below the first abscissa the first amplitude is returned, at or beyond the
/// second abscissa the second amplitude. The points are never reordered, so a
/// descending pair always yields one of its endpoint amplitudes.
fn interpolate(x: f64, (x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> f64 {
    if x < x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    // x0 <= x < x1, so the span is non-zero
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedKind;
    use crate::plan::SweepPlan;
    use approx::assert_relative_eq;

    fn measurement(mhz: f64, fdx: &[f64], fdy: &[f64]) -> SingleFrequencyMeasurement {
        SingleFrequencyMeasurement::new(
            Frequency::from_mhz(mhz),
            Vec::new(),
            Vec::new(),
            fdx.to_vec(),
            fdy.to_vec(),
        )
    }

    #[test]
    fn test_nearest_index_prefers_lower_on_tie() {
        assert_eq!(nearest_index(&[-0.2, -0.1, 0.0, 0.1], -0.05), 1);
        assert_eq!(nearest_index(&[-0.1, 0.0, 0.1], -0.05), 0);
        assert_eq!(nearest_index(&[-0.2, 0.0, 0.2], 0.05), 1);
    }

    #[test]
    fn test_interpolate() {
        assert_relative_eq!(interpolate(-0.5, (-1.0, 2.0), (0.0, 4.0)), 3.0);
        assert_relative_eq!(interpolate(0.5, (-1.0, 2.0), (0.0, 4.0)), 4.0);
        assert_relative_eq!(interpolate(-2.0, (-1.0, 2.0), (0.0, 4.0)), 2.0);
        assert_relative_eq!(interpolate(-1.0, (-1.0, 2.0), (0.0, 4.0)), 2.0);
    }

    #[test]
    fn test_interpolate_keeps_point_order() {
        // Descending pair: past the last abscissa gives the last amplitude
        assert_relative_eq!(interpolate(0.5, (0.0, 4.0), (-1.0, 2.0)), 2.0);
        assert_relative_eq!(interpolate(-0.5, (0.0, 4.0), (-1.0, 2.0)), 4.0);
        assert_relative_eq!(interpolate(0.3, (0.0, 7.0), (0.0, 9.0)), 9.0);
        assert_relative_eq!(interpolate(-0.3, (0.0, 7.0), (0.0, 9.0)), 7.0);
    }

    #[test]
    fn test_single_measurement_yields_three_points() {
        let step = Frequency::from_mhz(0.1);
        let m = measurement(30.0, &[-0.1, -0.05, 0.0, 0.05, 0.1], &[1.0, 3.0, 5.0, 3.0, 1.0]);

        let composite = SpectrumAssembler::default()
            .assemble_measurements([&m], step)
            .unwrap();

        assert_eq!(composite.len(), 3);
        assert_relative_eq!(composite.fdx()[0], 30e6 - 0.05e6);
        assert_relative_eq!(composite.fdx()[1], 30e6);
        assert_relative_eq!(composite.fdx()[2], 30e6 + 0.05e6);
        assert_relative_eq!(composite.fdy()[0], 3.0);
        assert_relative_eq!(composite.fdy()[1], 5.0);
        assert_relative_eq!(composite.fdy()[2], 3.0);
    }

    #[test]
    fn test_upper_edge_follows_lower_neighbour() {
        let step = Frequency::from_mhz(0.1);
        let fdx = [-0.1, -0.05, 0.0, 0.05, 0.1];
        let assembler = SpectrumAssembler::default();

        for neighbour in [3.0, 100.0] {
            let m = measurement(30.0, &fdx, &[1.0, neighbour, 5.0, 3.0, 1.0]);
            let segment = assembler.segment(&m, step).unwrap();
            assert_relative_eq!(segment.lower.amplitude, neighbour);
            assert_relative_eq!(segment.center.amplitude, 5.0);
            assert_relative_eq!(segment.upper.amplitude, neighbour);
        }
    }

    #[test]
    fn test_lower_edge_outside_bracket_takes_neighbour() {
        let step = Frequency::from_mhz(0.1);
        // 2 MHz over 256 bins: the bin nearest -0.05 MHz is -0.046875 MHz
        let bin = 2.0 / 256.0;
        let fdx: Vec<f64> = (-8..=8).map(|k| f64::from(k) * bin).collect();
        let fdy: Vec<f64> = (-8..=8).map(|k| 10.0 + f64::from(k)).collect();
        let m = measurement(100.0, &fdx, &fdy);

        let segment = SpectrumAssembler::default().segment(&m, step).unwrap();
        assert_relative_eq!(fdx[2], -0.046_875);
        assert_relative_eq!(segment.lower.amplitude, fdy[2]);
        assert_relative_eq!(segment.center.amplitude, 10.0);
        assert_relative_eq!(segment.upper.amplitude, fdy[2]);
    }

    #[test]
    fn test_lower_edge_interpolated_between_bins() {
        let step = Frequency::from_mhz(0.1);
        // Nearest bin to -0.05 is -0.08; the edge lies between it and the center.
        let m = measurement(100.0, &[-0.16, -0.08, 0.0, 0.08, 0.16], &[0.0, 2.0, 6.0, 2.0, 0.0]);

        let segment = SpectrumAssembler::default().segment(&m, step).unwrap();
        assert_relative_eq!(segment.lower.amplitude, 2.0 + (0.03 / 0.08) * 4.0, epsilon = 1e-9);
        assert_relative_eq!(segment.center.amplitude, 6.0);
        assert_relative_eq!(segment.upper.amplitude, 2.0);
        assert_relative_eq!(segment.lower.frequency, 99.95e6, max_relative = 1e-12);
        assert_relative_eq!(segment.upper.frequency, 100.05e6, max_relative = 1e-12);
    }

    #[test]
    fn test_adjacent_measurements_blend_boundary() {
        let step = Frequency::from_mhz(0.1);
        let first = measurement(30.0, &[-0.2, 0.0, 0.2], &[1.0, 2.0, 3.0]);
        let second = measurement(30.1, &[-0.2, 0.0, 0.2], &[4.0, 5.0, 6.0]);

        let assembler = SpectrumAssembler::default();
        let before = assembler.segment(&first, step).unwrap();
        let next = assembler.segment(&second, step).unwrap();
        let composite = assembler
            .assemble_measurements([&first, &second], step)
            .unwrap();

        assert_eq!(composite.len(), 6);
        assert_eq!(composite.fdx().len(), composite.fdy().len());
        assert_relative_eq!(composite.fdx()[2], composite.fdx()[3]);
        assert_relative_eq!(
            composite.fdy()[2],
            (before.upper.amplitude + next.lower.amplitude) / 2.0
        );
        assert_relative_eq!(composite.fdy()[3], next.lower.amplitude);
        assert_relative_eq!(composite.fdy()[2], 3.5);
        assert!(composite.fdx().windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_assemble_from_state_in_frequency_order() {
        let plan = SweepPlan::build(
            Frequency::from_mhz(30.0),
            Frequency::from_mhz(30.2),
            Frequency::from_mhz(0.1),
        )
        .unwrap();
        let mut state = SweepState::new(&plan);
        let fdx = [-0.1, -0.05, 0.0, 0.05, 0.1];

        for (idx, &frequency) in plan.frequencies().iter().enumerate().rev() {
            #[allow(clippy::cast_precision_loss, reason = "small test index")]
            let level = idx as f64;
            state
                .record(SingleFrequencyMeasurement::new(
                    frequency,
                    Vec::new(),
                    Vec::new(),
                    fdx.to_vec(),
                    vec![level; fdx.len()],
                ))
                .unwrap();
        }

        let composite = SpectrumAssembler::default().assemble(&state).unwrap();
        assert_eq!(composite.len(), 9);
        assert!(composite.fdx().windows(2).all(|pair| pair[0] <= pair[1]));
        assert_relative_eq!(composite.fdy()[1], 0.0);
        assert_relative_eq!(composite.fdy()[2], 0.5);
        assert_relative_eq!(composite.fdy()[5], 1.5);
        assert_relative_eq!(composite.fdy()[7], 2.0);
    }

    #[test]
    fn test_partial_state_assembles_filled_slots_only() {
        let plan = SweepPlan::build(
            Frequency::from_mhz(30.0),
            Frequency::from_mhz(30.3),
            Frequency::from_mhz(0.1),
        )
        .unwrap();
        let mut state = SweepState::new(&plan);
        state
            .record(measurement(30.0, &[-0.05, 0.0, 0.05], &[1.0, 1.0, 1.0]))
            .unwrap();

        let composite = SpectrumAssembler::default().assemble(&state).unwrap();
        assert_eq!(composite.len(), 3);
        assert_eq!(composite.points().count(), 3);
    }

    #[test]
    fn test_missing_center_bin_fails_assembly() {
        let step = Frequency::from_mhz(0.1);
        let good = measurement(30.0, &[-0.2, 0.0, 0.2], &[1.0, 2.0, 3.0]);
        let bad = measurement(30.1, &[-0.2, 0.1, 0.2], &[1.0, 2.0, 3.0]);

        let err = SpectrumAssembler::default()
            .assemble_measurements([&good, &bad], step)
            .unwrap_err();
        assert_eq!(
            err,
            SweepError::MalformedMeasurement {
                frequency: Frequency::from_mhz(30.1),
                kind: MalformedKind::MissingCenterBin,
            }
        );
    }

    #[test]
    fn test_offset_unit_in_hertz() {
        let step = Frequency::from_hz(100_000.0);
        let m = measurement(30.0, &[-50_000.0, 0.0, 50_000.0], &[2.0, 4.0, 2.0]);

        let segment = SpectrumAssembler::new(Frequency::from_hz(1.0))
            .segment(&m, step)
            .unwrap();
        assert_relative_eq!(segment.lower.amplitude, 2.0);
        assert_relative_eq!(segment.upper.amplitude, 2.0);
    }
}
