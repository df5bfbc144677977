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

//! Sweep planning: turns a frequency range and step into target frequencies.

use crate::error::SweepError;
use crate::measurement::Frequency;

/// Fraction of a step within which `stop` counts as landing on the grid.
const GRID_TOLERANCE: f64 = 1e-9;
/// Upper bound on plan size, far above any practical sweep.
const MAX_PLAN_POINTS: usize = 1_000_000;

/// Frequency range and step of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    /// Lowest frequency to measure.
    pub start: Frequency,
    /// Highest frequency that must be covered.
    pub stop: Frequency,
    /// Spacing between measurements; also the width of each assembled segment.
    pub step: Frequency,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: Frequency::from_hz(30e6),
            stop: Frequency::from_hz(200e6),
            step: Frequency::from_hz(0.1e6),
        }
    }
}

impl SweepConfig {
    /// Build the plan described by this configuration.
    pub fn plan(&self) -> Result<SweepPlan, SweepError> {
        SweepPlan::build(self.start, self.stop, self.step)
    }
}

/// Ordered list of target frequencies for one sweep.
///
/// Frequencies start at `start` and advance by `step` until the first grid
/// point at or above `stop`, so the plan always covers the closed interval
/// `[start, stop]` and may overshoot `stop` by less than one step.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    frequencies: Vec<Frequency>,
    step: Frequency,
}

impl SweepPlan {
    /// Build a plan for `[start, stop]` with the given step.
    pub fn build(start: Frequency, stop: Frequency, step: Frequency) -> Result<Self, SweepError> {
        if !start.hz().is_finite() || !stop.hz().is_finite() || !step.hz().is_finite() {
            return Err(SweepError::InvalidPlan("frequencies must be finite"));
        }
        if step.hz() <= 0.0 {
            return Err(SweepError::InvalidPlan("step must be positive"));
        }
        if start.hz() <= 0.0 {
            return Err(SweepError::InvalidPlan("start frequency must be positive"));
        }
        if start.hz() > stop.hz() {
            return Err(SweepError::InvalidPlan("start frequency exceeds stop frequency"));
        }

        // Step arithmetic in floating point rarely lands exactly on `stop`;
        // treat near-integer spans as exact so no spurious point is added.
        let span = (stop.hz() - start.hz()) / step.hz();
        let nearest = span.round();
        let steps = if (span - nearest).abs() <= GRID_TOLERANCE {
            nearest
        } else {
            span.ceil()
        };

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "steps is a non-negative whole number checked against MAX_PLAN_POINTS"
        )]
        let frequencies = {
            if steps >= MAX_PLAN_POINTS as f64 {
                return Err(SweepError::InvalidPlan("step too small for frequency range"));
            }
            let count = steps as usize + 1;
            (0..count)
                .map(|i| Frequency::from_hz(start.hz() + i as f64 * step.hz()))
                .collect()
        };

        Ok(Self { frequencies, step })
    }

    /// Target frequencies in ascending order.
    #[must_use]
    pub fn frequencies(&self) -> &[Frequency] {
        &self.frequencies
    }

    /// Spacing between adjacent target frequencies.
    #[must_use]
    pub fn step(&self) -> Frequency {
        self.step
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}
