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

//! Frequencies and the single-frequency measurement produced by acquisition.
//!
//! A measurement is created once per sweep step by the acquisition
//! collaborator and never changes afterwards. Its frequency-domain offsets
//! are relative to the target frequency and must contain exactly one zero
//! (the center bin).

use crate::error::{MalformedKind, SweepError};

const HZ_PER_MHZ: f64 = 1e6;

/// A frequency in hertz.
///
/// Hertz is the storage unit everywhere in the core; megahertz accessors
/// exist for display and user input only.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Frequency(f64);

impl Frequency {
    /// One megahertz.
    pub const MHZ: Self = Self(HZ_PER_MHZ);

    #[must_use]
    pub const fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    #[must_use]
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * HZ_PER_MHZ)
    }

    #[must_use]
    pub const fn hz(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn mhz(self) -> f64 {
        self.0 / HZ_PER_MHZ
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} MHz", self.mhz())
    }
}

/// Result of one measurement at a single target frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleFrequencyMeasurement {
    target_frequency: Frequency,
    tdx: Vec<f64>,
    tdy: Vec<f64>,
    fdx: Vec<f64>,
    fdy: Vec<f64>,
}

impl SingleFrequencyMeasurement {
    /// Create a measurement from time-domain and frequency-domain samples.
    ///
    /// No validation happens here; [`Self::center_bin`] checks the contract
    /// when the measurement is assembled.
    #[must_use]
    pub fn new(
        target_frequency: Frequency,
        tdx: Vec<f64>,
        tdy: Vec<f64>,
        fdx: Vec<f64>,
        fdy: Vec<f64>,
    ) -> Self {
        Self {
            target_frequency,
            tdx,
            tdy,
            fdx,
            fdy,
        }
    }

    /// Frequency the acquisition was tuned to.
    #[must_use]
    pub fn target_frequency(&self) -> Frequency {
        self.target_frequency
    }

    /// Time axis of the time-domain samples.
    #[must_use]
    pub fn tdx(&self) -> &[f64] {
        &self.tdx
    }

    /// Time-domain amplitudes.
    #[must_use]
    pub fn tdy(&self) -> &[f64] {
        &self.tdy
    }

    /// Frequency offsets relative to the target frequency.
    #[must_use]
    pub fn fdx(&self) -> &[f64] {
        &self.fdx
    }

    /// Frequency-domain amplitudes.
    #[must_use]
    pub fn fdy(&self) -> &[f64] {
        &self.fdy
    }

    /// Check the array lengths and locate the zero-offset sample.
    ///
    /// Returns the index of the center bin in `fdx`.
    #[allow(
        clippy::float_cmp,
        reason = "the center bin is defined by an exact zero offset"
    )]
    pub fn center_bin(&self) -> Result<usize, SweepError> {
        let malformed = |kind| SweepError::MalformedMeasurement {
            frequency: self.target_frequency,
            kind,
        };

        if self.fdx.len() != self.fdy.len() {
            return Err(malformed(MalformedKind::FrequencyDomainLength {
                fdx: self.fdx.len(),
                fdy: self.fdy.len(),
            }));
        }
        if self.tdx.len() != self.tdy.len() {
            return Err(malformed(MalformedKind::TimeDomainLength {
                tdx: self.tdx.len(),
                tdy: self.tdy.len(),
            }));
        }

        let mut zeros = self
            .fdx
            .iter()
            .enumerate()
            .filter(|(_, offset)| **offset == 0.0)
            .map(|(idx, _)| idx);

        match (zeros.next(), zeros.next()) {
            (Some(center), None) => Ok(center),
            (Some(_), Some(_)) => Err(malformed(MalformedKind::CenterBinNotUnique)),
            (None, _) => Err(malformed(MalformedKind::MissingCenterBin)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(fdx: Vec<f64>, fdy: Vec<f64>) -> SingleFrequencyMeasurement {
        SingleFrequencyMeasurement::new(
            Frequency::from_mhz(30.0),
            vec![0.0, 1.0],
            vec![0.5, 0.25],
            fdx,
            fdy,
        )
    }

    #[test]
    fn test_frequency_unit_conversion() {
        let f = Frequency::from_mhz(30.1);
        assert!((f.hz() - 30_100_000.0).abs() < 1e-6);
        assert!((Frequency::from_hz(200e6).mhz() - 200.0).abs() < 1e-12);
        assert_eq!(Frequency::MHZ.hz(), 1e6);
        assert_eq!(format!("{}", Frequency::from_mhz(30.0)), "30.0000 MHz");
    }

    #[test]
    fn test_center_bin_found() {
        let m = measurement(vec![-0.2, 0.0, 0.2], vec![1.0, 2.0, 3.0]);
        assert_eq!(m.center_bin(), Ok(1));
    }

    #[test]
    fn test_center_bin_missing() {
        let m = measurement(vec![-0.2, 0.1, 0.2], vec![1.0, 2.0, 3.0]);
        assert_eq!(
            m.center_bin(),
            Err(SweepError::MalformedMeasurement {
                frequency: Frequency::from_mhz(30.0),
                kind: MalformedKind::MissingCenterBin,
            })
        );
    }

    #[test]
    fn test_center_bin_not_unique() {
        let m = measurement(vec![0.0, 0.0, 0.2], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            m.center_bin(),
            Err(SweepError::MalformedMeasurement {
                kind: MalformedKind::CenterBinNotUnique,
                ..
            })
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let m = measurement(vec![-0.2, 0.0, 0.2], vec![1.0, 2.0]);
        assert!(matches!(
            m.center_bin(),
            Err(SweepError::MalformedMeasurement {
                kind: MalformedKind::FrequencyDomainLength { fdx: 3, fdy: 2 },
                ..
            })
        ));

        let m = SingleFrequencyMeasurement::new(
            Frequency::from_mhz(30.0),
            vec![0.0],
            vec![],
            vec![0.0],
            vec![1.0],
        );
        assert!(matches!(
            m.center_bin(),
            Err(SweepError::MalformedMeasurement {
                kind: MalformedKind::TimeDomainLength { tdx: 1, tdy: 0 },
                ..
            })
        ));
    }
}
