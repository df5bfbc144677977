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

//! Error taxonomy shared by every layer of the sweep core.

use thiserror::Error;

use crate::measurement::Frequency;

/// Ways a single-frequency measurement can break the data contract the
/// assembler relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// The frequency-domain offsets contain no exact zero.
    MissingCenterBin,
    /// The frequency-domain offsets contain more than one exact zero.
    CenterBinNotUnique,
    /// `fdx` and `fdy` differ in length.
    FrequencyDomainLength { fdx: usize, fdy: usize },
    /// `tdx` and `tdy` differ in length.
    TimeDomainLength { tdx: usize, tdy: usize },
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCenterBin => write!(f, "no zero-offset sample"),
            Self::CenterBinNotUnique => write!(f, "more than one zero-offset sample"),
            Self::FrequencyDomainLength { fdx, fdy } => {
                write!(f, "frequency domain has {fdx} offsets but {fdy} amplitudes")
            }
            Self::TimeDomainLength { tdx, tdy } => {
                write!(f, "time domain has {tdx} timestamps but {tdy} samples")
            }
        }
    }
}

/// Errors surfaced by plan construction, sweep bookkeeping and assembly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("invalid sweep plan: {0}")]
    InvalidPlan(&'static str),

    #[error("measurement at {0} does not belong to the current sweep plan")]
    UnknownFrequency(Frequency),

    #[error("measurement at {0} was already recorded in this sweep")]
    DuplicateMeasurement(Frequency),

    #[error("malformed measurement at {frequency}: {kind}")]
    MalformedMeasurement {
        frequency: Frequency,
        kind: MalformedKind,
    },
}
