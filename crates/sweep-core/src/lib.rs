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

//! Stepped-frequency sweep scheduling and broadband spectrum assembly.
//!
//! A broadband sweep measures a frequency range one target frequency at a
//! time and stitches the individually acquired spectra into one continuous
//! composite. This crate holds the pure data core of that process and the
//! calling contract it expects from its environment:
//!
//! - **Plan**: [`SweepPlan`] turns start, stop and step into target frequencies
//! - **State**: [`SweepState`] tracks pending and filled slots, progress and the
//!   most recent measurement
//! - **Assembly**: [`SpectrumAssembler`] rebuilds the [`CompositeSpectrum`] from
//!   every filled slot
//! - **Controller**: [`SweepController`] requests measurements through an
//!   [`Acquisition`] implementation and broadcasts [`SweepEvent`]s
//!
//! The core never talks to hardware or renders anything.
//!
//! # Example
//!
//! ```
//! use sweep_core::{Frequency, SingleFrequencyMeasurement, SpectrumAssembler, SweepPlan, SweepState};
//!
//! let plan = SweepPlan::build(
//!     Frequency::from_mhz(30.0),
//!     Frequency::from_mhz(30.1),
//!     Frequency::from_mhz(0.1),
//! )?;
//! let mut state = SweepState::new(&plan);
//!
//! while let Some(frequency) = state.next_pending() {
//!     state.record(SingleFrequencyMeasurement::new(
//!         frequency,
//!         vec![0.0, 1.0],
//!         vec![1.0, 0.5],
//!         vec![-0.2, 0.0, 0.2],
//!         vec![1.0, 2.0, 3.0],
//!     ))?;
//! }
//!
//! let spectrum = SpectrumAssembler::default().assemble(&state)?;
//! assert_eq!(spectrum.len(), 6);
//! # Ok::<(), sweep_core::SweepError>(())
//! ```

pub mod assembler;
pub mod controller;
pub mod error;
pub mod measurement;
pub mod plan;
pub mod state;

pub use assembler::{CompositeSpectrum, Segment, SpectrumAssembler, SpectrumPoint};
pub use controller::{
    run_sweep, Acquisition, ControllerConfig, SweepController, SweepEvent, SweepOutcome,
    SweepStep,
};
pub use error::{MalformedKind, SweepError};
pub use measurement::{Frequency, SingleFrequencyMeasurement};
pub use plan::{SweepConfig, SweepPlan};
pub use state::SweepState;
