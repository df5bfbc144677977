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

//! SDR (Software Defined Radio) module for single-frequency acquisition.
//!
//! This module provides:
//! - FFT computation of baseband blocks into centred magnitude spectra
//! - A simulated receiver implementing the sweep acquisition contract

pub mod simulated_source;
pub mod spectrum;

pub use simulated_source::SimulatedAcquisition;
