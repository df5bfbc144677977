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

//! Application configuration management.
//!
//! Settings are stored in TOML format through `confy`. Frequencies are kept in
//! megahertz here because that is what users type; they are converted to
//! hertz when the sweep configuration is built.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sweep_core::{Frequency, SweepConfig};
use thiserror::Error;

const APP_NAME: &str = "broadband-sweep";
const CONFIG_NAME: &str = "config";

/// Lowest start frequency accepted, in MHz.
pub const MIN_FREQUENCY_MHZ: f64 = 30.0;
/// Highest stop frequency accepted, in MHz.
pub const MAX_FREQUENCY_MHZ: f64 = 200.0;

/// Errors from validating user-supplied sweep settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("frequency step must be positive, got {0} MHz")]
    InvalidStep(f64),

    #[error("start frequency {start} MHz is above stop frequency {stop} MHz")]
    InvertedRange { start: f64, stop: f64 },
}

/// Parameters of the simulated acquisition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Frequency of the simulated resonance line in MHz
    #[serde(default = "default_line_frequency")]
    pub line_frequency_mhz: f64,

    /// Decay time of the simulated signal in microseconds
    #[serde(default = "default_decay_time")]
    pub decay_time_us: f64,

    /// Receiver sample rate in MHz
    #[serde(default = "default_sample_rate")]
    pub sample_rate_mhz: f64,

    /// Number of samples per measurement (FFT size)
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    /// Relative noise amplitude added to every sample
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,

    /// Simulated acquisition latency per measurement in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_line_frequency() -> f64 {
    83.56
}

fn default_decay_time() -> f64 {
    50.0
}

fn default_sample_rate() -> f64 {
    2.0
}

fn default_fft_size() -> usize {
    256
}

fn default_noise_level() -> f64 {
    0.02
}

fn default_delay_ms() -> u64 {
    1
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            line_frequency_mhz: default_line_frequency(),
            decay_time_us: default_decay_time(),
            sample_rate_mhz: default_sample_rate(),
            fft_size: default_fft_size(),
            noise_level: default_noise_level(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Sweep start frequency in MHz
    #[serde(default = "default_start_frequency")]
    pub start_frequency_mhz: f64,

    /// Sweep stop frequency in MHz
    #[serde(default = "default_stop_frequency")]
    pub stop_frequency_mhz: f64,

    /// Sweep step in MHz
    #[serde(default = "default_frequency_step")]
    pub frequency_step_mhz: f64,

    /// Simulated acquisition settings
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_config_version() -> u32 {
    1
}

fn default_start_frequency() -> f64 {
    MIN_FREQUENCY_MHZ
}

fn default_stop_frequency() -> f64 {
    MAX_FREQUENCY_MHZ
}

fn default_frequency_step() -> f64 {
    0.1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            start_frequency_mhz: default_start_frequency(),
            stop_frequency_mhz: default_stop_frequency(),
            frequency_step_mhz: default_frequency_step(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, confy::ConfyError> {
        confy::load_path(path)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), confy::ConfyError> {
        confy::store_path(path, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Set the start frequency, raising it to the lower limit if needed
    pub fn set_start_frequency(&mut self, mhz: f64) {
        self.start_frequency_mhz = if mhz > MIN_FREQUENCY_MHZ {
            mhz
        } else {
            MIN_FREQUENCY_MHZ
        };
    }

    /// Set the stop frequency, lowering it to the upper limit if needed
    pub fn set_stop_frequency(&mut self, mhz: f64) {
        self.stop_frequency_mhz = if mhz < MAX_FREQUENCY_MHZ {
            mhz
        } else {
            MAX_FREQUENCY_MHZ
        };
    }

    /// Validate the stored settings and convert them to a sweep configuration.
    ///
    /// Values loaded from disk go through the same limits as the setters.
    pub fn sweep_config(&self) -> Result<SweepConfig, ConfigError> {
        let start = self.start_frequency_mhz.max(MIN_FREQUENCY_MHZ);
        let stop = self.stop_frequency_mhz.min(MAX_FREQUENCY_MHZ);
        let step = self.frequency_step_mhz;

        if step.is_nan() || step <= 0.0 {
            return Err(ConfigError::InvalidStep(step));
        }
        if start > stop {
            return Err(ConfigError::InvertedRange { start, stop });
        }

        Ok(SweepConfig {
            start: Frequency::from_mhz(start),
            stop: Frequency::from_mhz(stop),
            step: Frequency::from_mhz(step),
        })
    }
}
