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

//! Broadband sweep runner.
//!
//! Loads the sweep settings, drives a stepped-frequency sweep against the
//! simulated receiver and prints the stitched broadband spectrum as
//! `frequency_mhz amplitude` lines on stdout.

mod config;
mod sdr;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use config::AppConfig;
use log::{debug, error, info, warn};
use sdr::SimulatedAcquisition;
use status::{SharedSweepStatus, SweepStatus};
use sweep_core::{run_sweep, CompositeSpectrum, ControllerConfig, SweepController, SweepOutcome};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Number of in-flight measurement results buffered between receiver and sweep
const RESULT_CHANNEL_SIZE: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "broadband-sweep", version, about = "Stepped-frequency broadband spectrum sweep")]
struct Cli {
    /// Sweep start frequency in MHz
    #[arg(long)]
    start_mhz: Option<f64>,

    /// Sweep stop frequency in MHz
    #[arg(long)]
    stop_mhz: Option<f64>,

    /// Sweep step in MHz
    #[arg(long)]
    step_mhz: Option<f64>,

    /// Frequency of the simulated resonance line in MHz
    #[arg(long)]
    line_mhz: Option<f64>,

    /// Simulated acquisition latency per measurement in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Read settings from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the configuration file
    #[arg(long)]
    save: bool,

    /// Do not print the spectrum
    #[arg(long)]
    no_output: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(mhz) = self.start_mhz {
            config.set_start_frequency(mhz);
        }
        if let Some(mhz) = self.stop_mhz {
            config.set_stop_frequency(mhz);
        }
        if let Some(mhz) = self.step_mhz {
            config.frequency_step_mhz = mhz;
        }
        if let Some(mhz) = self.line_mhz {
            config.simulation.line_frequency_mhz = mhz;
        }
        if let Some(ms) = self.delay_ms {
            config.simulation.delay_ms = ms;
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(cli: &Cli) -> AppConfig {
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    cli.apply_to(&mut config);

    if cli.save {
        let saved = match &cli.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        };
        match saved {
            Ok(()) => info!("Configuration saved"),
            Err(e) => warn!("Failed to save configuration: {}", e),
        }
    }

    config
}

fn print_spectrum(spectrum: &CompositeSpectrum) {
    println!("# frequency_mhz amplitude");
    for point in spectrum.points() {
        println!("{:.6} {:.6e}", point.frequency / 1e6, point.amplitude);
    }
}

fn report_status(status: &SweepStatus) {
    for diagnostic in &status.diagnostics {
        debug!(
            "[{}] {:?}: {}",
            diagnostic.timestamp.format("%H:%M:%S%.3f"),
            diagnostic.level,
            diagnostic.message
        );
    }

    if let Some(seconds) = status.elapsed_seconds() {
        let points = status.spectrum.as_ref().map_or(0, |spectrum| spectrum.len());
        info!(
            "Sweep {:?} after {:.1}s ({:.1}% of {} frequencies, {} spectrum points)",
            status.phase, seconds, status.progress_percent, status.planned_points, points
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Ok(path) = AppConfig::get_config_path() {
        info!("Default configuration file: {}", path.display());
    }
    let config = load_config(&cli);

    let plan = match config.sweep_config() {
        Ok(sweep) => match sweep.plan() {
            Ok(plan) => plan,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            error!("Invalid sweep settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (results_tx, mut results_rx) = mpsc::channel(RESULT_CHANNEL_SIZE);
    let acquisition = SimulatedAcquisition::new(config.simulation.clone(), results_tx);
    let mut controller = SweepController::new(acquisition, &ControllerConfig::default());

    let sweep_status: SharedSweepStatus = Arc::new(Mutex::new(SweepStatus::new()));
    let tracker = tokio::spawn(status::track_events(
        controller.subscribe(),
        Arc::clone(&sweep_status),
    ));

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping sweep");
            ctrl_c_cancel.cancel();
        }
    });

    let outcome = run_sweep(&mut controller, &plan, &mut results_rx, &cancel).await;

    // Closing the event channel lets the tracker drain and exit
    drop(controller);
    if let Err(e) = tracker.await {
        warn!("Status tracker stopped unexpectedly: {}", e);
    }

    // Latest snapshot published by the controller
    let spectrum = match sweep_status.lock() {
        Ok(status) => {
            report_status(&status);
            status.spectrum.clone()
        }
        Err(_) => None,
    };

    match outcome {
        Ok(SweepOutcome::Completed(_)) => {
            if !cli.no_output {
                match spectrum {
                    Some(spectrum) => print_spectrum(&spectrum),
                    None => warn!("Sweep completed without a published spectrum"),
                }
            }
            ExitCode::SUCCESS
        }
        Ok(SweepOutcome::Aborted) => {
            warn!("Sweep did not complete");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Sweep failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
