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

//! Sweep status tracking for the presentation side.
//!
//! Collects controller events into a snapshot that can be rendered at any
//! time: phase, progress, the latest single measurement, the latest
//! composite spectrum and a bounded list of diagnostic messages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{info, warn};
use sweep_core::{CompositeSpectrum, SingleFrequencyMeasurement, SweepEvent};
use tokio::sync::broadcast;

const MAX_DIAGNOSTICS: usize = 50;
/// Progress is logged each time it crosses a multiple of this percentage.
const PROGRESS_LOG_INTERVAL: f64 = 10.0;

/// Lifecycle of the sweep as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Running,
    Completed,
    Aborted,
    Failed,
}

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Snapshot of everything the presentation layer shows about a sweep
#[derive(Debug)]
pub struct SweepStatus {
    pub phase: SweepPhase,
    pub planned_points: usize,
    pub progress_percent: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_measurement: Option<Arc<SingleFrequencyMeasurement>>,
    pub spectrum: Option<Arc<CompositeSpectrum>>,

    // Diagnostic messages (keep last MAX_DIAGNOSTICS)
    pub diagnostics: VecDeque<DiagnosticMessage>,
    logged_progress_steps: u32,
}

impl Default for SweepStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepStatus {
    pub fn new() -> Self {
        Self {
            phase: SweepPhase::Idle,
            planned_points: 0,
            progress_percent: 0.0,
            started_at: None,
            finished_at: None,
            last_measurement: None,
            spectrum: None,
            diagnostics: VecDeque::with_capacity(MAX_DIAGNOSTICS),
            logged_progress_steps: 0,
        }
    }

    /// Fold one controller event into the snapshot
    pub fn apply(&mut self, event: &SweepEvent) {
        match event {
            SweepEvent::Started { points } => {
                *self = Self {
                    diagnostics: std::mem::take(&mut self.diagnostics),
                    ..Self::new()
                };
                self.phase = SweepPhase::Running;
                self.planned_points = *points;
                self.started_at = Some(Utc::now());
                self.add_diagnostic(
                    DiagnosticLevel::Info,
                    format!("Sweep started with {points} points"),
                );
            }
            SweepEvent::MeasurementRequested(_) => {}
            SweepEvent::MeasurementUpdated(measurement) => {
                self.last_measurement = Some(Arc::clone(measurement));
            }
            SweepEvent::SpectrumUpdated(spectrum) => {
                self.spectrum = Some(Arc::clone(spectrum));
            }
            SweepEvent::Progress(percent) => {
                self.progress_percent = *percent;
                self.log_progress();
            }
            SweepEvent::Completed => {
                self.finish(SweepPhase::Completed);
                self.add_diagnostic(DiagnosticLevel::Info, "Sweep complete".to_string());
            }
            SweepEvent::Aborted => {
                self.finish(SweepPhase::Aborted);
                self.add_diagnostic(DiagnosticLevel::Warning, "Sweep aborted".to_string());
            }
            SweepEvent::Failed(message) => {
                self.finish(SweepPhase::Failed);
                self.add_diagnostic(DiagnosticLevel::Error, message.clone());
            }
        }
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        self.diagnostics.push_back(DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        });

        while self.diagnostics.len() > MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
    }

    /// Sweep duration so far, or in total once finished
    #[allow(
        clippy::cast_precision_loss,
        reason = "millisecond durations are far below f64 precision limits"
    )]
    pub fn elapsed_seconds(&self) -> Option<f64> {
        let started = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some((end - started).num_milliseconds() as f64 / 1000.0)
    }

    fn finish(&mut self, phase: SweepPhase) {
        self.phase = phase;
        self.finished_at = Some(Utc::now());
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "progress is within [0, 100]"
    )]
    fn log_progress(&mut self) {
        let steps = (self.progress_percent / PROGRESS_LOG_INTERVAL).floor() as u32;
        if steps > self.logged_progress_steps {
            self.logged_progress_steps = steps;
            let latest = self
                .last_measurement
                .as_ref()
                .map(|m| m.target_frequency().to_string())
                .unwrap_or_default();
            info!("Sweep progress {:.0}% (last {})", self.progress_percent, latest);
        }
    }
}

pub type SharedSweepStatus = Arc<Mutex<SweepStatus>>;

/// Apply controller events to `status` until the controller goes away.
pub async fn track_events(mut events: broadcast::Receiver<SweepEvent>, status: SharedSweepStatus) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Ok(mut status) = status.lock() {
                    status.apply(&event);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Status tracker lagged, skipped {} events", skipped);
                if let Ok(mut status) = status.lock() {
                    status.add_diagnostic(
                        DiagnosticLevel::Warning,
                        format!("Skipped {skipped} sweep events"),
                    );
                }
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
