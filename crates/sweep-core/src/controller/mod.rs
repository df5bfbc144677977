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

//! Sweep orchestration.
//!
//! The controller owns the sweep state and an acquisition handle. Each
//! received measurement fills one slot, triggers a full reassembly of the
//! composite spectrum and either requests the next pending frequency or
//! finishes the sweep. Only one measurement request is ever outstanding.
//!
//! [`run_sweep`] drives a controller from an async result channel until the
//! sweep completes, fails or is cancelled.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::assembler::{CompositeSpectrum, SpectrumAssembler};
use crate::error::SweepError;
use crate::measurement::{Frequency, SingleFrequencyMeasurement};
use crate::plan::SweepPlan;
use crate::state::SweepState;

/// Outbound requests to the component that performs single measurements.
///
/// Both calls are fire-and-forget; results come back later through the
/// channel handed to [`run_sweep`] or through
/// [`SweepController::measurement_received`].
pub trait Acquisition {
    /// Tune to the given frequency.
    fn set_frequency(&mut self, frequency: Frequency);
    /// Start one measurement at the current frequency.
    fn start_measurement(&mut self);
}

/// Notifications for presentation layers.
#[derive(Debug, Clone)]
pub enum SweepEvent {
    /// A new sweep was started.
    Started { points: usize },
    /// A measurement was requested at this frequency.
    MeasurementRequested(Frequency),
    /// The most recent single measurement.
    MeasurementUpdated(Arc<SingleFrequencyMeasurement>),
    /// The composite spectrum was rebuilt.
    SpectrumUpdated(Arc<CompositeSpectrum>),
    /// Sweep progress in percent.
    Progress(f64),
    /// Every planned frequency has been measured.
    Completed,
    /// The sweep was abandoned before completion.
    Aborted,
    /// The sweep hit a fatal error.
    Failed(String),
}

/// What the controller did after handling an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepStep {
    /// A measurement was requested at this frequency.
    Requested(Frequency),
    /// The sweep is complete; nothing was requested.
    Completed,
}

/// How a driven sweep ended without error.
#[derive(Debug)]
pub enum SweepOutcome {
    /// All slots filled; carries the final state.
    Completed(SweepState),
    /// Cancelled or the result channel closed.
    Aborted,
}

/// Configuration for the sweep controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Unit of the measurements' frequency-domain offset axis.
    pub offset_unit: Frequency,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            offset_unit: Frequency::MHZ,
            event_channel_capacity: 256,
        }
    }
}

/// Drives one sweep at a time against an [`Acquisition`] implementation.
pub struct SweepController<A> {
    acquisition: A,
    assembler: SpectrumAssembler,
    state: Option<SweepState>,
    event_tx: broadcast::Sender<SweepEvent>,
}

impl<A> std::fmt::Debug for SweepController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepController")
            .field("assembler", &self.assembler)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<A: Acquisition> SweepController<A> {
    #[must_use]
    pub fn new(acquisition: A, config: &ControllerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Self {
            acquisition,
            assembler: SpectrumAssembler::new(config.offset_unit),
            state: None,
            event_tx,
        }
    }

    /// Subscribe to sweep events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SweepEvent> {
        self.event_tx.subscribe()
    }

    /// State of the current sweep, if one has been started.
    #[must_use]
    pub fn state(&self) -> Option<&SweepState> {
        self.state.as_ref()
    }

    /// Take the state out of the controller, ending the current sweep.
    pub fn take_state(&mut self) -> Option<SweepState> {
        self.state.take()
    }

    #[must_use]
    pub fn acquisition(&self) -> &A {
        &self.acquisition
    }

    /// Start a new sweep over `plan`, replacing any previous state, and
    /// request the first planned frequency.
    pub fn start_sweep(&mut self, plan: &SweepPlan) -> SweepStep {
        if let Some(first) = plan.frequencies().first() {
            info!(
                "Starting sweep: {} points from {} with step {}",
                plan.len(),
                first,
                plan.step()
            );
        }

        let state = SweepState::new(plan);
        let next = state.next_pending();
        self.state = Some(state);

        self.emit(SweepEvent::Started { points: plan.len() });
        self.emit(SweepEvent::Progress(0.0));

        match next {
            Some(frequency) => self.request(frequency),
            None => self.complete(),
        }
    }

    /// Handle one measurement result.
    ///
    /// Records the result, reassembles the composite spectrum, publishes
    /// both, and requests the next pending frequency unless the sweep is
    /// complete. Errors are published as [`SweepEvent::Failed`] and returned.
    pub fn measurement_received(
        &mut self,
        measurement: SingleFrequencyMeasurement,
    ) -> Result<SweepStep, SweepError> {
        match self.process(measurement) {
            Ok(step) => Ok(step),
            Err(e) => {
                error!("Sweep failed: {}", e);
                self.emit(SweepEvent::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Abandon the current sweep, returning its state.
    pub fn abort(&mut self) -> Option<SweepState> {
        let state = self.state.take();
        if let Some(state) = &state {
            warn!(
                "Sweep aborted at {:.1}% ({} of {} points)",
                state.progress_percent(),
                state.filled_count(),
                state.len()
            );
            self.emit(SweepEvent::Aborted);
        }
        state
    }

    fn process(&mut self, measurement: SingleFrequencyMeasurement) -> Result<SweepStep, SweepError> {
        let Some(state) = self.state.as_mut() else {
            return Err(SweepError::UnknownFrequency(measurement.target_frequency()));
        };

        // Malformed results must not occupy a slot.
        measurement.center_bin()?;
        let recorded = state.record(measurement)?;
        let composite = self.assembler.assemble(state)?;
        let progress = state.progress_percent();
        let next = state.next_pending();

        self.emit(SweepEvent::MeasurementUpdated(recorded));
        self.emit(SweepEvent::SpectrumUpdated(Arc::new(composite)));
        self.emit(SweepEvent::Progress(progress));

        Ok(match next {
            Some(frequency) => self.request(frequency),
            None => self.complete(),
        })
    }

    fn request(&mut self, frequency: Frequency) -> SweepStep {
        debug!("Requesting measurement at {}", frequency);
        self.acquisition.set_frequency(frequency);
        self.acquisition.start_measurement();
        self.emit(SweepEvent::MeasurementRequested(frequency));
        SweepStep::Requested(frequency)
    }

    fn complete(&mut self) -> SweepStep {
        info!("Sweep complete");
        self.emit(SweepEvent::Completed);
        SweepStep::Completed
    }

    fn emit(&self, event: SweepEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Run a full sweep: start it, then feed results from `results` into the
/// controller until the sweep completes.
///
/// Returns [`SweepOutcome::Aborted`] when `cancel` fires or the result
/// channel closes first. Any [`SweepError`] ends the sweep immediately.
pub async fn run_sweep<A: Acquisition>(
    controller: &mut SweepController<A>,
    plan: &SweepPlan,
    results: &mut mpsc::Receiver<SingleFrequencyMeasurement>,
    cancel: &CancellationToken,
) -> Result<SweepOutcome, SweepError> {
    if controller.start_sweep(plan) == SweepStep::Completed {
        return Ok(finish(controller));
    }

    loop {
        tokio::select! {
            result = results.recv() => {
                let Some(measurement) = result else {
                    warn!("Acquisition channel closed before the sweep completed");
                    controller.abort();
                    return Ok(SweepOutcome::Aborted);
                };

                if controller.measurement_received(measurement)? == SweepStep::Completed {
                    return Ok(finish(controller));
                }
            }

            () = cancel.cancelled() => {
                info!("Sweep cancelled");
                controller.abort();
                return Ok(SweepOutcome::Aborted);
            }
        }
    }
}

fn finish<A: Acquisition>(controller: &mut SweepController<A>) -> SweepOutcome {
    controller
        .take_state()
        .map_or(SweepOutcome::Aborted, SweepOutcome::Completed)
}
