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

//! Sweep bookkeeping: which planned frequencies are still pending.
//!
//! Each planned frequency owns one slot. Slots move from pending to filled
//! exactly once; the sweep is complete when no slot is pending. A new sweep
//! needs a fresh state built from a fresh plan.

use std::sync::Arc;

use log::{debug, warn};

use crate::error::SweepError;
use crate::measurement::{Frequency, SingleFrequencyMeasurement};
use crate::plan::SweepPlan;

#[derive(Debug, Clone)]
struct Slot {
    frequency: Frequency,
    measurement: Option<Arc<SingleFrequencyMeasurement>>,
}

/// Pending and filled slots for every frequency of one sweep plan.
#[derive(Debug, Clone)]
pub struct SweepState {
    slots: Vec<Slot>,
    step: Frequency,
    filled: usize,
    last_filled: Option<usize>,
}

impl SweepState {
    /// Create one pending slot per planned frequency, in plan order.
    #[must_use]
    pub fn new(plan: &SweepPlan) -> Self {
        let slots = plan
            .frequencies()
            .iter()
            .map(|&frequency| Slot {
                frequency,
                measurement: None,
            })
            .collect();

        Self {
            slots,
            step: plan.step(),
            filled: 0,
            last_filled: None,
        }
    }

    /// Fill the slot matching the measurement's target frequency.
    ///
    /// The frequency must match a planned frequency exactly. On error the
    /// state is left unchanged.
    pub fn record(
        &mut self,
        measurement: SingleFrequencyMeasurement,
    ) -> Result<Arc<SingleFrequencyMeasurement>, SweepError> {
        let frequency = measurement.target_frequency();
        let Some(idx) = self.slot_index(frequency) else {
            warn!("Rejected measurement at {frequency}: not part of the sweep plan");
            return Err(SweepError::UnknownFrequency(frequency));
        };

        let slot = &mut self.slots[idx];
        if slot.measurement.is_some() {
            warn!("Rejected measurement at {frequency}: slot already filled");
            return Err(SweepError::DuplicateMeasurement(frequency));
        }

        let measurement = Arc::new(measurement);
        slot.measurement = Some(Arc::clone(&measurement));
        self.filled += 1;
        self.last_filled = Some(idx);

        debug!(
            "Recorded {} ({}/{} slots filled)",
            frequency,
            self.filled,
            self.slots.len()
        );
        Ok(measurement)
    }

    /// Lowest planned frequency that is still pending.
    #[must_use]
    pub fn next_pending(&self) -> Option<Frequency> {
        self.slots
            .iter()
            .find(|slot| slot.measurement.is_none())
            .map(|slot| slot.frequency)
    }

    /// True once no slot is pending.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Percentage of filled slots, in `[0, 100]`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "slot counts are far below f64 integer precision"
    )]
    pub fn progress_percent(&self) -> f64 {
        if self.slots.is_empty() {
            return 100.0;
        }
        self.filled as f64 / self.slots.len() as f64 * 100.0
    }

    /// Most recently recorded measurement, regardless of plan order.
    #[must_use]
    pub fn last_filled(&self) -> Option<&Arc<SingleFrequencyMeasurement>> {
        self.last_filled
            .and_then(|idx| self.slots[idx].measurement.as_ref())
    }

    /// Filled measurements in ascending frequency order.
    pub fn filled(&self) -> impl Iterator<Item = &SingleFrequencyMeasurement> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.measurement.as_deref())
    }

    /// Step of the plan this state was built from.
    #[must_use]
    pub fn step(&self) -> Frequency {
        self.step
    }

    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.filled
    }

    /// Total number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot_index(&self, frequency: Frequency) -> Option<usize> {
        self.slots
            .binary_search_by(|slot| slot.frequency.hz().total_cmp(&frequency.hz()))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plan() -> SweepPlan {
        SweepPlan::build(
            Frequency::from_mhz(30.0),
            Frequency::from_mhz(30.4),
            Frequency::from_mhz(0.1),
        )
        .unwrap()
    }

    fn measurement_at(frequency: Frequency) -> SingleFrequencyMeasurement {
        SingleFrequencyMeasurement::new(
            frequency,
            vec![0.0, 1.0],
            vec![1.0, 0.5],
            vec![-0.2, 0.0, 0.2],
            vec![1.0, 2.0, 1.0],
        )
    }

    #[test]
    fn test_new_state_is_pending() {
        let plan = plan();
        let state = SweepState::new(&plan);

        assert_eq!(state.len(), 5);
        assert!(!state.is_complete());
        assert_relative_eq!(state.progress_percent(), 0.0);
        assert_eq!(state.next_pending(), Some(plan.frequencies()[0]));
        assert!(state.last_filled().is_none());
        assert_eq!(state.filled().count(), 0);
    }

    #[test]
    fn test_record_out_of_order_completes() {
        let plan = plan();
        let mut state = SweepState::new(&plan);

        for &idx in &[3, 0, 4, 1, 2] {
            state
                .record(measurement_at(plan.frequencies()[idx]))
                .unwrap();
        }

        assert!(state.is_complete());
        assert_relative_eq!(state.progress_percent(), 100.0);
        assert_eq!(state.next_pending(), None);
        assert_eq!(state.filled_count(), 5);
    }

    #[test]
    fn test_next_pending_is_lowest_frequency() {
        let plan = plan();
        let mut state = SweepState::new(&plan);

        state.record(measurement_at(plan.frequencies()[0])).unwrap();
        state.record(measurement_at(plan.frequencies()[2])).unwrap();
        assert_eq!(state.next_pending(), Some(plan.frequencies()[1]));

        state.record(measurement_at(plan.frequencies()[1])).unwrap();
        assert_eq!(state.next_pending(), Some(plan.frequencies()[3]));
        assert_relative_eq!(state.progress_percent(), 60.0);
    }

    #[test]
    fn test_last_filled_tracks_insertion_order() {
        let plan = plan();
        let mut state = SweepState::new(&plan);

        state.record(measurement_at(plan.frequencies()[4])).unwrap();
        state.record(measurement_at(plan.frequencies()[1])).unwrap();

        let last = state.last_filled().unwrap();
        assert_eq!(last.target_frequency(), plan.frequencies()[1]);

        let order: Vec<_> = state.filled().map(|m| m.target_frequency()).collect();
        assert_eq!(order, vec![plan.frequencies()[1], plan.frequencies()[4]]);
    }

    #[test]
    fn test_unknown_frequency_leaves_state_unchanged() {
        let plan = plan();
        let mut state = SweepState::new(&plan);
        state.record(measurement_at(plan.frequencies()[0])).unwrap();

        let stray = Frequency::from_hz(plan.frequencies()[1].hz() + 1.0);
        assert_eq!(
            state.record(measurement_at(stray)).unwrap_err(),
            SweepError::UnknownFrequency(stray)
        );

        assert_eq!(state.filled_count(), 1);
        assert_eq!(
            state.last_filled().unwrap().target_frequency(),
            plan.frequencies()[0]
        );
        assert_eq!(state.next_pending(), Some(plan.frequencies()[1]));
    }

    #[test]
    fn test_duplicate_measurement_rejected() {
        let plan = plan();
        let mut state = SweepState::new(&plan);
        let frequency = plan.frequencies()[2];

        state.record(measurement_at(frequency)).unwrap();
        assert_eq!(
            state.record(measurement_at(frequency)).unwrap_err(),
            SweepError::DuplicateMeasurement(frequency)
        );
        assert_eq!(state.filled_count(), 1);
        assert_eq!(state.last_filled().unwrap().target_frequency(), frequency);
        assert_eq!(state.next_pending(), Some(plan.frequencies()[0]));
    }
}
