//! Paused-time surcharge accrual.

use serde::Serialize;

use crate::config::PlaybackConfig;
use crate::types::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FareState {
    pub base_fare: Money,
    pub accrued_surcharge: Money,
    pub paused_seconds: u32,
}

/// Fare state machine driven by paused ticks.
///
/// Each paused second bumps a counter. The tick that pushes the counter past
/// the threshold charges `rate * counter` and starts the counter over, so the
/// charge depends on the counter value at the crossing rather than on a
/// steady per-second rate.
#[derive(Clone, Debug)]
pub struct CostAccrualPolicy {
    state: FareState,
    threshold_secs: u32,
    rate: Money,
}

impl CostAccrualPolicy {
    pub fn new(base_fare: Money, threshold_secs: u32, rate: Money) -> Self {
        Self {
            state: FareState {
                base_fare,
                ..Default::default()
            },
            threshold_secs,
            rate,
        }
    }

    pub fn from_config(base_fare: Money, config: &PlaybackConfig) -> Self {
        Self::new(base_fare, config.surcharge_threshold_secs, config.surcharge_rate)
    }

    pub fn state(&self) -> FareState {
        self.state
    }

    pub fn base_fare(&self) -> Money {
        self.state.base_fare
    }

    pub fn set_base_fare(&mut self, base_fare: Money) {
        self.state.base_fare = base_fare;
    }

    /// Count one paused second. Returns the surcharge applied on this tick, if any.
    pub fn accumulate_paused_second(&mut self) -> Option<Money> {
        self.state.paused_seconds = self.state.paused_seconds.saturating_add(1);

        if self.state.paused_seconds <= self.threshold_secs {
            return None;
        }

        let surcharge = self.rate * self.state.paused_seconds;
        self.state.accrued_surcharge += surcharge;
        self.state.paused_seconds = 0;

        Some(surcharge)
    }

    pub fn current_fare(&self) -> Money {
        self.state.base_fare + self.state.accrued_surcharge
    }

    /// Drop the paused-second counter but keep any surcharge already charged
    pub fn clear_paused(&mut self) {
        self.state.paused_seconds = 0;
    }

    pub fn reset_fare(&mut self) {
        self.state.accrued_surcharge = Money::ZERO;
        self.state.paused_seconds = 0;
    }
}
