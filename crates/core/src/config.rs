//! Playback and fare configuration.
//!
//! Every field has a default so a partial JSON document is enough to
//! override one knob.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Paused seconds tolerated before a surcharge is applied.
pub const DEFAULT_SURCHARGE_THRESHOLD_SECS: u32 = 30;

/// Surcharge per paused second counted on the tick that crosses the threshold.
pub const DEFAULT_SURCHARGE_RATE: Money = Money::from_cents(1);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wall-clock length of one simulated second, in milliseconds
    pub tick_period_ms: u64,

    pub surcharge_threshold_secs: u32,

    /// In cents
    pub surcharge_rate: Money,

    /// Give up on a single persistence call after this long
    pub persist_timeout_ms: u64,

    pub fare: FareSchedule,
}

impl PlaybackConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
            surcharge_threshold_secs: DEFAULT_SURCHARGE_THRESHOLD_SECS,
            surcharge_rate: DEFAULT_SURCHARGE_RATE,
            persist_timeout_ms: 5_000,
            fare: FareSchedule::default(),
        }
    }
}

/// Up-front base fare quote. All amounts in cents.
///
/// The default is a flat rate; set `per_km` / `per_minute` for a
/// distance-proportional fare.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FareSchedule {
    pub flag_fall: Money,
    pub per_km: Money,
    pub per_minute: Money,
    pub minimum: Money,
}

impl FareSchedule {
    pub fn flat(amount: Money) -> Self {
        Self {
            flag_fall: amount,
            per_km: Money::ZERO,
            per_minute: Money::ZERO,
            minimum: Money::ZERO,
        }
    }

    /// Base fare for a trip of the given provider-reported distance and duration
    pub fn quote(&self, distance_m: f64, duration_s: f64) -> Money {
        let km = non_negative(distance_m) / 1_000.0;
        let minutes = non_negative(duration_s) / 60.0;

        let fare = self.flag_fall + self.per_km.scale(km) + self.per_minute.scale(minutes);
        fare.max(self.minimum)
    }
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self::flat(Money::from_cents(1_000))
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
