// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Host time bases.
//!
//! Every wait in the service is measured on one of two clocks: the scaled clock, which follows
//! the host's time scale and stops while paused, and the real clock, which always advances.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which time base a request measures its waits on.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Host time, affected by time scale and pause.
    #[default]
    Scaled,
    /// Unscaled time, always advancing.
    Real,
}

impl ClockMode {
    /// Maps the `realTimeDelay` style flag onto a clock mode.
    pub fn from_real_time(real_time: bool) -> ClockMode {
        if real_time {
            ClockMode::Real
        } else {
            ClockMode::Scaled
        }
    }
}

/// The time that passed during one scheduler tick, on both clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    scaled: Duration,
    real: Duration,
}

impl Tick {
    pub fn new(scaled: Duration, real: Duration) -> Tick {
        Tick { scaled, real }
    }

    /// A tick where both clocks advanced by the same amount.
    pub fn uniform(dt: Duration) -> Tick {
        Tick::new(dt, dt)
    }

    /// Returns the delta for the given clock.
    pub fn delta(&self, mode: ClockMode) -> Duration {
        match mode {
            ClockMode::Scaled => self.scaled,
            ClockMode::Real => self.real,
        }
    }
}

/// Converts real frame deltas into ticks, applying the host time scale and pause state.
#[derive(Debug)]
pub struct Clock {
    time_scale: f64,
    paused: bool,
}

impl Clock {
    pub fn new() -> Clock {
        Clock {
            time_scale: 1.0,
            paused: false,
        }
    }

    /// Converts a real frame delta into a tick. The scaled delta saturates at `Duration::MAX`
    /// for very large time scales.
    pub fn advance(&self, real_dt: Duration) -> Tick {
        let scaled_dt = if self.paused {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(real_dt.as_secs_f64() * self.time_scale)
                .unwrap_or(Duration::MAX)
        };
        Tick::new(scaled_dt, real_dt)
    }

    /// Sets the scaled clock's rate relative to real time. Negative or non-finite scales are
    /// ignored.
    pub fn set_time_scale(&mut self, time_scale: f64) {
        if !time_scale.is_finite() || time_scale < 0.0 {
            debug!(time_scale, "Ignoring invalid time scale");
            return;
        }
        self.time_scale = time_scale;
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
