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

//! Reusable wait tokens and the countdowns that consume them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clock::{ClockMode, Tick};

/// Default quantum used to bucket delay values.
pub const DEFAULT_TIMER_QUANTUM: Duration = Duration::from_micros(1);

/// An immutable wait description: how long, and on which clock.
#[derive(Debug, PartialEq, Eq)]
pub struct WaitToken {
    duration: Duration,
    mode: ClockMode,
}

impl WaitToken {
    /// Creates an uncached token.
    pub fn new(duration: Duration, mode: ClockMode) -> WaitToken {
        WaitToken { duration, mode }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }
}

#[derive(Debug, Hash, PartialEq, Eq)]
struct WaitKey {
    buckets: u64,
    mode: ClockMode,
}

/// Deduplicates wait tokens by quantized duration and clock mode. Entries live for the life of
/// the cache; the set of distinct delays used in practice is small.
#[derive(Debug)]
pub struct TimerCache {
    quantum_nanos: u64,
    tokens: HashMap<WaitKey, Arc<WaitToken>>,
}

impl TimerCache {
    /// Creates a cache that buckets durations to the given quantum. A zero quantum falls back to
    /// the default.
    pub fn new(quantum: Duration) -> TimerCache {
        let quantum = if quantum.is_zero() {
            DEFAULT_TIMER_QUANTUM
        } else {
            quantum
        };
        TimerCache {
            quantum_nanos: u64::try_from(quantum.as_nanos()).unwrap_or(u64::MAX),
            tokens: HashMap::new(),
        }
    }

    /// Returns the shared token for the given delay, creating it on first use.
    pub fn get(&mut self, delay: Duration, mode: ClockMode) -> Arc<WaitToken> {
        let key = WaitKey {
            buckets: self.buckets(delay),
            mode,
        };
        let quantum_nanos = self.quantum_nanos;
        Arc::clone(self.tokens.entry(key).or_insert_with_key(|key| {
            let duration = Duration::from_nanos(key.buckets.saturating_mul(quantum_nanos));
            debug!(?duration, ?mode, "Caching wait token");
            Arc::new(WaitToken::new(duration, mode))
        }))
    }

    /// Number of distinct tokens cached.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rounds the delay to the nearest whole number of quanta.
    fn buckets(&self, delay: Duration) -> u64 {
        let nanos = delay.as_nanos();
        let quantum = u128::from(self.quantum_nanos);
        u64::try_from((nanos + quantum / 2) / quantum).unwrap_or(u64::MAX)
    }
}

impl Default for TimerCache {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER_QUANTUM)
    }
}

/// Per-request progress through a wait token, accumulated from tick deltas.
#[derive(Debug)]
pub struct Countdown {
    token: Arc<WaitToken>,
    elapsed: Duration,
}

impl Countdown {
    pub fn new(token: Arc<WaitToken>) -> Countdown {
        Countdown {
            token,
            elapsed: Duration::ZERO,
        }
    }

    /// Accumulates the tick's delta on the token's clock. Returns true once the wait is over.
    pub fn advance(&mut self, tick: &Tick) -> bool {
        self.elapsed = self.elapsed.saturating_add(tick.delta(self.token.mode()));
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.token.duration()
    }
}
