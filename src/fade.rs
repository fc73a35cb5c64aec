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

//! Tick-driven volume fades.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clock::{ClockMode, Tick};
use crate::emitter::VolumeControl;
use crate::error::InvalidRequest;
use crate::playsync::CancelHandle;
use crate::timers::{Countdown, WaitToken};

/// Called once a fade has written its final value.
pub type FadeCallback = Box<dyn FnOnce() + Send>;

/// Handle onto a running fade.
#[derive(Clone)]
pub struct FadeTask {
    id: u64,
    cancel_handle: CancelHandle,
}

impl FadeTask {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops the fade where it is. The final value is not written and the callback is not run.
    pub fn cancel(&self) {
        self.cancel_handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_handle.is_cancelled()
    }
}

struct ActiveFade {
    id: u64,
    target: VolumeControl,
    from: f32,
    to: f32,
    duration: Duration,
    clock: ClockMode,
    delay: Option<Countdown>,
    elapsed: Duration,
    on_complete: Option<FadeCallback>,
    cancel_handle: CancelHandle,
}

impl ActiveFade {
    /// Writes the interpolated value for the elapsed time, clamped to the fade's range.
    fn write_progress(&self) {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let value = self.from + (self.to - self.from) * t as f32;
        let (low, high) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        self.target.set(value.clamp(low, high));
    }

    /// Writes the exact final value and runs the callback.
    fn complete(&mut self) {
        self.target.set(self.to);
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
        debug!(id = self.id, to = self.to, "Fade complete");
    }

    /// Advances the fade. Returns true while it still has work to do.
    fn advance(&mut self, tick: &Tick) -> bool {
        if self.cancel_handle.is_cancelled() {
            debug!(id = self.id, "Fade cancelled");
            return false;
        }

        if let Some(delay) = self.delay.as_mut() {
            if !delay.advance(tick) {
                return true;
            }
            self.delay = None;
            return self.begin();
        }

        self.elapsed = self.elapsed.saturating_add(tick.delta(self.clock));
        if self.elapsed >= self.duration {
            self.complete();
            return false;
        }
        self.write_progress();
        true
    }

    /// Starts interpolating from the initial value. Zero-length fades complete immediately.
    fn begin(&mut self) -> bool {
        if self.duration.is_zero() {
            self.complete();
            return false;
        }
        self.target.set(self.from);
        true
    }
}

/// Runs every active fade. Fades are independent of the scheduler: they act on any
/// `VolumeControl`, pooled or not, and the caller owns the emitter's lifecycle.
pub struct FadeController {
    fades: Vec<ActiveFade>,
    next_id: u64,
}

impl FadeController {
    pub fn new() -> Self {
        Self {
            fades: Vec::new(),
            next_id: 1,
        }
    }

    /// Starts a fade from `from` to `to` over `duration`, after an optional delay on the given
    /// clock. A fade without delay takes its initial value immediately. Both bounds must be
    /// finite. The callback must not call back into whatever owns this controller.
    #[allow(clippy::too_many_arguments)]
    pub fn fade(
        &mut self,
        target: VolumeControl,
        from: f32,
        to: f32,
        duration: Duration,
        delay: Duration,
        clock: ClockMode,
        on_complete: Option<FadeCallback>,
    ) -> Result<FadeTask, InvalidRequest> {
        for bound in [from, to] {
            if !bound.is_finite() {
                return Err(InvalidRequest::FadeBound(bound));
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel_handle = CancelHandle::new();

        let mut fade = ActiveFade {
            id,
            target,
            from,
            to,
            duration,
            clock,
            delay: None,
            elapsed: Duration::ZERO,
            on_complete,
            cancel_handle: cancel_handle.clone(),
        };

        debug!(id, from, to, ?duration, ?delay, ?clock, "Fade started");
        let keep = if delay.is_zero() {
            fade.begin()
        } else {
            fade.delay = Some(Countdown::new(Arc::new(WaitToken::new(delay, clock))));
            true
        };
        if keep {
            self.fades.push(fade);
        }

        Ok(FadeTask { id, cancel_handle })
    }

    /// Advances every fade by one tick.
    pub fn tick(&mut self, tick: &Tick) {
        self.fades.retain_mut(|fade| fade.advance(tick));
    }

    /// Returns true if the fade is still running.
    pub fn is_active(&self, id: u64) -> bool {
        self.fades.iter().any(|f| f.id == id)
    }

    /// Number of running fades.
    pub fn active_count(&self) -> usize {
        self.fades.len()
    }

    /// Drops every fade without completing it.
    pub fn stop_all(&mut self) -> usize {
        let stopped = self.fades.len();
        for fade in self.fades.drain(..) {
            fade.cancel_handle.cancel();
        }
        stopped
    }
}

impl Default for FadeController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FadeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FadeController")
            .field("active_fades", &self.fades.len())
            .finish()
    }
}
