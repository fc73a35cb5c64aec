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

//! The sound service: the one object a host owns to play sound effects.
//!
//! The host calls [`SoundService::update`] once per frame with the real time that passed. The
//! service turns that into a tick on both clocks and advances the scheduler and every fade.
//! When driven from another thread (see [`crate::ticker`]) the service is shared behind a
//! `parking_lot::Mutex`, so channel accounting is never mutated concurrently.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use serde::Serialize;
use tracing::info;

use crate::audio::Engine;
use crate::channels::{Channel, ChannelRegistry};
use crate::clock::{Clock, ClockMode};
use crate::config;
use crate::emitter::{Spatial, Vec3, VolumeControl};
use crate::error::PlayError;
use crate::fade::{FadeCallback, FadeController, FadeTask};
use crate::pool::EmitterPool;
use crate::request::{ClipSelection, PlayRequest};
use crate::scheduler::{PlayOutcome, PlaybackEvent, PlaybackState, RequestId, Scheduler};
use crate::timers::TimerCache;

/// Emitter pool counters.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub created: usize,
    pub free: usize,
    pub active: usize,
}

/// A snapshot of the service's bookkeeping.
#[derive(Serialize, Clone, Debug)]
pub struct ServiceStats {
    pub pool: PoolStats,
    pub in_flight: usize,
    pub active_fades: usize,
    pub cached_timers: usize,
    pub channels: Vec<Channel>,
}

pub struct SoundService {
    clock: Clock,
    scheduler: Scheduler,
    fades: FadeController,
}

impl SoundService {
    /// Creates a service around an existing scheduler.
    pub fn new(scheduler: Scheduler) -> SoundService {
        SoundService {
            clock: Clock::new(),
            scheduler,
            fades: FadeController::new(),
        }
    }

    /// Creates a service with default pool and channel settings.
    pub fn with_engine(engine: Arc<dyn Engine>) -> SoundService {
        SoundService::new(Scheduler::new(
            engine,
            EmitterPool::new(
                Default::default(),
                crate::pool::DEFAULT_INITIAL_SIZE,
                crate::pool::DEFAULT_GROWTH_BATCH,
            ),
            ChannelRegistry::default(),
            TimerCache::default(),
        ))
    }

    /// Creates a service from the loaded configuration, with every configured channel cap
    /// applied.
    pub fn from_config(
        engine: Arc<dyn Engine>,
        config: &config::Service,
    ) -> Result<SoundService, config::ConfigError> {
        let pool = config.pool();
        let channels = config.channels();
        let mut registry = ChannelRegistry::new(channels.default_max_emitters());
        for (name, max_emitters) in channels.limits() {
            registry.configure(name, *max_emitters);
        }

        let scheduler = Scheduler::new(
            engine,
            EmitterPool::new(pool.template(), pool.initial_size(), pool.growth_batch()),
            registry,
            TimerCache::new(config.timer_quantum()?),
        );

        info!(
            initial_size = pool.initial_size(),
            growth_batch = pool.growth_batch(),
            channels = channels.limits().len(),
            "Sound service created"
        );
        Ok(SoundService::new(scheduler))
    }

    /// Creates or updates a channel's cap.
    pub fn configure_channel(&mut self, name: &str, max_emitters: u32) {
        self.scheduler.configure_channel(name, max_emitters);
    }

    /// Submits a fully described request.
    pub fn play(&mut self, request: PlayRequest) -> Result<PlayOutcome, PlayError> {
        self.scheduler.submit(request)
    }

    /// Plays a non-positional sound. `clips` is a single clip or a set to pick from at random.
    pub fn play_sound_2d(
        &mut self,
        clips: impl Into<ClipSelection>,
        volume: f32,
        pitch: f32,
        delay: Duration,
        real_time_delay: bool,
        channel: Option<&str>,
    ) -> Result<PlayOutcome, PlayError> {
        let mut request = PlayRequest::new(clips)
            .with_volume(volume)
            .with_pitch(pitch)
            .with_delay(delay)
            .with_clock(ClockMode::from_real_time(real_time_delay));
        if let Some(channel) = channel {
            request = request.on_channel(channel);
        }
        self.play(request)
    }

    /// Plays a sound at a position in the world.
    #[allow(clippy::too_many_arguments)]
    pub fn play_sound_3d(
        &mut self,
        position: Vec3,
        clips: impl Into<ClipSelection>,
        volume: f32,
        pitch: f32,
        spatial_blend: f32,
        min_distance: f32,
        max_distance: f32,
        delay: Duration,
        real_time_delay: bool,
        channel: Option<&str>,
    ) -> Result<PlayOutcome, PlayError> {
        let mut request = PlayRequest::new(clips)
            .with_volume(volume)
            .with_pitch(pitch)
            .with_spatial(Spatial {
                position,
                blend: spatial_blend,
                min_distance,
                max_distance,
            })
            .with_delay(delay)
            .with_clock(ClockMode::from_real_time(real_time_delay));
        if let Some(channel) = channel {
            request = request.on_channel(channel);
        }
        self.play(request)
    }

    /// Fades a volume from `from` to `to`. See [`FadeController::fade`].
    #[allow(clippy::too_many_arguments)]
    pub fn fade_volume(
        &mut self,
        target: VolumeControl,
        from: f32,
        to: f32,
        duration: Duration,
        delay: Duration,
        clock: ClockMode,
        on_complete: Option<FadeCallback>,
    ) -> Result<FadeTask, PlayError> {
        Ok(self
            .fades
            .fade(target, from, to, duration, delay, clock, on_complete)?)
    }

    /// Advances the service by one host frame.
    pub fn update(&mut self, real_dt: Duration) {
        let tick = self.clock.advance(real_dt);
        self.scheduler.tick(&tick);
        self.fades.tick(&tick);
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.clock.set_time_scale(time_scale);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Cancels one request immediately.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        self.scheduler.cancel(id)
    }

    pub fn state(&self, id: RequestId) -> PlaybackState {
        self.scheduler.state(id)
    }

    /// Cancels every request and fade. Used at teardown so no channel count is left behind.
    pub fn stop_all(&mut self) -> usize {
        self.scheduler.stop_all() + self.fades.stop_all()
    }

    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        self.scheduler.subscribe()
    }

    /// Returns true when no request or fade is in flight.
    pub fn is_idle(&self) -> bool {
        self.scheduler.in_flight() == 0 && self.fades.active_count() == 0
    }

    pub fn stats(&self) -> ServiceStats {
        let pool = self.scheduler.pool();
        ServiceStats {
            pool: PoolStats {
                created: pool.created(),
                free: pool.free_count(),
                active: pool.active_count(),
            },
            in_flight: self.scheduler.in_flight(),
            active_fades: self.fades.active_count(),
            cached_timers: self.scheduler.timers().len(),
            channels: self
                .scheduler
                .channels()
                .channels()
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl std::fmt::Debug for SoundService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundService")
            .field("clock", &self.clock)
            .field("scheduler", &self.scheduler)
            .field("fades", &self.fades)
            .finish()
    }
}
