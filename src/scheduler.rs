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

//! Playback scheduling for one-shot sounds.
//!
//! Each accepted request is an explicit state machine advanced by [`Scheduler::tick`]:
//!
//! - `Delayed`: waiting out the requested delay on the request's clock.
//! - `Playing`: the engine is triggered and the channel registration is taken.
//! - `ReturnScheduled`: holding the emitter for `delay + length * pitch + margin`.
//! - `Returned`: the channel registration is dropped and the emitter goes back to the pool.
//!
//! A cancelled request skips straight to `Returned` and undoes whatever it had taken.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::audio::Engine;
use crate::channels::ChannelRegistry;
use crate::clock::{ClockMode, Tick};
use crate::emitter::Emitter;
use crate::error::PlayError;
use crate::playsync::CancelHandle;
use crate::pool::EmitterPool;
use crate::request::{hold_duration, PlayRequest};
use crate::timers::{Countdown, TimerCache, WaitToken};

/// Identifies one accepted request.
pub type RequestId = u64;

/// The observable state of an in-flight request.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Delayed,
    Playing,
    ReturnScheduled,
    Returned,
}

/// Notifications published to subscribers as requests move through their lifecycle.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Accepted { id: RequestId, clip: String },
    Rejected { channel: String },
    Started { id: RequestId, emitter: u64 },
    Returned { id: RequestId },
    Cancelled { id: RequestId },
}

/// Handle onto an accepted request.
#[derive(Clone)]
pub struct PlaybackTicket {
    id: RequestId,
    cancel_handle: CancelHandle,
}

impl PlaybackTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Requests cancellation. The emitter and any channel registration are given back on the
    /// next tick.
    pub fn cancel(&self) {
        self.cancel_handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_handle.is_cancelled()
    }
}

impl std::fmt::Debug for PlaybackTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackTicket")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// The result of a well-formed play request.
#[derive(Debug)]
pub enum PlayOutcome {
    Accepted(PlaybackTicket),
    /// The named channel was saturated. Nothing was acquired or scheduled.
    Rejected { channel: String },
}

impl PlayOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PlayOutcome::Accepted(_))
    }

    pub fn ticket(&self) -> Option<&PlaybackTicket> {
        match self {
            PlayOutcome::Accepted(ticket) => Some(ticket),
            PlayOutcome::Rejected { .. } => None,
        }
    }
}

enum Phase {
    Delayed(Countdown),
    ReturnScheduled(Countdown),
}

struct PlaybackTask {
    id: RequestId,
    emitter: Emitter,
    channel: Option<String>,
    registered: bool,
    delay: Duration,
    clock: ClockMode,
    phase: Phase,
    cancel_handle: CancelHandle,
}

impl PlaybackTask {
    fn state(&self) -> PlaybackState {
        match self.phase {
            Phase::Delayed(_) => PlaybackState::Delayed,
            Phase::ReturnScheduled(_) => PlaybackState::ReturnScheduled,
        }
    }
}

/// Why a task left the scheduler.
enum Finish {
    Completed,
    Cancelled,
    /// The channel filled up while the request was delayed.
    Saturated,
}

/// Owns the emitter pool and channel registry, and advances every in-flight request.
pub struct Scheduler {
    engine: Arc<dyn Engine>,
    pool: EmitterPool,
    channels: ChannelRegistry,
    timers: TimerCache,
    rng: StdRng,
    tasks: Vec<PlaybackTask>,
    next_id: RequestId,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<dyn Engine>,
        pool: EmitterPool,
        channels: ChannelRegistry,
        timers: TimerCache,
    ) -> Self {
        Self::with_rng(engine, pool, channels, timers, StdRng::from_entropy())
    }

    /// Creates a scheduler with a specific random source for clip selection.
    pub fn with_rng(
        engine: Arc<dyn Engine>,
        pool: EmitterPool,
        channels: ChannelRegistry,
        timers: TimerCache,
        rng: StdRng,
    ) -> Self {
        Self {
            engine,
            pool,
            channels,
            timers,
            rng,
            tasks: Vec::new(),
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Accepts or rejects a play request. A rejected request has no side effects beyond the
    /// lazy creation of its channel.
    pub fn submit(&mut self, request: PlayRequest) -> Result<PlayOutcome, PlayError> {
        request.validate()?;

        if let Some(channel) = request.channel() {
            if !self.channels.is_available(channel) {
                debug!(channel, "Channel saturated, request rejected");
                self.publish(PlaybackEvent::Rejected {
                    channel: channel.to_string(),
                });
                return Ok(PlayOutcome::Rejected {
                    channel: channel.to_string(),
                });
            }
        }

        let clip = match request.clips().pick(&mut self.rng) {
            Some(clip) => clip.clone(),
            // validate() rejects empty sets.
            None => return Err(crate::error::InvalidRequest::EmptyClipSet.into()),
        };

        let mut emitter = self.pool.acquire();
        emitter.configure(
            clip.clone(),
            request.volume(),
            request.pitch(),
            *request.spatial(),
        );

        let id = self.next_id;
        self.next_id += 1;
        let cancel_handle = CancelHandle::new();

        let delay = request.delay();
        let clock = request.clock();
        let token = self.timers.get(delay, clock);
        let mut task = PlaybackTask {
            id,
            emitter,
            channel: request.channel().map(str::to_string),
            registered: false,
            delay,
            clock,
            phase: Phase::Delayed(Countdown::new(token)),
            cancel_handle: cancel_handle.clone(),
        };

        debug!(
            id,
            clip = clip.name(),
            ?delay,
            ?clock,
            channel = task.channel.as_deref(),
            "Play request accepted"
        );
        self.publish(PlaybackEvent::Accepted {
            id,
            clip: clip.name().to_string(),
        });

        if delay.is_zero() && !self.start(&mut task) {
            self.finish(task, Finish::Saturated);
        } else {
            self.tasks.push(task);
        }

        Ok(PlayOutcome::Accepted(PlaybackTicket { id, cancel_handle }))
    }

    /// Advances every in-flight request by one tick.
    pub fn tick(&mut self, tick: &Tick) {
        let mut tasks = std::mem::take(&mut self.tasks);
        let mut finished = Vec::new();
        for mut task in tasks.drain(..) {
            match self.advance(&mut task, tick) {
                Some(reason) => finished.push((task, reason)),
                None => self.tasks.push(task),
            }
        }
        for (task, reason) in finished {
            self.finish(task, reason);
        }
    }

    /// Moves one task forward. Returns the reason it is done, if it is.
    fn advance(&mut self, task: &mut PlaybackTask, tick: &Tick) -> Option<Finish> {
        if task.cancel_handle.is_cancelled() {
            return Some(Finish::Cancelled);
        }

        let delayed = matches!(task.phase, Phase::Delayed(_));
        let elapsed = match &mut task.phase {
            Phase::Delayed(countdown) | Phase::ReturnScheduled(countdown) => countdown.advance(tick),
        };
        if !elapsed {
            return None;
        }

        if !delayed {
            Some(Finish::Completed)
        } else if self.start(task) {
            None
        } else {
            Some(Finish::Saturated)
        }
    }

    /// Starts playback. Returns false if the channel filled up while the request was delayed,
    /// in which case the task must be finished without playing.
    fn start(&mut self, task: &mut PlaybackTask) -> bool {
        if let Some(channel) = task.channel.as_deref() {
            if !self.channels.is_available(channel) {
                debug!(id = task.id, channel, "Channel filled during delay, dropping");
                return false;
            }
        }

        if let Err(e) = self.engine.play_one_shot(&task.emitter) {
            error!(id = task.id, error = %e, "Failed to trigger playback");
        }

        if let Some(channel) = task.channel.as_deref() {
            self.channels.register(channel);
            task.registered = true;
        }

        let length = task
            .emitter
            .clip()
            .map(|clip| self.engine.clip_length(clip))
            .unwrap_or_default();
        let hold = hold_duration(task.delay, length, task.emitter.pitch());
        task.phase = Phase::ReturnScheduled(Countdown::new(Arc::new(WaitToken::new(
            hold, task.clock,
        ))));

        debug!(id = task.id, emitter = task.emitter.id(), ?hold, "Playback started");
        self.publish(PlaybackEvent::Started {
            id: task.id,
            emitter: task.emitter.id(),
        });
        true
    }

    /// Drops the task's channel registration and returns its emitter to the pool.
    fn finish(&mut self, task: PlaybackTask, reason: Finish) {
        let PlaybackTask {
            id,
            emitter,
            channel,
            registered,
            ..
        } = task;

        if registered {
            if let Some(channel) = channel.as_deref() {
                self.channels.deregister(channel);
            }
        }
        self.pool.release(emitter);

        match reason {
            Finish::Completed => {
                debug!(id, "Emitter returned");
                self.publish(PlaybackEvent::Returned { id });
            }
            Finish::Cancelled => {
                debug!(id, "Request cancelled");
                self.publish(PlaybackEvent::Cancelled { id });
            }
            Finish::Saturated => {
                self.publish(PlaybackEvent::Rejected {
                    channel: channel.unwrap_or_default(),
                });
            }
        }
    }

    /// Cancels a request immediately. Returns false if no such request is in flight.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        match self.tasks.iter().position(|t| t.id == id) {
            Some(index) => {
                let task = self.tasks.swap_remove(index);
                task.cancel_handle.cancel();
                self.finish(task, Finish::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight request immediately. Returns the number cancelled.
    pub fn stop_all(&mut self) -> usize {
        let tasks = std::mem::take(&mut self.tasks);
        let stopped = tasks.len();
        for task in tasks {
            task.cancel_handle.cancel();
            self.finish(task, Finish::Cancelled);
        }
        if stopped > 0 {
            info!(stopped, "All sounds stopped");
        }
        stopped
    }

    /// Returns the state of an in-flight request, or `Returned` if it is no longer tracked.
    pub fn state(&self, id: RequestId) -> PlaybackState {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .map(PlaybackTask::state)
            .unwrap_or(PlaybackState::Returned)
    }

    /// Returns a receiver for lifecycle events from now on.
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn pool(&self) -> &EmitterPool {
        &self.pool
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn configure_channel(&mut self, name: &str, max_emitters: u32) {
        self.channels.configure(name, max_emitters);
    }

    pub fn timers(&self) -> &TimerCache {
        &self.timers
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("engine", &self.engine.to_string())
            .field("in_flight", &self.tasks.len())
            .field("pool", &self.pool)
            .field("channels", &self.channels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock;
    use crate::emitter::{Clip, EmitterTemplate};

    const FRAME: Duration = Duration::from_millis(10);

    fn scheduler_with(engine: &mock::Engine, pool_size: usize) -> Scheduler {
        Scheduler::with_rng(
            Arc::new(engine.clone()),
            EmitterPool::new(EmitterTemplate::default(), pool_size, 5),
            ChannelRegistry::default(),
            TimerCache::default(),
            StdRng::seed_from_u64(1),
        )
    }

    fn clip(name: &str, millis: u64) -> Clip {
        Clip::new(name, Duration::from_millis(millis))
    }

    /// Ticks until the request is returned, and reports how long that took.
    fn run_until_returned(scheduler: &mut Scheduler, id: RequestId, tick: Tick) -> Duration {
        let mut elapsed = Duration::ZERO;
        while scheduler.state(id) != PlaybackState::Returned {
            scheduler.tick(&tick);
            elapsed += tick.delta(ClockMode::Real);
            assert!(elapsed < Duration::from_secs(60), "request never returned");
        }
        elapsed
    }

    fn accepted(outcome: Result<PlayOutcome, PlayError>) -> PlaybackTicket {
        match outcome.expect("valid request") {
            PlayOutcome::Accepted(ticket) => ticket,
            PlayOutcome::Rejected { channel } => panic!("rejected on {}", channel),
        }
    }

    #[test]
    fn test_immediate_play_and_return() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 2);

        let ticket = accepted(scheduler.submit(PlayRequest::new(clip("coin", 200))));
        assert_eq!(engine.trigger_count(), 1);
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::ReturnScheduled);
        assert_eq!(scheduler.pool().active_count(), 1);

        let held = run_until_returned(&mut scheduler, ticket.id(), Tick::uniform(FRAME));
        // 0.2s clip + 0.1s margin.
        assert!(held >= Duration::from_millis(300) && held < Duration::from_millis(310));
        assert_eq!(scheduler.pool().active_count(), 0);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_hold_scales_with_pitch() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);

        let ticket = accepted(scheduler.submit(PlayRequest::new(clip("roar", 2000)).with_pitch(1.5)));
        let held = run_until_returned(&mut scheduler, ticket.id(), Tick::uniform(FRAME));
        assert!(held >= Duration::from_millis(3100) && held < Duration::from_millis(3110));
    }

    #[test]
    fn test_delay_then_play() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);

        let ticket = accepted(
            scheduler.submit(
                PlayRequest::new(clip("bell", 500))
                    .with_delay(Duration::from_millis(100))
                    .on_channel("ui"),
            ),
        );
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::Delayed);
        assert_eq!(engine.trigger_count(), 0);
        // The emitter is taken at acceptance, the channel only at start.
        assert_eq!(scheduler.pool().active_count(), 1);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));

        for _ in 0..9 {
            scheduler.tick(&Tick::uniform(FRAME));
        }
        assert_eq!(engine.trigger_count(), 0);
        scheduler.tick(&Tick::uniform(FRAME));
        assert_eq!(engine.trigger_count(), 1);
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::ReturnScheduled);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(1));

        // Hold is delay + length + margin, counted from playback start.
        let held = run_until_returned(&mut scheduler, ticket.id(), Tick::uniform(FRAME));
        assert!(held >= Duration::from_millis(700) && held < Duration::from_millis(710));
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));
    }

    #[test]
    fn test_scaled_delay_waits_while_paused() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 2);
        let paused = Tick::new(Duration::ZERO, FRAME);

        accepted(scheduler.submit(
            PlayRequest::new(clip("scaled", 100)).with_delay(Duration::from_millis(50)),
        ));
        accepted(
            scheduler.submit(
                PlayRequest::new(clip("real", 100))
                    .with_delay(Duration::from_millis(50))
                    .with_clock(ClockMode::Real),
            ),
        );

        for _ in 0..10 {
            scheduler.tick(&paused);
        }
        let played: Vec<String> = engine.triggered().into_iter().map(|t| t.clip).collect();
        assert_eq!(played, vec!["real".to_string()]);
    }

    #[test]
    fn test_rejection_has_no_side_effects() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 4);
        scheduler.configure_channel("ui", 1);
        let events = scheduler.subscribe();

        accepted(scheduler.submit(PlayRequest::new(clip("click", 1000)).on_channel("ui")));
        let created = scheduler.pool().created();
        let active = scheduler.pool().active_count();
        let timers = scheduler.timers().len();

        let outcome = scheduler
            .submit(
                PlayRequest::new(clip("click", 1000))
                    .with_delay(Duration::from_millis(333))
                    .on_channel("ui"),
            )
            .expect("valid");
        assert!(!outcome.is_accepted());
        assert_eq!(scheduler.pool().created(), created);
        assert_eq!(scheduler.pool().active_count(), active);
        assert_eq!(scheduler.timers().len(), timers);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(1));
        assert_eq!(scheduler.in_flight(), 1);
        assert_eq!(engine.trigger_count(), 1);

        let events: Vec<PlaybackEvent> = events.try_iter().collect();
        assert_eq!(
            events.last(),
            Some(&PlaybackEvent::Rejected {
                channel: "ui".to_string()
            })
        );
    }

    #[test]
    fn test_channel_bound_and_net_zero() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 2);
        scheduler.configure_channel("footsteps", 3);

        let mut accepted_count = 0;
        for i in 0..200u64 {
            let request = PlayRequest::new(clip("step", 40 + (i % 5) * 10))
                .with_delay(Duration::from_millis((i % 3) * 10))
                .on_channel("footsteps");
            if scheduler.submit(request).expect("valid").is_accepted() {
                accepted_count += 1;
            }
            scheduler.tick(&Tick::uniform(FRAME));
            let active = scheduler
                .channels()
                .get("footsteps")
                .map(|c| c.active_emitters())
                .unwrap_or_default();
            assert!(active <= 3, "channel exceeded its cap: {}", active);
        }
        assert!(accepted_count > 3);

        while scheduler.in_flight() > 0 {
            scheduler.tick(&Tick::uniform(FRAME));
        }
        assert_eq!(scheduler.channels().get("footsteps").map(|c| c.active_emitters()), Some(0));
        assert_eq!(scheduler.pool().active_count(), 0);
    }

    #[test]
    fn test_cancel_after_start_deregisters() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);
        let events = scheduler.subscribe();

        let ticket = accepted(scheduler.submit(PlayRequest::new(clip("alarm", 5000)).on_channel("ui")));
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(1));

        ticket.cancel();
        scheduler.tick(&Tick::uniform(FRAME));
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::Returned);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));
        assert_eq!(scheduler.pool().active_count(), 0);

        let events: Vec<PlaybackEvent> = events.try_iter().collect();
        assert_eq!(events.last(), Some(&PlaybackEvent::Cancelled { id: ticket.id() }));
    }

    #[test]
    fn test_cancel_during_delay_never_plays() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);

        let ticket = accepted(
            scheduler.submit(
                PlayRequest::new(clip("late", 100))
                    .with_delay(Duration::from_secs(1))
                    .on_channel("ui"),
            ),
        );
        assert!(scheduler.cancel(ticket.id()));
        assert!(!scheduler.cancel(ticket.id()));
        assert!(ticket.is_cancelled());

        for _ in 0..200 {
            scheduler.tick(&Tick::uniform(FRAME));
        }
        assert_eq!(engine.trigger_count(), 0);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));
        assert_eq!(scheduler.pool().active_count(), 0);
    }

    #[test]
    fn test_stop_all() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 2);

        for _ in 0..6 {
            accepted(scheduler.submit(PlayRequest::new(clip("rain", 10_000)).on_channel("ambience")));
        }
        assert_eq!(scheduler.pool().active_count(), 6);
        assert_eq!(scheduler.stop_all(), 6);
        assert_eq!(scheduler.pool().active_count(), 0);
        assert_eq!(scheduler.pool().created(), 7);
        assert_eq!(
            scheduler.channels().get("ambience").map(|c| c.active_emitters()),
            Some(0)
        );
    }

    #[test]
    fn test_channel_filled_during_delay() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 2);
        scheduler.configure_channel("voice", 1);

        // Both pass the gate while the channel is empty.
        let delayed = accepted(
            scheduler.submit(
                PlayRequest::new(clip("line-a", 1000))
                    .with_delay(Duration::from_millis(50))
                    .on_channel("voice"),
            ),
        );
        accepted(scheduler.submit(PlayRequest::new(clip("line-b", 1000)).on_channel("voice")));

        for _ in 0..10 {
            scheduler.tick(&Tick::uniform(FRAME));
        }
        assert_eq!(scheduler.state(delayed.id()), PlaybackState::Returned);
        assert_eq!(engine.trigger_count(), 1);
        assert_eq!(scheduler.channels().get("voice").map(|c| c.active_emitters()), Some(1));
        assert_eq!(scheduler.pool().active_count(), 1);
    }

    #[test]
    fn test_engine_failure_still_returns() {
        let engine = mock::Engine::get("mock");
        engine.set_fail(true);
        let mut scheduler = scheduler_with(&engine, 1);

        let ticket = accepted(scheduler.submit(PlayRequest::new(clip("broken", 100)).on_channel("ui")));
        run_until_returned(&mut scheduler, ticket.id(), Tick::uniform(FRAME));
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));
        assert_eq!(scheduler.pool().active_count(), 0);
    }

    #[test]
    fn test_invalid_request_touches_nothing() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);

        let result = scheduler.submit(PlayRequest::new(Vec::<Clip>::new()).on_channel("ui"));
        assert!(matches!(result, Err(PlayError::InvalidRequest(_))));
        assert!(scheduler.channels().get("ui").is_none());
        assert_eq!(scheduler.pool().active_count(), 0);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_event_sequence() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);
        let events = scheduler.subscribe();

        let ticket = accepted(scheduler.submit(PlayRequest::new(clip("pop", 50))));
        run_until_returned(&mut scheduler, ticket.id(), Tick::uniform(FRAME));

        let events: Vec<PlaybackEvent> = events.try_iter().collect();
        let emitter = engine.triggered()[0].emitter_id;
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Accepted {
                    id: ticket.id(),
                    clip: "pop".to_string()
                },
                PlaybackEvent::Started {
                    id: ticket.id(),
                    emitter
                },
                PlaybackEvent::Returned { id: ticket.id() },
            ]
        );
    }

    #[test]
    fn test_extreme_pitch_holds_until_cancelled() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);

        let ticket = accepted(
            scheduler.submit(
                PlayRequest::new(clip("drone", 2000))
                    .with_pitch(f32::MAX)
                    .on_channel("ui"),
            ),
        );
        assert_eq!(engine.trigger_count(), 1);
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::ReturnScheduled);

        for _ in 0..100 {
            scheduler.tick(&Tick::uniform(Duration::from_secs(3600)));
        }
        assert_eq!(scheduler.state(ticket.id()), PlaybackState::ReturnScheduled);
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(1));

        assert!(scheduler.cancel(ticket.id()));
        assert_eq!(scheduler.channels().get("ui").map(|c| c.active_emitters()), Some(0));
        assert_eq!(scheduler.pool().active_count(), 0);
    }

    #[test]
    fn test_saturated_start_releases_emitter() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);
        scheduler.configure_channel("voice", 1);
        let events = scheduler.subscribe();

        let mut task = PlaybackTask {
            id: 99,
            emitter: scheduler.pool.acquire(),
            channel: Some("voice".to_string()),
            registered: false,
            delay: Duration::ZERO,
            clock: ClockMode::Scaled,
            phase: Phase::Delayed(Countdown::new(scheduler.timers.get(
                Duration::ZERO,
                ClockMode::Scaled,
            ))),
            cancel_handle: CancelHandle::new(),
        };
        scheduler.channels.register("voice");
        assert!(!scheduler.start(&mut task));
        scheduler.finish(task, Finish::Saturated);

        assert_eq!(engine.trigger_count(), 0);
        assert_eq!(scheduler.pool().active_count(), 0);
        assert_eq!(scheduler.channels().get("voice").map(|c| c.active_emitters()), Some(1));
        let events: Vec<PlaybackEvent> = events.try_iter().collect();
        assert_eq!(
            events,
            vec![PlaybackEvent::Rejected {
                channel: "voice".to_string()
            }]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let engine = mock::Engine::get("mock");
        let mut scheduler = scheduler_with(&engine, 1);
        drop(scheduler.subscribe());
        accepted(scheduler.submit(PlayRequest::new(clip("pop", 50))));
        assert!(scheduler.subscribers.is_empty());
    }
}
