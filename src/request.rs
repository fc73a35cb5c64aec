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
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::clock::ClockMode;
use crate::emitter::{Clip, Spatial, Vec3};
use crate::error::InvalidRequest;

/// Either one clip, or a set of clips to pick from at random.
#[derive(Clone, Debug, PartialEq)]
pub enum ClipSelection {
    Single(Clip),
    Random(Vec<Clip>),
}

impl ClipSelection {
    /// Picks the clip to play. A set is sampled uniformly; an empty set yields nothing.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Clip> {
        match self {
            ClipSelection::Single(clip) => Some(clip),
            ClipSelection::Random(clips) => clips.choose(rng),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ClipSelection::Single(_) => false,
            ClipSelection::Random(clips) => clips.is_empty(),
        }
    }
}

impl From<Clip> for ClipSelection {
    fn from(clip: Clip) -> Self {
        ClipSelection::Single(clip)
    }
}

impl From<&Clip> for ClipSelection {
    fn from(clip: &Clip) -> Self {
        ClipSelection::Single(clip.clone())
    }
}

impl From<Vec<Clip>> for ClipSelection {
    fn from(clips: Vec<Clip>) -> Self {
        ClipSelection::Random(clips)
    }
}

impl From<&[Clip]> for ClipSelection {
    fn from(clips: &[Clip]) -> Self {
        ClipSelection::Random(clips.to_vec())
    }
}

/// Describes one play call. Consumed by the scheduler.
#[derive(Clone, Debug)]
pub struct PlayRequest {
    clips: ClipSelection,
    volume: f32,
    pitch: f32,
    spatial: Spatial,
    delay: Duration,
    clock: ClockMode,
    channel: Option<String>,
}

impl PlayRequest {
    /// Creates a non-positional request at full volume and normal pitch, with no delay.
    pub fn new(clips: impl Into<ClipSelection>) -> PlayRequest {
        PlayRequest {
            clips: clips.into(),
            volume: 1.0,
            pitch: 1.0,
            spatial: Spatial::FLAT,
            delay: Duration::ZERO,
            clock: ClockMode::Scaled,
            channel: None,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_spatial(mut self, spatial: Spatial) -> Self {
        self.spatial = spatial;
        self
    }

    /// Positions the sound in the world, keeping the current blend and distances.
    pub fn at(mut self, position: Vec3) -> Self {
        self.spatial.position = position;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn on_channel(mut self, channel: &str) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    pub fn clips(&self) -> &ClipSelection {
        &self.clips
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn clock(&self) -> ClockMode {
        self.clock
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Checks the request before any state is touched.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.clips.is_empty() {
            return Err(InvalidRequest::EmptyClipSet);
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(InvalidRequest::Volume(self.volume));
        }
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return Err(InvalidRequest::Pitch(self.pitch));
        }
        if !self.spatial.is_valid() {
            return Err(InvalidRequest::Spatial);
        }
        Ok(())
    }
}

/// The time an emitter is held after playback starts: the initial delay, the clip length scaled
/// by pitch, and a fixed margin. Saturates at `Duration::MAX` for extreme pitches.
pub fn hold_duration(delay: Duration, clip_length: Duration, pitch: f32) -> Duration {
    let scaled = Duration::try_from_secs_f64(clip_length.as_secs_f64() * f64::from(pitch))
        .unwrap_or(Duration::MAX);
    delay.saturating_add(scaled).saturating_add(RETURN_MARGIN)
}

/// Margin added to every hold so the engine has finished with the voice before it is reused.
pub const RETURN_MARGIN: Duration = Duration::from_millis(100);
