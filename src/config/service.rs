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
use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use super::cue::Cue;
use super::error::ConfigError;
use super::parse_duration;
use crate::channels::DEFAULT_MAX_EMITTERS;
use crate::emitter::{Clip, EmitterTemplate};
use crate::pool::{DEFAULT_GROWTH_BATCH, DEFAULT_INITIAL_SIZE};
use crate::request::PlayRequest;
use crate::timers::DEFAULT_TIMER_QUANTUM;

const DEFAULT_ENGINE: &str = "mock";
const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// A YAML representation of the sound service configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Service {
    /// The audio engine to use.
    engine: Option<String>,

    /// Emitter pool sizing.
    #[serde(default)]
    pool: Pool,

    /// Channel caps.
    #[serde(default)]
    channels: Channels,

    /// Bucket size for cached delay timers, e.g. "1ms".
    timer_quantum: Option<String>,

    /// How many times per second the ticker updates the service.
    tick_rate_hz: Option<u32>,

    /// The clips the engine knows about.
    #[serde(default)]
    clips: Vec<ClipDefinition>,

    /// Scripted plays for the run command.
    #[serde(default)]
    cues: Vec<Cue>,
}

impl Service {
    /// Returns the engine name (default: mock).
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    /// Returns the timer cache quantum (default: 1us).
    pub fn timer_quantum(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "timer_quantum",
            self.timer_quantum.as_deref(),
            DEFAULT_TIMER_QUANTUM,
        )
    }

    /// Returns the ticker rate (default: 60Hz).
    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz.unwrap_or(DEFAULT_TICK_RATE_HZ)
    }

    pub fn clips(&self) -> &[ClipDefinition] {
        &self.clips
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Resolves every clip definition, keyed by name.
    pub fn clip_library(&self) -> Result<HashMap<String, Clip>, ConfigError> {
        self.clips
            .iter()
            .map(|clip| Ok((clip.name.clone(), clip.to_clip()?)))
            .collect()
    }

    /// Resolves the cue list into start offsets and requests, sorted by offset.
    pub fn cue_requests(&self) -> Result<Vec<(Duration, PlayRequest)>, ConfigError> {
        let library = self.clip_library()?;
        let mut requests = self
            .cues
            .iter()
            .enumerate()
            .map(|(index, cue)| cue.to_request(index, &library))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        requests.sort_by_key(|(at, _)| *at);
        Ok(requests)
    }

    /// Checks everything that can be checked without an engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz() == 0 {
            return Err(ConfigError::Invalid(
                "tick_rate_hz must be greater than zero".to_string(),
            ));
        }
        if self.pool.growth_batch() == 0 {
            return Err(ConfigError::Invalid(
                "pool.growth_batch must be greater than zero".to_string(),
            ));
        }
        // Unlisted channels are created with this cap on first use and must accept a sound.
        if self.channels.default_max_emitters() == 0 {
            return Err(ConfigError::Invalid(
                "channels.default_max_emitters must be greater than zero".to_string(),
            ));
        }
        self.timer_quantum()?;
        self.cue_requests()?;
        Ok(())
    }
}

/// Emitter pool configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Pool {
    /// Emitters created at startup (default: 10).
    initial_size: Option<usize>,

    /// Emitters added whenever the pool drains (default: 5).
    growth_batch: Option<usize>,

    /// Settings every emitter starts from.
    template: Option<EmitterTemplate>,
}

impl Pool {
    pub fn initial_size(&self) -> usize {
        self.initial_size.unwrap_or(DEFAULT_INITIAL_SIZE)
    }

    pub fn growth_batch(&self) -> usize {
        self.growth_batch.unwrap_or(DEFAULT_GROWTH_BATCH)
    }

    pub fn template(&self) -> EmitterTemplate {
        self.template.unwrap_or_default()
    }
}

/// Channel configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Channels {
    /// Cap for channels that are not listed (default: 8).
    default_max_emitters: Option<u32>,

    /// Explicit caps by channel name.
    #[serde(default)]
    limits: HashMap<String, u32>,
}

impl Channels {
    pub fn default_max_emitters(&self) -> u32 {
        self.default_max_emitters.unwrap_or(DEFAULT_MAX_EMITTERS)
    }

    pub fn limits(&self) -> &HashMap<String, u32> {
        &self.limits
    }
}

/// A clip the engine can play, with its length.
#[derive(Deserialize, Clone, Debug)]
pub struct ClipDefinition {
    name: String,
    length: String,
}

impl ClipDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_clip(&self) -> Result<Clip, ConfigError> {
        let length = parse_duration(
            &format!("clip '{}' length", self.name),
            Some(&self.length),
            Duration::ZERO,
        )?;
        Ok(Clip::new(&self.name, length))
    }
}
