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

use super::error::ConfigError;
use super::parse_duration;
use crate::clock::ClockMode;
use crate::emitter::{Clip, Spatial};
use crate::request::PlayRequest;

/// A scripted play: which clips to pick from, when to submit, and how to play them.
#[derive(Deserialize, Clone, Debug)]
pub struct Cue {
    /// Offset from the start of the run at which the request is submitted.
    at: Option<String>,

    /// Clip names. One is picked at random when more than one is given.
    clips: Vec<String>,

    volume: Option<f32>,
    pitch: Option<f32>,

    /// Delay before playback, measured on the clock chosen by `real_time`.
    delay: Option<String>,

    #[serde(default)]
    real_time: bool,

    channel: Option<String>,

    /// World position. Setting this makes the cue fully 3D unless a blend is given.
    position: Option<[f32; 3]>,
    spatial_blend: Option<f32>,
    min_distance: Option<f32>,
    max_distance: Option<f32>,
}

impl Cue {
    /// Resolves the cue into its submit offset and request. `index` is only used for errors.
    pub fn to_request(
        &self,
        index: usize,
        library: &HashMap<String, Clip>,
    ) -> Result<(Duration, PlayRequest), ConfigError> {
        let clips = self
            .clips
            .iter()
            .map(|name| {
                library
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownClip {
                        cue: index,
                        clip: name.clone(),
                    })
            })
            .collect::<Result<Vec<Clip>, ConfigError>>()?;

        let at = parse_duration(
            &format!("cue {} at", index),
            self.at.as_deref(),
            Duration::ZERO,
        )?;
        let delay = parse_duration(
            &format!("cue {} delay", index),
            self.delay.as_deref(),
            Duration::ZERO,
        )?;

        let mut request = PlayRequest::new(clips)
            .with_volume(self.volume.unwrap_or(1.0))
            .with_pitch(self.pitch.unwrap_or(1.0))
            .with_delay(delay)
            .with_clock(ClockMode::from_real_time(self.real_time))
            .with_spatial(self.spatial());
        if let Some(channel) = &self.channel {
            request = request.on_channel(channel);
        }

        request.validate().map_err(|e| {
            ConfigError::Invalid(format!("cue {} is not a playable request: {}", index, e))
        })?;
        Ok((at, request))
    }

    fn spatial(&self) -> Spatial {
        let mut spatial = Spatial::FLAT;
        if let Some(position) = self.position {
            spatial.position = position.into();
            spatial.blend = 1.0;
        }
        if let Some(blend) = self.spatial_blend {
            spatial.blend = blend;
        }
        if let Some(min_distance) = self.min_distance {
            spatial.min_distance = min_distance;
        }
        if let Some(max_distance) = self.max_distance {
            spatial.max_distance = max_distance;
        }
        spatial
    }
}
