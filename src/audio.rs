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
use std::{error::Error, fmt, sync::Arc, time::Duration};

use crate::emitter::{Clip, Emitter};

pub mod mock;

/// The audio engine that actually renders emitters. Decoding, mixing and spatialization all
/// live behind this trait.
pub trait Engine: fmt::Display + Send + Sync {
    /// Triggers exactly one playback of the emitter's configured clip. Playback completion is
    /// not reported back; the scheduler infers it from the clip length.
    fn play_one_shot(&self, emitter: &Emitter) -> Result<(), Box<dyn Error>>;

    /// Reports the length of the clip at pitch 1.0.
    fn clip_length(&self, clip: &Clip) -> Duration {
        clip.length()
    }
}

/// Gets an engine with the given name.
pub fn get_engine(name: &str) -> Result<Arc<dyn Engine>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Engine::get(name)));
    }

    Err(format!("unknown audio engine '{}'", name).into())
}
