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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use crate::emitter::{Emitter, Spatial, VolumeControl};

/// A record of one triggered playback.
#[derive(Clone, Debug)]
pub struct Triggered {
    pub emitter_id: u64,
    pub clip: String,
    pub volume: f32,
    pub pitch: f32,
    pub spatial: Spatial,
    /// Live view of the emitter's volume, as a real voice would hold it.
    pub volume_control: VolumeControl,
}

/// A mock engine. Doesn't actually play anything, but records every trigger.
#[derive(Clone)]
pub struct Engine {
    name: String,
    triggered: Arc<Mutex<Vec<Triggered>>>,
    fail: Arc<AtomicBool>,
}

impl Engine {
    /// Gets the given mock engine.
    pub fn get(name: &str) -> Engine {
        Engine {
            name: name.to_string(),
            triggered: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns every playback triggered so far.
    pub fn triggered(&self) -> Vec<Triggered> {
        self.triggered.lock().clone()
    }

    /// Returns the number of playbacks triggered so far.
    pub fn trigger_count(&self) -> usize {
        self.triggered.lock().len()
    }

    /// Makes subsequent triggers fail, to exercise error handling.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl crate::audio::Engine for Engine {
    fn play_one_shot(&self, emitter: &Emitter) -> Result<(), Box<dyn Error>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(format!("{} refused to play", self.name).into());
        }

        let clip = match emitter.clip() {
            Some(clip) => clip,
            None => return Err("emitter has no clip".into()),
        };

        info!(
            engine = self.name,
            emitter = emitter.id(),
            clip = clip.name(),
            volume = emitter.volume(),
            pitch = emitter.pitch(),
            "Playing one-shot."
        );

        self.triggered.lock().push(Triggered {
            emitter_id: emitter.id(),
            clip: clip.name().to_string(),
            volume: emitter.volume(),
            pitch: emitter.pitch(),
            spatial: *emitter.spatial(),
            volume_control: emitter.volume_control(),
        });
        Ok(())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
