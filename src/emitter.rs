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

//! Emitters: reusable playback slots, each mapping onto one voice of the audio engine.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global emitter ID counter.
static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);

/// A sound clip as reported by the audio engine: a name and a playback length at pitch 1.0.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Clip {
    name: Arc<str>,
    length: Duration,
}

impl Clip {
    pub fn new(name: &str, length: Duration) -> Clip {
        Clip {
            name: Arc::from(name),
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> Duration {
        self.length
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.length)
    }
}

/// A point in world space.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

/// Spatial parameters handed to the engine. A blend of 0.0 is fully 2D, 1.0 fully 3D.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct Spatial {
    pub position: Vec3,
    pub blend: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Spatial {
    /// Non-positional playback.
    pub const FLAT: Spatial = Spatial {
        position: Vec3::ZERO,
        blend: 0.0,
        min_distance: 1.0,
        max_distance: 500.0,
    };

    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.blend.is_finite()
            && self.min_distance.is_finite()
            && self.max_distance.is_finite()
            && self.min_distance >= 0.0
            && self.min_distance <= self.max_distance
    }
}

impl Default for Spatial {
    fn default() -> Self {
        Spatial::FLAT
    }
}

/// A shared, lock-free volume value. The emitter, the engine voice and any fade all observe
/// the same value.
#[derive(Clone)]
pub struct VolumeControl {
    bits: Arc<AtomicU32>,
}

impl VolumeControl {
    pub fn new(volume: f32) -> VolumeControl {
        VolumeControl {
            bits: Arc::new(AtomicU32::new(volume.to_bits())),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, volume: f32) {
        self.bits.store(volume.to_bits(), Ordering::Relaxed);
    }
}

impl fmt::Debug for VolumeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VolumeControl").field(&self.get()).finish()
    }
}

/// The settings new emitters are created with, and reset to when they return to the pool.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct EmitterTemplate {
    pub volume: f32,
    pub pitch: f32,
    pub spatial: Spatial,
}

impl Default for EmitterTemplate {
    fn default() -> Self {
        EmitterTemplate {
            volume: 1.0,
            pitch: 1.0,
            spatial: Spatial::FLAT,
        }
    }
}

/// One playback slot. Emitters are not `Clone`: while active an emitter is owned by exactly one
/// in-flight request, and while inactive by the pool.
pub struct Emitter {
    id: u64,
    template: EmitterTemplate,
    clip: Option<Clip>,
    volume: VolumeControl,
    pitch: f32,
    spatial: Spatial,
    active: bool,
}

impl Emitter {
    /// Creates an inactive emitter with its own state initialised from the template.
    pub fn from_template(template: &EmitterTemplate) -> Emitter {
        Emitter {
            id: NEXT_EMITTER_ID.fetch_add(1, Ordering::SeqCst),
            template: *template,
            clip: None,
            volume: VolumeControl::new(template.volume),
            pitch: template.pitch,
            spatial: template.spatial,
            active: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Returns a handle onto this emitter's volume, suitable for fading.
    pub fn volume_control(&self) -> VolumeControl {
        self.volume.clone()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Applies the playback parameters of a request.
    pub fn configure(&mut self, clip: Clip, volume: f32, pitch: f32, spatial: Spatial) {
        self.clip = Some(clip);
        self.volume.set(volume);
        self.pitch = pitch;
        self.spatial = spatial;
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    /// Returns the emitter to its inactive template state.
    pub(crate) fn reset(&mut self) {
        self.active = false;
        self.clip = None;
        self.volume.set(self.template.volume);
        self.pitch = self.template.pitch;
        self.spatial = self.template.spatial;
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("clip", &self.clip.as_ref().map(|c| c.name()))
            .field("volume", &self.volume())
            .field("pitch", &self.pitch)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitters_do_not_share_volume() {
        let template = EmitterTemplate::default();
        let a = Emitter::from_template(&template);
        let b = Emitter::from_template(&template);
        assert_ne!(a.id(), b.id());

        a.volume_control().set(0.25);
        assert_eq!(a.volume(), 0.25);
        assert_eq!(b.volume(), 1.0);
    }

    #[test]
    fn test_reset_restores_template() {
        let template = EmitterTemplate {
            volume: 0.5,
            pitch: 1.0,
            spatial: Spatial::FLAT,
        };
        let mut emitter = Emitter::from_template(&template);
        emitter.configure(
            Clip::new("laser", Duration::from_millis(300)),
            0.9,
            1.5,
            Spatial {
                position: Vec3::new(1.0, 2.0, 3.0),
                blend: 1.0,
                ..Spatial::FLAT
            },
        );
        emitter.activate();
        assert!(emitter.is_active());
        assert_eq!(emitter.clip().map(|c| c.name()), Some("laser"));

        emitter.reset();
        assert!(!emitter.is_active());
        assert!(emitter.clip().is_none());
        assert_eq!(emitter.volume(), 0.5);
        assert_eq!(emitter.pitch(), 1.0);
        assert_eq!(*emitter.spatial(), Spatial::FLAT);
    }

    #[test]
    fn test_spatial_validation() {
        assert!(Spatial::FLAT.is_valid());
        let inverted = Spatial {
            min_distance: 10.0,
            max_distance: 1.0,
            ..Spatial::FLAT
        };
        assert!(!inverted.is_valid());
        let nan = Spatial {
            position: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Spatial::FLAT
        };
        assert!(!nan.is_valid());
    }
}
