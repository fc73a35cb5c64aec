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

//! Pooled, channel-limited scheduling of transient sound effects.
//!
//! Play calls borrow an emitter from a growable pool, wait out an optional delay on either the
//! scaled or the real clock, trigger the engine, and give the emitter back once the clip has had
//! time to finish. Everything advances from a single `update(dt)` call, either from the host's
//! frame loop or from a [`ticker::Ticker`].

pub mod audio;
pub mod channels;
pub mod clock;
pub mod config;
pub mod emitter;
pub mod error;
pub mod fade;
pub mod playsync;
pub mod pool;
pub mod request;
pub mod scheduler;
pub mod service;
pub mod ticker;
pub mod timers;

pub use clock::ClockMode;
pub use emitter::{Clip, Spatial, Vec3};
pub use error::{InvalidRequest, PlayError};
pub use request::PlayRequest;
pub use scheduler::{PlayOutcome, PlaybackEvent, PlaybackState, PlaybackTicket};
pub use service::SoundService;
