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

//! Named concurrency caps for groups of sounds.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

/// Default maximum number of concurrent emitters for a channel that was never configured.
pub const DEFAULT_MAX_EMITTERS: u32 = 8;

/// A named cap on concurrently playing emitters.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    name: String,
    max_emitters: u32,
    active_emitters: u32,
}

impl Channel {
    fn new(name: &str, max_emitters: u32) -> Channel {
        Channel {
            name: name.to_string(),
            max_emitters,
            active_emitters: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_emitters(&self) -> u32 {
        self.max_emitters
    }

    pub fn active_emitters(&self) -> u32 {
        self.active_emitters
    }

    fn is_available(&self) -> bool {
        self.active_emitters < self.max_emitters
    }
}

/// Tracks every channel referenced during the session. Channels are never removed.
pub struct ChannelRegistry {
    channels: HashMap<String, Channel>,
    default_max_emitters: u32,
}

impl ChannelRegistry {
    pub fn new(default_max_emitters: u32) -> Self {
        Self {
            channels: HashMap::new(),
            default_max_emitters,
        }
    }

    /// Creates or updates a channel's cap. If more emitters are active than the new cap allows,
    /// the active count is clamped to the cap. Playing emitters are not stopped.
    pub fn configure(&mut self, name: &str, max_emitters: u32) {
        let channel = self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name, max_emitters));
        channel.max_emitters = max_emitters;
        if channel.active_emitters > max_emitters {
            debug!(
                channel = name,
                active = channel.active_emitters,
                max_emitters,
                "Clamping active count to new cap"
            );
            channel.active_emitters = max_emitters;
        }
    }

    /// Returns true if another emitter may start on the channel. Unknown channels are created
    /// with the default cap.
    pub fn is_available(&mut self, name: &str) -> bool {
        let default_max = self.default_max_emitters;
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(channel = name, max_emitters = default_max, "Created channel");
                Channel::new(name, default_max)
            })
            .is_available()
    }

    /// Counts an emitter as playing on the channel. Unknown channels are ignored.
    pub fn register(&mut self, name: &str) {
        if let Some(channel) = self.channels.get_mut(name) {
            channel.active_emitters = channel.active_emitters.saturating_add(1);
        }
    }

    /// Counts an emitter as finished on the channel. Unknown channels are ignored; the count
    /// never drops below zero.
    pub fn deregister(&mut self, name: &str) {
        if let Some(channel) = self.channels.get_mut(name) {
            if channel.active_emitters == 0 {
                warn!(channel = name, "Deregister without matching register");
                return;
            }
            channel.active_emitters -= 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Returns all channels sorted by name.
    pub fn channels(&self) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.channels.values().collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        channels
    }

    pub fn default_max_emitters(&self) -> u32 {
        self.default_max_emitters
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EMITTERS)
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels.len())
            .field("default_max_emitters", &self.default_max_emitters)
            .finish()
    }
}
