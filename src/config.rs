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
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use duration_string::DurationString;

mod cue;
mod error;
mod service;

pub use cue::Cue;
pub use error::ConfigError;
pub use service::{Channels, ClipDefinition, Pool, Service};

/// Prefix for environment variables that override file settings, e.g. `SFXPOOL_ENGINE`.
const ENV_PREFIX: &str = "SFXPOOL";

/// Loads the service configuration from a YAML file, with environment overrides applied on
/// top.
pub fn load(path: &Path) -> Result<Service, ConfigError> {
    Ok(Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize::<Service>()?)
}

/// Parses an optional duration string such as `250ms`, falling back to the default when unset.
pub(crate) fn parse_duration(
    field: &str,
    value: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => DurationString::from_string(value.to_string())
            .map(Into::into)
            .map_err(|e| ConfigError::Duration {
                field: field.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}
