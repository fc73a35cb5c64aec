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

/// Typed error for play requests refused at the API boundary. Channel saturation is not an
/// error; it is reported as a rejected outcome.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PlayError {
    #[error("invalid play request: {0}")]
    InvalidRequest(#[from] InvalidRequest),
}

/// The reason a request was malformed.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidRequest {
    #[error("clip set is empty")]
    EmptyClipSet,
    #[error("volume {0} must be finite and non-negative")]
    Volume(f32),
    #[error("pitch {0} must be finite and positive")]
    Pitch(f32),
    #[error("spatial parameters are out of range")]
    Spatial,
    #[error("fade bound {0} must be finite")]
    FadeBound(f32),
}
