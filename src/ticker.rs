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

//! Drives a shared service from a background thread for hosts without a frame loop.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::playsync::CancelHandle;
use crate::service::SoundService;

/// A background thread that calls `update` on the service at a fixed rate with the measured
/// real time since the previous update.
pub struct Ticker {
    cancel_handle: CancelHandle,
    join_handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Starts ticking the service `rate_hz` times per second.
    pub fn start(service: Arc<Mutex<SoundService>>, rate_hz: u32) -> io::Result<Ticker> {
        if rate_hz == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "tick rate must be greater than zero",
            ));
        }

        let cancel_handle = CancelHandle::new();
        let frame_time = Duration::from_secs_f64(1.0 / f64::from(rate_hz));
        let join_handle = {
            let cancel_handle = cancel_handle.clone();
            thread::Builder::new()
                .name("sfxpool-ticker".to_string())
                .spawn(move || {
                    info!(rate_hz, "Ticker started");
                    let mut last_update = Instant::now();
                    let mut next_frame = last_update + frame_time;
                    loop {
                        let wait = next_frame.saturating_duration_since(Instant::now());
                        if cancel_handle.wait_timeout(wait) {
                            break;
                        }

                        let now = Instant::now();
                        service.lock().update(now.duration_since(last_update));
                        last_update = now;

                        next_frame += frame_time;
                        // Skip frames we fell behind on rather than bursting to catch up.
                        if next_frame < now {
                            debug!("Ticker fell behind");
                            next_frame = now + frame_time;
                        }
                    }
                    info!("Ticker stopped");
                })?
        };

        Ok(Ticker {
            cancel_handle,
            join_handle: Some(join_handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.cancel_handle.cancel();
        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                error!("Ticker thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.is_some() && !self.cancel_handle.is_cancelled()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
