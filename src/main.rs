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
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use sfxpool::scheduler::PlayOutcome;
use sfxpool::service::{ServiceStats, SoundService};
use sfxpool::ticker::Ticker;
use sfxpool::{audio, config};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A pooled sound effect scheduler."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads and checks a service configuration without playing anything.
    Verify {
        /// The path to the service configuration.
        path: String,
    },
    /// Plays the cues in a service configuration and reports the final bookkeeping.
    Run {
        /// The path to the service configuration.
        path: String,
        /// Print events and the final stats as JSON.
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify { path } => {
            let service = config::load(&PathBuf::from(&path))?;
            service.validate()?;

            println!("Configuration {} is valid.", path);
            println!("- engine: {}", service.engine());
            println!("- tick rate: {}Hz", service.tick_rate_hz());
            println!(
                "- pool: {} emitters, growing by {}",
                service.pool().initial_size(),
                service.pool().growth_batch()
            );
            println!(
                "- channels: default cap {}, {} configured",
                service.channels().default_max_emitters(),
                service.channels().limits().len()
            );
            println!("- clips: {}", service.clips().len());
            println!("- cues: {}", service.cues().len());
        }
        Commands::Run { path, json } => {
            let config = config::load(&PathBuf::from(&path))?;
            config.validate()?;
            let stats = run(&config, json).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}

/// Plays every cue at its offset, waits for the service to go idle, and returns the final stats.
async fn run(config: &config::Service, json: bool) -> Result<ServiceStats, Box<dyn Error>> {
    let engine = audio::get_engine(config.engine())?;
    info!(engine = engine.to_string(), "Using engine");

    let service = Arc::new(Mutex::new(SoundService::from_config(engine, config)?));
    let events = service.lock().subscribe();
    let printer = thread::spawn(move || {
        for event in events.iter() {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(err = e.to_string(), "Unable to encode event"),
                }
            } else {
                println!("{:?}", event);
            }
        }
    });

    let mut ticker = Ticker::start(Arc::clone(&service), config.tick_rate_hz())?;
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(config.tick_rate_hz()));

    let start = Instant::now();
    for (at, request) in config.cue_requests()? {
        tokio::time::sleep_until(start + at).await;
        match service.lock().play(request)? {
            PlayOutcome::Accepted(ticket) => info!(id = ticket.id(), "Cue accepted"),
            PlayOutcome::Rejected { channel } => info!(channel, "Cue rejected"),
        }
    }

    while !service.lock().is_idle() {
        tokio::time::sleep(frame_time).await;
    }
    ticker.stop();

    let stats = service.lock().stats();
    // The last reference owns the event senders; dropping it lets the printer finish.
    drop(ticker);
    drop(service);
    if printer.join().is_err() {
        warn!("Event printer panicked");
    }

    Ok(stats)
}

fn print_stats(stats: &ServiceStats) {
    println!(
        "Pool: {} created, {} free, {} active",
        stats.pool.created, stats.pool.free, stats.pool.active
    );
    println!("In flight: {}", stats.in_flight);
    println!("Active fades: {}", stats.active_fades);
    println!("Cached timers: {}", stats.cached_timers);
    println!("Channels:");
    for channel in stats.channels.iter() {
        println!(
            "- {}: {}/{}",
            channel.name(),
            channel.active_emitters(),
            channel.max_emitters()
        );
    }
}
