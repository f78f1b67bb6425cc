//! # PHOSPHOR Headless Demo
//!
//! Two real threads, one frame pipeline, no GPU:
//!
//! - main thread: owns the (pretend) graphics context, runs the simulation
//!   at the configured tick rate, seals one frame per tick;
//! - presentation thread: receives the context on loan, runs the paced
//!   present loop against the recording backend, hands the context back at
//!   shutdown.
//!
//! Usage: `phosphor_headless [config.toml]`

use phosphor::{build_tick_frame, HeadlessBackend, PhosphorConfig, RenderLog};
use phosphor_present::{handoff, DriverConfig, MonotonicClock, PresentDriver, Stepper};
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use tracing::{debug, error, info};

/// The pretend graphics context handed between the two threads.
#[derive(Debug)]
struct PaintContext {
    label: &'static str,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "starting headless run");

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "presentation thread failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<PhosphorConfig, phosphor::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => PhosphorConfig::load(Path::new(&path)),
        None => Ok(PhosphorConfig::default()),
    }
}

fn run(config: &PhosphorConfig) -> Result<(), phosphor_present::PresentError> {
    let (mut producer, consumer) = phosphor_core::FramePipeline::new();
    let (owner, loan) = handoff::<PaintContext>();
    let log = RenderLog::new();

    let backend = HeadlessBackend::new(config.refresh_interval());
    let stats = backend.stats_handle();
    let (driver, stop) = PresentDriver::new(
        consumer,
        backend,
        MonotonicClock::new(),
        DriverConfig {
            tick_interval: config.tick_interval(),
        },
    );
    let gauge = driver.gauge();

    let presenter = thread::Builder::new()
        .name("present".to_string())
        .spawn(move || -> Result<(), phosphor_present::PresentError> {
            let (context, return_slip) = loan.receive().expect("context loan failed");
            debug!(context = context.label, "context current on present thread");

            let result = driver.run().map(|_backend| ());

            if let Err(err) = return_slip.hand_back(context) {
                error!(%err, "owner gone, dropping context on present thread");
            }
            result
        })
        .expect("failed to spawn present thread");

    // The context is created and eventually destroyed on this thread; the
    // present thread only borrows it.
    let reclaim = owner
        .lend(PaintContext { label: "headless" })
        .expect("present thread went away before the context was lent");

    // Simulation loop: one sealed frame per paced tick.
    let mut stepper = Stepper::new(MonotonicClock::new(), config.tick_interval());
    let timing_every = u64::from(config.tick_hz).max(1);
    for tick in 0..config.run_frames {
        let seq = build_tick_frame(&mut producer, tick, &log);
        let outcome = stepper.step();
        if !outcome.slept {
            stepper.reseed(config.tick_interval());
        }
        if config.timing_logs && tick % timing_every == 0 {
            debug!(
                tick,
                seq = seq.get(),
                present_interval_us = gauge
                    .interval()
                    .map_or(0, |interval| interval.as_micros() as u64),
                "tick sealed"
            );
        }
    }

    info!("simulation finished, stopping presentation");
    stop.stop();
    let result = presenter
        .join()
        .unwrap_or_else(|_| panic!("present thread panicked"));

    let context = reclaim
        .reclaim()
        .expect("present thread dropped the context instead of returning it");
    debug!(context = context.label, "context back on owning thread");

    let stats = *stats.lock();
    info!(
        frames = config.run_frames,
        presents = stats.presents,
        flushes = stats.flushes,
        commands = log.len(),
        "headless run complete"
    );
    result
}
