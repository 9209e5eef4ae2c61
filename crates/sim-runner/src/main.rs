mod commands;
mod config;
mod wiring;

use std::{
    error::Error,
    io::{self, BufRead},
    thread,
};

use runtime::{now_ms, ChannelPresenter, EngineError, SimEngine};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, CommandError, HELP};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = config::Config::from_env()?;
    let seed = config.seed.unwrap_or_else(|| now_ms().unsigned_abs());
    tracing::info!(
        seed,
        speed = %config.speed,
        output = config.output.as_str(),
        "starting simulator"
    );

    let session = wiring::build_session(&config, seed, now_ms());
    let (presenter, events) = ChannelPresenter::new();
    let (handle, engine) = SimEngine::new(session, presenter)
        .with_max_ticks(config.max_ticks)
        .spawn();
    let printer = tokio::spawn(wiring::print_events(events, config.output));

    if config.output == config::OutputMode::Log {
        println!("{HELP}");
    }

    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            _ = handle.closed() => break,
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    break;
                };
                let command = match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => command,
                    Err(CommandError::Empty) => continue,
                    Err(err) => {
                        println!("error: {err}");
                        continue;
                    }
                };
                match wiring::dispatch(&handle, command, config.output).await {
                    Ok(()) => {}
                    Err(EngineError::Stopped) => break,
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    handle.shutdown();
    let session = engine.await?;
    printer.await?;

    let snapshot = session.snapshot();
    tracing::info!(
        ticks = session.tick_count(),
        total_value = snapshot.portfolio.total_value,
        profit = snapshot.portfolio.profit,
        unlocked = session.achievements().progress().unlocked,
        "simulator stopped"
    );
    Ok(())
}

/// Reads stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Human-readable logs on stderr; stdout carries the presentation stream.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
