use core_sim::{SimConfig, Snapshot};
use runtime::{EngineError, EngineHandle, Session, SessionEvent, SessionStatus, SimulationClock};
use tokio::sync::mpsc;

use crate::{
    commands::{Command, HELP},
    config::{Config, OutputMode},
};

pub fn build_session(config: &Config, seed: u64, now_ms: i64) -> Session {
    let sim_config = SimConfig::default().with_starting_cash(config.starting_cash);
    let clock = SimulationClock::new(config.base_interval).with_speed(config.speed);

    Session::with_clock(sim_config, seed, clock, now_ms)
}

/// Runs one parsed command against the engine, printing any direct reply.
/// Trade rejections have already reached the presenter, so they are not errors here.
pub async fn dispatch(
    handle: &EngineHandle,
    command: Command,
    output: OutputMode,
) -> Result<(), EngineError> {
    match command {
        Command::Trade {
            action,
            symbol,
            quantity,
        } => match handle.trade(symbol, action, quantity).await {
            Ok(_) | Err(EngineError::Trade(_)) => {}
            Err(err) => return Err(err),
        },
        Command::Speed(Some(speed)) => {
            handle.set_speed(speed).await?;
        }
        Command::Speed(None) => {
            handle.cycle_speed().await?;
        }
        Command::Pause => {
            handle.pause().await?;
        }
        Command::Resume => {
            handle.resume().await?;
        }
        Command::Reset => {
            handle.reset().await?;
        }
        Command::Status => {
            let status = handle.status().await?;
            match render_status(&status, output) {
                Ok(text) => println!("{text}"),
                Err(err) => tracing::error!(%err, "failed to render status"),
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => handle.shutdown(),
    }
    Ok(())
}

/// Prints presentation events until the engine drops its presenter.
pub async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>, output: OutputMode) {
    while let Some(event) = events.recv().await {
        match render_event(&event, output) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(%err, kind = event.kind(), "failed to render event"),
        }
    }
}

pub fn render_event(event: &SessionEvent, output: OutputMode) -> serde_json::Result<String> {
    if output == OutputMode::Json {
        return event.to_json();
    }

    Ok(match event {
        SessionEvent::Tick { snapshot } => {
            format!("[tick {}] {}", snapshot.tick, market_line(snapshot))
        }
        SessionEvent::TradeResult { success: true, message } => format!("OK    {message}"),
        SessionEvent::TradeResult {
            success: false,
            message,
        } => format!("FAIL  {message}"),
        SessionEvent::AchievementUnlocked { achievement } => format!(
            "{} Achievement unlocked: {} ({}) - {}",
            achievement.icon,
            achievement.name,
            achievement.rarity.as_str(),
            achievement.description
        ),
        SessionEvent::Reset { snapshot } => {
            format!("Game reset! Good luck, trader. {}", market_line(snapshot))
        }
        SessionEvent::ClockChanged { state, speed } => {
            format!("clock {} at {speed}", state.as_str())
        }
    })
}

pub fn render_status(status: &SessionStatus, output: OutputMode) -> serde_json::Result<String> {
    if output == OutputMode::Json {
        return serde_json::to_string(status);
    }

    let portfolio = &status.snapshot.portfolio;
    let mut lines = vec![
        format!(
            "clock {} at {} | tick {}",
            status.state.as_str(),
            status.speed,
            status.snapshot.tick
        ),
        market_line(&status.snapshot),
    ];
    for position in portfolio.positions.iter().filter(|p| p.shares > 0) {
        lines.push(format!(
            "  {} x{} = ${:.2}",
            position.symbol, position.shares, position.value
        ));
    }
    lines.push(format!(
        "profit ${:.2} ({:+.2}%) | trades {} | achievements {}/{}",
        portfolio.profit,
        portfolio.profit_pct,
        portfolio.stats.total_trades,
        status.progress.unlocked,
        status.progress.total
    ));
    for entry in &status.recent_log {
        lines.push(format!(
            "  {} [{}] {}",
            entry.time_label(),
            entry.kind.as_str(),
            entry.message
        ));
    }
    Ok(lines.join("\n"))
}

fn market_line(snapshot: &Snapshot) -> String {
    let prices: Vec<String> = snapshot
        .instruments
        .iter()
        .map(|i| format!("{} ${:.2} ({:+.2}%)", i.symbol, i.price, i.change_pct))
        .collect();
    let portfolio = &snapshot.portfolio;

    format!(
        "{} | cash ${:.2} | total ${:.2}",
        prices.join(" | "),
        portfolio.cash,
        portfolio.total_value
    )
}
