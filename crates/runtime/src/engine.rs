use core_sim::{Snapshot, TradeAction, TradeError, TradeFill};
use time::OffsetDateTime;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::{ClockState, Speed},
    events::Presenter,
    session::{Session, SessionStatus},
};

const COMMAND_BUFFER: usize = 64;
const STATUS_LOG_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("simulation engine is no longer running")]
    Stopped,

    #[error(transparent)]
    Trade(#[from] TradeError),
}

impl<T> From<mpsc::error::SendError<T>> for EngineError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Stopped
    }
}

impl From<oneshot::error::RecvError> for EngineError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Stopped
    }
}

enum Command {
    Trade {
        symbol: String,
        action: TradeAction,
        quantity: String,
        reply: oneshot::Sender<Result<TradeFill, TradeError>>,
    },
    SetSpeed {
        speed: Speed,
        reply: oneshot::Sender<Speed>,
    },
    CycleSpeed {
        reply: oneshot::Sender<Speed>,
    },
    Pause {
        reply: oneshot::Sender<ClockState>,
    },
    Resume {
        reply: oneshot::Sender<ClockState>,
    },
    TogglePause {
        reply: oneshot::Sender<ClockState>,
    },
    Reset {
        reply: oneshot::Sender<Snapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
}

/// Unix millis from the wall clock.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Drives a [`Session`] from one task: ticks on the clock interval and runs
/// presentation commands in between, so the two never interleave.
pub struct SimEngine<P> {
    session: Session,
    presenter: P,
    max_ticks: Option<u64>,
}

impl<P> SimEngine<P>
where
    P: Presenter + Send + 'static,
{
    pub fn new(session: Session, presenter: P) -> Self {
        Self {
            session,
            presenter,
            max_ticks: None,
        }
    }

    /// Stops the loop on its own after `max_ticks` ticks.
    pub fn with_max_ticks(self, max_ticks: Option<u64>) -> Self {
        Self { max_ticks, ..self }
    }

    /// Starts the engine task. The join handle yields the session once the
    /// loop ends: on shutdown, when every handle is dropped, or at the tick limit.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<Session>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();
        let handle = EngineHandle {
            commands: tx,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(self.run(rx, cancel));
        (handle, task)
    }

    async fn run(self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) -> Session {
        let SimEngine {
            mut session,
            mut presenter,
            max_ticks,
        } = self;
        let mut next_tick = Instant::now() + session.interval();

        loop {
            let running = session.clock().is_running();

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(ticks = session.tick_count(), "engine cancelled");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!("all engine handles dropped; stopping");
                        break;
                    };
                    let before = (session.clock().state(), session.clock().speed());
                    handle_command(&mut session, &mut presenter, command);
                    if before != (session.clock().state(), session.clock().speed()) {
                        next_tick = Instant::now() + session.interval();
                    }
                }
                _ = tokio::time::sleep_until(next_tick), if running => {
                    session.tick(now_ms(), &mut presenter);
                    next_tick += session.interval();

                    if max_ticks.is_some_and(|limit| session.tick_count() >= limit) {
                        tracing::info!(ticks = session.tick_count(), "tick limit reached");
                        break;
                    }
                }
            }
        }

        session
    }
}

fn handle_command(session: &mut Session, presenter: &mut impl Presenter, command: Command) {
    let now = now_ms();

    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Trade {
            symbol,
            action,
            quantity,
            reply,
        } => {
            let result = session.submit_order(&symbol, action, &quantity, now, presenter);
            let _ = reply.send(result);
        }
        Command::SetSpeed { speed, reply } => {
            session.set_speed(speed, now, presenter);
            let _ = reply.send(session.clock().speed());
        }
        Command::CycleSpeed { reply } => {
            let _ = reply.send(session.cycle_speed(now, presenter));
        }
        Command::Pause { reply } => {
            let _ = reply.send(session.pause(presenter));
        }
        Command::Resume { reply } => {
            let _ = reply.send(session.resume(presenter));
        }
        Command::TogglePause { reply } => {
            let _ = reply.send(session.toggle_pause(presenter));
        }
        Command::Reset { reply } => {
            session.reset(now, presenter);
            let _ = reply.send(session.snapshot());
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
        Command::Status { reply } => {
            let _ = reply.send(session.status(STATUS_LOG_LINES));
        }
    }
}

/// Cloneable front end to a running [`SimEngine`].
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(build(reply)).await?;
        Ok(response.await?)
    }

    pub async fn trade(
        &self,
        symbol: impl Into<String>,
        action: TradeAction,
        quantity: impl Into<String>,
    ) -> Result<TradeFill, EngineError> {
        let symbol = symbol.into();
        let quantity = quantity.into();
        let result = self
            .request(|reply| Command::Trade {
                symbol,
                action,
                quantity,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub async fn set_speed(&self, speed: Speed) -> Result<Speed, EngineError> {
        self.request(|reply| Command::SetSpeed { speed, reply }).await
    }

    pub async fn cycle_speed(&self) -> Result<Speed, EngineError> {
        self.request(|reply| Command::CycleSpeed { reply }).await
    }

    pub async fn pause(&self) -> Result<ClockState, EngineError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<ClockState, EngineError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    pub async fn toggle_pause(&self) -> Result<ClockState, EngineError> {
        self.request(|reply| Command::TogglePause { reply }).await
    }

    pub async fn reset(&self) -> Result<Snapshot, EngineError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, EngineError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn status(&self) -> Result<SessionStatus, EngineError> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Resolves once the engine loop has ended.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }
}
