pub mod clock;
pub mod engine;
pub mod events;
pub mod logging;
pub mod session;

pub use clock::{ClockState, SimulationClock, Speed, BASE_INTERVAL};
pub use engine::{now_ms, EngineError, EngineHandle, SimEngine};
pub use events::{ChannelPresenter, NullPresenter, Presenter, RecordingPresenter, SessionEvent};
pub use logging::{LogEntry, LogKind, TradeLog, TRADE_LOG_CAPACITY};
pub use session::{Session, SessionStatus};
