use achievements::Achievement;
use core_sim::Snapshot;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::clock::{ClockState, Speed};

/// Receives state pushes from the session. Implementations render; they never
/// mutate the simulation.
pub trait Presenter {
    fn on_tick(&mut self, snapshot: &Snapshot);

    fn on_trade_result(&mut self, success: bool, message: &str);

    fn on_achievement_unlocked(&mut self, achievement: &Achievement);

    fn on_reset(&mut self, snapshot: &Snapshot);

    fn on_clock_changed(&mut self, _state: ClockState, _speed: Speed) {}
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        (**self).on_tick(snapshot);
    }

    fn on_trade_result(&mut self, success: bool, message: &str) {
        (**self).on_trade_result(success, message);
    }

    fn on_achievement_unlocked(&mut self, achievement: &Achievement) {
        (**self).on_achievement_unlocked(achievement);
    }

    fn on_reset(&mut self, snapshot: &Snapshot) {
        (**self).on_reset(snapshot);
    }

    fn on_clock_changed(&mut self, state: ClockState, speed: Speed) {
        (**self).on_clock_changed(state, speed);
    }
}

/// Presenter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn on_tick(&mut self, _snapshot: &Snapshot) {}

    fn on_trade_result(&mut self, _success: bool, _message: &str) {}

    fn on_achievement_unlocked(&mut self, _achievement: &Achievement) {}

    fn on_reset(&mut self, _snapshot: &Snapshot) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    Tick {
        snapshot: Snapshot,
    },
    TradeResult {
        success: bool,
        message: String,
    },
    AchievementUnlocked {
        achievement: Achievement,
    },
    Reset {
        snapshot: Snapshot,
    },
    ClockChanged {
        state: ClockState,
        speed: Speed,
    },
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::TradeResult { .. } => "trade_result",
            Self::AchievementUnlocked { .. } => "achievement_unlocked",
            Self::Reset { .. } => "reset",
            Self::ClockChanged { .. } => "clock_changed",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Collects every pushed event in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Vec<SessionEvent>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(SessionEvent::kind).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Presenter for RecordingPresenter {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        self.events.push(SessionEvent::Tick {
            snapshot: snapshot.clone(),
        });
    }

    fn on_trade_result(&mut self, success: bool, message: &str) {
        self.events.push(SessionEvent::TradeResult {
            success,
            message: message.to_owned(),
        });
    }

    fn on_achievement_unlocked(&mut self, achievement: &Achievement) {
        self.events.push(SessionEvent::AchievementUnlocked {
            achievement: *achievement,
        });
    }

    fn on_reset(&mut self, snapshot: &Snapshot) {
        self.events.push(SessionEvent::Reset {
            snapshot: snapshot.clone(),
        });
    }

    fn on_clock_changed(&mut self, state: ClockState, speed: Speed) {
        self.events.push(SessionEvent::ClockChanged { state, speed });
    }
}

/// Forwards events to another task. Sends after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("presentation receiver closed; event dropped");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        self.forward(SessionEvent::Tick {
            snapshot: snapshot.clone(),
        });
    }

    fn on_trade_result(&mut self, success: bool, message: &str) {
        self.forward(SessionEvent::TradeResult {
            success,
            message: message.to_owned(),
        });
    }

    fn on_achievement_unlocked(&mut self, achievement: &Achievement) {
        self.forward(SessionEvent::AchievementUnlocked {
            achievement: *achievement,
        });
    }

    fn on_reset(&mut self, snapshot: &Snapshot) {
        self.forward(SessionEvent::Reset {
            snapshot: snapshot.clone(),
        });
    }

    fn on_clock_changed(&mut self, state: ClockState, speed: Speed) {
        self.forward(SessionEvent::ClockChanged { state, speed });
    }
}
