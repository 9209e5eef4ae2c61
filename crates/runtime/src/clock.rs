use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub const BASE_INTERVAL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Running,
    Paused,
}

impl ClockState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

/// Tick rate multiplier. Cycles 1x, 2x, 5x and back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Speed {
    #[default]
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "5x")]
    X5,
}

impl Speed {
    pub fn multiplier(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X5 => 5,
        }
    }

    pub fn from_multiplier(multiplier: u32) -> Option<Self> {
        match multiplier {
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            5 => Some(Self::X5),
            _ => None,
        }
    }

    /// Accepts `5` as well as `5x`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_suffix('x')
            .or_else(|| trimmed.strip_suffix('X'))
            .unwrap_or(trimmed);
        digits.parse().ok().and_then(Self::from_multiplier)
    }

    pub fn next(self) -> Self {
        match self {
            Self::X1 => Self::X2,
            Self::X2 => Self::X5,
            Self::X5 => Self::X1,
        }
    }

    pub fn is_max(self) -> bool {
        self == Self::X5
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    state: ClockState,
    speed: Speed,
    base_interval: Duration,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(BASE_INTERVAL)
    }
}

impl SimulationClock {
    /// A paused clock at 1x.
    pub fn new(base_interval: Duration) -> Self {
        assert!(
            !base_interval.is_zero(),
            "base_interval must be greater than zero"
        );

        Self {
            state: ClockState::Paused,
            speed: Speed::X1,
            base_interval,
        }
    }

    pub fn with_speed(self, speed: Speed) -> Self {
        Self { speed, ..self }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn interval(&self) -> Duration {
        self.base_interval / self.speed.multiplier()
    }

    pub fn start(&mut self) {
        self.state = ClockState::Running;
    }

    pub fn pause(&mut self) {
        self.state = ClockState::Paused;
    }

    pub fn resume(&mut self) {
        self.start();
    }

    pub fn toggle(&mut self) -> ClockState {
        self.state = match self.state {
            ClockState::Running => ClockState::Paused,
            ClockState::Paused => ClockState::Running,
        };
        self.state
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    pub fn cycle_speed(&mut self) -> Speed {
        self.speed = self.speed.next();
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ClockState, SimulationClock, Speed, BASE_INTERVAL};

    #[test]
    fn interval_divides_base_by_speed() {
        let mut clock = SimulationClock::default();

        assert_eq!(clock.base_interval(), BASE_INTERVAL);
        assert_eq!(clock.interval(), BASE_INTERVAL);
        clock.set_speed(Speed::X2);
        assert_eq!(clock.interval(), Duration::from_millis(500));
        clock.set_speed(Speed::X5);
        assert_eq!(clock.interval(), Duration::from_millis(200));
    }

    #[test]
    fn speed_cycles_back_to_one() {
        let mut clock = SimulationClock::default();

        let seen: Vec<Speed> = (0..4).map(|_| clock.cycle_speed()).collect();

        assert_eq!(seen, [Speed::X2, Speed::X5, Speed::X1, Speed::X2]);
    }

    #[test]
    fn new_clock_is_paused_until_started() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.state(), ClockState::Paused);

        clock.start();
        assert!(clock.is_running());
        assert_eq!(clock.toggle(), ClockState::Paused);
        clock.resume();
        assert_eq!(clock.state(), ClockState::Running);
    }

    #[test]
    fn parses_speed_labels() {
        assert_eq!(Speed::parse("5"), Some(Speed::X5));
        assert_eq!(Speed::parse("2x"), Some(Speed::X2));
        assert_eq!(Speed::parse(" 1X "), Some(Speed::X1));
        assert_eq!(Speed::parse("3"), None);
        assert_eq!(Speed::parse("fast"), None);
        assert_eq!(Speed::X5.to_string(), "5x");
    }

    #[test]
    #[should_panic(expected = "base_interval must be greater than zero")]
    fn rejects_zero_base_interval() {
        let _ = SimulationClock::new(Duration::ZERO);
    }
}
