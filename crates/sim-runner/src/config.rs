use std::{env, time::Duration};

use runtime::{Speed, BASE_INTERVAL};

const DEFAULT_SPEED: Speed = Speed::X1;
const DEFAULT_STARTING_CASH: f64 = 10_000.0;
const DEFAULT_OUTPUT: OutputMode = OutputMode::Log;

const ENV_SEED: &str = "SIM_SEED";
const ENV_SPEED: &str = "SIM_SPEED";
const ENV_STARTING_CASH: &str = "SIM_STARTING_CASH";
const ENV_BASE_INTERVAL_MS: &str = "SIM_BASE_INTERVAL_MS";
const ENV_OUTPUT: &str = "SIM_OUTPUT";
const ENV_MAX_TICKS: &str = "SIM_MAX_TICKS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Log,
    Json,
}

impl OutputMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "log" => Some(Self::Log),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` seeds from the wall clock at startup.
    pub seed: Option<u64>,
    pub speed: Speed,
    pub starting_cash: f64,
    pub base_interval: Duration,
    pub output: OutputMode,
    pub max_ticks: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SIM_SEED must be an unsigned 64-bit integer")]
    InvalidSeed,

    #[error("SIM_SPEED must be one of: 1, 2, 5")]
    InvalidSpeed,

    #[error("SIM_STARTING_CASH must be a finite amount greater than zero")]
    InvalidStartingCash,

    #[error("SIM_BASE_INTERVAL_MS must be a whole number of milliseconds greater than zero")]
    InvalidBaseInterval,

    #[error("SIM_OUTPUT must be one of: log, json")]
    InvalidOutput,

    #[error("SIM_MAX_TICKS must be a whole number greater than zero")]
    InvalidMaxTicks,

    #[error("{key} contains non-unicode data")]
    NonUnicode { key: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = match read_env(ENV_SEED)? {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidSeed)?),
            None => None,
        };

        let speed = match read_env(ENV_SPEED)? {
            Some(value) => Speed::parse(&value).ok_or(ConfigError::InvalidSpeed)?,
            None => DEFAULT_SPEED,
        };

        let starting_cash = match read_env(ENV_STARTING_CASH)? {
            Some(value) => {
                let parsed = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::InvalidStartingCash)?;
                if !parsed.is_finite() || parsed <= 0.0 {
                    return Err(ConfigError::InvalidStartingCash);
                }
                parsed
            }
            None => DEFAULT_STARTING_CASH,
        };

        let base_interval = match read_env(ENV_BASE_INTERVAL_MS)? {
            Some(value) => Duration::from_millis(
                parse_positive(&value).ok_or(ConfigError::InvalidBaseInterval)?,
            ),
            None => BASE_INTERVAL,
        };

        let output = match read_env(ENV_OUTPUT)? {
            Some(value) => OutputMode::parse(value.trim()).ok_or(ConfigError::InvalidOutput)?,
            None => DEFAULT_OUTPUT,
        };

        let max_ticks = match read_env(ENV_MAX_TICKS)? {
            Some(value) => Some(parse_positive(&value).ok_or(ConfigError::InvalidMaxTicks)?),
            None => None,
        };

        Ok(Self {
            seed,
            speed,
            starting_cash,
            base_interval,
            output,
            max_ticks,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode { key }),
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|parsed| *parsed > 0)
}
