use core_sim::TradeAction;
use runtime::Speed;

pub const HELP: &str = "commands: buy <SYMBOL> <QTY> | sell <SYMBOL> <QTY> | speed [1|2|5] | \
pause | resume | reset | status | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Quantity stays raw text so the session reports bad input as a failed trade.
    Trade {
        action: TradeAction,
        symbol: String,
        quantity: String,
    },
    /// `None` cycles to the next speed.
    Speed(Option<Speed>),
    Pause,
    Resume,
    Reset,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("speed must be one of: 1, 2, 5 (got '{0}')")]
    InvalidSpeed(String),

    #[error("unexpected input after '{command}': '{rest}'")]
    TrailingInput { command: &'static str, rest: String },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let head = head.to_ascii_lowercase();

        let command = match TradeAction::parse(&head) {
            Some(action) => {
                let missing = |argument| CommandError::MissingArgument {
                    command: action.as_str(),
                    argument,
                };
                let symbol = words.next().ok_or_else(|| missing("symbol"))?;
                let quantity = words.next().ok_or_else(|| missing("quantity"))?;
                Self::Trade {
                    action,
                    symbol: symbol.to_ascii_uppercase(),
                    quantity: quantity.to_owned(),
                }
            }
            None => match head.as_str() {
                "speed" => match words.next() {
                    Some(value) => Self::Speed(Some(
                        Speed::parse(value)
                            .ok_or_else(|| CommandError::InvalidSpeed(value.to_owned()))?,
                    )),
                    None => Self::Speed(None),
                },
                "pause" => Self::Pause,
                "resume" | "play" => Self::Resume,
                "reset" => Self::Reset,
                "status" => Self::Status,
                "help" | "?" => Self::Help,
                "quit" | "exit" => Self::Quit,
                _ => return Err(CommandError::Unknown(head)),
            },
        };

        let name = command.name();
        finish(command, name, words)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trade { action, .. } => action.as_str(),
            Self::Speed(_) => "speed",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::Status => "status",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

fn finish<'a>(
    command: Command,
    name: &'static str,
    rest: impl Iterator<Item = &'a str>,
) -> Result<Command, CommandError> {
    let rest: Vec<&str> = rest.collect();
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::TrailingInput {
            command: name,
            rest: rest.join(" "),
        })
    }
}

#[cfg(test)]
mod tests {
    use core_sim::TradeAction;
    use runtime::Speed;

    use super::{Command, CommandError};

    #[test]
    fn parses_trade_commands() {
        assert_eq!(
            Command::parse("buy rtx 10").unwrap(),
            Command::Trade {
                action: TradeAction::Buy,
                symbol: "RTX".to_owned(),
                quantity: "10".to_owned(),
            }
        );
        assert_eq!(
            Command::parse("  SELL NOK 50 ").unwrap(),
            Command::Trade {
                action: TradeAction::Sell,
                symbol: "NOK".to_owned(),
                quantity: "50".to_owned(),
            }
        );
    }

    #[test]
    fn keeps_bad_quantities_for_the_session_to_reject() {
        let command = Command::parse("buy RTX -3").unwrap();

        assert!(matches!(command, Command::Trade { ref quantity, .. } if quantity == "-3"));
    }

    #[test]
    fn trade_without_arguments_names_what_is_missing() {
        assert_eq!(
            Command::parse("buy").unwrap_err(),
            CommandError::MissingArgument {
                command: "buy",
                argument: "symbol",
            }
        );
        assert_eq!(
            Command::parse("sell NOK").unwrap_err(),
            CommandError::MissingArgument {
                command: "sell",
                argument: "quantity",
            }
        );
    }

    #[test]
    fn speed_cycles_without_argument_and_validates_with_one() {
        assert_eq!(Command::parse("speed").unwrap(), Command::Speed(None));
        assert_eq!(
            Command::parse("speed 5").unwrap(),
            Command::Speed(Some(Speed::X5))
        );
        assert_eq!(
            Command::parse("speed 3").unwrap_err(),
            CommandError::InvalidSpeed("3".to_owned())
        );
    }

    #[test]
    fn parses_control_words_and_aliases() {
        assert_eq!(Command::parse("pause").unwrap(), Command::Pause);
        assert_eq!(Command::parse("play").unwrap(), Command::Resume);
        assert_eq!(Command::parse("Reset").unwrap(), Command::Reset);
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
        assert_eq!(Command::parse("?").unwrap(), Command::Help);
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_empty_unknown_and_trailing_input() {
        assert_eq!(Command::parse("   ").unwrap_err(), CommandError::Empty);
        assert_eq!(
            Command::parse("short RTX 5").unwrap_err(),
            CommandError::Unknown("short".to_owned())
        );
        assert_eq!(
            Command::parse("pause now").unwrap_err(),
            CommandError::TrailingInput {
                command: "pause",
                rest: "now".to_owned(),
            }
        );
        assert_eq!(
            Command::parse("buy RTX 10 please").unwrap_err().to_string(),
            "unexpected input after 'buy': 'please'"
        );
    }
}
