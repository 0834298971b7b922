use crate::controller::{ControllerError, LampController};
use crate::device::HttpTransport;
use crate::domain::color::{ColorCatalog, ColorChoice, Rgb};
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

const HELP: &str = "Commands:
  on | off                 switch the lamp
  color <preset|#rrggbb>   apply a preset or a hex color
  pick <r> <g> <b>         apply a picked color, channels between 0 and 1
  intensity <value>        apply an intensity between 0 and 1
  status                   ask the lamp for its current state
  help | quit
";

#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    On,
    Off,
    Preset(String),
    Hex(Rgb),
    Pick(f64, f64, f64),
    Intensity(f64),
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}', type 'help' for a list of commands")]
    UnknownCommand(String),
    #[error("'{0}' expects {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("'{0}' is not a #rrggbb color")]
    InvalidHex(String),
}

impl FromStr for ConsoleCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();

        match command.as_str() {
            "on" => Ok(ConsoleCommand::On),
            "off" => Ok(ConsoleCommand::Off),
            "color" => match words.next() {
                Some(hex) if hex.starts_with('#') => Rgb::from_hex(hex).map(ConsoleCommand::Hex).ok_or_else(|| ParseError::InvalidHex(hex.to_string())),
                Some(name) => Ok(ConsoleCommand::Preset(name.to_string())),
                None => Err(ParseError::MissingArgument("color", "a preset name or #rrggbb")),
            },
            "pick" => {
                let mut channel = || -> Result<f64, ParseError> { number(words.next().ok_or(ParseError::MissingArgument("pick", "three channels"))?) };
                Ok(ConsoleCommand::Pick(channel()?, channel()?, channel()?))
            }
            "intensity" => {
                let value = words.next().ok_or(ParseError::MissingArgument("intensity", "a value between 0 and 1"))?;
                Ok(ConsoleCommand::Intensity(number(value)?))
            }
            "status" => Ok(ConsoleCommand::Status),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            _ => Err(ParseError::UnknownCommand(command)),
        }
    }
}

fn number(value: &str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|_| ParseError::InvalidNumber(value.to_string()))
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Reads commands line by line until `quit` or the end of the input.
#[instrument(skip_all)]
pub async fn run<R, W>(input: R, mut out: W, controller: &LampController, transport: &HttpTransport) -> Result<(), ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let catalog = ColorCatalog::presets();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                out.write_all(format!("{}\n", e).as_bytes()).await?;
                continue;
            }
        };
        debug!(?command, "Running console command");

        match command {
            ConsoleCommand::On => controller.turn_on().await?,
            ConsoleCommand::Off => controller.turn_off().await?,
            ConsoleCommand::Preset(name) => match catalog.find(&name) {
                Some(choice) => controller.apply_color(choice.clone()).await?,
                None => out.write_all(format!("unknown preset '{}'\n", name).as_bytes()).await?,
            },
            ConsoleCommand::Hex(rgb) => controller.apply_color(ColorChoice::picked(rgb)).await?,
            ConsoleCommand::Pick(r, g, b) => controller.apply_color(ColorChoice::picked(Rgb::from_normalized(r, g, b))).await?,
            ConsoleCommand::Intensity(value) => {
                controller.set_intensity(value).await?;
                controller.apply_intensity(true).await?;
            }
            ConsoleCommand::Status => match transport.status().await {
                Ok(status) => out.write_all(format!("lamp is {}\n", status).as_bytes()).await?,
                Err(e) => {
                    warn!("⚠️ Could not retrieve the lamp status: {}", e);
                    out.write_all(format!("could not retrieve the lamp status: {}\n", e).as_bytes()).await?
                }
            },
            ConsoleCommand::Help => {
                let presets = catalog.choices().iter().map(|choice| choice.name()).collect::<Vec<_>>().join(", ");
                out.write_all(format!("{}Presets: {}\n", HELP, presets).as_bytes()).await?
            }
            ConsoleCommand::Quit => break,
        }
        out.flush().await?;
    }

    Ok(())
}
