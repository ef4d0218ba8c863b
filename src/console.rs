use engine::StopSignal;
use std::io::BufRead;

/// A line typed on the control console.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Stop,
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" => Command::Empty,
        "stop" => Command::Stop,
        other => Command::Unknown(other.to_string()),
    }
}

/// Reads commands from `input` until `stop` arrives or the input ends.
///
/// Runs on its own OS thread: blocking reads on stdin would otherwise keep
/// the async runtime from shutting down.
pub fn listen_for_commands(input: impl BufRead, stop: StopSignal) {
    tracing::info!("Type 'stop' and press Enter to stop the monitor.");

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read from the console.");
                break;
            }
        };

        match parse_command(&line) {
            Command::Stop => {
                stop.stop();
                break;
            }
            Command::Unknown(command) => tracing::warn!("Unknown command: {}", command),
            Command::Empty => {}
        }

        if stop.is_stopped() {
            break;
        }
    }
}
