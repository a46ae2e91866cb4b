//! Line-based operator console on standard input.
//!
//! With `[trigger] source = "manual"` this is where frames come from: every
//! empty line (just pressing Enter) requests one frame.  The console also
//! accepts a few commands in either trigger mode:
//!
//! | Input          | Effect                                  |
//! |----------------|-----------------------------------------|
//! | *(empty)*, `t` | trigger one frame                        |
//! | `mode <name>`  | switch the running program               |
//! | `modes`        | list the available programs              |
//! | `q`, `quit`    | stop the engine                          |
//!
//! The reader runs on its own thread and blocks on `stdin`.  It is never
//! joined: when the engine stops, the process exits around it.

use std::io::{self, BufRead};
use std::thread;

use tracing::{info, warn};

use crate::application::pipeline::PipelineControl;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Trigger,
    SwitchMode(String),
    ListModes,
    Quit,
    Unknown(String),
}

/// Parses one input line.  Surrounding whitespace is ignored.
pub fn parse_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (None, _, _) | (Some("t" | "trigger"), None, _) => ConsoleCommand::Trigger,
        (Some("mode"), Some(name), None) => ConsoleCommand::SwitchMode(name.to_string()),
        (Some("modes"), None, _) => ConsoleCommand::ListModes,
        (Some("q" | "quit"), None, _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.to_string()),
    }
}

/// Applies `command` to the pipeline.  Returns `false` once the console
/// should stop reading.
pub fn execute(command: ConsoleCommand, control: &PipelineControl) -> bool {
    match command {
        ConsoleCommand::Trigger => {
            if !control.trigger_now() {
                info!("frame already pending");
            }
        }
        ConsoleCommand::SwitchMode(name) => match control.switch_mode(&name) {
            Ok(()) => info!("mode is now {name}"),
            Err(e) => warn!("{e}"),
        },
        ConsoleCommand::ListModes => info!(
            "modes: {} (active: {})",
            control.available_modes().join(", "),
            control.active_mode()
        ),
        ConsoleCommand::Quit => {
            info!("quit requested from console");
            control.request_stop();
            return false;
        }
        ConsoleCommand::Unknown(line) => warn!("unknown command {line:?}"),
    }
    true
}

/// Reads commands from `input` until EOF, a quit command, or the pipeline
/// stops.
pub fn run_console(input: impl BufRead, control: &PipelineControl) {
    for line in input.lines() {
        if !control.is_running() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("console input failed: {e}");
                break;
            }
        };
        if !execute(parse_command(&line), control) {
            break;
        }
    }
}

/// Starts the console on a thread named `console` reading standard input.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_console(control: PipelineControl) -> io::Result<()> {
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || run_console(io::stdin().lock(), &control))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_line_is_trigger() {
        assert_eq!(parse_command(""), ConsoleCommand::Trigger);
        assert_eq!(parse_command("   \n"), ConsoleCommand::Trigger);
        assert_eq!(parse_command("t"), ConsoleCommand::Trigger);
    }

    #[test]
    fn test_parse_mode_switch() {
        assert_eq!(parse_command("mode wash"), ConsoleCommand::SwitchMode("wash".to_string()));
        assert_eq!(parse_command("  mode   off "), ConsoleCommand::SwitchMode("off".to_string()));
    }

    #[test]
    fn test_parse_quit_and_list() {
        assert_eq!(parse_command("q"), ConsoleCommand::Quit);
        assert_eq!(parse_command("quit"), ConsoleCommand::Quit);
        assert_eq!(parse_command("modes"), ConsoleCommand::ListModes);
    }

    #[test]
    fn test_parse_malformed_is_unknown() {
        assert_eq!(parse_command("mode"), ConsoleCommand::Unknown("mode".to_string()));
        assert_eq!(
            parse_command("mode a b"),
            ConsoleCommand::Unknown("mode a b".to_string())
        );
        assert_eq!(parse_command("dance"), ConsoleCommand::Unknown("dance".to_string()));
    }
}
