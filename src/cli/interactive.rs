//! Line-driven front-end over the app state.
//!
//! Every line typed is parsed into one or more [`AppEvent`]s and dispatched
//! through a [`LiveScanner`], so the terminal session follows the same
//! transitions a graphical front-end would.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use super::interrupt::Interrupt;
use super::scanner::LiveScanner;
use crate::app::{AppEvent, AppState, Mode, NoticeLevel, ScanPhase};
use crate::camera::FrameSource;
use crate::error::AppError;
use crate::format::BarcodeFormat;
use crate::permissions::PermissionProbe;
use crate::render::{render, RenderOptions};

pub const HELP: &str = "\
Commands:
  mode generate|scan   switch screens
  format <name>        pick a format (qr, aztec, data-matrix, pdf417, code128, code39, ean13)
  text <text>          set the text to encode
  generate [<text>]    encode the current (or given) text
  save <path.png>      write the last generated code to a file
  again                scan another code
  dismiss              clear the current message
  show                 print the current screen
  help                 show this help
  quit                 leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Events(Vec<AppEvent>),
    Save(PathBuf),
    Show,
    Help,
    Quit,
}

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let input = match command {
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "?" => Input::Help,
        "show" => Input::Show,
        "mode" => match rest {
            "generate" | "gen" | "g" => Input::Events(vec![AppEvent::SelectMode(Mode::Generate)]),
            "scan" | "s" => Input::Events(vec![AppEvent::SelectMode(Mode::Scan)]),
            other => return Err(format!("Unknown mode '{}': use generate or scan", other)),
        },
        "format" => {
            let format: BarcodeFormat = rest.parse().map_err(|e| format!("{}", e))?;
            Input::Events(vec![AppEvent::SelectFormat(format)])
        }
        "text" => Input::Events(vec![AppEvent::EditInput(rest.to_string())]),
        "generate" | "gen" => {
            if rest.is_empty() {
                Input::Events(vec![AppEvent::Generate])
            } else {
                Input::Events(vec![AppEvent::EditInput(rest.to_string()), AppEvent::Generate])
            }
        }
        "save" if !rest.is_empty() => Input::Save(PathBuf::from(rest)),
        "save" => return Err("Usage: save <path.png>".to_string()),
        "again" => Input::Events(vec![AppEvent::ScanAgain]),
        "dismiss" => Input::Events(vec![AppEvent::DismissNotice]),
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(Some(input))
}

/// Print what changed between two states.
fn print_changes(before: &AppState, after: &AppState, opts: &RenderOptions) {
    if after.mode != before.mode {
        println!("Mode: {:?}", after.mode);
    }
    if after.format != before.format {
        println!("Format: {}", after.format);
    }
    if after.generated != before.generated {
        if let Some(generated) = &after.generated {
            for line in render(&generated.image, opts) {
                println!("{}", line);
            }
            println!("Type: {}", generated.format());
        }
    }
    if after.scan != before.scan {
        match &after.scan {
            ScanPhase::Result(result) => {
                println!("Scanned code:");
                println!("  {}", result.text);
                println!("  ({}). Type 'again' to scan another.", result.format);
            }
            ScanPhase::Scanning if after.camera_active => println!("Scanning..."),
            ScanPhase::Scanning => {}
        }
    }
    if after.notice != before.notice {
        if let Some(notice) = &after.notice {
            let prefix = match notice.level {
                NoticeLevel::Info => "Note",
                NoticeLevel::Error => "Error",
            };
            println!("{}: {}", prefix, notice.message);
            if notice.retryable {
                println!("(type 'again' to retry)");
            }
        }
    }
}

fn print_screen(state: &AppState, opts: &RenderOptions) {
    print_changes(&AppState::default(), state, opts);
    println!("Mode: {:?}  Format: {}  Text: {:?}", state.mode, state.format, state.input);
}

fn prompt(state: &AppState) {
    let label = match state.mode {
        Mode::Generate => "generate",
        Mode::Scan => "scan",
    };
    print!("{}> ", label);
    std::io::stdout().flush().ok();
}

/// Read stdin on a dedicated thread; tokio's stdin would hold the runtime open.
fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Could not read stdin: {}", e);
    }
    rx
}

/// Run the session until `quit`, end of input or Ctrl+C.
pub async fn run_interactive<P, F, S>(
    scanner: &mut LiveScanner<P, F>,
    interrupt: &mut Interrupt,
    opts: RenderOptions,
) -> Result<(), AppError>
where
    P: PermissionProbe,
    F: Fn() -> S + Clone + Send + 'static,
    S: FrameSource,
{
    println!("{}", HELP);
    let mut lines = spawn_stdin_reader();

    loop {
        prompt(scanner.state());
        let before = scanner.state().clone();

        tokio::select! {
            _ = interrupt.wait() => break,
            line = lines.recv() => {
                let Some(line) = line else { break };
                match parse_line(&line) {
                    Ok(None) => continue,
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(Input::Help)) => println!("{}", HELP),
                    Ok(Some(Input::Show)) => print_screen(scanner.state(), &opts),
                    Ok(Some(Input::Save(path))) => match &scanner.state().generated {
                        Some(generated) => match generated.image.save(&path) {
                            Ok(()) => {
                                println!("Saved {} to {}", generated.format(), path.display())
                            }
                            Err(e) => println!("Error: {}", AppError::from(e)),
                        },
                        None => println!("Nothing generated yet"),
                    },
                    Ok(Some(Input::Events(events))) => {
                        for event in events {
                            // Failures are already notices on the state
                            if let Err(e) = scanner.dispatch(event) {
                                log::debug!("Dispatch reported: {}", e);
                            }
                        }
                    }
                    Err(msg) => println!("{}", msg),
                }
            }
            result = scanner.next_result() => {
                let event = match result {
                    Some(result) => AppEvent::ScanDecoded(result),
                    None => AppEvent::CameraFailed("camera stream ended".to_string()),
                };
                if let Err(e) = scanner.dispatch(event) {
                    log::debug!("Dispatch reported: {}", e);
                }
                println!();
            }
        }

        print_changes(&before, scanner.state(), &opts);
    }

    scanner.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(line: &str) -> Vec<AppEvent> {
        match parse_line(line) {
            Ok(Some(Input::Events(events))) => events,
            other => panic!("Expected events for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn test_mode_commands() {
        assert_eq!(events("mode scan"), vec![AppEvent::SelectMode(Mode::Scan)]);
        assert_eq!(events("mode g"), vec![AppEvent::SelectMode(Mode::Generate)]);
        assert!(parse_line("mode sideways").is_err());
    }

    #[test]
    fn test_format_command() {
        assert_eq!(
            events("format EAN-13"),
            vec![AppEvent::SelectFormat(BarcodeFormat::Ean13)]
        );
        assert!(parse_line("format bogus").is_err());
    }

    #[test]
    fn test_generate_with_text_sets_input_first() {
        assert_eq!(
            events("generate hello world"),
            vec![
                AppEvent::EditInput("hello world".to_string()),
                AppEvent::Generate
            ]
        );
        assert_eq!(events("generate"), vec![AppEvent::Generate]);
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(parse_line("quit"), Ok(Some(Input::Quit)));
        assert_eq!(parse_line("?"), Ok(Some(Input::Help)));
        assert_eq!(
            parse_line("save out.png"),
            Ok(Some(Input::Save(PathBuf::from("out.png"))))
        );
        assert!(parse_line("save").is_err());
        assert_eq!(events("again"), vec![AppEvent::ScanAgain]);
        assert_eq!(events("dismiss"), vec![AppEvent::DismissNotice]);
        assert!(parse_line("frobnicate").is_err());
    }
}
