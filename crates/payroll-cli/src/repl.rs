//! Subcommand: `payroll chat` -- interactive payroll session.
//!
//! Each line is either a slash command handled locally or a chat message
//! routed through the coordinator.  The session state lives here and is
//! replaced only when a turn succeeds.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use payroll_agent::{Coordinator, Turn, WorkflowState};
use tracing::{info, warn};

use crate::helpers::{build_model, init_tracing, load_config, load_employees, media_type_for};

const HELP: &str = "\
  Commands:
    /upload <path> [media-type]   Extract employees from a document
    /status                       Show the working list and approval state
    /report                       Generate the report (requires approval)
    /export json|csv <path>       Write the last report to a file
    /save <path>                  Save the session state as JSON
    /help                         Show this help
    /quit                         Exit
  Anything else is sent to the assistant.";

/// A parsed REPL line.
#[derive(Debug, PartialEq)]
enum Input {
    Upload {
        path: PathBuf,
        media_type: Option<String>,
    },
    Status,
    Report,
    Export {
        format: ExportFormat,
        path: PathBuf,
    },
    Save(PathBuf),
    Help,
    Quit,
    Chat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
}

fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Chat(line.to_owned()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let input = match (name, args.as_slice()) {
        ("upload", [path]) => Input::Upload {
            path: PathBuf::from(*path),
            media_type: None,
        },
        ("upload", [path, media_type]) => Input::Upload {
            path: PathBuf::from(*path),
            media_type: Some((*media_type).to_owned()),
        },
        ("status", []) => Input::Status,
        ("report", []) => Input::Report,
        ("export", [format, path]) => {
            let format = match format.to_ascii_lowercase().as_str() {
                "json" => ExportFormat::Json,
                "csv" => ExportFormat::Csv,
                other => bail!("unknown export format `{other}` (use json or csv)"),
            };
            Input::Export {
                format,
                path: PathBuf::from(*path),
            }
        }
        ("save", [path]) => Input::Save(PathBuf::from(*path)),
        ("help", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        _ => bail!("unrecognised command `/{command}`, type /help for the list"),
    };
    Ok(input)
}

/// Run the interactive session.
pub async fn cmd_chat(
    existing: Option<PathBuf>,
    document: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    init_tracing("warn");

    let config = load_config(config_path.as_deref())?;
    let model = build_model(&config)?;
    let currency = config.currency_symbol.clone();
    let coordinator = Coordinator::new(config, model);

    let snapshot = match &existing {
        Some(path) => load_employees(path)?,
        None => Vec::new(),
    };
    let mut state = Coordinator::new_session(snapshot);
    info!(session_id = %state.session_id, "chat session started");

    println!();
    println!("  Payroll assistant v{}", env!("CARGO_PKG_VERSION"));
    println!("  Session: {}", state.session_id);
    if !state.existing_employees.is_empty() {
        println!(
            "  Loaded {} employees from the previous period.",
            state.existing_employees.len()
        );
    }
    println!("  Upload a document with /upload <path>, or type /help.");
    println!();

    if let Some(path) = document {
        upload(&coordinator, &mut state, &path, None).await;
    }

    let stdin = io::stdin();
    let mut line_buf = String::new();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        line_buf.clear();
        match stdin.read_line(&mut line_buf) {
            Ok(0) => {
                println!();
                info!("EOF received, exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  Error reading input: {e}");
                continue;
            }
        }

        if line_buf.trim().is_empty() {
            continue;
        }

        let input = match parse_input(&line_buf) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("  {e}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Status => println!("{}", state.status(&currency)),
            Input::Upload { path, media_type } => {
                upload(&coordinator, &mut state, &path, media_type.as_deref()).await;
            }
            Input::Report => {
                let mut request = state.clone();
                request.trigger_report = true;
                let result = coordinator.generate_report(&request).await;
                apply(&mut state, result);
            }
            Input::Export { format, path } => {
                if let Err(e) = export(&state, format, &path) {
                    eprintln!("  {e:#}");
                }
            }
            Input::Save(path) => {
                let result = state
                    .to_json()
                    .context("failed to serialize session")
                    .and_then(|json| {
                        std::fs::write(&path, json)
                            .with_context(|| format!("failed to write {}", path.display()))
                    });
                match result {
                    Ok(()) => println!("  Session saved to {}", path.display()),
                    Err(e) => eprintln!("  {e:#}"),
                }
            }
            Input::Chat(text) => {
                let result = coordinator.send_message(&state, &text).await;
                apply(&mut state, result);
            }
        }
    }

    println!("  Goodbye!");
    Ok(())
}

async fn upload(
    coordinator: &Coordinator,
    state: &mut WorkflowState,
    path: &Path,
    media_type: Option<&str>,
) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("  Failed to read {}: {e}", path.display());
            return;
        }
    };
    let media_type = media_type.unwrap_or_else(|| media_type_for(path));
    println!("  Reading {} ({media_type})...", path.display());

    let result = coordinator.submit_document(state, &bytes, media_type).await;
    apply(state, result);
}

/// Print the reply and keep the new state, or report the error and keep
/// the old one.
fn apply(state: &mut WorkflowState, result: payroll_agent::Result<Turn>) {
    match result {
        Ok(turn) => {
            println!("{}", turn.reply);
            *state = turn.state;
        }
        Err(e) => {
            warn!(error = %e, "turn failed");
            if e.is_retryable() {
                eprintln!("  {e} (nothing was changed; try again)");
            } else {
                eprintln!("  {e}");
            }
        }
    }
}

fn export(state: &WorkflowState, format: ExportFormat, path: &Path) -> Result<()> {
    let Some(report) = &state.report else {
        bail!("no report yet; approve the data and ask for the report first");
    };
    let content = match format {
        ExportFormat::Json => report.to_json().context("failed to serialize report")?,
        ExportFormat::Csv => report.to_csv(),
    };
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("  Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            parse_input("  Bob worked 5 hours overtime \n").unwrap(),
            Input::Chat("Bob worked 5 hours overtime".into())
        );
    }

    #[test]
    fn slash_commands() {
        assert_eq!(
            parse_input("/upload scan.png").unwrap(),
            Input::Upload {
                path: PathBuf::from("scan.png"),
                media_type: None
            }
        );
        assert_eq!(
            parse_input("/upload notes text/plain").unwrap(),
            Input::Upload {
                path: PathBuf::from("notes"),
                media_type: Some("text/plain".into())
            }
        );
        assert_eq!(
            parse_input("/export CSV out.csv").unwrap(),
            Input::Export {
                format: ExportFormat::Csv,
                path: PathBuf::from("out.csv")
            }
        );
        assert_eq!(parse_input("/quit").unwrap(), Input::Quit);
        assert_eq!(parse_input("/status").unwrap(), Input::Status);
    }

    #[test]
    fn bad_commands_are_errors() {
        assert!(parse_input("/export xml out.xml").is_err());
        assert!(parse_input("/upload").is_err());
        assert!(parse_input("/dance").is_err());
    }

    #[test]
    fn export_without_report_fails() {
        let state = Coordinator::new_session(Vec::new());
        let dir = tempfile::tempdir().unwrap();
        assert!(export(&state, ExportFormat::Json, &dir.path().join("r.json")).is_err());
    }
}
