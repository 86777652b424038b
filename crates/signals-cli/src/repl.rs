//! REPL – feed raw signal updates to the decision core by hand.
//!
//! The shell remembers the last ε and vitals it was given, so `eps` and
//! `ground` take only the new values.
//!
//! Supported commands:
//!   eps <value>                         – report a new ε
//!   ground <safety> <regulation>        – report new vitals
//!   drag <gate_id> <cost> <class>       – consider a gate (micro / meso / macro)
//!   spawn <room_id> <reason> [depth]    – open a pocket room
//!   merge <room_id> <ds> <dc> <dr>      – merge a pocket room
//!   archive <room_id> <reason>          – archive a pocket room
//!   guard <active|released>             – raise or lower the sanctuary guard
//!   ctx <id>                            – switch context id
//!   ledger [n]                          – show the last n ledger entries
//!   help | quit | exit

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::str::FromStr;

use signals_kernel::{SignalUpdate, Thresholds};
use signals_types::{EnergyClass, GuardState};

use crate::console::{console_pipeline, print_faults};

const DEFAULT_LEDGER_TAIL: usize = 5;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Epsilon(f64),
    Grounding { safety: f64, regulation: f64 },
    /// Any update that does not depend on remembered values.
    Update(SignalUpdate),
    Context(String),
    Ledger(usize),
    Help,
    Quit,
}

/// Parse one input line.  Returns a user-facing message on bad input.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = words.collect();

    let command = match (cmd.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("eps", [value]) => ReplCommand::Epsilon(number(value)?),
        ("ground", [safety, regulation]) => ReplCommand::Grounding {
            safety: number(safety)?,
            regulation: number(regulation)?,
        },
        ("drag", [gate_id, cost, class]) => ReplCommand::Update(SignalUpdate::GateDrag {
            gate_id: gate_id.to_string(),
            cost: number(cost)?,
            energy_class: EnergyClass::from_str(class).map_err(|e| e.to_string())?,
        }),
        ("spawn", [room_id, reason, rest @ ..]) if rest.len() <= 1 => {
            ReplCommand::Update(SignalUpdate::PocketSpawn {
                room_id: room_id.to_string(),
                reason: reason.to_string(),
                depth: rest.first().map(|d| number(d)).transpose()?.unwrap_or(1),
            })
        }
        ("merge", [room_id, ds, dc, dr]) => ReplCommand::Update(SignalUpdate::PocketMerge {
            room_id: room_id.to_string(),
            delta_safety: number(ds)?,
            delta_consent: number(dc)?,
            delta_regulation: number(dr)?,
        }),
        ("archive", [room_id, reason]) => ReplCommand::Update(SignalUpdate::PocketArchive {
            room_id: room_id.to_string(),
            reason: reason.to_string(),
        }),
        ("guard", [state]) => ReplCommand::Update(SignalUpdate::SanctuaryGuard {
            state: GuardState::from_str(state).map_err(|e| e.to_string())?,
        }),
        ("ctx", [id]) => ReplCommand::Context(id.to_string()),
        ("ledger", []) => ReplCommand::Ledger(DEFAULT_LEDGER_TAIL),
        ("ledger", [n]) => ReplCommand::Ledger(number(n)?),
        ("help", []) => ReplCommand::Help,
        ("quit" | "exit", []) => ReplCommand::Quit,
        (
            "eps" | "ground" | "drag" | "spawn" | "merge" | "archive" | "guard" | "ctx" | "ledger"
            | "help" | "quit" | "exit",
            _,
        ) => return Err(format!("wrong arguments for '{cmd}' (see help)")),
        _ => return Err(format!("unknown command '{cmd}'")),
    };
    Ok(command)
}

fn number<T: FromStr>(raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("'{raw}' is not a valid number"))
}

/// Remembered raw values, so the shell can supply the "previous" half of
/// each ε and vitals update.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplState {
    pub context_id: String,
    pub epsilon: f64,
    pub safety: f64,
    pub regulation: f64,
}

impl ReplState {
    pub fn new(context_id: String) -> Self {
        Self {
            context_id,
            epsilon: 0.0,
            safety: 0.8,
            regulation: 0.8,
        }
    }

    /// Build the update for a signal command and remember the new values.
    /// Returns `None` for commands that are not signal updates.
    pub fn update_for(&mut self, command: &ReplCommand) -> Option<SignalUpdate> {
        match command {
            ReplCommand::Epsilon(epsilon) => {
                let update = SignalUpdate::Epsilon {
                    epsilon: *epsilon,
                    prev_epsilon: self.epsilon,
                };
                self.epsilon = *epsilon;
                Some(update)
            }
            ReplCommand::Grounding { safety, regulation } => {
                let update = SignalUpdate::Grounding {
                    prev_safety: self.safety,
                    new_safety: *safety,
                    prev_regulation: self.regulation,
                    new_regulation: *regulation,
                };
                self.safety = *safety;
                self.regulation = *regulation;
                Some(update)
            }
            ReplCommand::Update(update) => Some(update.clone()),
            _ => None,
        }
    }
}

/// Entry point for the interactive shell.
pub fn run(thresholds: Thresholds, context_id: String) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Terminal error".red(), e);
            return;
        }
    };

    let pipeline = console_pipeline(thresholds);
    let mut state = ReplState::new(context_id);
    println!("  Type {} for a list of commands.\n", "help".bold().cyan());

    loop {
        let line = match editor.readline("signals> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{} {}", "Error:".red(), msg);
                continue;
            }
        };

        if let Some(update) = state.update_for(&command) {
            match pipeline.machine().apply(&state.context_id, &update) {
                Some(report) => print_faults(&report),
                None => println!("  {}", "(below threshold, nothing published)".dimmed()),
            }
            continue;
        }

        match command {
            ReplCommand::Context(id) => {
                println!("  context → {}", id.bold());
                state.context_id = id;
            }
            ReplCommand::Ledger(n) => match pipeline.ledger() {
                Some(ledger) => {
                    for entry in ledger.tail(n) {
                        println!(
                            "  {} {} ctx={} {}",
                            entry.ts.format("%H:%M:%S%.3f").to_string().dimmed(),
                            entry.kind.label().bold(),
                            entry.context_id,
                            entry.payload
                        );
                    }
                }
                None => println!("  {}", "no ledger attached".dimmed()),
            },
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => {
                println!("{}", "Goodbye.".green());
                break;
            }
            ReplCommand::Epsilon(_) | ReplCommand::Grounding { .. } | ReplCommand::Update(_) => {}
        }
    }
}

fn print_help() {
    println!();
    println!("{}", "Signal Commands".bold().underline());
    println!("  {}                      – report a new ε", "eps <v>".bold().cyan());
    println!("  {}   – report new vitals", "ground <safety> <reg>".bold().cyan());
    println!("  {}  – consider a gate (micro/meso/macro)", "drag <gate> <cost> <c>".bold().cyan());
    println!("  {} – open a pocket room", "spawn <room> <reason> [d]".bold().cyan());
    println!("  {}  – merge a pocket room", "merge <room> <ds> <dc> <dr>".bold().cyan());
    println!("  {}   – archive a pocket room", "archive <room> <reason>".bold().cyan());
    println!("  {}   – sanctuary guard", "guard <active|released>".bold().cyan());
    println!("  {}                     – switch context id", "ctx <id>".bold().cyan());
    println!("  {}                 – show recent ledger entries", "ledger [n]".bold().cyan());
    println!("  {}                  – exit the shell", "quit  exit".bold().cyan());
    println!();
}
