// crates/ur_cli/src/main.rs
//
// Console front-end for the ordering engine.
//
// Two modes:
// - interactive (default): drives an Engine directly with the full editing
//   menu (answer, add/remove/rename element or parameter, swap, status).
// - replay (--answers): drives a SessionDriver over an in-memory store, the
//   same step protocol a web deployment uses, answering from the script.
//
// On completion both modes print the ranking and, with --out, write
// canonical outcome.json / comparisons.json artifacts.

mod args;

use args::{parse_and_validate, Args};
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;

use ur_core::trace::TraceSink;
use ur_core::{Choice, Engine, Step};
use ur_session::{
    AnswerChoice, AnswerForm, ComparisonRecord, MemoryStore, SessionDriver, SessionId,
    SessionOutcome, SessionStore, StepView,
};

const OUTCOME_FILE: &str = "outcome.json";
const COMPARISONS_FILE: &str = "comparisons.json";

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ur: error: {e}");
            return ExitCode::from(1);
        }
    };

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ur: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<ExitCode, String> {
    match args.answers.clone() {
        Some(script) => run_replay(&args, &script),
        None => run_interactive(&args),
    }
}

/// Scripted run through the session driver (the web step protocol).
fn run_replay(args: &Args, script: &str) -> Result<ExitCode, String> {
    let id: SessionId = "console".parse().map_err(|e| format!("{e}"))?;
    let mut driver = SessionDriver::new(MemoryStore::new());
    let mut answers = script.chars();

    let mut view = driver
        .begin(&id, &args.parameters, &args.elements, &now_utc())
        .map_err(|e| format!("{e}"))?;
    loop {
        match view {
            StepView::Finished { ranking, num_comparisons, .. } => {
                print_ranking(&args.elements, &ranking, num_comparisons, args.quiet);
                if let Some(dir) = &args.out {
                    let outcome = driver
                        .outcome(&id)
                        .map_err(|e| format!("{e}"))?
                        .ok_or("completed session has no stored outcome")?;
                    let events = driver
                        .store()
                        .comparisons(&id)
                        .map_err(|e| format!("{e}"))?;
                    write_artifacts(dir, &outcome, &events)?;
                    if !args.quiet {
                        println!("ur: artifacts written to {}", dir.display());
                    }
                }
                return Ok(ExitCode::SUCCESS);
            }
            StepView::Question { elem, against, parameter, .. } => {
                let Some(c) = answers.next() else {
                    eprintln!("ur: error: --answers exhausted before the ordering completed");
                    return Ok(ExitCode::from(2));
                };
                let choice = if c == 'h' { AnswerChoice::Higher } else { AnswerChoice::Lower };
                let form = AnswerForm { choice, a: elem, b: against, c: parameter };
                view = driver
                    .submit(&id, &args.parameters, &args.elements, &form, &now_utc())
                    .map_err(|e| format!("{e}"))?;
            }
        }
    }
}

struct StderrTrace;

impl TraceSink for StderrTrace {
    fn record(&mut self, line: &str) {
        eprintln!("ur: trace: {line}");
    }
}

enum Command {
    Continue,
    Quit,
}

/// Interactive run: full engine menu on stdin.
fn run_interactive(args: &Args) -> Result<ExitCode, String> {
    let mut engine = Engine::new(args.parameters.clone(), args.elements.clone())
        .map_err(|e| e.to_string())?;
    if args.trace {
        engine = engine.with_trace_sink(Box::new(StderrTrace));
    }
    if !args.quiet {
        println!(
            "ur: commands: l h s ae <name> re <idx> ne <idx> <name> \
             ap <name> rp <idx> np <idx> <name> sw <i> <j> q"
        );
    }

    let mut events: Vec<ComparisonRecord> = Vec::new();
    let stdin = io::stdin();
    let mut input = stdin.lock().lines();

    loop {
        let q = match engine.next() {
            Step::Done => break,
            Step::Ask(q) => q,
        };
        println!(
            "[{}] is {} (l)ower or (h)igher than {}?  ({:.0}% done)",
            engine.parameter_names()[q.parameter],
            engine.element_names()[q.elem],
            engine.element_names()[q.against],
            engine.progress(),
        );
        let Some(line) = input.next() else {
            eprintln!("ur: error: input closed before the ordering completed");
            return Ok(ExitCode::from(2));
        };
        let line = line.map_err(|e| e.to_string())?;
        match dispatch(&mut engine, &mut events, line.trim())? {
            Command::Continue => {}
            Command::Quit => {
                for status in engine.status_lines() {
                    println!("{status}");
                }
                return Ok(ExitCode::SUCCESS);
            }
        }
    }

    let ranking = engine.final_ordering();
    print_ranking(engine.element_names(), &ranking, engine.comparisons(), args.quiet);
    if let Some(dir) = &args.out {
        let outcome = SessionOutcome {
            ranking,
            prioritized: engine.tables().to_vec(),
            num_comparisons: engine.comparisons(),
            completed_at: now_utc(),
        };
        write_artifacts(dir, &outcome, &events)?;
        if !args.quiet {
            println!("ur: artifacts written to {}", dir.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn dispatch(
    engine: &mut Engine,
    events: &mut Vec<ComparisonRecord>,
    line: &str,
) -> Result<Command, String> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };
    match cmd {
        "l" | "h" if rest.is_empty() => {
            let q = match engine.next() {
                Step::Ask(q) => q,
                Step::Done => return Ok(Command::Continue),
            };
            let choice = if cmd == "h" { AnswerChoice::Higher } else { AnswerChoice::Lower };
            events.push(ComparisonRecord {
                step: engine.comparisons(),
                elem_a: q.elem,
                elem_b: q.against,
                parameter: q.parameter,
                parameter_name: engine.parameter_names()[q.parameter].clone(),
                choice,
                answered_at: now_utc(),
            });
            engine.answer(Choice::from(choice)).map_err(|e| e.to_string())?;
        }
        "s" => {
            for status in engine.status_lines() {
                println!("{status}");
            }
        }
        "ae" if !rest.is_empty() => report(engine.add_element(rest)),
        "ap" if !rest.is_empty() => report(engine.add_parameter(rest)),
        "re" => match rest.parse::<usize>() {
            Ok(idx) => report(engine.remove_element(idx)),
            Err(_) => println!("ur: usage: re <idx>"),
        },
        "rp" => match rest.parse::<usize>() {
            Ok(idx) => report(engine.remove_parameter(idx)),
            Err(_) => println!("ur: usage: rp <idx>"),
        },
        "ne" => match rest.split_once(char::is_whitespace) {
            Some((idx, name)) if idx.parse::<usize>().is_ok() && !name.trim().is_empty() => {
                report(engine.rename_element(idx.parse().unwrap_or(usize::MAX), name.trim()));
            }
            _ => println!("ur: usage: ne <idx> <name>"),
        },
        "np" => match rest.split_once(char::is_whitespace) {
            Some((idx, name)) if idx.parse::<usize>().is_ok() && !name.trim().is_empty() => {
                report(engine.rename_parameter(idx.parse().unwrap_or(usize::MAX), name.trim()));
            }
            _ => println!("ur: usage: np <idx> <name>"),
        },
        "sw" => {
            let mut parts = rest.split_whitespace();
            match (
                parts.next().and_then(|s| s.parse::<usize>().ok()),
                parts.next().and_then(|s| s.parse::<usize>().ok()),
            ) {
                (Some(a), Some(b)) if parts.next().is_none() => {
                    report(engine.swap_parameter_priorities(a, b));
                }
                _ => println!("ur: usage: sw <i> <j>"),
            }
        }
        "q" => return Ok(Command::Quit),
        "" => {}
        other => println!("ur: unknown command {other:?}"),
    }
    Ok(Command::Continue)
}

fn report(accepted: bool) {
    if accepted {
        println!("ur: ok");
    } else {
        println!("ur: rejected");
    }
}

fn print_ranking(element_names: &[String], ranking: &[usize], comparisons: u64, quiet: bool) {
    if !quiet {
        println!("ur: completed — {comparisons} comparisons");
    }
    for (rank, &e) in ranking.iter().enumerate() {
        let name = element_names.get(e).map(String::as_str).unwrap_or("?");
        println!("{}. {name}", rank + 1);
    }
}

fn write_artifacts(
    dir: &Path,
    outcome: &SessionOutcome,
    events: &[ComparisonRecord],
) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("cannot create {}: {e}", dir.display()))?;

    let bytes = ur_io::to_canonical_bytes(outcome).map_err(|e| format!("{e}"))?;
    fs::write(dir.join(OUTCOME_FILE), bytes)
        .map_err(|e| format!("cannot write {OUTCOME_FILE}: {e}"))?;

    let bytes = ur_io::to_canonical_bytes(&events).map_err(|e| format!("{e}"))?;
    fs::write(dir.join(COMPARISONS_FILE), bytes)
        .map_err(|e| format!("cannot write {COMPARISONS_FILE}: {e}"))?;
    Ok(())
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
