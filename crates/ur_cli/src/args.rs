// crates/ur_cli/src/args.rs
//
// Argument parsing & validation for the console front-end.
// - Parameter/element lists arrive comma-separated, most important first.
// - `--answers` switches to non-interactive replay ('l'/'h' per comparison).

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ur", about = "Prioritize elements by stepwise pairwise comparison")]
pub struct Args {
    /// Parameter names, most important first (comma-separated).
    #[arg(short = 'p', long, value_delimiter = ',', required = true)]
    pub parameters: Vec<String>,

    /// Element names to prioritize (comma-separated).
    #[arg(short = 'e', long, value_delimiter = ',', required = true)]
    pub elements: Vec<String>,

    /// Directory for outcome.json / comparisons.json on completion.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Non-interactive replay: one 'l' (lower) or 'h' (higher) per comparison.
    #[arg(long)]
    pub answers: Option<String>,

    /// Echo engine trace lines to stderr.
    #[arg(long)]
    pub trace: bool,

    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug)]
pub enum CliError {
    EmptyName(&'static str),
    BadAnswers(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::EmptyName(list) => write!(f, "empty name in --{list}"),
            CliError::BadAnswers(s) => {
                write!(f, "--answers may only contain 'l' and 'h': {s:?}")
            }
        }
    }
}
impl std::error::Error for CliError {}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

fn validate(mut args: Args) -> Result<Args, CliError> {
    for name in &mut args.parameters {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(CliError::EmptyName("parameters"));
        }
    }
    for name in &mut args.elements {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(CliError::EmptyName("elements"));
        }
    }
    if let Some(script) = &mut args.answers {
        *script = script.trim().to_ascii_lowercase();
        if !script.chars().all(|c| c == 'l' || c == 'h') {
            return Err(CliError::BadAnswers(script.clone()));
        }
    }
    Ok(args)
}
