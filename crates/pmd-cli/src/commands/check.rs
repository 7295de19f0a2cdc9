//! Implementation of the `pmd check` command.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::IntoDiagnostic;
use owo_colors::OwoColorize;
use pmd::parse_template;
use serde::Serialize;

use crate::commands::inputs::collect_templates;
use crate::output::report_error;
use crate::output::table::format_check_table;

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Templates or directories of `.pmd` templates to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print a summary table after the diagnostics
    #[arg(long)]
    pub summary: bool,
}

/// JSON output for one checked template.
#[derive(Debug, Serialize)]
struct CheckJson {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

/// Run the check command.
///
/// Only static errors are detected: metadata, lexing and structure. Includes
/// are not followed, since their targets depend on the render.
pub fn run_check(args: CheckArgs) -> miette::Result<i32> {
    let inputs = match collect_templates(&args.paths) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(e.exit_code());
        }
    };

    let mut exit = exitcode::OK;
    let mut records = Vec::new();
    let mut summary: Vec<(&Path, Option<String>)> = Vec::new();

    for input in &inputs {
        let path = input.path.as_path();
        let content = match read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!(
                    "{} cannot read {}: {e}",
                    "error:".red().bold(),
                    path.display()
                );
                exit = exitcode::NOINPUT;
                records.push(CheckJson {
                    path: path.display().to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                    line: None,
                    column: None,
                });
                summary.push((path, Some(e.to_string())));
                continue;
            }
        };

        match parse_template(&content, path) {
            Ok(template) => {
                log::debug!(
                    "{} is valid ({} metadata keys)",
                    path.display(),
                    template.metadata().len()
                );
                if !args.json {
                    eprintln!("{} {}", "ok".green(), path.display());
                }
                records.push(CheckJson {
                    path: path.display().to_string(),
                    ok: true,
                    error: None,
                    line: None,
                    column: None,
                });
                summary.push((path, None));
            }
            Err(e) => {
                if exit == exitcode::OK {
                    exit = exitcode::DATAERR;
                }
                if !args.json {
                    report_error(&e);
                }
                let position = e.position();
                records.push(CheckJson {
                    path: path.display().to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                    line: position.map(|p| p.line),
                    column: position.map(|p| p.column),
                });
                summary.push((path, Some(e.to_string())));
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).into_diagnostic()?
        );
    } else if args.summary {
        println!("{}", format_check_table(&summary));
    }
    Ok(exit)
}
