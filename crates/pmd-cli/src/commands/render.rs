//! Implementation of the `pmd render` command.

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::panic;
use std::path::{Path, PathBuf};
use std::thread::{self, Builder};

use clap::Args;
use miette::IntoDiagnostic;
use owo_colors::OwoColorize;
use pmd::{Engine, Error, Metadata, Resolution, Value};
use serde::Serialize;

use crate::commands::inputs::{TemplateInput, collect_templates, load_context, parse_key_val};
use crate::output::report_error;
use crate::output::table::format_metadata_table;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Templates or directories of `.pmd` templates to render
    #[arg(required = true)]
    pub templates: Vec<PathBuf>,

    /// JSON file holding the render context
    #[arg(short, long, env = "PMD_CONTEXT")]
    pub context: Option<PathBuf>,

    /// Render context as an inline JSON object; takes precedence over
    /// --context
    #[arg(long)]
    pub context_json: Option<String>,

    /// Context variables in name=value format (repeatable); values are parsed
    /// as JSON when possible
    #[arg(long = "var", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// Write each rendered template under this directory instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extension of files written with --output
    #[arg(long, default_value = "md")]
    pub extension: String,

    /// Print template metadata instead of rendering
    #[arg(long)]
    pub show_metadata: bool,

    /// Fail on variables missing from the context
    #[arg(long)]
    pub strict: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of templates to render in parallel (defaults to the CPU count)
    #[arg(short, long)]
    pub jobs: Option<NonZeroUsize>,
}

/// Stack size of render workers. Templates and includes nest deeply enough
/// that the default thread stack is too small.
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// JSON output for one rendered template.
#[derive(Serialize)]
struct RenderJson {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// JSON output for one template's metadata.
#[derive(Serialize)]
struct MetadataJson<'a> {
    path: String,
    metadata: &'a Metadata,
}

/// Run the render command.
pub fn run_render(args: RenderArgs) -> miette::Result<i32> {
    let inputs = match collect_templates(&args.templates) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(e.exit_code());
        }
    };
    let context = match load_context(
        args.context.as_deref(),
        args.context_json.as_deref(),
        &args.vars,
    ) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(e.exit_code());
        }
    };

    let engine = Engine::builder()
        .resolution(if args.strict {
            Resolution::Strict
        } else {
            Resolution::Lenient
        })
        .build();

    if args.show_metadata {
        return show_metadata(&engine, &inputs, args.json);
    }

    let jobs = args
        .jobs
        .or_else(|| thread::available_parallelism().ok())
        .map_or(1, NonZeroUsize::get);
    log::debug!("rendering {} template(s) with {jobs} job(s)", inputs.len());
    let results = render_all(&engine, &inputs, &context, jobs).into_diagnostic()?;

    let mut exit = exitcode::OK;
    let mut json_results = Vec::new();
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(rendered) => {
                if let Some(dir) = &args.output {
                    let dest = output_path(dir, &input.relative, &args.extension);
                    if let Err(e) = write_output(&dest, &rendered) {
                        eprintln!(
                            "{} cannot write {}: {e}",
                            "error:".red().bold(),
                            dest.display()
                        );
                        exit = exitcode::IOERR;
                        continue;
                    }
                    if !args.json {
                        eprintln!(
                            "{} {} -> {}",
                            "rendered".green(),
                            input.path.display(),
                            dest.display()
                        );
                    }
                }
                if args.json {
                    json_results.push(RenderJson {
                        path: input.path.display().to_string(),
                        output: args.output.is_none().then_some(rendered),
                        error: None,
                    });
                } else if args.output.is_none() {
                    print!("{rendered}");
                }
            }
            Err(e) => {
                if exit == exitcode::OK {
                    exit = exit_code_for(&e);
                }
                if args.json {
                    json_results.push(RenderJson {
                        path: input.path.display().to_string(),
                        output: None,
                        error: Some(e.to_string()),
                    });
                } else {
                    report_error(&e);
                }
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json_results).into_diagnostic()?
        );
    }
    Ok(exit)
}

/// Render every input against `context`, in input order.
///
/// Inputs are split into contiguous chunks, one scoped thread per chunk, all
/// sharing `engine` and its template cache.
fn render_all(
    engine: &Engine,
    inputs: &[TemplateInput],
    context: &Value,
    jobs: usize,
) -> io::Result<Vec<Result<String, Error>>> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = inputs.len().div_ceil(jobs.clamp(1, inputs.len()));
    thread::scope(|scope| -> io::Result<Vec<Result<String, Error>>> {
        let handles = inputs
            .chunks(chunk_size)
            .map(|chunk| {
                Builder::new()
                    .stack_size(WORKER_STACK_SIZE)
                    .spawn_scoped(scope, move || {
                        chunk
                            .iter()
                            .map(|input| engine.render_file(&input.path, context))
                            .collect::<Vec<_>>()
                    })
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            })
            .collect())
    })
}

/// Print metadata for each input as a table or JSON.
fn show_metadata(engine: &Engine, inputs: &[TemplateInput], json: bool) -> miette::Result<i32> {
    let mut exit = exitcode::OK;
    let mut loaded = Vec::new();
    for input in inputs {
        match engine.load(&input.path) {
            Ok(template) => loaded.push((input.path.as_path(), template)),
            Err(e) => {
                if exit == exitcode::OK {
                    exit = exit_code_for(&e);
                }
                report_error(&e);
            }
        }
    }

    if json {
        let entries: Vec<MetadataJson<'_>> = loaded
            .iter()
            .map(|(path, template)| MetadataJson {
                path: path.display().to_string(),
                metadata: template.metadata(),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).into_diagnostic()?
        );
    } else {
        let rows: Vec<(&Path, &Metadata)> = loaded
            .iter()
            .map(|(path, template)| (*path, template.metadata()))
            .collect();
        println!("{}", format_metadata_table(&rows));
    }
    Ok(exit)
}

/// `<dir>/<relative>` with its extension replaced by `extension`.
fn output_path(dir: &Path, relative: &Path, extension: &str) -> PathBuf {
    dir.join(relative).with_extension(extension)
}

fn write_output(dest: &Path, rendered: &str) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, rendered)
}

/// Unreadable templates are missing input; everything else is bad data.
fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::Io { .. } => exitcode::NOINPUT,
        _ => exitcode::DATAERR,
    }
}
