//! Form Logic CLI
//!
//! Command-line interface for evaluating form data against form schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use form_logic::{
    evaluate_form, lint, load_data, load_schema_auto, validate_form, EvalOptions, FileStatus,
    FormData, FormSchema, Severity, ValidateError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "form-logic")]
#[command(about = "Evaluate conditional form schemas against form data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct EvalArgs {
    /// Schema source: file path or URL (http:// or https://)
    schema: String,

    /// Form data file (JSON object of field values)
    data: PathBuf,

    /// Date age checks are measured against (YYYY-MM-DD, default: today)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Fail on conditions using operators other than eq instead of ignoring them
    #[arg(long)]
    strict_operators: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve visibility, requiredness, and errors for every field
    Evaluate {
        #[command(flatten)]
        args: EvalArgs,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate form data, exiting non-zero when a visible field is invalid
    Validate {
        #[command(flatten)]
        args: EvalArgs,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files for errors (syntax, shape, patterns, conditions)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            args,
            output,
            pretty,
        } => run_evaluate(&args, output, pretty),
        Commands::Validate { args, json } => run_validate(&args, json),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Load the schema, the data snapshot, and the evaluation options.
fn load_inputs(args: &EvalArgs) -> Result<(FormSchema, FormData, EvalOptions), ValidateError> {
    let schema = load_schema_auto(&args.schema)?;
    let data = load_data(&args.data)?;

    let mut options = EvalOptions::new().strict_operators(args.strict_operators);
    if let Some(today) = args.today {
        options = options.today(today);
    }
    Ok((schema, data, options))
}

fn run_evaluate(args: &EvalArgs, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let fail = |e: ValidateError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    };

    let (schema, data, options) = load_inputs(args).map_err(fail)?;
    let report = evaluate_form(&schema, &data, &options)
        .map_err(|e| fail(ValidateError::Eval(e)))?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(args: &EvalArgs, json_output: bool) -> Result<(), u8> {
    let result = load_inputs(args).and_then(|(schema, data, options)| {
        let validation = validate_form(&schema, &data, &options)?;
        if validation.is_valid {
            Ok(())
        } else {
            Err(ValidateError::Invalid {
                errors: validation.errors,
            })
        }
    });

    match result {
        Ok(()) => {
            if json_output {
                println!(r#"{{"isValid":true,"errors":{{}}}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "isValid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for (key, messages) in &errors {
                    for message in messages {
                        eprintln!("  {}: {}", key, message);
                    }
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "isValid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
