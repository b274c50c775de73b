//! Fieldrules CLI - check and evaluate formulas and control rules

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use fieldrules::prelude::*;
use fieldrules::{detect_conflict, ControlEngine, ControlOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldrules")]
#[command(
    author,
    version,
    about = "Check and evaluate field formulas and control rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only)
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a formula and print its inferred type
    Check {
        /// Formula text
        formula: String,

        /// Entity definition (JSON) whose fields form the schema
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Evaluate a formula against field values
    Eval {
        /// Formula text
        formula: String,

        /// Field values (JSON object)
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// Evaluate the control rules of an entity
    Controls {
        /// Entity definition (JSON)
        #[arg(short, long)]
        entity: PathBuf,

        /// Field values (JSON object)
        #[arg(long)]
        values: Option<PathBuf>,

        /// Do not skip rules whose condition infers to a non-boolean type
        #[arg(long)]
        no_infer: bool,
    },

    /// Compute the calculated fields of an entity
    Calculate {
        /// Entity definition (JSON)
        #[arg(short, long)]
        entity: PathBuf,

        /// Field values (JSON object)
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// Classify an override against a computed and/or control value
    Conflict {
        /// Field id
        #[arg(short, long)]
        field: String,

        /// Override value (JSON)
        #[arg(long = "override")]
        override_value: String,

        /// Value computed by the field's formula (JSON)
        #[arg(long)]
        computed: Option<String>,

        /// Value set by a control rule (JSON)
        #[arg(long)]
        control: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    let outcome = match cli.command {
        Commands::Check { formula, schema } => check(&formula, schema.as_deref()),
        Commands::Eval { formula, values } => eval(&formula, values.as_deref()),
        Commands::Controls {
            entity,
            values,
            no_infer,
        } => controls(&entity, values.as_deref(), !no_infer),
        Commands::Calculate { entity, values } => calculate(&entity, values.as_deref()),
        Commands::Conflict {
            field,
            override_value,
            computed,
            control,
        } => conflict(&field, &override_value, computed.as_deref(), control.as_deref()),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Install a stderr subscriber; `RUST_LOG` wins over `-v`/`-q`
fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    let level = verbosity.tracing_level_filter().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,fieldrules={level},fieldrules_core={level},fieldrules_formula={level}",
            level = level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    tracing::debug!(path = %path.display(), "reading {}", what);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} '{}'", what, path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} '{}'", what, path.display()))
}

fn read_values(path: Option<&Path>) -> Result<FieldValues> {
    match path {
        Some(path) => read_json(path, "field values"),
        None => Ok(FieldValues::new()),
    }
}

fn parse_value(text: &str, what: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON for {}: {}", what, text))
}

fn check(formula: &str, schema: Option<&Path>) -> Result<bool> {
    let schema = match schema {
        Some(path) => read_json::<EntityDefinition>(path, "entity definition")?.schema(),
        None => Vec::new(),
    };

    let result = validate_formula(formula, &schema);
    println!("Valid: {}", result.is_valid);
    println!("Type: {}", result.inferred_type);
    if !result.field_references.is_empty() {
        let refs: Vec<&str> = result.field_references.iter().map(String::as_str).collect();
        println!("References: {}", refs.join(", "));
    }
    for error in &result.errors {
        println!("error: {}", error);
    }
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    Ok(result.is_valid)
}

/// Parse and evaluate; syntax errors are reported like evaluation errors
fn eval_formula(formula: &str, values: &FieldValues) -> std::result::Result<Value, FormulaError> {
    let ast = parse_formula(formula)?;
    let ctx = EvaluationContext::with_standard_functions(values);
    evaluate(&ast, &ctx)
}

fn eval(formula: &str, values: Option<&Path>) -> Result<bool> {
    let values = read_values(values)?;

    match eval_formula(formula, &values) {
        Ok(value) => {
            println!("{}", serde_json::to_string(&value)?);
            Ok(true)
        }
        Err(e) => {
            println!("error: {}", e);
            Ok(false)
        }
    }
}

fn controls(entity: &Path, values: Option<&Path>, infer: bool) -> Result<bool> {
    let entity: EntityDefinition = read_json(entity, "entity definition")?;
    let values = read_values(values)?;

    let engine = ControlEngine::new(ControlOptions {
        infer_condition_types: infer,
        ..ControlOptions::default()
    });
    let result = engine.evaluate(&entity, &values);

    println!("{}", serde_json::to_string_pretty(&result.resolved())?);
    for error in &result.errors {
        eprintln!("skipped: {}", error);
    }

    Ok(result.is_ok())
}

fn calculate(entity: &Path, values: Option<&Path>) -> Result<bool> {
    let entity: EntityDefinition = read_json(entity, "entity definition")?;
    let values = read_values(values)?;

    let result = calculate_fields(&entity, &values);
    println!("{}", serde_json::to_string_pretty(&result.values)?);
    for (field, error) in &result.errors {
        eprintln!("{}: {}", field, error);
    }

    Ok(result.is_ok())
}

fn conflict(
    field: &str,
    override_value: &str,
    computed: Option<&str>,
    control: Option<&str>,
) -> Result<bool> {
    if computed.is_none() && control.is_none() {
        bail!("Pass --computed, --control or both");
    }

    let override_value = parse_value(override_value, "--override")?;
    let computed = computed.map(|v| parse_value(v, "--computed")).transpose()?;
    let control = control.map(|v| parse_value(v, "--control")).transpose()?;

    match detect_conflict(field, &override_value, computed.as_ref(), control.as_ref())? {
        Some(info) => {
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(false)
        }
        None => {
            println!("No conflict");
            Ok(true)
        }
    }
}
