//! ResourceForge CLI - JSON bridge to the synthesis engine
//!
//! Commands: resources, validate, synth
//! Outputs JSON to stdout, logs to stderr (RUST_LOG)
//! Returns 2 when the caller's input is rejected

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use resourceforge_core::{builtin_catalog, PipelineError, SynthesisPipeline};

#[derive(Parser)]
#[command(name = "resourceforge-cli")]
#[command(about = "ResourceForge CLI - Infrastructure Resource Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Payload {
    /// Raw attributes as a JSON object
    #[arg(short, long)]
    payload: Option<String>,

    /// File containing the raw attributes
    #[arg(long)]
    payload_file: Option<PathBuf>,
}

impl Payload {
    fn load(&self) -> Result<Value, String> {
        let text = match (&self.payload, &self.payload_file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
            (None, None) => return Err("no payload given".to_string()),
        };
        serde_json::from_str(&text).map_err(|e| format!("Invalid payload: {e}"))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource types
    Resources,

    /// Validate raw attributes against a resource schema
    Validate {
        /// Resource type, e.g. aws_sqs_queue
        #[arg(short, long)]
        resource: String,

        #[command(flatten)]
        payload: Payload,
    },

    /// Validate, build the block and bind references
    Synth {
        /// Resource type, e.g. aws_sqs_queue
        #[arg(short, long)]
        resource: String,

        /// Instance name used in reference tokens
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        payload: Payload,
    },
}

fn print(value: &impl Serialize, compact: bool) -> ExitCode {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn failure(error: &PipelineError, compact: bool) -> ExitCode {
    let mut output = json!({"success": false, "error": error.to_string()});
    if let PipelineError::Validation(cause) = error {
        output["path"] = json!(cause.path());
    }
    print(&output, compact);
    if error.is_user_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match builtin_catalog() {
        Ok(c) => c,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to initialize catalog: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };
    let pipeline = SynthesisPipeline::new(catalog);

    match cli.command {
        Commands::Resources => {
            let resources: Vec<_> = pipeline.list_resources().iter().map(|d| d.summary()).collect();
            print(&resources, cli.compact)
        }

        Commands::Validate { resource, payload } => {
            let raw = match payload.load() {
                Ok(v) => v,
                Err(e) => {
                    print(&json!({"valid": false, "error": e}), cli.compact);
                    return ExitCode::from(2);
                }
            };

            match pipeline.validate(&resource, &raw) {
                Ok(record) => print(&json!({"valid": true, "record": record}), cli.compact),
                Err(e) => failure(&e, cli.compact),
            }
        }

        Commands::Synth { resource, name, payload } => {
            let raw = match payload.load() {
                Ok(v) => v,
                Err(e) => {
                    print(&json!({"success": false, "error": e}), cli.compact);
                    return ExitCode::from(2);
                }
            };

            match pipeline.synthesize(&resource, &name, &raw) {
                Ok(synthesized) => print(&json!({"success": true, "resource": synthesized}), cli.compact),
                Err(e) => failure(&e, cli.compact),
            }
        }
    }
}
