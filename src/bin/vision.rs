//! Vision CLI - Command-line interface for Synheart Vision
//!
//! Commands:
//! - transform: Process a recorded frame stream into metrics (batch mode)
//! - run: Process streaming frame records from stdin (streaming mode)
//! - validate: Validate frame record schema
//! - schema: Describe the input and output schemas
//! - config: Print the default configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use synheart_vision::encoder::{MetricEnvelope, METRIC_SCHEMA_VERSION};
use synheart_vision::schema::{FrameReader, FrameRecord, SCHEMA_VERSION};
use synheart_vision::{CollectingSink, VisionConfig, VisionProcessor, VISION_VERSION};

/// Vision - On-device biometric inference from camera-derived samples
#[derive(Parser)]
#[command(name = "vision")]
#[command(author = "Synheart AI Inc")]
#[command(version = VISION_VERSION)]
#[command(about = "Estimate heart rate and attention from frame samples", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (logs go to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a recorded frame stream into metrics (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Configuration file (JSON, partial overrides allowed)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Process streaming frame records from stdin (streaming mode)
    Run {
        /// Configuration file (JSON, partial overrides allowed)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate frame record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Print the default configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one metric envelope per line)
    Ndjson,
    /// JSON array of metric envelopes
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (vision.frame.v1)
    Input,
    /// Output schema (vision.metric.v1)
    Output,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries data; diagnostics go to stderr
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), VisionCliError> {
    match command {
        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
            config,
        } => cmd_transform(&input, &output, input_format, output_format, config.as_deref()),
        Commands::Run { config, flush } => cmd_run(config.as_deref(), flush),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
        Commands::Config => {
            println!("{}", VisionConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<VisionConfig, VisionCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            let config = VisionConfig::from_json(&json)?;
            debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(VisionConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, VisionCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: &InputFormat) -> Result<Vec<FrameRecord>, VisionCliError> {
    let records = match format {
        InputFormat::Ndjson => FrameReader::parse_ndjson(data)?,
        InputFormat::Json => FrameReader::parse_array(data)?,
    };
    Ok(records)
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), VisionCliError> {
    let config = load_config(config)?;
    let records = parse_records(&read_input(input)?, &input_format)?;

    if records.is_empty() {
        return Err(VisionCliError::NoRecords);
    }

    let mut processor = VisionProcessor::new(config, Box::new(CollectingSink::new()))?;
    processor.start()?;

    let total = records.len();
    for record in records {
        processor.process_and_tick(record)?;
    }

    let envelopes: Vec<MetricEnvelope> = processor
        .drain_events()
        .into_iter()
        .map(|event| processor.encoder().encode(event))
        .collect();
    info!(records = total, metrics = envelopes.len(), "transform complete");

    let output_data = format_output(&envelopes, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(config: Option<&Path>, flush: bool) -> Result<(), VisionCliError> {
    let config = load_config(config)?;
    let mut processor = VisionProcessor::new(config, Box::new(CollectingSink::new()))?;
    processor.start()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = FrameReader::parse_line(&line, line_num + 1)?;
        processor.process_and_tick(record)?;

        for encoded in processor.drain_encoded()? {
            writeln!(stdout, "{}", encoded)?;
        }
        if flush {
            stdout.flush()?;
        }
    }

    processor.stop();
    stdout.flush()?;
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), VisionCliError> {
    let records = parse_records(&read_input(input)?, &input_format)?;
    let results = FrameReader::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                kind: r.kind.to_string(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} record (index {}): {}", err.kind, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(VisionCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), VisionCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", serde_json::to_string_pretty(&input_json_schema())?);
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per line, tagged by \"kind\":");
                println!();
                println!("1. color - Face-region channel averages for one frame");
                println!("   - r, g, b: mean intensities");
                println!("   - t: capture time (ms)");
                println!();
                println!("2. eye - Eye landmarks for one frame");
                println!("   - left_eye, right_eye: {{ center, iris, openness }} (all optional)");
                println!("   - gaze_direction: optional producer-supplied vector");
                println!("   - t: capture time (ms)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", serde_json::to_string_pretty(&output_json_schema())?);
            } else {
                println!("Output Schema: {}", METRIC_SCHEMA_VERSION);
                println!();
                println!("Each metric envelope contains:");
                println!();
                println!("- schema_version: {}", METRIC_SCHEMA_VERSION);
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc: RFC 3339 timestamp");
                println!("- event: one of");
                println!("  - heart_rate: {{ bpm, is_fallback, status, timestamp, peak_count }}");
                println!("  - attention: {{ attention_score, fixation_count, avg_fixation_duration, saccade_count, blink_rate, timestamp }}");
                println!("  - gaze: {{ gaze_direction, timestamp }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn format_output(
    envelopes: &[MetricEnvelope],
    format: &OutputFormat,
) -> Result<String, VisionCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for envelope in envelopes {
                lines.push(serde_json::to_string(envelope)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(envelopes)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(envelopes)?),
    }
}

fn input_json_schema() -> serde_json::Value {
    let point = serde_json::json!({
        "type": "object",
        "required": ["x", "y"],
        "properties": {
            "x": {"type": "number"},
            "y": {"type": "number"},
            "z": {"type": "number"}
        }
    });
    let eye = serde_json::json!({
        "type": "object",
        "properties": {
            "center": point,
            "iris": point,
            "openness": {"type": "number", "minimum": 0}
        }
    });

    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": SCHEMA_VERSION,
        "oneOf": [
            {
                "type": "object",
                "required": ["kind", "r", "g", "b", "t"],
                "properties": {
                    "kind": {"const": "color"},
                    "r": {"type": "number"},
                    "g": {"type": "number"},
                    "b": {"type": "number"},
                    "t": {"type": "number", "minimum": 0}
                }
            },
            {
                "type": "object",
                "required": ["kind", "t"],
                "properties": {
                    "kind": {"const": "eye"},
                    "left_eye": eye,
                    "right_eye": eye,
                    "gaze_direction": point,
                    "t": {"type": "number", "minimum": 0}
                }
            }
        ]
    })
}

fn output_json_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": METRIC_SCHEMA_VERSION,
        "type": "object",
        "required": ["schema_version", "producer", "computed_at_utc", "event"],
        "properties": {
            "schema_version": {"const": METRIC_SCHEMA_VERSION},
            "producer": {
                "type": "object",
                "required": ["name", "version", "instance_id"]
            },
            "computed_at_utc": {"type": "string", "format": "date-time"},
            "event": {
                "type": "object",
                "required": ["metric", "timestamp"],
                "properties": {
                    "metric": {"enum": ["heart_rate", "attention", "gaze"]},
                    "bpm": {"type": "integer", "minimum": 0},
                    "is_fallback": {"type": "boolean"},
                    "status": {"enum": ["measured", "fallback", "not_ready"]},
                    "attention_score": {"type": "integer", "minimum": 0, "maximum": 100},
                    "gaze_direction": {"type": "object"}
                }
            }
        }
    })
}

// Error types

#[derive(Debug)]
enum VisionCliError {
    Io(io::Error),
    Compute(synheart_vision::ComputeError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for VisionCliError {
    fn from(e: io::Error) -> Self {
        VisionCliError::Io(e)
    }
}

impl From<synheart_vision::ComputeError> for VisionCliError {
    fn from(e: synheart_vision::ComputeError) -> Self {
        VisionCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VisionCliError {
    fn from(e: serde_json::Error) -> Self {
        VisionCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VisionCliError> for CliError {
    fn from(e: VisionCliError) -> Self {
        use synheart_vision::ComputeError;

        match e {
            VisionCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VisionCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'vision config' for a valid starting point")
                    }
                    ComputeError::InvalidSample(_) => {
                        ("VALIDATION_ERROR", "Run 'vision validate' for details")
                    }
                    ComputeError::NotReady(_) => ("NOT_READY", "Check the sample source"),
                    _ => ("PARSE_ERROR", "Ensure input matches vision.frame.v1 schema"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VisionCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VisionCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            VisionCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    kind: String,
    error: String,
}
