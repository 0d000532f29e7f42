//! Vitaspan CLI - Command-line interface for life-expectancy prediction
//!
//! Commands:
//! - predict: Run one prediction from an indicator record
//! - validate: Validate an indicator record against its bounds
//! - doctor: Diagnose model artifact health and configuration
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vitaspan::chart::{render_importance_svg, DEFAULT_CHART_SIZE};
use vitaspan::features::CANONICAL_FEATURES;
use vitaspan::model::{TreeEnsembleModel, MODEL_VERSION};
use vitaspan::predictor::Predictor;
use vitaspan::report::{PredictionReport, REPORT_VERSION};
use vitaspan::schema::{IndicatorRecord, SCHEMA_VERSION};
use vitaspan::{PredictError, PRODUCER_NAME, VITASPAN_VERSION};

/// Default model artifact location
const DEFAULT_MODEL_PATH: &str = "life_expectancy_model.json";

/// Vitaspan - Life-expectancy inference over national health indicators
#[derive(Parser)]
#[command(name = "vitaspan")]
#[command(version = VITASPAN_VERSION)]
#[command(about = "Predict life expectancy from health indicators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one prediction from an indicator record
    Predict {
        /// Input record path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Model artifact path
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Write the importance chart to this SVG path
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Validate an indicator record against its declared bounds
    Validate {
        /// Input record path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose model artifact health and configuration
    Doctor {
        /// Model artifact path to check
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input, output, or model)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
    /// Human-readable text summary
    Text,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (health.indicators.v1)
    Input,
    /// Output schema (life.report.v1)
    Output,
    /// Model artifact schema (life.model.v1)
    Model,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
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

fn run(cli: Cli) -> Result<(), VitaspanCliError> {
    match cli.command {
        Commands::Predict {
            input,
            output,
            model,
            chart,
            format,
        } => cmd_predict(&input, &output, &model, chart.as_deref(), format),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { model, json } => cmd_doctor(&model, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_predict(
    input: &PathBuf,
    output: &PathBuf,
    model_path: &Path,
    chart: Option<&Path>,
    format: OutputFormat,
) -> Result<(), VitaspanCliError> {
    // Model is loaded exactly once, before any input handling
    let predictor = Predictor::load(model_path)?;

    let input_data = read_input(input)?;
    let record = IndicatorRecord::from_json(&input_data)?;

    let report = predictor.predict(&record)?;

    if let Some(chart_path) = chart {
        let svg = render_importance_svg(&report.importance_ranking, DEFAULT_CHART_SIZE)?;
        fs::write(chart_path, svg)?;
    }

    let output_data = format_report(&report, &format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &PathBuf, json: bool) -> Result<(), VitaspanCliError> {
    let input_data = read_input(input)?;
    let record: IndicatorRecord = serde_json::from_str(&input_data)?;

    let mut errors: Vec<String> = Vec::new();
    if record.schema_version != SCHEMA_VERSION {
        errors.push(format!(
            "schema_version: expected {SCHEMA_VERSION}, got {}",
            record.schema_version
        ));
    }
    errors.extend(
        record
            .indicators
            .violations()
            .iter()
            .map(|e| e.to_string()),
    );

    let report = ValidationReport {
        schema_version: record.schema_version.clone(),
        country: record.country.clone(),
        valid: errors.is_empty(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:  {}", report.schema_version);
        if let Some(country) = &report.country {
            println!("Country: {}", country);
        }
        println!("Valid:   {}", report.valid);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}", err);
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(VitaspanCliError::ValidationFailed(report.errors.len()))
    }
}

fn cmd_doctor(model_path: &Path, json: bool) -> Result<(), VitaspanCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "vitaspan_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitaspan version {}", VITASPAN_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    // Model artifact checks
    if model_path.exists() {
        match TreeEnsembleModel::load(model_path) {
            Ok(model) => {
                checks.push(DoctorCheck {
                    name: "model_artifact".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Artifact {} valid ({} features, {} trees)",
                        model.model_id,
                        model.features.len(),
                        model.trees.len()
                    ),
                });

                if model.importances.iter().all(|s| *s == 0.0) {
                    checks.push(DoctorCheck {
                        name: "importances".to_string(),
                        status: CheckStatus::Warning,
                        message: "All importance scores are zero; chart ranking is meaningless"
                            .to_string(),
                    });
                }

                match Predictor::from_artifact(model) {
                    Ok(_) => checks.push(DoctorCheck {
                        name: "feature_contract".to_string(),
                        status: CheckStatus::Ok,
                        message: "Model feature list matches the feature builder".to_string(),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "feature_contract".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    }),
                }
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "model_artifact".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
            }
        }
    } else {
        checks.push(DoctorCheck {
            name: "model_artifact".to_string(),
            status: CheckStatus::Error,
            message: format!("Model artifact not found at {}", model_path.display()),
        });
    }

    // Check stdin mode (for piping records into predict/validate)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITASPAN_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitaspan Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitaspanCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), VitaspanCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record carries seven bounded indicators:");
                println!();
                println!("  income_composition   0.0 - 1.0    (step 0.01)");
                println!("  schooling_years      0.0 - 20.7   (step 0.1)");
                println!("  under_five_deaths    0 - 2500     (count)");
                println!("  adult_mortality      1 - 723      (per 1,000)");
                println!("  thinness_10_19_pct   0.0 - 27.7   (%)");
                println!("  hiv_prevalence       0.0 - 50.6");
                println!("  bmi                  0.0 - 87.0");
                println!();
                println!("Optional fields: country (label), observed_at (RFC 3339)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", REPORT_VERSION);
                println!();
                println!("A prediction report contains:");
                println!();
                println!("- report_version: Schema version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ model_id, input_schema, timestamps }}");
                println!("- country: Optional input label, echoed back");
                println!("- prediction: {{ years, display }} (display is fixed to two decimals)");
                println!("- importance_ranking: [{{ rank, feature, importance }}] sorted descending");
            }
        }
        SchemaType::Model => {
            if json_schema {
                println!("{}", get_model_json_schema());
                return Ok(());
            }
            println!("Model Schema: {}", MODEL_VERSION);
            println!();
            println!("A model artifact declares:");
            println!();
            println!("- model_version, model_id");
            println!("- features: exactly these seven trained column names:");
            for feature in CANONICAL_FEATURES {
                println!("    {:?}", feature);
            }
            println!("- base_score: baseline added to every prediction");
            println!("- trees: regression trees as flat node arrays (split/leaf)");
            println!("- importances: one non-negative score per feature, same order");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, VitaspanCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_report(
    report: &PredictionReport,
    format: &OutputFormat,
) -> Result<String, VitaspanCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(report)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Text => {
            let mut out = String::new();
            if let Some(country) = &report.country {
                out.push_str(&format!("Country:            {}\n", country));
            }
            out.push_str(&format!(
                "Predicted life expectancy: {}\n",
                report.prediction.display
            ));
            out.push_str("\nFeature importances (descending):\n");
            for entry in &report.importance_ranking {
                out.push_str(&format!(
                    "  {}. {:<32} {:.4}\n",
                    entry.rank,
                    entry.feature.trim(),
                    entry.importance
                ));
            }
            Ok(out)
        }
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Vitaspan health indicator record",
        "type": "object",
        "required": ["schema_version", "indicators"],
        "properties": {
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "country": { "type": "string" },
            "observed_at": { "type": "string", "format": "date-time" },
            "indicators": {
                "type": "object",
                "required": [
                    "income_composition", "schooling_years", "under_five_deaths",
                    "adult_mortality", "thinness_10_19_pct", "hiv_prevalence", "bmi"
                ],
                "properties": {
                    "income_composition": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                    "schooling_years": { "type": "number", "minimum": 0.0, "maximum": 20.7 },
                    "under_five_deaths": { "type": "number", "minimum": 0, "maximum": 2500 },
                    "adult_mortality": { "type": "number", "minimum": 1, "maximum": 723 },
                    "thinness_10_19_pct": { "type": "number", "minimum": 0.0, "maximum": 27.7 },
                    "hiv_prevalence": { "type": "number", "minimum": 0.0, "maximum": 50.6 },
                    "bmi": { "type": "number", "minimum": 0.0, "maximum": 87.0 }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": REPORT_VERSION,
        "description": "Vitaspan prediction report",
        "type": "object",
        "required": ["report_version", "producer", "provenance", "prediction", "importance_ranking"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "model_id": { "type": "string" },
                    "input_schema": { "type": "string" },
                    "observed_at_utc": { "type": "string" },
                    "computed_at_utc": { "type": "string" }
                }
            },
            "country": { "type": "string" },
            "prediction": {
                "type": "object",
                "properties": {
                    "years": { "type": "number" },
                    "display": { "type": "string" }
                }
            },
            "importance_ranking": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "rank": { "type": "integer" },
                        "feature": { "type": "string" },
                        "importance": { "type": "number" }
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_model_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": MODEL_VERSION,
        "description": "Vitaspan model artifact (regression tree ensemble)",
        "type": "object",
        "required": ["model_version", "model_id", "features", "base_score", "trees", "importances"],
        "properties": {
            "model_version": { "type": "string", "const": MODEL_VERSION },
            "model_id": { "type": "string" },
            "features": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 7,
                "maxItems": 7
            },
            "base_score": { "type": "number" },
            "trees": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["nodes"],
                    "properties": {
                        "nodes": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["kind"],
                                "properties": {
                                    "kind": { "enum": ["split", "leaf"] },
                                    "feature": { "type": "integer" },
                                    "threshold": { "type": "number" },
                                    "left": { "type": "integer" },
                                    "right": { "type": "integer" },
                                    "value": { "type": "number" }
                                }
                            }
                        }
                    }
                }
            },
            "importances": {
                "type": "array",
                "items": { "type": "number", "minimum": 0.0 }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum VitaspanCliError {
    Io(io::Error),
    Predict(PredictError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for VitaspanCliError {
    fn from(e: io::Error) -> Self {
        VitaspanCliError::Io(e)
    }
}

impl From<PredictError> for VitaspanCliError {
    fn from(e: PredictError) -> Self {
        VitaspanCliError::Predict(e)
    }
}

impl From<serde_json::Error> for VitaspanCliError {
    fn from(e: serde_json::Error) -> Self {
        VitaspanCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitaspanCliError> for CliError {
    fn from(e: VitaspanCliError) -> Self {
        match e {
            VitaspanCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitaspanCliError::Predict(e) => {
                let (code, hint) = match &e {
                    PredictError::ModelLoad(_) | PredictError::InvalidModel(_) => (
                        "MODEL_ERROR",
                        "Run 'vitaspan doctor' to inspect the artifact",
                    ),
                    PredictError::FeatureMismatch { .. } | PredictError::UnknownFeature(_) => (
                        "FEATURE_MISMATCH",
                        "The artifact was trained against a different feature contract",
                    ),
                    PredictError::OutOfRange { .. }
                    | PredictError::NonFinite(_)
                    | PredictError::InvalidSchemaVersion { .. }
                    | PredictError::MissingField(_) => (
                        "INPUT_ERROR",
                        "Run 'vitaspan validate' for details",
                    ),
                    PredictError::RenderError(_) => ("RENDER_ERROR", "Check the chart output path"),
                    PredictError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    PredictError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VitaspanCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitaspanCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} indicator checks failed", count),
                hint: Some("Fix the reported values and retry".to_string()),
            },
            VitaspanCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    country: Option<String>,
    valid: bool,
    errors: Vec<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
