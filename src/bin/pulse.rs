//! Pulse CLI - Command-line interface for Plant Pulse
//!
//! Commands:
//! - run: Process streaming frames from stdin (streaming mode)
//! - transform: Process a file of frames into output records (batch mode)
//! - score: Score a single sample given on the command line
//! - simulate: Emit a deterministic scenario feed as frames
//! - doctor: Diagnose configuration and store health

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use plant_pulse::adapters::{FrameAdapter, FrameFormat};
use plant_pulse::config::EngineConfig;
use plant_pulse::encoder::{OutputEncoder, OutputRecord};
use plant_pulse::normalizer::BANDS_VERSION;
use plant_pulse::persistence::{read_benchmark_days, read_last_watered_at, JsonFileStore};
use plant_pulse::pipeline::PlantEngine;
use plant_pulse::scenario::Scenario;
use plant_pulse::types::RawSample;
use plant_pulse::{EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// Pulse - On-device engine for houseplant sensor boards
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Plant Pulse Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn plant sensor readings into comfort scores, mood and reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process streaming frames from stdin (streaming mode)
    Run {
        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Key-value store file for watering history
        #[arg(long)]
        store: Option<PathBuf>,

        /// Frame format
        #[arg(long, default_value = "json")]
        format: InputFormat,

        /// Publish comfort metrics on every sample
        #[arg(long)]
        realtime: bool,

        /// Only write records whose metrics changed or that carry an event
        #[arg(long)]
        changes_only: bool,

        /// Load engine state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file on exit
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Process a file of frames into output records (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Frame format
        #[arg(long, default_value = "json")]
        format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Load engine state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file after processing
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// Score a single sample given on the command line
    Score {
        #[arg(long)]
        soil: f64,

        #[arg(long)]
        temperature: f64,

        #[arg(long)]
        humidity: f64,

        #[arg(long, default_value = "200")]
        gas: f64,

        #[arg(long, default_value = "1023")]
        wetness: f64,

        #[arg(long, default_value = "20")]
        bio: f64,

        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Emit a deterministic scenario feed as frames
    Simulate {
        /// Scenario name (healthy, drying, watering, gas-spike)
        scenario: String,

        /// Number of frames
        #[arg(long, default_value = "60")]
        count: usize,

        /// Seconds between frames
        #[arg(long, default_value = "5")]
        interval_secs: i64,

        /// Frame format
        #[arg(long, default_value = "json")]
        format: InputFormat,
    },

    /// Diagnose configuration and store health
    Doctor {
        /// Check engine config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check key-value store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// One JSON object per line
    Json,
    /// One CSV row per line: soil,temperature,humidity,gas,wetness,bio
    Csv,
}

impl From<InputFormat> for FrameFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Json => FrameFormat::Json,
            InputFormat::Csv => FrameFormat::Csv,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

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

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Run {
            config,
            store,
            format,
            realtime,
            changes_only,
            load_state,
            save_state,
        } => cmd_run(
            config.as_deref(),
            store.as_deref(),
            format,
            realtime,
            changes_only,
            load_state.as_deref(),
            save_state.as_deref(),
        ),

        Commands::Transform {
            input,
            output,
            format,
            output_format,
            config,
            load_state,
            save_state,
        } => cmd_transform(
            &input,
            &output,
            format,
            output_format,
            config.as_deref(),
            load_state.as_deref(),
            save_state.as_deref(),
        ),

        Commands::Score {
            soil,
            temperature,
            humidity,
            gas,
            wetness,
            bio,
            config,
            json,
        } => {
            let sample = RawSample::new(soil, temperature, humidity, gas, wetness, bio);
            cmd_score(sample, config.as_deref(), json)
        }

        Commands::Simulate {
            scenario,
            count,
            interval_secs,
            format,
        } => cmd_simulate(&scenario, count, interval_secs, format),

        Commands::Doctor {
            config,
            store,
            json,
        } => cmd_doctor(config.as_deref(), store.as_deref(), json),
    }
}

fn build_engine(
    config: Option<&Path>,
    load_state: Option<&Path>,
) -> Result<PlantEngine, PulseCliError> {
    let config = match config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = PlantEngine::with_config(config);

    if let Some(state_path) = load_state {
        let state_json = fs::read_to_string(state_path)?;
        engine.load_state(&state_json)?;
    }

    Ok(engine)
}

fn cmd_run(
    config: Option<&Path>,
    store: Option<&Path>,
    format: InputFormat,
    realtime: bool,
    changes_only: bool,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
) -> Result<(), PulseCliError> {
    let mut engine = build_engine(config, load_state)?;
    if realtime {
        engine.set_realtime(true);
    }
    if let Some(store_path) = store {
        engine.attach_store(Box::new(JsonFileStore::open(store_path)?));
    }

    let adapter = FrameFormat::from(format).adapter();
    let encoder = OutputEncoder::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || adapter.is_header(trimmed) {
            continue;
        }

        let sample = adapter.parse_frame(trimmed, Utc::now())?;
        let output = engine.ingest(sample);

        if changes_only && !output.changed && !output.is_new_event {
            continue;
        }

        writeln!(stdout, "{}", encoder.encode_to_json(&output)?)?;
        stdout.flush()?;
    }

    if let Some(state_path) = save_state {
        fs::write(state_path, engine.save_state()?)?;
    }

    Ok(())
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
) -> Result<(), PulseCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let samples = FrameFormat::from(format).adapter().parse_batch(&input_data)?;
    if samples.is_empty() {
        return Err(PulseCliError::NoFrames);
    }

    let mut engine = build_engine(config, load_state)?;
    let encoder = OutputEncoder::new();
    let records: Vec<OutputRecord> = samples
        .into_iter()
        .map(|sample| encoder.encode(&engine.ingest(sample)))
        .collect();

    if let Some(state_path) = save_state {
        fs::write(state_path, engine.save_state()?)?;
    }

    let output_data = format_output(&records, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_score(sample: RawSample, config: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut engine = build_engine(config, None)?;
    let output = engine.ingest(sample);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let metrics = &output.comfort_metrics;
    println!("State:          {}", output.emotion_state);
    println!("                {}", output.emotion_state.message());
    println!();
    println!("Scores (0-100)");
    println!("  hydration:    {}", output.scores.hydration);
    println!("  comfort:      {}", output.scores.comfort);
    println!("  air quality:  {}", output.scores.air_quality);
    println!("  bio signal:   {}", output.scores.bio_signal);
    println!("  overall:      {}", output.overall_health);
    println!();
    println!("Comfort metrics");
    println!("  soil:         {:.1}%", metrics.soil_percent);
    println!("  moisture:     {:.3}", metrics.moisture_index);
    println!("  temperature:  {:.3}", metrics.temperature_index);
    println!("  humidity:     {:.3}", metrics.humidity_index);
    println!("  watering:     {:.3}", metrics.watering_index);
    println!("  gas:          {:.3}", metrics.gas_index);
    println!("  plant comfort:{:.3}", metrics.plant_comfort);

    if let Some(reminder) = &output.reminder {
        println!();
        let urgency = if reminder.is_urgent { " (urgent)" } else { "" };
        println!("Reminder{}: {}", urgency, reminder.message);
    }

    Ok(())
}

fn cmd_simulate(
    scenario: &str,
    count: usize,
    interval_secs: i64,
    format: InputFormat,
) -> Result<(), PulseCliError> {
    let scenario: Scenario = scenario.parse()?;
    let samples = scenario.samples(Utc::now(), Duration::seconds(interval_secs), count);
    let mut stdout = io::stdout();

    for sample in samples {
        let line = match format {
            InputFormat::Json => serde_json::json!({
                "soil": sample.soil_moisture,
                "temperature": sample.temperature,
                "humidity": sample.humidity,
                "gas": sample.gas_level,
                "wetness": sample.wetness_contact,
                "bio": sample.bio_signal,
                "timestamp": sample.received_at.to_rfc3339(),
            })
            .to_string(),
            InputFormat::Csv => format!(
                "{:.1},{:.2},{:.2},{:.1},{:.1},{:.2},{}",
                sample.soil_moisture,
                sample.temperature,
                sample.humidity,
                sample.gas_level,
                sample.wetness_contact,
                sample.bio_signal,
                sample.received_at.to_rfc3339()
            ),
        };
        writeln!(stdout, "{}", line)?;
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, store: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Plant Pulse version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "bands".to_string(),
        status: CheckStatus::Ok,
        message: format!("Threshold set: {}", BANDS_VERSION),
    });

    if let Some(config_path) = config {
        checks.push(if config_path.exists() {
            match EngineConfig::from_file(config_path) {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (gas baseline {}, benchmark {} days)",
                        config.gas_baseline, config.benchmark_days
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: "Config file does not exist".to_string(),
            }
        });
    }

    if let Some(store_path) = store {
        checks.push(check_store(store_path));
    }

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
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
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
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_store(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Warning,
            message: "Store file does not exist yet (created on first watering)".to_string(),
        };
    }

    let store = match JsonFileStore::open(path) {
        Ok(store) => store,
        Err(e) => {
            return DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot open store: {}", e),
            }
        }
    };

    match (read_last_watered_at(&store), read_benchmark_days(&store)) {
        (Ok(watered_at), Ok(days)) => DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Store valid (last watered: {}, benchmark: {})",
                watered_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                days.map(|d| format!("{d} days"))
                    .unwrap_or_else(|| "default".to_string())
            ),
        },
        (Err(e), _) | (_, Err(e)) => DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Warning,
            message: format!("Store has unreadable values, they will be ignored: {}", e),
        },
    }
}

fn format_output(records: &[OutputRecord], format: &OutputFormat) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoFrames,
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<EngineError> for PulseCliError {
    fn from(e: EngineError) -> Self {
        PulseCliError::Engine(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Engine(e) => {
                let (code, hint) = match &e {
                    EngineError::FrameError(_) | EngineError::MissingField(_) => (
                        "FRAME_ERROR",
                        "Frames need soil, temperature, humidity, gas, wetness and bio",
                    ),
                    EngineError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    EngineError::DateParseError(_) => {
                        ("DATE_ERROR", "Use RFC 3339 timestamps or epoch milliseconds")
                    }
                    EngineError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'pulse doctor --config <file>' for details")
                    }
                    EngineError::StoreError(_) => {
                        ("STORE_ERROR", "Run 'pulse doctor --store <file>' for details")
                    }
                    EngineError::UnknownScenario(_) => (
                        "UNKNOWN_SCENARIO",
                        "Choose one of: healthy, drying, watering, gas-spike",
                    ),
                    EngineError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

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
