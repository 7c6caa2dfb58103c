//! notewarp CLI — check, evaluate and apply note transforms.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use clap::{Parser, Subcommand};

use notewarp::config::EngineConfig;
use notewarp::diagnostics::DiagnosticLog;
use notewarp::dsl::{self, Dialect, PitchFilter, Statement};
use notewarp::eval::EvalContext;
use notewarp::note::{parse_note_name, NoteEvent};
use notewarp::time::{TimeRange, TimeSignature};
use notewarp::transform::{ApplyOptions, DeltaMap, TransformEngine};

#[derive(Parser)]
#[command(name = "notewarp")]
#[command(about = "Time- and pitch-conditional note transforms", long_about = None)]
struct Cli {
    /// Config file (default: ~/.notewarp/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use modulation parameter names (velocityDeviation)
    #[arg(short, long, global = true)]
    modulation: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a transform and print its statements
    Check {
        /// Transform source, a file containing it, or "-" for stdin
        source: String,
    },

    /// Evaluate a transform at one position
    Eval {
        /// Transform source, a file containing it, or "-" for stdin
        source: String,

        /// Position in beats
        #[arg(short, long, default_value = "0")]
        position: f64,

        /// Note pitch (MIDI number or name such as C3)
        #[arg(long)]
        pitch: Option<String>,

        /// Time signature, e.g. 3/4
        #[arg(short, long, value_parser = parse_time_sig)]
        time_sig: Option<TimeSignature>,

        /// 12-bit pitch-class mask, decimal or 0b/0x prefixed
        #[arg(short, long, value_parser = parse_mask)]
        scale_mask: Option<u16>,

        /// Active range start in beats (for ramp/curve)
        #[arg(long, requires = "range_end")]
        range_start: Option<f64>,

        /// Active range end in beats
        #[arg(long, requires = "range_start")]
        range_end: Option<f64>,
    },

    /// Apply a transform to a YAML list of notes and print the result
    Apply {
        /// YAML file with a list of notes
        notes: PathBuf,

        /// Transform source, a file containing it, or "-" for stdin
        source: String,

        /// Time signature, e.g. 3/4
        #[arg(short, long, value_parser = parse_time_sig)]
        time_sig: Option<TimeSignature>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// 12-bit pitch-class mask, decimal or 0b/0x prefixed
        #[arg(short, long, value_parser = parse_mask)]
        scale_mask: Option<u16>,
    },
}

fn parse_time_sig(text: &str) -> Result<TimeSignature, String> {
    TimeSignature::parse(text).ok_or_else(|| format!("invalid time signature '{text}'"))
}

fn parse_mask(text: &str) -> Result<u16, String> {
    let parsed = if let Some(bits) = text.strip_prefix("0b") {
        u16::from_str_radix(bits, 2)
    } else if let Some(hex) = text.strip_prefix("0x") {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|e| format!("invalid scale mask '{text}': {e}"))
}

fn parse_pitch(text: &str) -> Result<u8, String> {
    text.parse::<u8>()
        .ok()
        .filter(|p| *p <= 127)
        .or_else(|| parse_note_name(text))
        .ok_or_else(|| format!("invalid pitch '{text}'"))
}

/// Inline source, a path to a source file, or "-" for stdin.
fn read_source(source: &str) -> Result<String, Box<dyn std::error::Error>> {
    if source == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    let path = Path::new(source);
    if path.is_file() {
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(source.to_string())
}

fn describe_statement(statement: &Statement, dialect: Dialect) -> String {
    let mut parts = Vec::new();
    match statement.pitch_filter {
        Some(PitchFilter::Single(p)) => parts.push(format!("pitch={p}")),
        Some(PitchFilter::Range(low, high)) => parts.push(format!("pitch={low}-{high}")),
        None => {}
    }
    if let Some(time) = statement.time_filter {
        parts.push(format!("time={}-{}", time.start, time.end));
    }
    parts.push(format!(
        "{} {} {}",
        dialect.parameter_name(statement.parameter),
        statement.operator,
        statement.expression
    ));
    parts.join(" ")
}

fn print_deltas(deltas: &DeltaMap, dialect: Dialect) {
    if deltas.is_empty() {
        println!("(no changes)");
    }
    for (parameter, delta) in deltas {
        println!(
            "{} {} {}",
            dialect.parameter_name(*parameter),
            delta.operator,
            delta.value
        );
    }
}

/// Diagnostics printed after a run; older ones are summarised as a count.
const MAX_PRINTED_DIAGNOSTICS: usize = 20;

fn print_diagnostics(log: &DiagnosticLog, started: SystemTime) {
    let omitted = log.len().saturating_sub(MAX_PRINTED_DIAGNOSTICS);
    if omitted > 0 {
        eprintln!("({omitted} earlier diagnostics omitted)");
    }
    for entry in log.recent(MAX_PRINTED_DIAGNOSTICS) {
        let ms = entry.elapsed_since(started).as_secs_f64() * 1000.0;
        eprintln!("[+{ms:.1}ms] {}", entry.diagnostic);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let started = SystemTime::now();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load().unwrap_or_default(),
    };
    if cli.modulation {
        config.dialect = Dialect::Modulation;
    }
    let dialect = config.dialect;

    match cli.command {
        Commands::Check { source } => {
            let source = read_source(&source)?;
            let statements = dsl::parse_dialect(&source, dialect)?;
            for (i, statement) in statements.iter().enumerate() {
                println!("{:>3}  {}", i + 1, describe_statement(statement, dialect));
            }
        }

        Commands::Eval {
            source,
            position,
            pitch,
            time_sig,
            scale_mask,
            range_start,
            range_end,
        } => {
            let source = read_source(&source)?;
            let time_sig = time_sig.unwrap_or(config.time_signature);

            let mut ctx = EvalContext::new(position, time_sig).with_bar_beat();
            if let Some(pitch) = pitch {
                ctx = ctx.with_pitch(parse_pitch(&pitch)?);
            }
            if let Some(mask) = scale_mask {
                ctx = ctx.with_scale_mask(mask);
            }
            if let (Some(start), Some(end)) = (range_start, range_end) {
                ctx = ctx.with_active_range(TimeRange::new(start, end));
            }

            let log = Arc::new(DiagnosticLog::new(config.diagnostic_capacity));
            let engine = TransformEngine::from_config(&config).with_diagnostics(log.clone());
            let deltas = match dialect {
                Dialect::Transform => engine.evaluate_transform(&source, &ctx),
                Dialect::Modulation => engine.evaluate_modulation(&source, &ctx),
            };
            if let (Some(bar), Some(beat)) = (ctx.bar, ctx.beat) {
                println!("at {bar}|{beat} ({position} beats)");
            }
            print_deltas(&deltas, dialect);
            print_diagnostics(&log, started);
        }

        Commands::Apply {
            notes,
            source,
            time_sig,
            seed,
            scale_mask,
        } => {
            let source = read_source(&source)?;
            let content = std::fs::read_to_string(&notes)?;
            let mut notes: Vec<NoteEvent> = serde_yaml::from_str(&content)?;

            if seed.is_some() {
                config.seed = seed;
            }
            let mut options =
                ApplyOptions::new(time_sig.unwrap_or(config.time_signature)).with_dialect(dialect);
            if let Some(mask) = scale_mask {
                options = options.with_scale_mask(mask);
            }

            let log = Arc::new(DiagnosticLog::new(config.diagnostic_capacity));
            let engine = TransformEngine::from_config(&config).with_diagnostics(log.clone());
            let report = engine.apply_transforms_with(&mut notes, &source, &options);

            print!("{}", serde_yaml::to_string(&notes)?);
            print_diagnostics(&log, started);
            tracing::info!(
                changed = report.notes_changed,
                failures = report.failures.len(),
                "done"
            );
        }
    }

    Ok(())
}
