use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use photon_core::{AnalysisConfig, DialectKind, Report};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PHOTON_BUILD_COMMIT"),
    ", built ",
    env!("PHOTON_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  photon-spectator pcap decode capture.pcapng -o report.json\n  photon-spectator pcap analyze capture.pcap --stdout --pretty\n  photon-spectator pcap decode capture.pcapng -o report.json --dialect albion --parameters";

#[derive(Parser, Debug)]
#[command(name = "photon-spectator")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder for Photon UDP traffic in network captures.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log decoder diagnostics to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode the Photon traffic of a capture into a versioned JSON report.
    #[command(visible_alias = "analyze", alias = "analyse", after_help = EXAMPLES)]
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Path to a .pcap or .pcapng file (a glob must match exactly one file)
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// UDP port carrying Photon traffic; repeat for several (default 5055, 5056)
    #[arg(long = "port", value_name = "PORT")]
    ports: Vec<u16>,

    /// Type-tag table used to decode parameters
    #[arg(long, value_enum, default_value_t = DialectArg::Photon)]
    dialect: DialectArg,

    /// Incomplete fragment sequences kept per flow (default 128)
    #[arg(long, value_name = "N")]
    fragment_capacity: Option<usize>,

    /// Decode parameter tables and include one record per message
    #[arg(long)]
    parameters: bool,

    /// Exit with a non-zero code if decode issues are present
    #[arg(long)]
    strict: bool,

    /// List decode issues after analysis
    #[arg(long)]
    list_issues: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DialectArg {
    Photon,
    Albion,
}

impl From<DialectArg> for DialectKind {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Photon => DialectKind::Photon,
            DialectArg::Albion => DialectKind::Albion,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Decode(args) => cmd_pcap_decode(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let config = analysis_config(&args)?;

    let report_path = match (args.stdout, args.report.as_ref()) {
        (true, _) => None,
        (false, Some(path)) => Some(path),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };
    if let Some(report_path) = report_path {
        ensure_distinct_output(&resolved_input, report_path)?;
    }

    debug!(input = %resolved_input.display(), ?config, "decoding capture");
    let rep = photon_core::analyze_pcap_file(&resolved_input, &config)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report_path) => {
            if let Some(parent) = report_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(report_path, json)
                .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        }
    }

    if args.list_issues && !args.quiet {
        print_issues(&rep);
    }
    if let Some(report_path) = report_path {
        if !args.quiet {
            eprintln!(
                "OK: {} frames, {} messages -> {}",
                rep.photon.frames,
                rep.messages.iter().map(|m| m.count).sum::<u64>(),
                report_path.display()
            );
        }
    }
    if args.strict && !rep.issues.is_empty() {
        return Err(CliError::new(
            "decode issues detected",
            Some("use --list-issues to inspect".to_string()),
        ));
    }
    Ok(())
}

fn analysis_config(args: &DecodeArgs) -> Result<AnalysisConfig, CliError> {
    let mut config = AnalysisConfig {
        dialect: args.dialect.into(),
        include_parameters: args.parameters,
        ..AnalysisConfig::default()
    };
    if !args.ports.is_empty() {
        let mut ports = args.ports.clone();
        ports.sort_unstable();
        ports.dedup();
        config.ports = ports;
    }
    if let Some(capacity) = args.fragment_capacity {
        if capacity == 0 {
            return Err(CliError::new(
                "fragment capacity must be at least 1",
                Some("omit --fragment-capacity to use the default of 128".to_string()),
            ));
        }
        config.fragment_capacity = capacity;
    }
    Ok(config)
}

fn ensure_distinct_output(input: &Path, report_path: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A missing output directory is created later, so it cannot hold the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report_path.file_name().ok_or_else(|| {
        CliError::new(
            format!("invalid report path: {}", report_path.display()),
            Some("pass a file name, not a directory".to_string()),
        )
    })?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_issues(rep: &Report) {
    eprintln!("Decode issues:");
    for issue in &rep.issues {
        eprintln!("  {} {} ({})", issue.severity, issue.id, issue.count);
        for example in &issue.examples {
            eprintln!("    {}", example);
        }
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|path| path.display().to_string())
                .collect();
            if count > 3 {
                listed.push("...".to_string());
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern,
                    count,
                    listed.join(", ")
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
