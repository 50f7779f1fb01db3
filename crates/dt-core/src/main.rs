//! DRAM Fault Triage Core - error-log classification CLI
//!
//! The main entry point for dt-core, handling:
//! - Ingest of error events, inventory and trouble tickets
//! - Failure-mechanism classification
//! - Category, summary and FIT reports
//! - Configuration inspection and validation

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dt_common::error::{format_error_human, StructuredError};
use dt_common::{Error, OutputFormat, SCHEMA_VERSION};
use dt_core::config::{load_config, ConfigOptions, ResolvedConfig};
use dt_core::exit_codes::ExitCode;
use dt_core::ingest::{load_dataset, InputPaths, RejectedRecord};
use dt_core::log_event;
use dt_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use dt_core::pipeline::{run_pipeline, CategoryRow, PipelineOutput};
use dt_core::report::{category_table, compute_fit, render, summarize, FitReport, ReportEnvelope, Summary, Table};
use serde::Serialize;

/// DRAM Fault Triage - classify memory error logs by failure mechanism
#[derive(Parser)]
#[command(name = "dt-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// classifier.json, or a directory containing one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq, -qqq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every device and print the category table
    Classify(ClassifyArgs),

    /// Count devices per category, logical class and mechanism
    Summary(ClassifyArgs),

    /// Failure rates (FIT) per category
    Fit(FitArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Error-event CSV
    #[arg(long)]
    events: PathBuf,

    /// Server inventory CSV
    #[arg(long)]
    inventory: PathBuf,

    /// Trouble-ticket CSV
    #[arg(long)]
    tickets: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Skip cross-module (multi-socket) correlation
    #[arg(long)]
    no_msocket: bool,

    /// Let multi-rank devices fall through to the geometric rules
    #[arg(long)]
    no_mrank: bool,

    /// Classify transient and permanent devices in one population
    #[arg(long)]
    no_permanency_split: bool,

    /// Re-run multi_socket and bank_control devices through the geometric rules
    #[arg(long)]
    refine_multi_socket: bool,

    /// Leave year-0001 timestamps as they are
    #[arg(long)]
    no_epoch_remap: bool,

    /// Drop devices of this DRAM model (repeatable)
    #[arg(long = "exclude-model", value_name = "MODEL")]
    exclude_models: Vec<String>,

    /// Worker threads for the geometric rules
    #[arg(long)]
    workers: Option<usize>,

    /// Write the report here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FitArgs {
    #[command(flatten)]
    classify: ClassifyArgs,

    /// Fleet size in DIMMs
    #[arg(long)]
    num_dimms: Option<u64>,

    /// Observation period in hours
    #[arg(long)]
    hours: Option<f64>,

    /// DRAM chips per rank
    #[arg(long)]
    chips_per_rank: Option<u32>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

/// Which report an analysis run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    Categories,
    Summary,
    Fit,
}

impl Report {
    fn command(&self) -> &'static str {
        match self {
            Report::Categories => "classify",
            Report::Summary => "summary",
            Report::Fit => "fit",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    init_logging(&LogConfig::from_env(level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Classify(args) => run_analysis(&cli.global, args, None, Report::Categories),
        Commands::Summary(args) => run_analysis(&cli.global, args, None, Report::Summary),
        Commands::Fit(args) => run_analysis(&cli.global, &args.classify, Some(args), Report::Fit),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Analysis commands
// ============================================================================

#[derive(Serialize)]
struct CategoryBody<'a> {
    command: &'static str,
    rows: &'a [CategoryRow],
    rejected: &'a [RejectedRecord],
}

#[derive(Serialize)]
struct SummaryBody<'a> {
    command: &'static str,
    summary: &'a Summary,
}

#[derive(Serialize)]
struct FitBody<'a> {
    command: &'static str,
    fit: &'a FitReport,
}

fn apply_overrides(resolved: &mut ResolvedConfig, args: &ClassifyArgs, fit: Option<&FitArgs>) {
    let config = &mut resolved.config;
    if args.no_msocket {
        config.classifier.msocket = false;
    }
    if args.no_mrank {
        config.classifier.mrank = false;
    }
    if args.no_permanency_split {
        config.classifier.split_by_permanency = false;
    }
    if args.refine_multi_socket {
        config.classifier.refine_multi_socket = true;
    }
    if args.no_epoch_remap {
        config.ingest.remap_placeholder_epoch = false;
    }
    for model in &args.exclude_models {
        if !config.classifier.is_excluded(model) {
            config.classifier.excluded_models.push(model.clone());
        }
    }
    if let Some(workers) = args.workers {
        config.classifier.workers = workers;
    }
    if let Some(fit) = fit {
        if let Some(n) = fit.num_dimms {
            config.fleet.num_dimms = n;
        }
        if let Some(h) = fit.hours {
            config.fleet.hours = h;
        }
        if let Some(c) = fit.chips_per_rank {
            config.fleet.chips_per_rank = c;
        }
    }
}

fn run_analysis(
    global: &GlobalOpts,
    args: &ClassifyArgs,
    fit: Option<&FitArgs>,
    report: Report,
) -> ExitCode {
    let run_id = generate_run_id();
    let mut resolved = match resolve_config(global, &LogContext::new(run_id.clone())) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };
    apply_overrides(&mut resolved, args, fit);
    if let Err(e) = resolved.revalidate() {
        return output_error(global, &e.into());
    }

    let snapshot = resolved.snapshot();
    let ctx = LogContext::new(run_id.clone()).with_config_id(snapshot.short_id());
    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "run started",
        command = report.command(),
        config_source = snapshot.config_source.as_str()
    );

    let paths = InputPaths {
        events: args.input.events.clone(),
        inventory: args.input.inventory.clone(),
        tickets: args.input.tickets.clone(),
    };
    let dataset = match load_dataset(&paths, &resolved.config.ingest, &ctx) {
        Ok(dataset) => dataset,
        Err(e) => return output_error(global, &e.into()),
    };

    let PipelineOutput { rows, stats } =
        match run_pipeline(&dataset, &resolved.config.classifier, &ctx) {
            Ok(output) => output,
            Err(e) => return output_error(global, &e),
        };

    let rendered = match report {
        Report::Categories => render(
            global.format,
            &ReportEnvelope::new(
                &run_id,
                &snapshot,
                &stats,
                CategoryBody {
                    command: report.command(),
                    rows: &rows,
                    rejected: &dataset.rejected,
                },
            ),
            &[("Categories", category_table(&rows))],
        ),
        Report::Summary => {
            let summary = summarize(&rows);
            render(
                global.format,
                &ReportEnvelope::new(
                    &run_id,
                    &snapshot,
                    &stats,
                    SummaryBody {
                        command: report.command(),
                        summary: &summary,
                    },
                ),
                &summary.tables(),
            )
        }
        Report::Fit => {
            let fit = compute_fit(&rows, &resolved.config.fleet);
            render(
                global.format,
                &ReportEnvelope::new(
                    &run_id,
                    &snapshot,
                    &stats,
                    FitBody {
                        command: report.command(),
                        fit: &fit,
                    },
                ),
                &[("FIT", fit.table())],
            )
        }
    };
    let rendered = match rendered {
        Ok(text) => text,
        Err(e) => return output_error(global, &e),
    };

    if let Err(e) = emit(&rendered, args.output.as_ref(), &ctx) {
        return output_error(global, &e);
    }

    let exit_code = if dataset.has_rejections() {
        ExitCode::PartialFail
    } else {
        ExitCode::Clean
    };
    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "run finished",
        devices = stats.devices as u64,
        rejected_rows = stats.rejected_rows as u64,
        exit_code = exit_code.code_name()
    );
    exit_code
}

fn emit(text: &str, output: Option<&PathBuf>, ctx: &LogContext) -> Result<(), Error> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            log_event!(
                ctx,
                INFO,
                event_names::REPORT_WRITTEN,
                Stage::Report,
                "report written",
                path = path.display().to_string().as_str()
            );
        }
        None => print!("{}", text),
    }
    Ok(())
}

// ============================================================================
// Config and version
// ============================================================================

/// Load classifier.json (or defaults) and log where it came from.
fn resolve_config(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig, ExitCode> {
    match load_config(&ConfigOptions {
        config_path: global.config.clone(),
    }) {
        Ok(resolved) => {
            match &resolved.paths.classifier {
                Some(path) => log_event!(
                    ctx,
                    DEBUG,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "configuration loaded",
                    path = path.display().to_string().as_str(),
                    source = resolved.paths.source.to_string().as_str()
                ),
                None => log_event!(
                    ctx,
                    DEBUG,
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "no classifier.json found, using built-in defaults"
                ),
            }
            Ok(resolved)
        }
        Err(e) => {
            log_event!(
                ctx,
                WARN,
                event_names::CONFIG_ERROR,
                Stage::Init,
                "configuration rejected",
                reason = e.to_string().as_str()
            );
            Err(output_error(global, &e.into()))
        }
    }
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    let resolved = match resolve_config(global, &LogContext::new(generate_run_id())) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };
    let snapshot = resolved.snapshot();

    let (status, payload) = match args.command {
        ConfigCommands::Show => (
            "show",
            serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "config": resolved.config,
                "snapshot": snapshot,
                "geometry": dt_core::config::Geometry::STANDARD,
            }),
        ),
        ConfigCommands::Validate => (
            "valid",
            serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "status": "valid",
                "snapshot": snapshot,
            }),
        ),
    };

    let mut table = Table::new(&["key", "value"]);
    table.push(vec!["status".into(), status.into()]);
    table.push(vec!["source".into(), snapshot.config_source.clone()]);
    table.push(vec![
        "path".into(),
        snapshot.config_path.clone().unwrap_or_else(|| "(builtin defaults)".into()),
    ]);
    table.push(vec!["config_id".into(), snapshot.short_id().to_string()]);
    if let Ok(serde_json::Value::Object(summary)) = serde_json::to_value(&snapshot.summary) {
        for (key, value) in summary {
            table.push(vec![key, value.to_string()]);
        }
    }

    match render(global.format, &payload, &[("Configuration", table)]) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::Clean
        }
        Err(e) => output_error(global, &e),
    }
}

fn print_version(global: &GlobalOpts) {
    let version = env!("CARGO_PKG_VERSION");
    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "name": "dt-core",
                "version": version,
                "schema_version": SCHEMA_VERSION,
            })
        ),
        _ => println!("dt-core {}", version),
    }
}

/// Print an error to stderr in the requested format and map it to an exit code.
fn output_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from_error(err);
    tracing::error!(
        target: event_names::INTERNAL_ERROR,
        code = err.code(),
        exit_code = exit_code.code_name(),
        "{}",
        err
    );
    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        _ => eprintln!("{}", format_error_human(err, std::io::stderr().is_terminal())),
    }
    exit_code
}
