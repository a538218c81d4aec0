//! `authscope`, the single binary for every role in the system: the
//! dispatcher HTTP API, a broker-consuming worker for one analyzer queue,
//! one-shot per-analyzer runs outside the broker, and the hidden `run-task`
//! subcommand the worker's child-process supervisor re-invokes this same
//! binary with.
//!
//! A `clap` command enum dispatched in `main`, `init_tracing()` for
//! structured JSON logs, and a shared `load_config()` helper for every
//! subcommand that needs one.

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use authscope_domain::model::AnalyzerKind;

#[derive(Parser)]
#[command(name = "authscope", version, about = "Distributed web-authentication landscape scanner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the dispatcher's HTTP API and broker publisher.
    Dispatcher {
        #[command(subcommand)]
        action: DispatcherAction,
    },
    /// Runs a broker-consuming worker for one analyzer's queue.
    Worker {
        #[arg(long, value_enum)]
        analyzer: AnalyzerArg,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// One-shot landscape analysis of a single domain, outside the broker.
    LandscapeAnalysis(OneShotArgs),
    /// One-shot passkey analysis of a single domain, outside the broker.
    PasskeyAnalysis(OneShotArgs),
    /// One-shot login-trace analysis of a single domain, outside the broker.
    LoginTraceAnalysis(OneShotArgs),
    /// One-shot wildcard-receiver analysis of a single domain, outside the broker.
    WildcardReceiverAnalysis(OneShotArgs),
    /// Runs one task read from stdin as `{"task":...,"config":...}`, writing
    /// its `TaskResult` to stdout. Used by `authscope-worker`'s child-process
    /// supervisor; not meant to be invoked by hand.
    #[command(hide = true, name = "run-task")]
    RunTask,
    /// Inspect or validate the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DispatcherAction {
    /// Starts the HTTP API, binding `server.host:server.port`.
    Serve {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Loads the config and reports validation errors, if any.
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Prints the effective config (after defaults) as TOML.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct OneShotArgs {
    #[arg(long)]
    domain: String,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum AnalyzerArg {
    LandscapeAnalysis,
    PasskeyAnalysis,
    LoginTraceAnalysis,
    WildcardReceiverAnalysis,
}

impl From<AnalyzerArg> for AnalyzerKind {
    fn from(arg: AnalyzerArg) -> Self {
        match arg {
            AnalyzerArg::LandscapeAnalysis => AnalyzerKind::LandscapeAnalysis,
            AnalyzerArg::PasskeyAnalysis => AnalyzerKind::PasskeyAnalysis,
            AnalyzerArg::LoginTraceAnalysis => AnalyzerKind::LoginTraceAnalysis,
            AnalyzerArg::WildcardReceiverAnalysis => AnalyzerKind::WildcardReceiverAnalysis,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        None => {
            init_tracing("info");
            run_dispatcher_serve(None).await
        }
        Some(Command::Dispatcher { action: DispatcherAction::Serve { config } }) => {
            init_tracing("info");
            run_dispatcher_serve(config.as_deref()).await
        }
        Some(Command::Worker { analyzer, config }) => {
            init_tracing("info");
            run_worker(analyzer.into(), config.as_deref()).await
        }
        Some(Command::LandscapeAnalysis(args)) => run_oneshot(AnalyzerKind::LandscapeAnalysis, args).await,
        Some(Command::PasskeyAnalysis(args)) => run_oneshot(AnalyzerKind::PasskeyAnalysis, args).await,
        Some(Command::LoginTraceAnalysis(args)) => run_oneshot(AnalyzerKind::LoginTraceAnalysis, args).await,
        Some(Command::WildcardReceiverAnalysis(args)) => {
            run_oneshot(AnalyzerKind::WildcardReceiverAnalysis, args).await
        }
        Some(Command::RunTask) => {
            init_tracing("warn");
            cli::run_task::run().await
        }
        Some(Command::Config { action: ConfigAction::Validate { config } }) => {
            let (config, path) = cli::load_config(config.as_deref())?;
            if !cli::config::validate(&config, &path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config { action: ConfigAction::Show { config } }) => {
            let (config, _path) = cli::load_config(config.as_deref())?;
            cli::config::show(&config);
            Ok(())
        }
    }
}

async fn run_dispatcher_serve(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let (config, _path) = cli::load_config(config_path)?;
    let config = Arc::new(config);

    let shutdown = CancellationToken::new();
    let state = authscope_dispatcher::bootstrap::build_app_state(config.clone()).await?;
    authscope_dispatcher::bootstrap::spawn_background_tasks(state.clone(), shutdown.clone());

    let router = authscope_dispatcher::api::router(state.clone()).with_state(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "authscope dispatcher listening");

    let shutdown_signal = async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    };
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal).await?;
    Ok(())
}

async fn run_worker(analyzer: AnalyzerKind, config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let (config, _path) = cli::load_config(config_path)?;
    let shutdown = CancellationToken::new();

    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_for_signal.cancel();
    });

    tracing::info!(queue = analyzer.queue_name(), "authscope worker starting");
    authscope_worker::run(config, analyzer, shutdown).await?;
    Ok(())
}

async fn run_oneshot(analyzer: AnalyzerKind, args: OneShotArgs) -> anyhow::Result<()> {
    init_tracing(&args.log_level);
    let (config, _path) = cli::load_config(args.config.as_deref())?;
    cli::oneshot::run(analyzer, &args.domain, &config, &args.out).await
}

/// Structured JSON logging; the default level can be overridden
/// per-invocation (one-shot subcommands take `--log-level`) or via
/// `RUST_LOG`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).json().try_init();
}
