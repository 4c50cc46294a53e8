use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use pgshift::commands;
use pgshift::config;
use pgshift::constants::CONFIG_FILENAME;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two schemas; exits with 1 when they differ
    Diff(commands::DiffArgs),

    /// Generate migration and rollback scripts
    Generate(commands::GenerateArgs),

    /// Run a migration script in one transaction
    Apply(commands::ApplyArgs),

    /// Print the statements of a SQL script
    Split {
        /// Script to split
        file: PathBuf,
    },

    /// Capture a live database into a snapshot file
    Snapshot(commands::SnapshotArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Received shutdown signal, cancelling...");
        on_signal.cancel();
    });

    run_main(cli, &cancel).await
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(
    file_config: config::ConfigInput,
    cli_config: config::ConfigInput,
) -> Result<config::Config> {
    config::ConfigBuilder::new()
        .with_file(file_config)
        .with_cli_args(cli_config)
        .resolve()
}

async fn run_main(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    // `split` works on a file alone and never reads the config
    let file_config = || config::load_config(&cli.config_file);

    match &cli.command {
        Commands::Split { file } => {
            commands::cmd_split(file)?;
            Ok(())
        }
        Commands::Diff(args) => {
            let cli_config = config::ConfigInput {
                databases: Some(args.database_args.clone().into()),
                comparison: Some(args.comparison_args.clone().into()),
                ..Default::default()
            };
            let config = resolve_config(file_config()?, cli_config)?;

            info!("Comparing schemas");
            if commands::cmd_diff(&config, args, cancel).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Generate(args) => {
            let cli_config = config::ConfigInput {
                databases: Some(args.database_args.clone().into()),
                comparison: Some(args.comparison_args.clone().into()),
                output: Some(args.output_args.clone().into()),
                ..Default::default()
            };
            let config = resolve_config(file_config()?, cli_config)?;

            info!("Generating migration");
            commands::cmd_generate(&config, args, cancel).await?;
            Ok(())
        }
        Commands::Apply(args) => {
            let config = resolve_config(file_config()?, config::ConfigInput::default())?;

            info!("Applying migration");
            commands::cmd_apply(&config, args, cancel).await?;
            Ok(())
        }
        Commands::Snapshot(args) => {
            let config = resolve_config(file_config()?, config::ConfigInput::default())?;

            info!("Capturing snapshot");
            commands::cmd_snapshot(&config, args, cancel).await
        }
    }
}
