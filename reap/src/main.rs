use clap::{CommandFactory, Parser, Subcommand};
use commands::session::{BackendArgs, KeepArgs};
use std::path::PathBuf;

mod commands;
mod config;
mod context;
mod format;

/// Reap - Registry tag retention
///
/// Deletes container image versions whose tags are no longer supported,
/// keeping every digest referenced by a supported release or extra tag.
#[derive(Parser, Debug)]
#[command(name = "reap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    /// Config file (default: ~/.config/reap/config.yaml)
    #[arg(long, global = true, env = "REAP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Check that the registry is reachable with the current credentials
    Check {
        /// Image reference (registry/namespace/name)
        image: String,
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Show which tags and versions would be deleted
    Plan {
        /// Image reference (registry/namespace/name)
        image: String,
        #[command(flatten)]
        keep: KeepArgs,
        #[command(flatten)]
        backend: BackendArgs,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Delete unsupported versions
    Clean {
        /// Image reference (registry/namespace/name)
        image: String,
        #[command(flatten)]
        keep: KeepArgs,
        #[command(flatten)]
        backend: BackendArgs,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        force: bool,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a config file with default values
    Init,
    /// Get a configuration value (or display all if no key provided)
    Get {
        /// Configuration key to get (e.g., network.timeout)
        key: Option<String>,
        /// Output format: pretty, json, yaml
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    context::init_tracing(verbosity);

    let color = match cli.color.as_deref().map(str::parse::<format::ColorChoice>) {
        None => None,
        Some(Ok(choice)) => Some(choice),
        Some(Err(e)) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    // Precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(color, verbosity, cli.config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init => commands::config::handle_init(&ctx),
            ConfigCommands::Get { key, format } => {
                commands::config::handle_get(&ctx, key.as_deref(), format.as_deref());
            }
        },
        Commands::Check { image, backend } => {
            commands::check::handle_check(&ctx, &image, &backend).await;
        }
        Commands::Plan {
            image,
            keep,
            backend,
            format,
        } => {
            commands::plan::handle_plan(&ctx, &image, &keep, &backend, format.as_deref()).await;
        }
        Commands::Clean {
            image,
            keep,
            backend,
            dry_run,
            force,
        } => {
            commands::clean::handle_clean(&ctx, &image, &keep, &backend, dry_run, force).await;
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
