// src/main.rs

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use ditto::config::{self, Config};
use ditto::db::SqliteStore;
use ditto::definitions::DirectoryLoader;
use ditto::display::TablePresenter;
use ditto::packages::Pacman;
use ditto::sync::{self, SyncContext, SyncOptions, SyncOutcome, TerminalPrompt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Separates install arguments from remove arguments after `--`
const ARGS_SEPARATOR: &str = "::";

#[derive(Parser)]
#[command(name = "ditto")]
#[command(author, version, about = "Declarative package sync tool for Arch-based systems")]
#[command(long_about = "Ditto keeps installed packages in sync across machines using \
plain .pkgs files.\n\nDefine the packages you want and ditto installs them, removing \
anything it installed earlier that you no longer list. Strict mode also removes every \
other package not in your definitions. Running `ditto` with no command creates the \
config file under $XDG_CONFIG_HOME/ditto.")]
struct Cli {
    /// Config file path (default: $XDG_CONFIG_HOME/ditto/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Managed-state database path (default: $XDG_CONFIG_HOME/ditto/ditto.db)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize installed packages with your desired package list
    ///
    /// Extra pacman arguments go after `--`; use `::` to separate install
    /// arguments from remove arguments, e.g. `ditto sync -x -- --needed :: -ns`.
    ///
    /// The confirmation prompt needs an interactive terminal. Without one the
    /// answer counts as "no" and nothing is changed.
    #[command(visible_alias = "s")]
    Sync {
        /// Show what would change without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Remove every installed package that is not in the definitions
        #[arg(short = 'x', long)]
        strict: bool,
        /// [install args...] :: [remove args...]
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// List packages ditto manages for a host (including global records)
    Managed {
        /// Host to list (default: this machine)
        #[arg(long)]
        host: Option<String>,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: clap_complete::Shell,
    },
}

/// Split forwarded arguments at the first `::`
fn split_install_remove_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    match args.iter().position(|a| a == ARGS_SEPARATOR) {
        Some(i) => (args[..i].to_vec(), args[i + 1..].to_vec()),
        None => (args.to_vec(), Vec::new()),
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(config::default_config_path()?),
    }
}

fn db_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.db_path {
        Some(path) => Ok(path.clone()),
        None => Ok(config::default_db_path()?),
    }
}

fn cmd_sync(
    config_path: &Path,
    db_path: &Path,
    dry_run: bool,
    strict: bool,
    args: &[String],
) -> Result<()> {
    // Host scoping is meaningless without it, so resolve before touching anything
    let host = ditto::host::current_host()?;

    let config = Config::load(config_path)?;

    let (install_args, mut remove_args) = split_install_remove_args(args);
    if !remove_args.is_empty() && !strict {
        eprintln!("Warning: remove args provided but --strict is disabled, ignoring them.");
        remove_args.clear();
    }

    let options = SyncOptions {
        dry_run,
        strict,
        install_args,
        remove_args,
    };
    debug!("Sync options: {:?}", options);

    let pacman = Pacman::new(&config);
    let loader = DirectoryLoader::new(config::packages_dir_for(config_path));
    let presenter = TablePresenter::new(config.pager.clone());
    let mut store = SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open managed-state store {}", db_path.display()))?;
    let mut prompt = TerminalPrompt;

    info!("Syncing host {} from {}", host, loader.root().display());

    let mut ctx = SyncContext {
        config: &config,
        host: &host,
        package_manager: &pacman,
        loader: &loader,
        store: &mut store,
        presenter: &presenter,
        confirmation: &mut prompt,
    };

    match sync::run(&mut ctx, &options)? {
        SyncOutcome::DryRun => println!("Dry run mode, no changes made"),
        SyncOutcome::NothingToDo => println!("Nothing to apply."),
        SyncOutcome::Aborted => println!("Aborted."),
        SyncOutcome::Applied { recorded } => {
            println!("Changes applied.");
            debug!("{} package(s) now managed for {}", recorded, host);
        }
    }

    Ok(())
}

fn cmd_managed(db_path: &Path, host: Option<String>, json: bool) -> Result<()> {
    let host = match host {
        Some(host) => host,
        None => ditto::host::current_host()?,
    };

    let store = SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open managed-state store {}", db_path.display()))?;
    let records = store.records_for(&host)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No packages managed for {}.", host);
        return Ok(());
    }

    println!("Packages managed for {}:", host);
    for record in &records {
        let scope = record.host.as_deref().unwrap_or("global");
        println!("  {} ({})", record.name, scope);
    }
    println!("\nTotal: {} package(s)", records.len());

    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr; keep them quiet unless asked for with RUST_LOG
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Sync {
            dry_run,
            strict,
            args,
        }) => cmd_sync(&config_path(&cli)?, &db_path(&cli)?, *dry_run, *strict, args),
        Some(Commands::Managed { host, json }) => cmd_managed(&db_path(&cli)?, host.clone(), *json),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "ditto", &mut std::io::stdout());
            Ok(())
        }
        None => {
            let path = config_path(&cli)?;
            Config::load(&path)?;
            println!("Ditto v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", path.display());
            println!("Definitions: {}", config::packages_dir_for(&path).display());
            println!("Run 'ditto --help' for usage information");
            Ok(())
        }
    }
}
