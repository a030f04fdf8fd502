use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use config_history::telemetry::{self, LogFormat};
use config_history::watch::Dispatcher;
use config_history::{HistoryConfig, HistoryStore};

/// Record the state history of watched objects in a git repository
///
/// Every add, update, or delete of a watched object becomes one commit. The
/// repository's `.git/info/refs` is kept current so it can be cloned over
/// plain HTTP from any static file server.
#[derive(Parser)]
#[command(name = "config-history")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "CONFIG_HISTORY_CONFIG", default_value = "config-history.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "CONFIG_HISTORY_LOG_FORMAT", default_value_t)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RepoArgs {
    /// Repository path (overrides `[repository] path`)
    #[arg(long, env = "CONFIG_HISTORY_REPO")]
    repo: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open or create the repository and publish its reference index
    Init {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Record a stream of newline-delimited watch events
    Watch {
        #[command(flatten)]
        repo: RepoArgs,

        /// Committer name for recorded changes (overrides `[identity] component`)
        #[arg(long, env = "CONFIG_HISTORY_COMPONENT")]
        component: Option<String>,

        /// Event stream to read; `-` is stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },

    /// Show recorded history, newest first
    Log {
        #[command(flatten)]
        repo: RepoArgs,

        /// Maximum number of commits to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    let mut config = HistoryConfig::load(&cli.config)?;

    match cli.command {
        Commands::Init { repo } => {
            apply_repo(&mut config, repo);
            let store = open(&config)?;
            println!(
                "repository ready at {} (committing as {})",
                config.repository.path.display(),
                store.author()
            );
            Ok(())
        }
        Commands::Watch {
            repo,
            component,
            input,
        } => {
            apply_repo(&mut config, repo);
            if let Some(component) = component {
                config.identity.component = component;
            }
            let store = open(&config)?;
            let mut dispatcher = Dispatcher::new(&store);
            let stats = if input.as_os_str() == "-" {
                dispatcher.run(std::io::stdin().lock())
            } else {
                let file = std::fs::File::open(&input)
                    .with_context(|| format!("opening {}", input.display()))?;
                dispatcher.run(BufReader::new(file))
            }
            .context("reading watch events")?;
            tracing::info!(
                dispatched = stats.dispatched,
                ignored = stats.ignored,
                malformed = stats.malformed,
                "event stream ended"
            );
            Ok(())
        }
        Commands::Log { repo, limit } => {
            apply_repo(&mut config, repo);
            let store = open(&config)?;
            for entry in store.history(limit).context("reading history")? {
                println!("commit {}", entry.id);
                println!("Author:    {}", entry.author);
                println!("Committer: {}", entry.committer);
                println!("Time:      {}", entry.time);
                println!();
                println!("    {}", entry.message);
                println!();
            }
            Ok(())
        }
    }
}

fn apply_repo(config: &mut HistoryConfig, args: RepoArgs) {
    if let Some(path) = args.repo {
        config.repository.path = path;
    }
}

fn open(config: &HistoryConfig) -> Result<HistoryStore> {
    HistoryStore::open(config).with_context(|| {
        format!(
            "opening history at {}",
            config.repository.path.display()
        )
    })
}
