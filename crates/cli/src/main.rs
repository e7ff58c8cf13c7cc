mod api;
mod commands;
mod config;
mod credentials;
mod ui;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use shared::api::Namespace;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "bigsolo-admin")]
#[command(about = "Administration client for the BigSolo interactions API")]
#[command(version)]
#[command(after_help = "Examples:
  bigsolo-admin login                       Sign in with the admin credentials
  bigsolo-admin process                     Fold pending logs into the cache now
  bigsolo-admin stats blue-box              Show likes, comments and rating of a series
  bigsolo-admin kv list INTERACTIONS_LOG    Browse pending logs and locks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as admin and store the token
    #[command(after_help = "Example: bigsolo-admin login --username admin")]
    Login {
        /// Admin username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Forget the stored admin token
    Logout,

    /// Run log aggregation on the server now
    #[command(after_help = "Example: bigsolo-admin process")]
    Process,

    /// Manage pending interaction logs
    Logs {
        #[command(subcommand)]
        action: LogsCommands,
    },

    /// Browse or edit raw KV namespaces
    #[command(after_help = "Examples:
  bigsolo-admin kv list INTERACTIONS_CACHE
  bigsolo-admin kv list INTERACTIONS_LOG --cursor 'log:blue-box:1.2.3.4:1718000000000-abc'
  bigsolo-admin kv delete INTERACTIONS_LOG lock:1.2.3.4")]
    Kv {
        #[command(subcommand)]
        action: KvCommands,
    },

    /// Moderate comments
    #[command(after_help = "Examples:
  bigsolo-admin comments list
  bigsolo-admin comments list --series blue-box
  bigsolo-admin comments delete blue-box 12 1718000000000_abcdefg")]
    Comments {
        #[command(subcommand)]
        action: CommentsCommands,
    },

    /// Show the aggregated interactions of a series
    #[command(after_help = "Example: bigsolo-admin stats blue-box")]
    Stats {
        /// Series slug
        slug: String,
    },

    /// Check (and consume) a client session's cleanup marker
    #[command(after_help = "Example: bigsolo-admin cleanup 5f0c2a")]
    Cleanup {
        /// Session id sent with log-action
        session_id: String,
    },

    /// Generate shell completions
    #[command(after_help = "Examples:
  bigsolo-admin completions bash > ~/.bash_completion.d/bigsolo-admin
  bigsolo-admin completions zsh > ~/.zfunc/_bigsolo-admin")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum LogsCommands {
    /// Delete every pending log entry without processing it
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum KvCommands {
    /// List keys and values, 100 per page
    List {
        /// INTERACTIONS_LOG, INTERACTIONS_CACHE or IMG_CHEST_CACHE
        namespace: Namespace,
        /// Cursor printed by the previous page
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Delete one key
    Delete {
        namespace: Namespace,
        key: String,
    },
}

#[derive(Subcommand)]
enum CommentsCommands {
    /// List cached comments, newest first
    List {
        /// Only show comments of this series
        #[arg(long)]
        series: Option<String>,
    },
    /// Delete comments of one chapter
    Delete {
        /// Series slug
        series: String,
        /// Chapter number
        chapter: String,
        /// Comment ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        ui::print_error(&err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = envy::prefixed("BIGSOLO_").from_env::<Config>()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Login { username } => commands::login::run(&config, username).await,
        Commands::Logout => commands::login::logout(&config).await,
        Commands::Process => commands::process::run(&config).await,
        Commands::Logs { action } => match action {
            LogsCommands::Clear { yes } => commands::logs::clear(&config, yes).await,
        },
        Commands::Kv { action } => match action {
            KvCommands::List { namespace, cursor } => {
                commands::kv::list(&config, namespace, cursor).await
            }
            KvCommands::Delete { namespace, key } => {
                commands::kv::delete(&config, namespace, key).await
            }
        },
        Commands::Comments { action } => match action {
            CommentsCommands::List { series } => commands::comments::list(&config, series).await,
            CommentsCommands::Delete {
                series,
                chapter,
                ids,
            } => commands::comments::delete(&config, series, chapter, ids).await,
        },
        Commands::Stats { slug } => commands::stats::run(&config, &slug).await,
        Commands::Cleanup { session_id } => commands::cleanup::run(&config, &session_id).await,
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "bigsolo-admin", &mut std::io::stdout());
            Ok(())
        }
    }
}
