//! Feedline CLI - sign in, read the feed, and post from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use client_config_and_utils::{init_logging, Config, LogSettings, Paths};
use tracing::debug;

/// Feedline CLI - manage your session, profile, and posts.
#[derive(Parser, Debug)]
#[command(name = "feedline")]
#[command(about = "Feedline CLI for authentication, profile, and feed")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Provider base address, overriding FEEDLINE_API_URL and config.json
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Also print logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Login with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status,

    /// Fetch and print the signed-in user
    Whoami,

    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Show the feed
    Feed,

    /// Publish a post
    Post {
        /// Post text
        content: String,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update your name and/or bio
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let mut config = Config::load(&paths)?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let log_settings = LogSettings {
        default_level: cli.log_level.unwrap_or_else(|| config.log_level.clone()),
        log_path: Some(paths.log_file()),
        also_stderr: cli.verbose,
    };
    if let Err(e) = init_logging(&log_settings) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    debug!(api_url = %config.api_url, "Starting feedline");

    let app = commands::App::new(&config, &paths)?;
    let _bootstrap = app.spawn_bootstrap();

    let format = cli.format;
    match cli.command {
        Commands::Login { email } => commands::login(&app, email, &format).await,
        Commands::Register { name, email } => {
            commands::register(&app, name, email, &format).await
        }
        Commands::Logout => commands::logout(&app, &format).await,
        Commands::Status => commands::status(&app, &format).await,
        Commands::Whoami => commands::whoami(&app, &format).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile_show(&app, &format).await,
            ProfileCommands::Update { name, bio } => {
                commands::profile_update(&app, name, bio, &format).await
            }
        },
        Commands::Feed => commands::feed(&app, &format).await,
        Commands::Post { content } => commands::post(&app, &content, &format).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string(), &format);
        std::process::exit(1);
    }
}
