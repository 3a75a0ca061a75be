mod cmd;
mod output;

use clap::{Parser, Subcommand};
use launchpad_core::kind::PipelineKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "launchpad",
    about = "Startup analysis backend and crew pipeline client",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backend-for-frontend server
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "3000", env = "PORT")]
        port: u16,
        /// Document store for saved forms and chats
        #[arg(long, default_value = "launchpad.redb", env = "LAUNCHPAD_DB")]
        db: PathBuf,
        /// Open the health page in a browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Run one crew analysis and follow it to the end
    Analyze {
        /// Pipeline: roadmap, strengths, weaknesses or suggestions
        kind: PipelineKind,
        /// JSON file with the startup form (bare, or wrapped in startup_data/formData)
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Launchpad server base URL
        #[arg(long, env = "LAUNCHPAD_SERVER")]
        server: Option<String>,
        /// Signed session value (see `launchpad token`)
        #[arg(long, env = "LAUNCHPAD_SESSION")]
        session: Option<String>,
    },

    /// Mint a signed session value for an identity
    Token {
        /// User identity, usually an email address
        identity: String,
    },

    /// Show which external services are configured
    Config,
}

fn main() {
    // A missing .env is fine; the real environment still applies.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve { port, db, open } => cmd::serve::run(port, &db, open),
        Commands::Analyze {
            kind,
            input,
            server,
            session,
        } => cmd::analyze::run(
            kind,
            &input,
            server.as_deref(),
            session.as_deref(),
            cli.json,
        ),
        Commands::Token { identity } => cmd::token::run(&identity, cli.json),
        Commands::Config => cmd::config::run(cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
