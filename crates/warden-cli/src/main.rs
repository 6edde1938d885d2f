use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Governed access to database environments")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, short, env = "WARDEN_CONFIG", default_value = "warden.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate the configuration.
    Check,

    /// Print every environment with its effective policy, as JSON.
    Environments,

    /// Show how a prompt would be routed, without running anything.
    Route {
        /// Free-text request, e.g. "show tables in prod".
        prompt: String,

        /// Operation arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,

        /// Operation to favour when scores are close.
        #[arg(long)]
        prefer: Option<String>,

        /// Target environment, overriding inference.
        #[arg(long = "env")]
        environment: Option<String>,
    },

    /// Open a connection to one environment and report on it.
    Ping {
        /// Environment name. Defaults to `default_environment`.
        #[arg(long = "env")]
        environment: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check => commands::check::run(&cli.config),
        Command::Environments => commands::environments::run(&cli.config),
        Command::Route {
            prompt,
            args,
            prefer,
            environment,
        } => commands::route::run(
            &cli.config,
            commands::route::RouteArgs {
                prompt,
                args,
                prefer,
                environment,
            },
        ),
        Command::Ping { environment } => {
            commands::ping::run(&cli.config, environment.as_deref()).await
        }
    }
}
