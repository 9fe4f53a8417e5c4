//! Netpath — interactive client for the network path-finding backend.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use netpath_app::repl::{self, Command};
use netpath_app::AppController;
use netpath_client::PathQueryClient;
use netpath_core::{ClientConfig, WeightVector};
use netpath_view::FileSurface;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Explore a simulated network: initialize it, query weighted paths, view the topology
#[derive(Parser, Debug)]
#[command(name = "netpath")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (default: $NETPATH_BACKEND_URL or http://localhost:5000)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Where the rendered frame is written (default: $NETPATH_OUTPUT or netpath.png)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session (default)
    Repl,

    /// Initialize the network and find one path
    Route {
        start: u32,
        end: u32,

        #[arg(long)]
        latency: Option<f64>,

        #[arg(long)]
        load: Option<f64>,

        #[arg(long)]
        security: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.backend {
        config.base_url = url;
    }
    if let Some(path) = cli.output {
        config.output_path = path;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }

    info!("Backend: {}", config.base_url);
    let surface = Box::new(FileSurface::new(&config.output_path));
    let output_path = config.output_path.clone();
    let client = PathQueryClient::new(config)?;
    let controller = AppController::new(client, surface);

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => run_repl(&controller).await,
        Commands::Route {
            start,
            end,
            latency,
            load,
            security,
        } => {
            let defaults = controller.snapshot().weights;
            let weights = WeightVector::new(
                latency.unwrap_or(defaults.latency),
                load.unwrap_or(defaults.load),
                security.unwrap_or(defaults.security),
            );

            controller.init_network().await?;
            controller.select(start, end)?;
            controller.set_weights(weights);
            controller.find_path().await?;

            let snap = controller.snapshot();
            if let Some(result) = &snap.current_path {
                println!("{}", repl::format_path(&snap.model, result));
            }
            println!("Frame written to {}", output_path.display());
            Ok(())
        }
    }
}

async fn run_repl(controller: &AppController) -> anyhow::Result<()> {
    println!("netpath — type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("netpath> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match repl::execute(controller, command).await {
            Ok(out) => println!("{}", out),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}
