use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use graphstudio::config::{DEFAULT_COMPOSE_FILE, DEFAULT_HTTP_PORT, PgSettings, StudioConfig};
use graphstudio::loader::load_graph;
use graphstudio::registry::GraphRegistry;
use graphstudio::supervisor;

/// Local development studio for graph-driven agent workflows.
#[derive(Parser, Debug)]
#[command(name = "graphstudio", version, about, long_about = None)]
struct Cli {
    /// Registered graph module name or path to a graph manifest
    /// (omit to serve the demo graph)
    graph: Option<String>,

    /// Port for the HTTP API
    #[arg(short, long, default_value_t = DEFAULT_HTTP_PORT)]
    port: u16,

    /// Compose specification used to launch the backing stack
    #[arg(long, default_value = DEFAULT_COMPOSE_FILE)]
    compose_file: PathBuf,

    /// Read POSTGRES_* connection settings from the environment instead of
    /// the fixed local stack
    #[arg(long)]
    from_env: bool,
}

/// Exit code for startup validation failures, distinct from runtime failures.
const CONFIG_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let pg = if cli.from_env {
        PgSettings::from_env()
    } else {
        PgSettings::local_stack()
    };
    let config = StudioConfig::default()
        .with_pg(pg)
        .with_port(cli.port)
        .with_compose_file(cli.compose_file);

    let registry = GraphRegistry::with_defaults();
    let graph = match load_graph(&registry, cli.graph.as_deref(), &config.pg) {
        Ok(graph) => graph,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(CONFIG_FAILURE);
        }
    };

    match supervisor::run(&config, graph).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
