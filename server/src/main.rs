use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use directory_server::{AppConfig, AppState, ServeConfig, serve};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::EmployeeStore;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "directory-server", version, about = "Employee directory server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Print the fixture records the server starts with.
    Seed,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::Seed => print_seed(),
    }
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = AppConfig::load()?;
    info!(
        admin = %config.admin.email,
        ttl_minutes = config.session_ttl.num_minutes(),
        public_dir = ?config.public_dir,
        "configuration loaded"
    );
    let store = EmployeeStore::with_fixtures();
    info!(employees = store.len(), next_id = store.next_id(), "record store seeded");
    serve(cmd.into(), AppState::new(config, store)).await
}

fn print_seed() -> Result<()> {
    let store = EmployeeStore::with_fixtures();
    let json = serde_json::to_string_pretty(store.list()).context("failed to encode fixtures")?;
    println!("{json}");
    Ok(())
}
