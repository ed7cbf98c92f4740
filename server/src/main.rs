use clap::Parser;
use log::info;
use server::clock::SystemClock;
use server::config::GameConfig;
use server::game::Game;
use server::network::Server;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Maximum number of concurrent players
    #[arg(short, long, default_value = "10")]
    max_clients: usize,

    /// Seed for wave layout and enemy fire, random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = GameConfig::default().with_tick_rate(args.tick_rate);

    info!("Starting server...");
    info!(
        "Tick rate: {}Hz, max players: {}",
        config.tick_rate, args.max_clients
    );

    let game = match args.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Game::with_seed(config, seed)
        }
        None => Game::new(config),
    };

    let address = format!("{}:{}", args.host, args.port);
    let clock = Arc::new(SystemClock::new());
    let server = Server::bind(&address, game, clock, args.max_clients).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
