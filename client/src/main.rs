use clap::Parser;
use client::game::ClientConfig;
use client::input::StrafeBot;
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// How long to play, in seconds
    #[arg(short = 'd', long, default_value = "30")]
    duration: u64,

    /// Hold the fire key for the whole session
    #[arg(short = 'f', long)]
    fire: bool,

    /// How often the bot changes direction, in milliseconds
    #[arg(long, default_value = "1000")]
    strafe_ms: u64,

    /// Interpolation window for remote entities, in milliseconds
    #[arg(long, default_value = "30")]
    interpolation_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting headless client...");
    info!("Connecting to: {}", args.server);
    info!(
        "Playing for {}s, fire {}",
        args.duration,
        if args.fire { "held" } else { "off" }
    );

    let mut config = ClientConfig::default();
    config.interpolation.window_ms = args.interpolation_ms;

    let bot = StrafeBot::new(args.strafe_ms, args.fire);
    let mut client = Client::new(&args.server, config, bot);

    client.run(Duration::from_secs(args.duration)).await?;

    Ok(())
}
