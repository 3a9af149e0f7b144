//! Authoritative server entry point.

use clap::Parser;
use log::info;
use server::network::Server;
use shared::FPS;
use std::time::Duration;

/// Command-line arguments for server configuration.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the UDP socket to.
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Maximum number of concurrent peers.
    #[arg(short, long, default_value = "128")]
    max_clients: usize,

    /// Seed for the respawn PCG, fixed by default so runs are reproducible.
    #[arg(long, default_value = "1")]
    seed: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / FPS as f32);

    info!("starting server on {addr}");
    info!("tick rate: {FPS}Hz ({tick_duration:?} per tick)");

    let mut server = Server::new(&addr, tick_duration, args.max_clients, args.seed).await?;
    server.run().await?;

    Ok(())
}
