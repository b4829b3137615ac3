use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig, ServerMessage};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Number of grid rows
    #[arg(long, default_value_t = shared::GRID_ROWS)]
    rows: usize,

    /// Number of grid columns
    #[arg(long, default_value_t = shared::GRID_COLS)]
    cols: usize,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value = "64")]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(short, long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let config = ServerConfig {
        rows: args.rows,
        cols: args.cols,
        max_clients: args.max_clients,
        client_timeout: Duration::from_secs(args.timeout_secs),
    };

    info!("Starting grid server on {}", address);
    let mut server = Server::new(&address, config).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down gracefully...");
                let _ = shutdown.send(ServerMessage::Shutdown);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    server.run().await?;

    Ok(())
}
