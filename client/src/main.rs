use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Print the server's update history and exit
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mut client = Client::new(&args.server).await?;

    if args.history {
        return client.print_history().await;
    }

    info!("Starting client, connecting to {}", args.server);
    client.run().await
}
