use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bid-cli")]
#[command(about = "Command-line client for the bid relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a bid from a configured account
    Bid {
        /// Account identifier
        #[arg(short, long)]
        identifier: String,
        /// Amount in wei (decimal)
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,
    },
    /// Check relay and RPC health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Bid { identifier, amount } => {
            client
                .post(format!("{}/bid", base))
                .json(&json!({ "identifier": identifier, "amount": amount }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
        Ok(())
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
}
