use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chaos-ctl")]
#[command(about = "Management CLI for the chaos proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active chaos configuration
    Config,
    /// Show injection counters and uptime
    Stats,
    /// Check that the proxy is up
    Health,
    /// Replace the active configuration with a JSON file
    Set {
        /// JSON document to upload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Config => client.get(format!("{}/_chaos/config", base)).send().await?,
        Commands::Stats => client.get(format!("{}/_chaos/stats", base)).send().await?,
        Commands::Health => client.get(format!("{}/_chaos/health", base)).send().await?,
        Commands::Set { file } => {
            let body = std::fs::read(&file)?;
            client
                .post(format!("{}/_chaos/config", base))
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: management API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text.trim_end());
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
