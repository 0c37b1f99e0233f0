use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "orchestrator-cli")]
#[command(about = "Management CLI for the service orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway health
    Status,
    /// List registered services
    Services,
    /// Send a GET through the gateway to a service
    Probe {
        service: String,
        #[arg(default_value = "")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{base}/")).send().await?;
            print_response(res).await?;
        }
        Commands::Services => {
            let res = client.get(format!("{base}/")).send().await?;
            if !res.status().is_success() {
                eprintln!("Error: gateway returned status {}", res.status());
                return Ok(());
            }
            let json: Value = res.json().await?;
            for name in json["microservices"].as_array().into_iter().flatten() {
                if let Some(name) = name.as_str() {
                    println!("{name}");
                }
            }
        }
        Commands::Probe { service, path } => {
            let path = path.trim_start_matches('/');
            let res = client
                .get(format!("{base}/api/{service}/{path}"))
                .send()
                .await?;
            let content_type = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-")
                .to_string();
            println!("status: {}", res.status());
            println!("content-type: {content_type}");
            println!();
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
