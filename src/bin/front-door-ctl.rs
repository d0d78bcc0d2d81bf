use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use front_door::config::{load_config, load_default};
use front_door::net::tls::materialize_config;

#[derive(Parser)]
#[command(name = "front-door-ctl")]
#[command(about = "Operational checks for a front-door deployment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the liveness probe of a running instance
    Liveness {
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },
    /// Resolve the configured TLS material without starting a server
    Tls {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Liveness { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/livenessprobe", url.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Tls { config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => load_default()?,
            };
            match materialize_config(&config.listener.tls)? {
                None => println!("TLS disabled: certificate or private key is empty"),
                Some(credential) => {
                    let (chain, _key) = credential.to_der()?;
                    println!("TLS enabled");
                    println!("  certificates in chain: {}", chain.len());
                    println!("  extra CA: {}", credential.certificate_authority.is_some());
                    println!("  passphrase set: {}", credential.passphrase.is_some());
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("liveness probe returned status {}", status).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
