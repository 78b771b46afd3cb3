use clap::{Parser, Subcommand};
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client for the freeload aggregation gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:7433")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the origin fetch counters
    Vars {
        #[arg(long, default_value = "/debug/vars")]
        path: String,
    },
    /// Fetch a set of origin URLs in one aggregate request
    Fetch {
        #[arg(long, default_value = "/json")]
        json_root: String,
        /// Shared URL prefix
        #[arg(short, long)]
        prefix: String,
        /// Inner parts, one URL per value
        #[arg(short, long)]
        inner: Vec<String>,
        /// Suffix applied to every URL
        #[arg(short, long)]
        suffix: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().no_proxy().build()?;

    match cli.command {
        Commands::Vars { path } => {
            let res = client.get(format!("{}{}", cli.url, path)).send().await?;
            print_response(res).await?;
        }
        Commands::Fetch {
            json_root,
            prefix,
            inner,
            suffix,
        } => {
            let mut query = vec![("p", prefix.as_str())];
            query.extend(inner.iter().map(|i| ("i", i.as_str())));
            if let Some(suffix) = suffix.as_deref() {
                query.push(("s", suffix));
            }

            let res = client
                .get(format!("{}{}", cli.url, json_root))
                .query(&query)
                .send()
                .await?;
            if let Some(cc) = res.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
                eprintln!("Cache-Control: {}", cc);
            }
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text.trim_end());
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
