use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "long-task-cli")]
#[command(about = "Client for the long-running request service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Disconnect after this many milliseconds instead of waiting for the response.
    #[arg(short, long, global = true)]
    abort_after_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StepArgs {
    #[arg(long)]
    total_steps: Option<i64>,

    #[arg(long)]
    step_duration_ms: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the endpoint that ignores cancellation
    Without {
        /// Step delays in milliseconds; the server default is used when omitted
        #[arg(value_delimiter = ',')]
        delays: Vec<i64>,
    },
    /// Call the endpoint that stops when cancelled
    With(StepArgs),
    /// Call the streaming endpoint and print progress as it arrives
    Streaming(StepArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let call = run(&client, &cli.url, cli.command);
    match cli.abort_after_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), call).await {
            Ok(result) => result,
            Err(_) => {
                eprintln!("Disconnected after {ms} ms");
                Ok(())
            }
        },
        None => call.await,
    }
}

async fn run(
    client: &reqwest::Client,
    url: &str,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Without { delays } => {
            let mut req = client.get(format!("{url}/LongRunning/WithoutCancellationToken"));
            if !delays.is_empty() {
                req = req.json(&delays);
            }
            print_response(req.send().await?).await
        }
        Commands::With(args) => {
            let res = client
                .get(format!("{url}/LongRunning/WithCancellationToken"))
                .query(&step_query(&args))
                .send()
                .await?;
            print_response(res).await
        }
        Commands::Streaming(args) => {
            let mut res = client
                .get(format!("{url}/LongRunning/Streaming"))
                .query(&step_query(&args))
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            while let Some(chunk) = res.chunk().await? {
                print!("{}", String::from_utf8_lossy(&chunk));
            }
            Ok(())
        }
    }
}

fn step_query(args: &StepArgs) -> Vec<(&'static str, i64)> {
    let mut query = Vec::new();
    if let Some(n) = args.total_steps {
        query.push(("totalSteps", n));
    }
    if let Some(ms) = args.step_duration_ms {
        query.push(("stepDurationMs", ms));
    }
    query
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
