//! Fires N simultaneous GET requests at one URL and prints every answer.
//!
//! ```text
//! burst http://localhost:8030/testBulkhead --count 10
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Barrier;

#[derive(Parser)]
#[command(name = "burst")]
#[command(about = "Send a burst of concurrent GET requests", long_about = None)]
struct Cli {
    /// Target URL.
    url: String,

    /// Number of simultaneous requests.
    #[arg(short, long, default_value_t = 10)]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "burst=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let barrier = Arc::new(Barrier::new(cli.count));

    let mut tasks = Vec::with_capacity(cli.count);
    for _ in 0..cli.count {
        let client = client.clone();
        let barrier = barrier.clone();
        let url = cli.url.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            let response = client.get(&url).send().await?;
            Ok::<String, reqwest::Error>(response.text().await?)
        }));
    }

    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        let body = match task.await? {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                format!("error: {e}")
            }
        };
        println!("re: {body}");
        // "ok 3" and "ok 7" count as the same answer
        let kind = body.trim_end_matches(|c: char| c.is_ascii_digit()).trim_end();
        *tally.entry(kind.to_string()).or_default() += 1;
    }

    println!("---");
    for (body, count) in tally {
        println!("{count:>4}  {body}");
    }
    Ok(())
}
