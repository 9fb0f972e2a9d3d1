//! Follow a generation job from the command line.
//!
//! Run with:
//! ```bash
//! export GENSTREAM_BASE_URL="https://jobs.example.com"
//! export GENSTREAM_API_KEY="your-token"
//! RUST_LOG=genstream=debug cargo run --example watch_job -- <job-id>
//! ```
//!
//! Press Ctrl-C to stop watching; the job itself keeps running.

use genstream::options::TransportOptions;
use genstream::{GenerationClient, HandlerSet, HttpGenerationClient, StreamOutcome};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let job_id = std::env::args()
        .nth(1)
        .ok_or("usage: watch_job <job-id>")?;

    let client = HttpGenerationClient::new(TransportOptions::from_env()?)?;

    // Cancel the stream on Ctrl-C
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let handlers = HandlerSet::new()
        .on_post(|event| {
            let status = event.post.status.as_deref().unwrap_or("unknown");
            println!("[post]   {} -> {}", event.post.id, status);
        })
        .on_title(|event| println!("[title]  {}: {}", event.post_id, event.title))
        .on_result(|event| match event.version {
            Some(version) => println!("[result] {} finished as version {}", event.post.id, version.id),
            None => println!("[result] {} finished without a version", event.post.id),
        })
        .on_error(|error| eprintln!("[error]  {}", error));

    let report = client.watch(&job_id, handlers, &cancel).await;

    println!(
        "\n{} events, {} malformed, {} unrouted, {} bytes",
        report.stats.delivered, report.stats.malformed, report.stats.unrouted, report.stats.bytes
    );

    match report.outcome {
        StreamOutcome::Completed => println!("Stream complete"),
        StreamOutcome::Cancelled => println!("Stopped watching"),
        StreamOutcome::Failed(e) => return Err(e.into()),
    }

    Ok(())
}
