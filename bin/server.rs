// Pink Morsel Sales - Web Server
// Serves the region query engine to the sales viewer

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use pink_morsel_sales::config::{DEFAULT_OUTPUT, DEFAULT_SERVER_ADDR};
use pink_morsel_sales::logging::init_logging;
use pink_morsel_sales::server::router;
use pink_morsel_sales::{read_dataset, SalesSnapshot};

#[derive(Parser)]
#[command(name = "pink-morsel-server")]
#[command(about = "Serve pink morsel sales queries over HTTP")]
struct Args {
    /// Derived dataset written by `pink-morsel build`
    #[arg(long, env = "PINK_MORSEL_DATASET", default_value = DEFAULT_OUTPUT)]
    dataset: PathBuf,
    /// Address to bind
    #[arg(long, env = "PINK_MORSEL_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    addr: String,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    println!("🌐 Pink Morsel Sales - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Loaded once; every request queries the same snapshot
    let records = read_dataset(&args.dataset).with_context(|| {
        format!(
            "Dataset not found or unreadable at {} (run: pink-morsel build)",
            args.dataset.display()
        )
    })?;
    let snapshot = SalesSnapshot::new(records);
    info!(rows = snapshot.len(), dataset = %args.dataset.display(), "snapshot loaded");

    let app = router(snapshot);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/sales?region=all", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
