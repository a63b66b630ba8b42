use anyhow::Result;
use ripple_tally::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
