use anyhow::Result;
use mailflow::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
