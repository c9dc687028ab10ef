use anyhow::Result;
use ooo::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
