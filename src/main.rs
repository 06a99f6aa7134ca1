use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    uiauto_agent::cli::app::run().await
}
