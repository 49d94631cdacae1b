use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ramai::run().await
}
