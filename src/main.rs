#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = sportsday::run().await {
        eprintln!("sportsday fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
