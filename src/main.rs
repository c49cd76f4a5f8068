#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examforge::run().await {
        eprintln!("examforge fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
