#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = arikya_rust::run().await {
        eprintln!("arikya-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
