#[tokio::main]
async fn main() {
    if let Err(e) = healthdash_lib::run().await {
        eprintln!("healthdash: {e}");
        std::process::exit(1);
    }
}
