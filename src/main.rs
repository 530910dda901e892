#[tokio::main]
async fn main() {
    if let Err(e) = autoscreen_lib::run().await {
        eprintln!("autoscreen: {}", e);
        std::process::exit(1);
    }
}
