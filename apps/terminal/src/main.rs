//! Market POS console register entry point.

#[tokio::main]
async fn main() {
    if let Err(err) = market_terminal::run().await {
        eprintln!("market-terminal: {}", err);
        std::process::exit(1);
    }
}
