/// Main entry point
#[tokio::main]
async fn main() {
    let code = match gptr::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
