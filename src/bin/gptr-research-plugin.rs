//! Research plugin as a standalone stdin/stdout program.

use gptr::plugin::{stdio, ResearchPlugin};

#[tokio::main]
async fn main() {
    let level = std::env::var("GPTR_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let log_file = std::env::var("GPTR_LOG_FILE").ok();
    let guard = gptr::logging::init(&level, log_file.as_deref()).ok();

    let code = stdio::serve(&ResearchPlugin::new()).await;

    drop(guard);
    std::process::exit(code);
}
