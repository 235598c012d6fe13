//! Example plugin: echoes the request it was given.

use gptr::plugin::{stdio, EchoPlugin};

#[tokio::main]
async fn main() {
    let level = std::env::var("GPTR_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let guard = gptr::logging::init(&level, std::env::var("GPTR_LOG_FILE").ok().as_deref()).ok();

    let code = stdio::serve(&EchoPlugin::from_env()).await;

    drop(guard);
    std::process::exit(code);
}
