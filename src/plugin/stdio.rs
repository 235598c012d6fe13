//! Plugin side of the stdin/stdout protocol.
//!
//! A plugin binary reads one JSON request from stdin, prints its JSON result
//! to stdout, diagnostics to stderr, and exits 0 on success.

use super::base::{Plugin, PluginOutput, PluginRequest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Parse raw stdin text and run the plugin on it
pub async fn handle_input(plugin: &dyn Plugin, raw: &str) -> PluginOutput {
    let request: PluginRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting unparsable plugin input");
            return PluginOutput::failure(format!("Failed to parse input: {e}"));
        }
    };

    match plugin.execute(&request).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(plugin = %plugin.name(), error = %e, "plugin failed");
            PluginOutput::failure(e)
        }
    }
}

/// Serve one request over the process's stdio and return the exit code
pub async fn serve(plugin: &dyn Plugin) -> i32 {
    let mut raw = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut raw).await {
        let output = PluginOutput::failure(format!("Failed to parse input: {e}"));
        write_output(&output).await;
        return output.exit_code;
    }

    let output = handle_input(plugin, &raw).await;
    write_output(&output).await;
    output.exit_code
}

async fn write_output(output: &PluginOutput) {
    if !output.stdout.is_empty() {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(output.stdout.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }
    if !output.stderr.is_empty() {
        let mut stderr = tokio::io::stderr();
        let _ = stderr.write_all(output.stderr.as_bytes()).await;
        let _ = stderr.write_all(b"\n").await;
        let _ = stderr.flush().await;
    }
}
