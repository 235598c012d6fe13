use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive; hold it until `main` returns.
#[allow(dead_code)]
pub struct LogGuard(WorkerGuard);

/// Initialize logging.
///
/// Stdout belongs to the plugin protocol, so events go to stderr, or to
/// `log_file` when one is given. The level comes from `GPTR_LOG_LEVEL`
/// (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`); `RUST_LOG` wins when set.
pub fn init(log_level: &str, log_file: Option<&str>) -> Result<LogGuard> {
    let (writer, guard): (NonBlocking, WorkerGuard) = match log_file {
        Some(raw) => {
            let log_path = PathBuf::from(expand_tilde(raw));
            ensure_parent_dir(&log_path)?;

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let directive = format!("gptr={},warn", tracing_level(log_level));
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_writer(writer)
        .try_init()
        .ok(); // If already initialized (e.g., in tests), don't crash.

    tracing::debug!(level = %log_level, file = ?log_file, "logging initialized");

    Ok(LogGuard(guard))
}

/// Map `GPTR_LOG_LEVEL` names (`WARNING`, `CRITICAL`, ...) onto tracing levels
pub fn tracing_level(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

fn expand_tilde(raw: &str) -> String {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let suffix = raw.strip_prefix('~').unwrap_or("");
            return format!("{}{}", home.display(), suffix);
        }
    }
    raw.to_string()
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Best-effort redaction for common API key patterns (e.g. `sk-...`).
pub fn redact_secrets(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut last = 0usize;
    let mut i = 0usize;

    while i < input.len() {
        if input[i..].starts_with("sk-") && i + 3 < input.len() {
            let mut j = i + 3;
            while j < input.len() {
                match bytes[j] {
                    b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => j += 1,
                    _ => break,
                }
            }

            // Require a minimum length to reduce false positives.
            if j.saturating_sub(i + 3) >= 8 {
                out.push_str(&input[last..i]);
                out.push_str("sk-***REDACTED***");
                last = j;
                i = j;
                continue;
            }
        }

        match input[i..].chars().next() {
            Some(ch) => i += ch.len_utf8(),
            None => break,
        }
    }

    out.push_str(&input[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_names() {
        assert_eq!(tracing_level("INFO"), "info");
        assert_eq!(tracing_level("debug"), "debug");
        assert_eq!(tracing_level("WARNING"), "warn");
        assert_eq!(tracing_level("CRITICAL"), "error");
        assert_eq!(tracing_level("bogus"), "info");
    }

    #[test]
    fn test_redacts_api_keys() {
        let text = "bad key sk-proj-abcdefghijkl in request";
        assert_eq!(redact_secrets(text), "bad key sk-***REDACTED*** in request");
    }

    #[test]
    fn test_short_sk_prefix_untouched() {
        assert_eq!(redact_secrets("task sk-1 done"), "task sk-1 done");
        assert_eq!(redact_secrets("naïve"), "naïve");
    }
}
