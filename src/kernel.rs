//! Command dispatch: name -> plugin -> relayed output and exit code.

use crate::config::{self, KernelConfig};
use crate::llm::ModelRouting;
use crate::plugin::{ConfigPlugin, PluginRegistry, PluginRequest, ResearchPlugin};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

/// Owns the effective config and the plugins commands resolve to
pub struct Kernel {
    config: KernelConfig,
    registry: PluginRegistry,
}

impl Kernel {
    pub fn new(config: KernelConfig, registry: PluginRegistry) -> Self {
        Self { config, registry }
    }

    /// Builtin plugins plus whatever the registry file lists
    ///
    /// External plugins receive the model routing through their environment.
    /// A broken registry file is logged and skipped.
    pub fn bootstrap<F>(config: KernelConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(ResearchPlugin::new()));
        registry.register(Arc::new(ConfigPlugin::new(config::settings_path(&lookup))));

        let routing = ModelRouting::resolve(&config, &lookup);
        match registry.load_registry_file(&config.plugin_registry, &routing.to_env()) {
            Ok(0) => {}
            Ok(count) => tracing::debug!(count, "loaded external plugins"),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "ignoring plugin registry"),
        }

        Self::new(config, registry)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Run `command` and relay its output; returns the process exit code
    pub async fn dispatch(
        &self,
        command: &str,
        args: Value,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> i32 {
        let Some(plugin) = self.registry.get(command) else {
            let _ = writeln!(err, "Error: Unknown command '{command}'");
            return 1;
        };

        tracing::debug!(command, plugin = %plugin.name(), "dispatching");
        let request = PluginRequest::new(command, args, self.config.clone());

        match plugin.execute(&request).await {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    let _ = writeln!(out, "{}", output.stdout);
                }
                if !output.stderr.is_empty() {
                    let _ = writeln!(err, "{}", output.stderr);
                }
                tracing::debug!(command, exit_code = output.exit_code, "plugin finished");
                output.exit_code
            }
            Err(e) => {
                tracing::error!(command, error = %e, "plugin failed to run");
                let _ = writeln!(err, "Error running plugin '{}': {e}", plugin.name());
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::EchoPlugin;
    use serde_json::json;

    fn kernel() -> Kernel {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(EchoPlugin::default()));
        Kernel::new(KernelConfig::default(), registry)
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let code = kernel()
            .dispatch("frobnicate", json!({}), &mut out, &mut err)
            .await;

        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Error: Unknown command 'frobnicate'\n"
        );
    }

    #[tokio::test]
    async fn test_relays_plugin_stdout() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let code = kernel()
            .dispatch("echo", json!({"x": 1}), &mut out, &mut err)
            .await;

        assert_eq!(code, 0);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["command"], "echo");
        assert_eq!(body["args"]["x"], 1);
        assert_eq!(body["config"]["llm_provider"], "gpt5");
    }

    #[test]
    fn test_bootstrap_registers_builtins() {
        let config = KernelConfig {
            plugin_registry: "/nonexistent/gptr/plugins.json".into(),
            ..KernelConfig::default()
        };
        let kernel = Kernel::bootstrap(config, |_| None);
        assert_eq!(kernel.registry().list_names(), vec!["config", "research"]);
    }
}
