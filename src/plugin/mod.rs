pub mod base;
pub mod configure;
pub mod echo;
pub mod process;
pub mod research;
pub mod stdio;

pub use base::{Plugin, PluginError, PluginOutput, PluginRequest};
pub use configure::ConfigPlugin;
pub use echo::EchoPlugin;
pub use process::ProcessPlugin;
pub use research::ResearchPlugin;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One entry of the registry file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    /// Bare executable path
    Path(PathBuf),
    Command {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Plugin registry - maps command names to plugins
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            plugins: BTreeMap::new(),
        }
    }

    /// Register a plugin under its own name, replacing any previous one
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), plugin).is_some() {
            tracing::debug!(plugin = %name, "replaced registered plugin");
        }
    }

    /// Get a plugin by command name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    /// Registered command names, sorted
    pub fn list_names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Register every external plugin listed in the JSON file at `path`
    ///
    /// A missing file registers nothing. Returns how many plugins were added.
    pub fn load_registry_file(
        &mut self,
        path: &Path,
        extra_env: &BTreeMap<String, String>,
    ) -> Result<usize> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read plugin registry {}", path.display()))
            }
        };

        let entries: HashMap<String, PluginEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid plugin registry {}", path.display()))?;

        let count = entries.len();
        for (name, entry) in entries {
            let plugin = match entry {
                PluginEntry::Path(program) => ProcessPlugin::new(&name, program),
                PluginEntry::Command { program, args } => {
                    ProcessPlugin::new(&name, program).with_args(args)
                }
            }
            .with_env(extra_env.clone());

            tracing::debug!(plugin = %name, program = %plugin.program().display(), "registered external plugin");
            self.register(Arc::new(plugin));
        }

        Ok(count)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
