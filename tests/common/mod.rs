//! Common test utilities and fixtures for kernel and plugin testing

#![allow(dead_code)]

use gptr::config::KernelConfig;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture: a scratch directory holding outputs, settings and registry
pub struct TestFixture {
    /// Temporary directory that gets cleaned up automatically
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("outputs")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.path().join("plugins.json")
    }

    /// Default config redirected into the fixture directory
    pub fn config(&self) -> KernelConfig {
        KernelConfig {
            output_dir: self.output_dir(),
            cache_dir: self.path().join("cache"),
            plugin_registry: self.registry_path(),
            ..KernelConfig::default()
        }
    }

    /// Environment a `gptr` child process should see to stay inside the fixture
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            ("GPTR_OUTPUT_DIR".into(), self.output_dir().display().to_string()),
            ("GPTR_CONFIG_FILE".into(), self.settings_path().display().to_string()),
            ("GPTR_PLUGIN_REGISTRY".into(), self.registry_path().display().to_string()),
            ("GPTR_CACHE_DIR".into(), self.path().join("cache").display().to_string()),
        ]
    }

    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let filepath = self.path().join(name);
        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&filepath, content).expect("Failed to write test file");
        filepath
    }

    pub fn write_registry(&self, registry: &serde_json::Value) -> PathBuf {
        self.create_file("plugins.json", &registry.to_string())
    }

    /// Reports written under the output directory, sorted by name
    pub fn reports(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.output_dir()) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();
        paths
    }
}
