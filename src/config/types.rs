use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Per-CLI first-token shortcuts: `[shortcuts.<cli>] name = ["tok", ...]`.
    #[serde(default)]
    pub shortcuts: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// How generated scripts are run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Program invoked as `<program> -c <script>` (default: "bash").
    #[serde(default = "default_shell_program")]
    pub program: String,
}

/// Invocation cache for cacheable CLIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache file (default: `<cache dir>/cmdgraph/cache.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_shell_program() -> String {
    "bash".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: None,
        }
    }
}

impl CacheConfig {
    /// Configured cache file, or the platform cache directory default.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cmdgraph")
                .join("cache.json")
        })
    }
}
