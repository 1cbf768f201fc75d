use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stow_store::FileStoreConfig;

/// Settings for the `stow` binary.
///
/// ```toml
/// root_pattern = "model_*"
///
/// [store]
/// root = "data"
/// extension = "json"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowConfig {
    pub store: FileStoreConfig,
    /// Glob used by `stow ids` when no pattern is given.
    pub root_pattern: Option<String>,
}

impl StowConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file (or defaults) with the `--root` override applied.
    pub fn resolve(config: Option<&Path>, root: Option<&Path>) -> anyhow::Result<Self> {
        let mut resolved = match config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(root) = root {
            resolved.store.root = root.to_path_buf();
        }
        Ok(resolved)
    }
}
