use std::path::{Path, PathBuf};

use tracing::debug;

use super::SettingsPatch;
use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = "destructify.toml";

/// Walks parent directories from `start` looking for `destructify.toml`.
/// Returns the path to the first one found, or `None`.
pub fn find_config_toml(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Reads and parses a `destructify.toml`. Keys use the same camelCase
/// names as the LSP settings, grouped in `[indexing]`, `[flatten]`,
/// `[output]`, `[hover]` and `[logging]` tables.
pub(crate) fn load_patch(path: &Path) -> Result<SettingsPatch> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let patch = toml::from_str::<SettingsPatch>(&content).map_err(|err| Error::Config {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })?;
    debug!("[config] loaded {}", path.display());
    Ok(patch)
}

#[cfg(test)]
#[path = "../../tests/src/config/file_tests.rs"]
mod tests;
