//! Layered settings: defaults, then `destructify.toml`, then the LSP
//! initialization options and `didChangeConfiguration` payloads.
//!
//! Settings are split into one file per category. [`Settings`] aggregates
//! all categories and handles JSON and TOML deserialization into partial
//! patches that are applied over the current values and clamped.

pub(crate) mod file;
pub(crate) mod flatten;
pub(crate) mod hover;
pub(crate) mod indexing;
pub(crate) mod logging;
pub(crate) mod output;

use std::{collections::HashMap, path::Path};

pub use file::{CONFIG_FILENAME, find_config_toml};
pub use flatten::{
    FlattenSettings, MAX_INDENT_WIDTH, MAX_MAX_ALIAS_HOPS, MAX_MAX_DEPTH, MAX_MAX_SCAN_BYTES, MIN_INDENT_WIDTH,
    MIN_MAX_DEPTH, MIN_MAX_SCAN_BYTES,
};
use flatten::FlattenSettingsPatch;
pub use hover::HoverSettings;
use hover::HoverSettingsPatch;
pub use indexing::{DEFAULT_EXTENSIONS, IndexingSettings, MAX_MAX_FILE_SIZE_KB, MIN_MAX_FILE_SIZE_KB};
use indexing::IndexingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
use logging::LoggingSettingsPatch;
pub use output::{DEFAULT_OUTPUT_DIRECTORY, OutputSettings};
use output::OutputSettingsPatch;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

pub const SETTINGS_SECTION_KEY: &str = "destructify";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub indexing: IndexingSettings,
    pub flatten: FlattenSettings,
    pub output: OutputSettings,
    pub hover: HoverSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<SettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    /// Apply a `destructify.toml` over the current values.
    pub fn merged_with_file(
        &self,
        path: &Path,
    ) -> Result<Self> {
        let patch = file::load_patch(path)?;
        let mut merged = self.clone();
        merged.apply_patch(patch);
        merged.normalize();
        Ok(merged)
    }

    /// Defaults overlaid with the nearest `destructify.toml` above `start`,
    /// if any.
    pub fn discover(start: &Path) -> Result<Self> {
        match find_config_toml(start) {
            Some(path) => Self::default().merged_with_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn apply_patch(
        &mut self,
        patch: SettingsPatch,
    ) {
        if let Some(p) = patch.indexing {
            self.indexing.apply_patch(p);
        }
        if let Some(p) = patch.flatten {
            self.flatten.apply_patch(p);
        }
        if let Some(p) = patch.output {
            self.output.apply_patch(p);
        }
        if let Some(p) = patch.hover {
            self.hover.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.indexing.normalize();
        self.flatten.normalize();
        self.output.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SettingsPatch {
    indexing: Option<IndexingSettingsPatch>,
    flatten: Option<FlattenSettingsPatch>,
    output: Option<OutputSettingsPatch>,
    hover: Option<HoverSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
