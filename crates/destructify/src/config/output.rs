use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_OUTPUT_DIRECTORY: &str = ".destructify";

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Results directory, relative to the workspace root unless absolute.
    pub directory: String,
    /// Ask the client to open the written results file.
    pub show_document: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: DEFAULT_OUTPUT_DIRECTORY.to_string(),
            show_document: true,
        }
    }
}

impl OutputSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: OutputSettingsPatch,
    ) {
        if let Some(v) = patch.directory {
            self.directory = v;
        }
        if let Some(v) = patch.show_document {
            self.show_document = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        let trimmed = self.directory.trim();
        self.directory = if trimmed.is_empty() {
            DEFAULT_OUTPUT_DIRECTORY.to_string()
        } else {
            trimmed.to_string()
        };
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct OutputSettingsPatch {
    pub(crate) directory: Option<String>,
    pub(crate) show_document: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
