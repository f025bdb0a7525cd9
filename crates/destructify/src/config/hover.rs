use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct HoverSettings {
    pub enable: bool,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            enable: true,
        }
    }
}

impl HoverSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: HoverSettingsPatch,
    ) {
        if let Some(v) = patch.enable {
            self.enable = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct HoverSettingsPatch {
    pub(crate) enable: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
