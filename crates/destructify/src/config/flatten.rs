use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::scan::DEFAULT_MAX_SCAN_BYTES;

pub const MIN_INDENT_WIDTH: usize = 0;
pub const MAX_INDENT_WIDTH: usize = 16;
pub const MIN_MAX_DEPTH: usize = 1;
pub const MAX_MAX_DEPTH: usize = 1024;
pub const MIN_MAX_SCAN_BYTES: usize = 1024;
pub const MAX_MAX_SCAN_BYTES: usize = 64 * 1024 * 1024;
pub const MAX_MAX_ALIAS_HOPS: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenSettings {
    /// Spaces added in front of every line of a nested body.
    pub indent_width: usize,
    /// Structs nested deeper than this are rendered as bare names.
    pub max_depth: usize,
    /// Brace-scan ceiling for one struct body.
    pub max_scan_bytes: usize,
    /// `0` derives the bound from the alias table size.
    pub max_alias_hops: usize,
}

impl Default for FlattenSettings {
    fn default() -> Self {
        Self {
            indent_width: 4,
            max_depth: 64,
            max_scan_bytes: DEFAULT_MAX_SCAN_BYTES,
            max_alias_hops: 0,
        }
    }
}

impl FlattenSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: FlattenSettingsPatch,
    ) {
        if let Some(v) = patch.indent_width {
            self.indent_width = v;
        }
        if let Some(v) = patch.max_depth {
            self.max_depth = v;
        }
        if let Some(v) = patch.max_scan_bytes {
            self.max_scan_bytes = v;
        }
        if let Some(v) = patch.max_alias_hops {
            self.max_alias_hops = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.indent_width = self.indent_width.clamp(MIN_INDENT_WIDTH, MAX_INDENT_WIDTH);
        self.max_depth = self.max_depth.clamp(MIN_MAX_DEPTH, MAX_MAX_DEPTH);
        self.max_scan_bytes = self.max_scan_bytes.clamp(MIN_MAX_SCAN_BYTES, MAX_MAX_SCAN_BYTES);
        self.max_alias_hops = self.max_alias_hops.min(MAX_MAX_ALIAS_HOPS);
    }

    /// Alias hop cap as understood by the catalog (`None` = automatic).
    pub fn alias_hop_cap(&self) -> Option<usize> {
        (self.max_alias_hops > 0).then_some(self.max_alias_hops)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct FlattenSettingsPatch {
    pub(crate) indent_width: Option<usize>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) max_scan_bytes: Option<usize>,
    pub(crate) max_alias_hops: Option<usize>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
