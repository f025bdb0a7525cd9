//! Struct and alias tables built by the scanner.
//!
//! A [`SymbolCatalog`] is an owned value: the scanner fills it, queries
//! borrow it, and a rescan builds a replacement instead of mutating one that
//! readers may be holding.

mod resolve;
mod types;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

pub use types::{
    CatalogEntry, CatalogEntryKind, ResolvedSymbol, StructDefinition, TypedefAlias, UnparseableStruct,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolCatalog {
    structs: HashMap<String, StructDefinition>,
    aliases: HashMap<String, TypedefAlias>,
    unparseable: HashMap<String, UnparseableStruct>,
    /// Lower cap on alias hops; `None` means "number of aliases + 1".
    max_alias_hops: Option<usize>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a struct definition. Last write wins on name collisions.
    pub fn insert_struct(
        &mut self,
        name: String,
        definition: StructDefinition,
    ) -> Option<StructDefinition> {
        self.unparseable.remove(&name);
        self.structs.insert(name, definition)
    }

    pub fn insert_alias(
        &mut self,
        name: String,
        alias: TypedefAlias,
    ) -> Option<TypedefAlias> {
        self.aliases.insert(name, alias)
    }

    /// Record a struct-like name that could not be parsed. A real struct
    /// definition under the same name takes precedence.
    pub fn insert_unparseable(
        &mut self,
        name: String,
        entry: UnparseableStruct,
    ) {
        if self.structs.contains_key(&name) {
            return;
        }
        self.unparseable.insert(name, entry);
    }

    pub fn struct_definition(
        &self,
        name: &str,
    ) -> Option<&StructDefinition> {
        self.structs.get(name)
    }

    pub fn alias(
        &self,
        name: &str,
    ) -> Option<&TypedefAlias> {
        self.aliases.get(name)
    }

    pub fn unparseable(
        &self,
        name: &str,
    ) -> Option<&UnparseableStruct> {
        self.unparseable.get(name)
    }

    pub fn contains_struct(
        &self,
        name: &str,
    ) -> bool {
        self.structs.contains_key(name)
    }

    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn unparseable_count(&self) -> usize {
        self.unparseable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty() && self.aliases.is_empty() && self.unparseable.is_empty()
    }

    pub fn structs(&self) -> impl Iterator<Item = (&String, &StructDefinition)> {
        self.structs.iter()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&String, &TypedefAlias)> {
        self.aliases.iter()
    }

    pub fn set_max_alias_hops(
        &mut self,
        max_alias_hops: Option<usize>,
    ) {
        self.max_alias_hops = max_alias_hops.filter(|&hops| hops > 0);
    }

    /// Drop every entry defined in `path` (used before rescanning it).
    pub fn remove_path(
        &mut self,
        path: &Path,
    ) {
        self.structs.retain(|_, def| def.path != path);
        self.aliases.retain(|_, alias| alias.path != path);
        self.unparseable.retain(|_, entry| entry.path != path);
    }

    /// Distinct files that contributed at least one entry.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .structs
            .values()
            .map(|d| d.path.clone())
            .chain(self.aliases.values().map(|a| a.path.clone()))
            .chain(self.unparseable.values().map(|u| u.path.clone()))
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Case-insensitive substring search over struct, alias and
    /// unparseable names. Results are sorted by name, then kind, and capped
    /// at `limit`.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Vec<CatalogEntry> {
        let query_lower = query.to_lowercase();
        let matches = |name: &str| name.to_lowercase().contains(&query_lower);

        let mut results: Vec<CatalogEntry> = Vec::new();
        for (name, def) in self.structs.iter().filter(|(name, _)| matches(name)) {
            results.push(CatalogEntry {
                name: name.clone(),
                kind: CatalogEntryKind::Struct,
                path: def.path.clone(),
                offset: Some(def.offset),
                detail: def.base.as_ref().map(|base| format!(": {base}")),
            });
        }
        for (name, alias) in self.aliases.iter().filter(|(name, _)| matches(name)) {
            let target = if alias.is_pointer {
                format!("*{}", alias.target)
            } else {
                alias.target.clone()
            };
            results.push(CatalogEntry {
                name: name.clone(),
                kind: CatalogEntryKind::Alias,
                path: alias.path.clone(),
                offset: None,
                detail: Some(target),
            });
        }
        for (name, entry) in self.unparseable.iter().filter(|(name, _)| matches(name)) {
            results.push(CatalogEntry {
                name: name.clone(),
                kind: CatalogEntryKind::Unparseable,
                path: entry.path.clone(),
                offset: Some(entry.offset),
                detail: Some(entry.reason.clone()),
            });
        }

        results.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.kind.cmp(&b.kind)));
        results.truncate(limit);
        results
    }
}

#[cfg(test)]
#[path = "../../tests/src/catalog/catalog_tests.rs"]
mod tests;
