use std::path::PathBuf;

/// Where a struct body lives: the file and the byte offset of its `{`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDefinition {
    pub path: PathBuf,
    pub offset: usize,
    /// Base named in a `struct Derived : Base {` header. Informational only.
    pub base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefAlias {
    pub target: String,
    pub is_pointer: bool,
    pub path: PathBuf,
}

/// A struct-like definition whose name could not be parsed, or an alias
/// declared for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparseableStruct {
    pub path: PathBuf,
    pub offset: usize,
    pub reason: String,
}

/// Result of following an alias chain to its canonical struct name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub root: String,
    pub is_pointer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CatalogEntryKind {
    Struct,
    Alias,
    Unparseable,
}

/// One row of [`super::SymbolCatalog::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: CatalogEntryKind,
    pub path: PathBuf,
    /// Brace offset for structs, `None` for aliases.
    pub offset: Option<usize>,
    /// Alias target (prefixed with `*` for pointer aliases).
    pub detail: Option<String>,
}
