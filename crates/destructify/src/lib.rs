pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod output;
pub mod progress;
pub mod scan;
pub mod server;
pub mod vfs;
pub mod workspace;

pub use catalog::{CatalogEntry, CatalogEntryKind, ResolvedSymbol, SymbolCatalog};
pub use config::Settings;
pub use error::{BlockError, Error, Result};
pub use flatten::{Expansion, destructify};
pub use output::{FileSink, ResultSink, WriterSink};
pub use scan::{ScanReport, Scanner, scan_workspace};
pub use server::DestructifyServer;
pub use vfs::{FsSources, MemorySources, OverlaySources, SourceReader};
pub use workspace::{DiscoveredFiles, build_catalog, discover_source_files};
