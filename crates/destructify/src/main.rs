use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use tower_lsp::{LspService, Server};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use destructify::{
    CatalogEntryKind, DestructifyServer, FileSink, FsSources, ResultSink, Settings, SymbolCatalog, WriterSink,
    build_catalog, destructify,
};

#[derive(Parser, Debug)]
#[command(name = "destructify", version, about)]
struct Args {
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the language server on stdio (default).
    Serve {
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Scan the roots and print the flattened expansion of one struct.
    Expand {
        symbol: String,

        /// Directory to scan; repeatable. Defaults to the current directory.
        #[arg(long = "root")]
        roots: Vec<PathBuf>,

        /// Settings file to use instead of the discovered `destructify.toml`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the expansion to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List struct and alias names matching QUERY (all when omitted).
    Symbols {
        query: Option<String>,

        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
}

fn default_log_path() -> PathBuf {
    dirs_or_tmp().join("destructify.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".destructify");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("destructify=debug,tower_lsp=info")
    } else {
        EnvFilter::new("destructify=info,tower_lsp=warn")
    }
}

/// Stderr logging always; a log file only for the server, whose stdout
/// belongs to the protocol.
fn init_logging(
    verbose: bool,
    log_file: Option<&Path>,
) {
    let file_layer = log_file.map(|log_path| {
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path.file_name().unwrap_or(std::ffi::OsStr::new("destructify.log")),
        );
        fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(env_filter(verbose))
    });

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(env_filter(verbose));

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve {
        log_file: None,
    }) {
        Command::Serve {
            log_file,
        } => {
            let log_path = log_file.unwrap_or_else(default_log_path);
            init_logging(args.verbose, Some(&log_path));
            serve(&log_path).await;
            ExitCode::SUCCESS
        },
        Command::Expand {
            symbol,
            roots,
            config,
            output,
        } => {
            init_logging(args.verbose, None);
            report(expand(&symbol, roots, config.as_deref(), output))
        },
        Command::Symbols {
            query,
            roots,
        } => {
            init_logging(args.verbose, None);
            report(symbols(query.as_deref().unwrap_or(""), roots))
        },
    }
}

async fn serve(log_path: &Path) {
    info!("Starting destructify server v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(DestructifyServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("destructify server stopped");
}

fn report(result: destructify::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        },
    }
}

fn resolve_roots(roots: Vec<PathBuf>) -> destructify::Result<Vec<PathBuf>> {
    if roots.is_empty() {
        return Ok(vec![std::env::current_dir()?]);
    }
    Ok(roots)
}

fn load_settings(
    roots: &[PathBuf],
    config: Option<&Path>,
) -> destructify::Result<Settings> {
    match (config, roots.first()) {
        (Some(path), _) => Settings::default().merged_with_file(path),
        (None, Some(root)) => Settings::discover(root),
        (None, None) => Ok(Settings::default()),
    }
}

fn scan(
    roots: &[PathBuf],
    settings: &Settings,
) -> SymbolCatalog {
    let (catalog, report) = build_catalog(roots, &settings.indexing, &settings.flatten, &FsSources);
    for problem in &report.problems {
        warn!("{problem}");
    }
    catalog
}

fn expand(
    symbol: &str,
    roots: Vec<PathBuf>,
    config: Option<&Path>,
    output: Option<PathBuf>,
) -> destructify::Result<()> {
    let roots = resolve_roots(roots)?;
    let settings = load_settings(&roots, config)?;
    let catalog = scan(&roots, &settings);

    let expansion = destructify(&catalog, &FsSources, symbol, &settings.flatten)?;
    for issue in &expansion.issues {
        warn!("{issue}");
    }

    match output {
        Some(path) => {
            let mut sink = FileSink::at(path);
            sink.write(symbol, &expansion.text)?;
            if let Some(written) = sink.last_written() {
                info!("Wrote {}", written.display());
            }
        },
        None => WriterSink::stdout().write(symbol, &expansion.text)?,
    }
    Ok(())
}

fn symbols(
    query: &str,
    roots: Vec<PathBuf>,
) -> destructify::Result<()> {
    let roots = resolve_roots(roots)?;
    let settings = load_settings(&roots, None)?;
    let catalog = scan(&roots, &settings);

    let mut listing = String::new();
    for entry in catalog.search(query, usize::MAX) {
        let kind = match entry.kind {
            CatalogEntryKind::Struct => "struct",
            CatalogEntryKind::Alias => "alias",
            CatalogEntryKind::Unparseable => "unparseable",
        };
        let location = match entry.offset.and_then(|offset| line_of(&entry.path, offset)) {
            Some(line) => format!("{}:{line}", entry.path.display()),
            None => entry.path.display().to_string(),
        };
        listing.push_str(&format!("{}\t{kind}\t{location}\t{}\n", entry.name, entry.detail.unwrap_or_default()));
    }
    WriterSink::stdout().write("symbols", listing.trim_end())?;
    Ok(())
}

/// One-based line of a byte offset in `path`.
fn line_of(
    path: &Path,
    offset: usize,
) -> Option<usize> {
    let text = std::fs::read_to_string(path).ok()?;
    let prefix = text.get(..offset)?;
    Some(prefix.matches('\n').count() + 1)
}
