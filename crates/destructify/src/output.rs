//! Destinations for formatted expansions.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{config::OutputSettings, error::Result};

pub trait ResultSink {
    /// Deliver the expansion of `symbol`.
    fn write(
        &mut self,
        symbol: &str,
        text: &str,
    ) -> Result<()>;
}

/// Writes expansions to any [`Write`], one per call, newline-terminated.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for WriterSink<W> {
    fn write(
        &mut self,
        _symbol: &str,
        text: &str,
    ) -> Result<()> {
        writeln!(self.writer, "{text}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Target {
    /// `<directory>/<Symbol>.txt`
    Directory(PathBuf),
    File(PathBuf),
}

/// Writes each expansion to a results file, replacing earlier content.
#[derive(Debug, Clone)]
pub struct FileSink {
    target: Target,
    last_written: Option<PathBuf>,
}

impl FileSink {
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Directory(directory.into()),
            last_written: None,
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
            last_written: None,
        }
    }

    /// Results directory for a workspace root.
    pub fn for_workspace(
        root: &Path,
        settings: &OutputSettings,
    ) -> Self {
        Self::in_directory(results_directory(root, settings))
    }

    pub fn path_for(
        &self,
        symbol: &str,
    ) -> PathBuf {
        match &self.target {
            Target::Directory(dir) => dir.join(format!("{}.txt", file_stem(symbol))),
            Target::File(path) => path.clone(),
        }
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl ResultSink for FileSink {
    fn write(
        &mut self,
        symbol: &str,
        text: &str,
    ) -> Result<()> {
        let path = self.path_for(symbol);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{text}\n"))?;
        debug!("[output] wrote {}", path.display());
        self.last_written = Some(path);
        Ok(())
    }
}

pub fn results_directory(
    root: &Path,
    settings: &OutputSettings,
) -> PathBuf {
    let directory = Path::new(&settings.directory);
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        root.join(directory)
    }
}

/// A symbol reduced to characters that are safe in a file name.
fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "expansion".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
#[path = "../tests/src/output_tests.rs"]
mod tests;
