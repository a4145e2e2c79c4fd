//! Writing generated files to disk.
//!
//! A file whose contents did not change is left alone so build tools keep their
//! timestamps. A file that cannot be written is reported and the rest still are.

use std::fs;
use std::path::{Path, PathBuf};

use interop_core::{Codespace, GenerationError};
use interop_generator::GeneratedFile;

use crate::config::OutputConfig;

/// Where each codespace's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub native_root: PathBuf,
    pub managed_root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path, config: &OutputConfig) -> Self {
        Self {
            native_root: root.join(&config.native_dir),
            managed_root: root.join(&config.managed_dir),
        }
    }

    pub fn path_of(&self, file: &GeneratedFile) -> PathBuf {
        match file.space {
            Codespace::Native => self.native_root.join(&file.path),
            Codespace::Managed => self.managed_root.join(&file.path),
        }
    }
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: usize,
    pub unchanged: usize,
    /// One `Io` error per file that could not be written.
    pub errors: Vec<GenerationError>,
}

pub fn write_files(layout: &OutputLayout, files: &[GeneratedFile]) -> WriteSummary {
    let mut summary = WriteSummary::default();
    for file in files {
        let path = layout.path_of(file);
        match write_file(&path, &file.contents) {
            Ok(true) => summary.written += 1,
            Ok(false) => summary.unchanged += 1,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "write failed");
                summary.errors.push(GenerationError::Io {
                    path: path.display().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
    tracing::info!(
        written = summary.written,
        unchanged = summary.unchanged,
        failed = summary.errors.len(),
        "output written"
    );
    summary
}

/// Returns whether the file was written.
fn write_file(path: &Path, contents: &str) -> std::io::Result<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(true)
}
