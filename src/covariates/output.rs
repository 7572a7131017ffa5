use crate::error::CovariateError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A report file staged next to its destination. It only appears under its
/// final name once [`PendingReport::persist`] is called, so an aborted run
/// leaves nothing behind.
pub struct PendingReport {
    target: PathBuf,
    staged: NamedTempFile,
}

impl PendingReport {
    pub fn create(target: PathBuf) -> Result<Self, CovariateError> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let staged = NamedTempFile::new_in(dir).map_err(|source| CovariateError::OutputUnavailable {
            path: target.clone(),
            source,
        })?;
        Ok(Self { target, staged })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Runs `fill` against a buffered writer over the staged file.
    pub fn write_with<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
    {
        let mut writer = BufWriter::new(self.staged.as_file_mut());
        fill(&mut writer)
            .and_then(|_| writer.flush())
            .with_context(|| format!("Failed to write {}", self.target.display()))
    }

    pub fn persist(self) -> Result<PathBuf> {
        self.staged
            .persist(&self.target)
            .with_context(|| format!("Failed to save {}", self.target.display()))?;
        Ok(self.target)
    }
}

/// `<root>.<suffix>`
pub fn report_path(root: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", root, suffix))
}
