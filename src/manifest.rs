use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, Result},
    requirement::Requirement,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub path: PathBuf,
    pub requirements: Vec<Requirement>,
    pub skipped: Vec<SkippedLine>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AppError::ManifestNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        //tolerate a BOM and stray non-utf8 bytes from editors on windows
        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let manifest = Self::parse(path, text);
        tracing::info!(
            path = %path.display(),
            requirements = manifest.requirements.len(),
            skipped = manifest.skipped.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Lines that fail to parse are recorded and skipped, never fatal.
    pub fn parse(path: &Path, text: &str) -> Self {
        let mut requirements = vec![];
        let mut skipped = vec![];
        for (i, line) in text.lines().enumerate() {
            match Requirement::parse(i + 1, line) {
                Ok(Some(req)) => requirements.push(req),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("{e}");
                    skipped.push(SkippedLine {
                        line_no: i + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Self {
            path: path.to_path_buf(),
            requirements,
            skipped,
        }
    }
}
