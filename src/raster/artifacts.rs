//! On-disk copies of produced images
//!
//! Runs inside the blocking task that produced the images. Directory
//! creation tolerates concurrent writers, and an existing file is never
//! overwritten: the name gets a `-{n}` suffix instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MAX_SUFFIX: usize = 10_000;

/// Writes artifacts into a single output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    base_path: PathBuf,
}

impl ArtifactWriter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `bytes` as `name`, returning the path actually used
    pub fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.base_path)?;

        let (stem, ext) = split_name(name);
        for attempt in 0..MAX_SUFFIX {
            let candidate = if attempt == 0 {
                name.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}-{}.{}", stem, attempt, ext),
                    None => format!("{}-{}", stem, attempt),
                }
            };
            let path = self.base_path.join(candidate);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}", name),
        ))
    }

    /// Like [`write`](Self::write) but logs failures instead of returning them
    pub fn save(&self, name: &str, bytes: &[u8]) -> Option<PathBuf> {
        match self.write(name, bytes) {
            Ok(path) => {
                tracing::debug!("Saved {} ({} bytes)", path.display(), bytes.len());
                Some(path)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to save {} under {}: {}",
                    name,
                    self.base_path.display(),
                    e
                );
                None
            }
        }
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
