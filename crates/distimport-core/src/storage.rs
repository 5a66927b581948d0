//! Part-file lifecycle for downloads.
//!
//! Bytes go to `<name>.part` next to the final path; the part file is renamed
//! into place only once the transfer has finished.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const PART_SUFFIX: &str = ".part";

/// Temp file for an in-flight download. Removed on drop unless finalized.
pub struct PartFile {
    file: Option<File>,
    temp_path: PathBuf,
}

impl PartFile {
    /// Create (or truncate) the part file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = part_path(final_path);
        let file = File::options()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            file: Some(file),
            temp_path,
        })
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file_mut()?.write_all(data)
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("part file already closed"))
    }

    /// Sync and rename the temp file to `final_path`. Consumes the part file.
    pub fn finalize(mut self, final_path: &Path) -> io::Result<()> {
        if let Some(f) = self.file.take() {
            f.sync_all()?;
        }
        std::fs::rename(&self.temp_path, final_path)?;
        // Nothing left to remove in Drop.
        self.temp_path = PathBuf::new();
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        self.file.take();
        if !self.temp_path.as_os_str().is_empty() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                tracing::debug!(path = %self.temp_path.display(), "failed to remove part file: {}", e);
            }
        }
    }
}

fn part_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("disc.iso");
        let mut part = PartFile::create(&final_path).unwrap();
        assert_eq!(part.temp_path(), dir.path().join("disc.iso.part"));
        part.write_all(b"hello").unwrap();
        part.finalize(&final_path).unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello");
        assert!(!dir.path().join("disc.iso.part").exists());
    }

    #[test]
    fn dropped_part_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("disc.iso");
        {
            let mut part = PartFile::create(&final_path).unwrap();
            part.write_all(b"x").unwrap();
        }
        assert!(!dir.path().join("disc.iso.part").exists());
        assert!(!final_path.exists());
    }
}
