//! Getting the image into the download directory.
//!
//! HTTP(S) sources are fetched with libcurl; local (NFS) sources are copied
//! with rsync.

pub mod http;
mod rsync;

use std::path::{Path, PathBuf};

use crate::announce;
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::runner::{run_checked, OutputMode, Runner};
use crate::source::IsoSource;

pub use rsync::rsync_command;

const FALLBACK_DOWNLOAD_DIR: &str = "/tmp/";

/// The configured download directory if it is a directory, else `/tmp/`.
pub fn locate_download_dir(configured: &Path) -> PathBuf {
    if configured.is_dir() {
        configured.to_path_buf()
    } else {
        tracing::debug!(
            configured = %configured.display(),
            "download dir is not a directory, using {}",
            FALLBACK_DOWNLOAD_DIR
        );
        PathBuf::from(FALLBACK_DOWNLOAD_DIR)
    }
}

/// An image in the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedIso {
    pub path: PathBuf,
    /// False when the file was already there before this run (including
    /// when the source is that very file); it must not be deleted.
    pub owned: bool,
}

/// Fetch `source` into `download_dir`, keeping its base name.
pub fn fetch_iso<R: Runner + ?Sized>(
    source: &IsoSource,
    download_dir: &Path,
    cfg: &ImportConfig,
    runner: &R,
) -> Result<FetchedIso, ImportError> {
    if !download_dir.exists() {
        return Err(ImportError::DownloadDirMissing(download_dir.to_path_buf()));
    }
    let iso_name = source.iso_name();
    let dest = download_dir.join(&iso_name);
    let preexisting = dest.exists();
    if preexisting {
        tracing::warn!(path = %dest.display(), "image already in download dir, it will be kept");
    }

    match source {
        IsoSource::Http(url) => {
            announce(format!("Downloading {iso_name}"));
            let bytes = http::download(url.as_str(), &dest, &cfg.http())
                .map_err(|err| ImportError::Download {
                    iso: iso_name.clone(),
                    err,
                })?;
            tracing::debug!(bytes, path = %dest.display(), "download finished");
            announce(format!("{iso_name} is downloaded"));
        }
        IsoSource::Local(src) => {
            if same_file(src, &dest) {
                announce(format!("{iso_name} is already in {}", download_dir.display()));
                return Ok(FetchedIso {
                    path: dest,
                    owned: false,
                });
            }
            if runner.locate("rsync").is_none() {
                return Err(ImportError::ToolMissing {
                    program: "rsync".to_string(),
                });
            }
            announce(format!("Rsync-ing {iso_name}"));
            run_checked(
                runner,
                &rsync_command(src, &dest),
                OutputMode::Inherit,
                &format!("can't rsync {iso_name} from NFS server"),
            )?;
            announce(format!("{iso_name} is rsync-ed"));
        }
    }

    Ok(FetchedIso {
        path: dest,
        owned: !preexisting,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeRunner;

    #[test]
    fn download_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(locate_download_dir(dir.path()), dir.path());
        assert_eq!(
            locate_download_dir(&dir.path().join("missing")),
            PathBuf::from("/tmp/")
        );
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert_eq!(locate_download_dir(&file), PathBuf::from("/tmp/"));
    }

    #[test]
    fn missing_download_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let missing = dir.path().join("gone");
        let err = fetch_iso(&source, &missing, &ImportConfig::default(), &FakeRunner::new())
            .unwrap_err();
        assert!(matches!(err, ImportError::DownloadDirMissing(p) if p == missing));
    }

    #[test]
    fn local_source_is_rsynced() {
        let src_dir = tempfile::tempdir().unwrap();
        let dl_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let runner = FakeRunner::new();

        let fetched = fetch_iso(&source, dl_dir.path(), &ImportConfig::default(), &runner).unwrap();
        assert_eq!(fetched.path, dl_dir.path().join("a.iso"));
        assert!(fetched.owned);
        assert_eq!(
            runner.calls(),
            vec![format!(
                "rsync --progress -avH {} {}",
                src.display(),
                dl_dir.path().join("a.iso").display()
            )]
        );
    }

    #[test]
    fn source_already_in_download_dir_is_not_copied() {
        let dl_dir = tempfile::tempdir().unwrap();
        let src = dl_dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let runner = FakeRunner::new();

        let fetched = fetch_iso(&source, dl_dir.path(), &ImportConfig::default(), &runner).unwrap();
        assert!(!fetched.owned);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn preexisting_destination_is_not_owned() {
        let src_dir = tempfile::tempdir().unwrap();
        let dl_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        std::fs::write(dl_dir.path().join("a.iso"), b"someone else's").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let runner = FakeRunner::new();

        let fetched = fetch_iso(&source, dl_dir.path(), &ImportConfig::default(), &runner).unwrap();
        assert_eq!(fetched.path, dl_dir.path().join("a.iso"));
        assert!(!fetched.owned);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn rsync_failure_is_fatal() {
        let src_dir = tempfile::tempdir().unwrap();
        let dl_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let runner = FakeRunner::new().fail("rsync", 23);

        let err = fetch_iso(&source, dl_dir.path(), &ImportConfig::default(), &runner).unwrap_err();
        assert_eq!(
            err.to_string().split(':').next().unwrap(),
            "can't rsync a.iso from NFS server"
        );
    }

    #[test]
    fn missing_rsync_is_reported() {
        let src_dir = tempfile::tempdir().unwrap();
        let dl_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("a.iso");
        std::fs::write(&src, b"iso").unwrap();
        let source = IsoSource::parse(src.to_str().unwrap()).unwrap();
        let runner = FakeRunner::new().without("rsync");

        let err = fetch_iso(&source, dl_dir.path(), &ImportConfig::default(), &runner).unwrap_err();
        assert!(matches!(err, ImportError::ToolMissing { program } if program == "rsync"));
    }
}
