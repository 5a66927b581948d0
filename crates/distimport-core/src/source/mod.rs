//! Where an image comes from and the names derived from it.
//!
//! A source is either an HTTP(S) URL or a path to an existing file (usually
//! on an NFS mount). The image keeps its base name in the download directory;
//! the distro name is that base name without its `.iso` suffix.

mod sanitize;

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ImportError;

pub use sanitize::sanitize_file_name;

const ISO_SUFFIX: &str = ".iso";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsoSource {
    Http(Url),
    Local(PathBuf),
}

impl IsoSource {
    /// Classify `raw`: an existing file is `Local`, an http(s) URL is `Http`.
    pub fn parse(raw: &str) -> Result<Self, ImportError> {
        let invalid = |reason: &str| ImportError::InvalidSource {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };

        let path = Path::new(raw);
        let source = if path.is_file() {
            IsoSource::Local(path.to_path_buf())
        } else {
            match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => IsoSource::Http(url),
                Ok(url) => {
                    return Err(invalid(&format!("unsupported URL scheme {}", url.scheme())))
                }
                Err(_) => return Err(invalid("not an existing file or an http(s) URL")),
            }
        };

        let name = source.iso_name();
        if name.is_empty() || name == "." || name == ".." {
            return Err(invalid("cannot derive an image file name"));
        }
        Ok(source)
    }

    /// Base name of the image, as stored in the download directory.
    pub fn iso_name(&self) -> String {
        let raw = match self {
            IsoSource::Http(url) => filename_from_url_path(url),
            IsoSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        };
        raw.map(|n| sanitize_file_name(&n)).unwrap_or_default()
    }

    /// `iso_name` without a trailing `.iso`, like `basename <path> .iso`.
    pub fn distro_name(&self) -> String {
        strip_iso_suffix(&self.iso_name()).to_string()
    }
}

impl fmt::Display for IsoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsoSource::Http(url) => write!(f, "{}", url),
            IsoSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment.
fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Removes `.iso` only when something is left, matching `basename`.
fn strip_iso_suffix(name: &str) -> &str {
    match name.strip_suffix(ISO_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}
