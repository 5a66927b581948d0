//! Single-stream HTTP GET of an image into a part file.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::HttpConfig;
use crate::storage::PartFile;

/// Why a download failed. A single attempt is made; any of these is fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}

/// Downloads `url` to `final_path` in one attempt. Returns the number of bytes written.
pub fn download(url: &str, final_path: &Path, http: &HttpConfig) -> Result<u64, FetchError> {
    let mut part = PartFile::create(final_path).map_err(FetchError::Storage)?;
    let written = get_once(url, &mut part, http)?;
    part.finalize(final_path).map_err(FetchError::Storage)?;
    Ok(written)
}

fn get_once(url: &str, part: &mut PartFile, http: &HttpConfig) -> Result<u64, FetchError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(http.connect_timeout_secs))?;
    easy.low_speed_limit(http.low_speed_limit)?;
    easy.low_speed_time(Duration::from_secs(http.low_speed_time_secs))?;
    if let Some(secs) = http.timeout_secs {
        easy.timeout(Duration::from_secs(secs))?;
    }
    easy.progress(true)?;

    let mut written = 0u64;
    let mut write_err = None;
    let mut progress = Progress::default();

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match part.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.progress_function(|total, now, _, _| {
            progress.update(total, now);
            true
        })?;
        transfer.perform()
    };
    progress.finish();

    if let Some(e) = write_err {
        return Err(FetchError::Storage(e));
    }
    performed?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(written)
}

/// Percent counter on stderr, in 5% steps.
#[derive(Default)]
struct Progress {
    last_step: Option<u64>,
}

impl Progress {
    fn update(&mut self, total: f64, now: f64) {
        if total <= 0.0 {
            return;
        }
        let pct = ((now / total) * 100.0).clamp(0.0, 100.0) as u64;
        let step = pct / 5;
        if self.last_step == Some(step) {
            return;
        }
        self.last_step = Some(step);
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r  {:>3}% of {} MiB", pct, (total as u64) >> 20);
        let _ = err.flush();
        if step % 4 == 0 {
            tracing::debug!(pct, "download progress");
        }
    }

    fn finish(&self) {
        if self.last_step.is_some() {
            eprintln!();
        }
    }
}
