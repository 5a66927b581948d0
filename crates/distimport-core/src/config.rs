use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// libcurl timeouts for HTTP downloads (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort when the transfer stays below this many bytes/sec ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Overall transfer timeout; `None` lets large images take as long as they need.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: None,
        }
    }
}

/// Global configuration loaded from `~/.config/distimport/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Where images are downloaded to. Falls back to `/tmp/` when not a directory.
    pub download_dir: PathBuf,
    /// Parent of the temporary per-distro mount points.
    pub mount_root: PathBuf,
    /// Kickstart file attached to every imported distro.
    pub kickstart: PathBuf,
    /// Provisioning server CLI.
    pub provisioner: String,
    /// Where the provisioner writes import task logs (mentioned after import).
    pub task_log_dir: PathBuf,
    /// Directory for per-run log files.
    pub log_dir: PathBuf,
    /// Number of run logs kept in `log_dir`.
    pub log_retention: usize,
    pub http: Option<HttpConfig>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("/tmp/"),
            mount_root: PathBuf::from("/mnt"),
            kickstart: PathBuf::from("/var/lib/cobbler/kickstarts/default.ks"),
            provisioner: "cobbler".to_string(),
            task_log_dir: PathBuf::from("/var/log/cobbler/tasks/"),
            log_dir: PathBuf::from("/var/log/distimport"),
            log_retention: 50,
            http: None,
        }
    }
}

impl ImportConfig {
    pub fn http(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("distimport")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ImportConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ImportConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load an explicit configuration file. Missing files are an error.
pub fn load_from(path: &Path) -> Result<ImportConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: ImportConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
