//! CLI settings – reads/writes `~/.signals/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use signals_runtime::DEMO_CONTEXT;

/// Persisted user configuration stored in `~/.signals/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Thresholds document (`.json` or `.toml`).  Built-in bands when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds_path: Option<PathBuf>,

    /// Fixed pause between demo phases, in milliseconds.  The scripted
    /// pauses are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_ms: Option<u64>,

    /// Context id stamped on events published from the REPL.
    #[serde(default = "default_context_id")]
    pub context_id: String,
}

fn default_context_id() -> String {
    DEMO_CONTEXT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds_path: None,
            pace_ms: None,
            context_id: default_context_id(),
        }
    }
}

/// Return the path to `~/.signals/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".signals").join("config.toml")
}

/// Load the config from disk, with `SIGNALS_*` overrides applied.  A missing
/// file yields the defaults (overrides still apply).
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply overrides looked up through `var`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SIGNALS_THRESHOLDS` | `thresholds_path` |
/// | `SIGNALS_PACE_MS` | `pace_ms` (ignored unless it parses) |
/// | `SIGNALS_CONTEXT` | `context_id` |
pub fn apply_overrides<F>(cfg: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("SIGNALS_THRESHOLDS")
        && !v.trim().is_empty()
    {
        cfg.thresholds_path = Some(PathBuf::from(v));
    }
    if let Some(v) = var("SIGNALS_PACE_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.pace_ms = Some(ms);
    }
    if let Some(v) = var("SIGNALS_CONTEXT")
        && !v.trim().is_empty()
    {
        cfg.context_id = v;
    }
}

/// Save the config to disk, creating `~/.signals/` if necessary.
pub fn save(cfg: &Config) -> Result<PathBuf, String> {
    let path = config_path();
    save_to(cfg, &path)?;
    Ok(path)
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
