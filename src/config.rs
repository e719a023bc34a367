use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Speed-smoothing policy constants.
///
/// These shape how per-server average speeds are folded together: how many
/// samples use the cumulative-mean formula before switching to the EMA, how
/// much history the EMA retains, and how sharp a single-connection drop has
/// to be before the sample counter is reset. The defaults are tuned for
/// conservative mirror ranking; treat them as policy knobs, not constants
/// with a derivation behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Number of samples averaged with the cumulative-mean formula before the
    /// update switches to the fixed-weight EMA.
    pub warmup_samples: u32,
    /// Weight retained for the previous average in the EMA regime (0..1).
    /// The newest sample gets the remainder.
    pub ema_retained: f64,
    /// A new single-connection average below this fraction of the previous
    /// one resets the sample counter, restarting the warmup regime (0..1).
    pub drop_reset_ratio: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            warmup_samples: 5,
            ema_retained: 0.8,
            drop_reset_ratio: 0.8,
        }
    }
}

impl SmoothingConfig {
    /// Warmup threshold, clamped so at least the first sample anchors the mean.
    pub(crate) fn warmup(&self) -> u32 {
        self.warmup_samples.max(1)
    }

    /// EMA retained weight, clamped into [0, 1].
    pub(crate) fn retained(&self) -> f64 {
        self.ema_retained.clamp(0.0, 1.0)
    }

    /// Drop-reset ratio, clamped into [0, 1].
    pub(crate) fn drop_ratio(&self) -> f64 {
        self.drop_reset_ratio.clamp(0.0, 1.0)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mirrorstat")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SmoothingConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SmoothingConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SmoothingConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Load configuration from an explicit path. Returns `None` when the file is
/// missing so the caller can fall back to [`SmoothingConfig::default`].
pub fn load_from_path(path: &Path) -> Result<Option<SmoothingConfig>> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read config: {}", path.display())),
    };
    let cfg = toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(Some(cfg))
}
