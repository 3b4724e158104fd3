pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{Defaults, Environment, ExecutionSettings, ScheduleMode, Settings};

use std::path::PathBuf;

pub const CONFIG_PATH_ENV: &str = "ENVFORGE_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "envforge.local.yaml",
    ".envforge.local.yaml",
    "envforge.yaml",
    ".envforge.yaml",
];

/// Find the settings file.
///
/// Search order:
/// 1. `ENVFORGE_CONFIG_PATH` (direct path)
/// 2. current directory: envforge.local.yaml, .envforge.local.yaml, envforge.yaml, .envforge.yaml
/// 3. the same names inside `./.envforge/`
/// 4. `~/.config/envforge/config.yaml`
///
/// Returns `Ok(None)` when no file exists; every setting has a default.
pub fn find_settings_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(
            "{} points to {} which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let project_dir = current_dir.join(".envforge");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("envforge").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}
