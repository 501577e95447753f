//! Layout settings for the CLI.
//!
//! Settings come from the first TOML file found, in order:
//!
//! 1. the `--config` path (it must exist),
//! 2. `schematic/config.toml` under the working directory,
//! 3. `config.toml` in the platform config directory.
//!
//! Without a file the library defaults apply. Spacings are checked on load
//! because renderers divide drawing units by them.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use schematic::{SchematicError, config::AppConfig};

const LOCAL_CONFIG: &str = "schematic/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("`layout.{key}` in {} must be a positive number, found {value}", .path.display())]
    Spacing {
        path: PathBuf,
        key: &'static str,
        value: f64,
    },
}

impl From<ConfigError> for SchematicError {
    fn from(err: ConfigError) -> Self {
        SchematicError::Io(std::io::Error::other(err.to_string()))
    }
}

/// Where the settings in use were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Explicit,
    Local,
    Platform,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "command line",
            Self::Local => "working directory",
            Self::Platform => "platform config directory",
        })
    }
}

/// Loads the layout settings, falling back to defaults when no file exists.
///
/// # Errors
///
/// Returns an error when an explicit path does not exist, or the file found
/// is unreadable, not valid TOML, or holds a non-positive spacing.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, SchematicError> {
    let explicit = explicit_path.map(|path| path.as_ref().to_path_buf());
    let Some((path, origin)) = locate(explicit) else {
        debug!("No configuration file found, using default layout settings");
        return Ok(AppConfig::default());
    };

    info!(path:? = path, origin:%; "Loading layout settings");
    read_config(&path)
}

fn locate(explicit: Option<PathBuf>) -> Option<(PathBuf, Origin)> {
    if let Some(path) = explicit {
        return Some((path, Origin::Explicit));
    }

    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some((local, Origin::Local));
    }

    let Some(dirs) = ProjectDirs::from("com", "schematic", "schematic") else {
        debug!("Could not determine platform-specific config directory");
        return None;
    };
    let platform = dirs.config_dir().join("config.toml");
    if platform.exists() {
        Some((platform, Origin::Platform))
    } else {
        debug!(path:? = platform; "Platform configuration file not found");
        None
    }
}

fn read_config(path: &Path) -> Result<AppConfig, SchematicError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let layout = config.layout();
    for (key, value) in [
        ("column_spacing", layout.column_spacing()),
        ("row_spacing", layout.row_spacing()),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::Spacing {
                path: path.to_path_buf(),
                key,
                value,
            }
            .into());
        }
    }

    Ok(config)
}
