use std::path::PathBuf;
use std::sync::OnceLock;

/// Platform directory layout for singscore.
///
/// On Linux this follows the XDG Base Directory Specification:
///   Config:  $XDG_CONFIG_HOME/singscore  (~/.config/singscore)
///   Data:    $XDG_DATA_HOME/singscore    (~/.local/share/singscore)
///
/// On macOS both live under ~/Library/Application Support/singscore.
///
/// The `dirs` crate handles platform detection. The resolved base paths are
/// cached in OnceLock cells so lookup only happens once.

const APP_DIR: &str = "singscore";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Root data directory: $XDG_DATA_HOME/singscore
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR))
}

/// Root config directory: $XDG_CONFIG_HOME/singscore
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR))
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Performance history database: <data_dir>/singscore.db
pub fn db_path() -> PathBuf {
    data_dir().join("singscore.db")
}
