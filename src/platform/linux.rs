// Livemark platform paths for Linux
// Config: ~/.config/livemark

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory for Livemark on Linux.
/// Uses `$XDG_CONFIG_HOME/livemark` if set, otherwise `~/.config/livemark`.
pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("livemark")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home).join(".config").join("livemark")
    }
}
