// src/infra/paths.rs — Config path resolution
//
// STORYMILL_HOME overrides everything for test isolation; otherwise
// config lives under ~/.storymill/.

use std::path::PathBuf;

fn storymill_home() -> Option<PathBuf> {
    std::env::var_os("STORYMILL_HOME").map(PathBuf::from)
}

/// Configuration directory: $STORYMILL_HOME/ or ~/.storymill/
pub fn config_dir() -> PathBuf {
    if let Some(home) = storymill_home() {
        return home;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".storymill")
}

/// Path to config.toml.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
