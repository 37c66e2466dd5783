use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Local database holding operator accounts and the leaderboard,
    /// under $HOME/.local/state/sysoverride when HOME is set.
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("sysoverride");
            Some(state_dir.join("arcade.db"))
        } else {
            ProjectDirs::from("", "", "sysoverride")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("arcade.db"))
        }
    }

    /// Append-only mission results log.
    pub fn mission_log_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sysoverride")
            .map(|proj_dirs| proj_dirs.config_dir().join("missions.csv"))
    }
}
