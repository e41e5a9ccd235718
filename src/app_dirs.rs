use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "dopamine-rush";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/dopamine-rush`, or the platform data dir without a HOME
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("scores.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(format!("{APP_NAME}.log")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_state_dir() {
        let Some(dir) = AppDirs::state_dir() else {
            return;
        };
        assert!(dir.ends_with(APP_NAME) || dir.to_string_lossy().contains(APP_NAME));
        assert_eq!(AppDirs::db_path().unwrap().parent(), Some(dir.as_path()));
        assert_eq!(
            AppDirs::log_path().unwrap().file_name().unwrap(),
            "dopamine-rush.log"
        );
    }
}
