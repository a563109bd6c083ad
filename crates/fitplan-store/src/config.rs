use std::env;
use std::path::{Path, PathBuf};

/// Plan store configuration.
///
/// Reads from the `FITPLAN_STORE_PATH` environment variable, falling back to
/// `<data dir>/fitplan/fitnessPlans.json` when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON file that holds the saved plan list.
    pub path: PathBuf,
}

impl StoreConfig {
    /// Name of the storage slot holding the saved plan list.
    pub const SLOT_NAME: &str = "fitnessPlans";

    /// Build a config from the environment.
    ///
    /// Priority: `FITPLAN_STORE_PATH` env var, then [`StoreConfig::default_path`].
    pub fn from_env() -> Self {
        let path = env::var("FITPLAN_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self { path }
    }

    /// Build a config from an explicit path (useful for tests and CLI flags).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default slot location under the platform data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fitplan")
            .join(format!("{}.json", Self::SLOT_NAME))
    }

    /// Directory containing the slot file, if any.
    pub fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
