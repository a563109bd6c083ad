//! Configuration file management for fitplan.
//!
//! Provides a TOML-based config file at `~/.config/fitplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use fitplan_core::media::{IllustrationService, NarrationService};
use fitplan_core::upstream::{
    self, DEEPGRAM_API_KEY_VAR, DeepgramClient, GEMINI_API_KEY_VAR, GeminiClient,
    STABILITY_API_KEY_VAR, StabilityClient,
};
use fitplan_core::{PlanService, SessionServices};
use fitplan_store::{FileSlot, PlanStore, StoreConfig};

/// Env var overriding the Gemini model name.
pub const GEMINI_MODEL_VAR: &str = "FITPLAN_GEMINI_MODEL";

/// Env var overriding the saved plan file.
pub const STORE_PATH_VAR: &str = "FITPLAN_STORE_PATH";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpstreamSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepgram_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_api_key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    /// Saved plan file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Keys accepted by `fitplan config set`.
pub const SETTABLE_KEYS: [&str; 5] = [
    "upstream.gemini_api_key",
    "upstream.gemini_model",
    "upstream.deepgram_api_key",
    "upstream.stability_api_key",
    "store.path",
];

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the fitplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/fitplan` or `~/.config/fitplan`.
/// The platform-specific `dirs::config_dir()` is ignored on purpose so the
/// file lives in the same place on macOS and Linux.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("fitplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fitplan")
}

/// Return the path to the fitplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file if there is one. A file that exists but does not
/// parse is still an error.
fn load_config_if_present(path: &Path) -> Result<Option<ConfigFile>> {
    if path.exists() {
        load_config_from(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    write_private(&config_path(), &contents)
}

/// Set one `section.key` value in the config file, keeping any comments
/// and formatting already there. Creates the file if needed.
pub fn set_value(key: &str, value: &str) -> Result<PathBuf> {
    let path = config_path();
    set_value_in(&path, key, value)?;
    Ok(path)
}

fn set_value_in(path: &Path, key: &str, value: &str) -> Result<()> {
    let Some((section, field)) = key.split_once('.').filter(|_| SETTABLE_KEYS.contains(&key))
    else {
        bail!(
            "unknown config key {key:?} (expected one of: {})",
            SETTABLE_KEYS.join(", ")
        );
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut doc: toml_edit::DocumentMut = content
        .parse()
        .with_context(|| format!("failed to parse {} as TOML document", path.display()))?;

    let table = doc
        .entry(section)
        .or_insert(toml_edit::table())
        .as_table_mut()
        .with_context(|| format!("[{section}] in {} is not a table", path.display()))?;
    // Indexing keeps the existing key and its leading comment.
    table[field] = toml_edit::value(value);

    write_private(path, &doc.to_string())
}

/// Write `contents` to `path` with 0600 permissions on Unix. The file holds
/// API keys.
fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Upstream credentials. Any of them may be missing; only the feature that
/// needs it is unavailable then.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini: Option<String>,
    pub deepgram: Option<String>,
    pub stability: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn state(key: &Option<String>) -> &'static str {
            if key.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("Credentials")
            .field("gemini", &state(&self.gemini))
            .field("deepgram", &state(&self.deepgram))
            .field("stability", &state(&self.stability))
            .finish()
    }
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct FitplanConfig {
    pub store: StoreConfig,
    pub credentials: Credentials,
    pub gemini_model: String,
}

impl FitplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Store path: `cli_store_path` > `FITPLAN_STORE_PATH` > `store.path` > data dir default
    /// - API keys: `GEMINI_API_KEY` / `DEEPGRAM_API_KEY` / `STABILITY_API_KEY` > `[upstream]`
    /// - Model: `FITPLAN_GEMINI_MODEL` > `upstream.gemini_model` > `gemini-2.0-flash`
    pub fn resolve(cli_store_path: Option<&Path>) -> Result<Self> {
        let file_config = load_config_if_present(&config_path())?.unwrap_or_default();
        Ok(Self::resolve_with(cli_store_path, file_config))
    }

    fn resolve_with(cli_store_path: Option<&Path>, file: ConfigFile) -> Self {
        let store_path = if let Some(path) = cli_store_path {
            path.to_path_buf()
        } else if let Some(path) = std::env::var_os(STORE_PATH_VAR) {
            PathBuf::from(path)
        } else if let Some(path) = file.store.path {
            path
        } else {
            StoreConfig::default_path()
        };

        let upstream_section = file.upstream;
        let credentials = Credentials {
            gemini: upstream::key_from_env(GEMINI_API_KEY_VAR)
                .or(upstream_section.gemini_api_key)
                .filter(|k| !k.trim().is_empty()),
            deepgram: upstream::key_from_env(DEEPGRAM_API_KEY_VAR)
                .or(upstream_section.deepgram_api_key)
                .filter(|k| !k.trim().is_empty()),
            stability: upstream::key_from_env(STABILITY_API_KEY_VAR)
                .or(upstream_section.stability_api_key)
                .filter(|k| !k.trim().is_empty()),
        };

        let gemini_model = std::env::var(GEMINI_MODEL_VAR)
            .ok()
            .or(upstream_section.gemini_model)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| upstream::gemini::DEFAULT_MODEL.to_string());

        Self {
            store: StoreConfig::new(store_path),
            credentials,
            gemini_model,
        }
    }

    /// The file-backed plan store.
    pub fn open_store(&self) -> PlanStore<FileSlot> {
        fitplan_store::open(&self.store)
    }

    /// Upstream-backed services built from the resolved credentials.
    pub fn services(&self) -> SessionServices {
        let model =
            GeminiClient::new(self.credentials.gemini.clone()).with_model(&self.gemini_model);
        SessionServices {
            plans: PlanService::new(Arc::new(model)),
            narration: NarrationService::new(Arc::new(DeepgramClient::new(
                self.credentials.deepgram.clone(),
            ))),
            illustration: IllustrationService::new(Arc::new(StabilityClient::new(
                self.credentials.stability.clone(),
            ))),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
