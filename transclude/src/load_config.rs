/// `load_config` module: loads a static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed and mapped to
/// the strongly-typed engine and store settings.
///
/// # Responsibilities
/// - Parse the `engine` section into [`EngineConfig`] (every key optional).
/// - Parse the `store` section into a [`StoreConfig`] (`fs` or `http`).
/// - Inject the HTTP origin token from `TRANSCLUDE_ORIGIN_TOKEN`; tokens are
///   never read from the file.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use transclude_core::config::EngineConfig;

pub const ORIGIN_TOKEN_ENV: &str = "TRANSCLUDE_ORIGIN_TOKEN";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub store: StoreConfig,
}

/// Where documents are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Fs { root: PathBuf },
    Http { base_url: String, token: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StoreSection {
    Fs { root: PathBuf },
    Http { base_url: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    engine: EngineConfig,
    store: StoreSection,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let store = match raw.store {
        StoreSection::Fs { root } => {
            info!(root = %root.display(), "Using directory store");
            StoreConfig::Fs { root }
        }
        StoreSection::Http { base_url } => {
            let token = std::env::var(ORIGIN_TOKEN_ENV).ok();
            info!(
                base_url = %base_url,
                token_set = token.is_some(),
                "Using HTTP origin store"
            );
            StoreConfig::Http { base_url, token }
        }
    };

    if raw.engine.max_depth == 0 {
        anyhow::bail!("engine.max_depth must be at least 1");
    }
    raw.engine.trace_loaded();

    Ok(CliConfig {
        engine: raw.engine,
        store,
    })
}
