//! Environment variable loading.

use std::env;
use std::path::{Path, PathBuf};

/// Variable naming the configuration file
pub const CONFIG_VAR: &str = "DOCPROXY_CONFIG";

/// Variable overriding the configured log level
pub const LOG_LEVEL_VAR: &str = "DOCPROXY_LOG_LEVEL";

/// Loads environment variables from a .env file and the system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<PathBuf>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file. Nothing is loaded when None, so
    ///   stray .env files in the working directory are not picked up.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file.filter(|path| path.exists()) {
            if let Err(e) = dotenv::from_path(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to load .env file");
            }
        }

        Self {
            env_file: env_file.map(Path::to_path_buf),
        }
    }

    /// The .env file this loader was given
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    /// Configuration file path from `DOCPROXY_CONFIG`
    pub fn config_path(&self) -> Option<PathBuf> {
        env::var_os(CONFIG_VAR).map(PathBuf::from)
    }

    /// Log level override from `DOCPROXY_LOG_LEVEL`
    pub fn log_level(&self) -> Option<String> {
        env::var(LOG_LEVEL_VAR).ok().filter(|level| !level.is_empty())
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
