//! Configuration management.
//!
//! This module provides configuration loading through TOML files and
//! environment variable management via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use docproxy::config::{ConfigurationLoader, EnvironmentLoader};
//! use docproxy::Proxy;
//!
//! let env = EnvironmentLoader::new(None);
//! let path = env.config_path();
//!
//! let loader = ConfigurationLoader::new(path.as_deref()).unwrap();
//! let proxy = Proxy::from_config(&loader.config).unwrap();
//! println!("backends: {:?}", proxy.backend_names());
//! ```

pub mod config;
pub mod environment;

pub use self::config::{
    BackendEntry, ConfigurationLoader, LoggingConfig, ProxyConfig, ProxySection,
    DEFAULT_CONFIG_PATH,
};
pub use self::environment::{EnvironmentLoader, CONFIG_VAR, LOG_LEVEL_VAR};
