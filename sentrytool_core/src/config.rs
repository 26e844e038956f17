//! Tool configuration
//!
//! Settings come from, in order of precedence: command-line flags, `SENTRY_*`
//! environment variables, the YAML config file (by default
//! `~/.sentrytool.yaml`) and built-in defaults.
//!
//! ```yaml
//! host: sentry.example.com
//! port: 8038
//! user: hive
//! component: kafka
//! verbose: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::client::{ConnectionSettings, DEFAULT_PORT};
use crate::logging::debug;
use crate::project;

const HOST_ENV: &str = "SENTRY_HOST";
const PORT_ENV: &str = "SENTRY_PORT";
const USER_ENV: &str = "SENTRY_USER";
const COMPONENT_ENV: &str = "SENTRY_COMPONENT";
const VERBOSE_ENV: &str = "SENTRY_VERBOSE";
const JSTACK_ENV: &str = "SENTRY_JSTACK";
const POLICY_FILE_ENV: &str = "SENTRY_POLICY_FILE";

/// Struct representing the `.sentrytool.yaml` file. Every key is optional.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    /// Sentry server host
    pub host: Option<String>,
    /// Sentry server port
    pub port: Option<u16>,
    /// User on whose behalf requests are made
    pub user: Option<String>,
    /// Component for the generic protocol
    pub component: Option<String>,
    /// Verbose output
    pub verbose: Option<bool>,
    /// Show server stack traces on errors
    pub jstack: Option<bool>,
    /// Policy file to run against instead of a server
    pub policy_file: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a config from a yaml string. An empty document is an empty
    /// config.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config = yaml::from_str::<FileConfig>(raw).context("Deserializing config")?;
        config.pop().ok_or_else(|| anyhow!["empty config document"])
    }

    /// Read the config file.
    ///
    /// An explicitly given path has to exist. Without one, the default path
    /// is used if there is a file there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => match project::default_cfg_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        debug!("Trying to read config from {:?}", path);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {}", path.display()))
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    /// `--host`
    pub host: Option<String>,
    /// `--port`, unparsed
    pub port: Option<String>,
    /// `--username`
    pub user: Option<String>,
    /// `--component`
    pub component: Option<String>,
    /// `--verbose`
    pub verbose: bool,
    /// `--jstack`
    pub jstack: bool,
    /// `--policy-file`
    pub policy_file: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// How to reach the service
    pub connection: ConnectionSettings,
    /// Verbose output
    pub verbose: bool,
    /// Show server stack traces on errors
    pub jstack: bool,
    /// Policy file to run against instead of a server
    pub policy_file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env(overrides: Overrides, file: FileConfig) -> Result<Self> {
        Self::resolve(overrides, file, |key| std::env::var(key).ok())
    }

    /// Resolve settings with `env` standing in for the process environment.
    pub fn resolve<F>(overrides: Overrides, file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let host = overrides
            .host
            .or_else(|| env(HOST_ENV))
            .or(file.host)
            .unwrap_or_else(|| ConnectionSettings::default().host);

        let port = match overrides.port.or_else(|| env(PORT_ENV)) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow!("invalid port {raw}"))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let user = overrides
            .user
            .or_else(|| env(USER_ENV))
            .or(file.user)
            .or_else(|| env("USER"))
            .or_else(|| env("USERNAME"))
            .unwrap_or_default();

        let component = overrides
            .component
            .or_else(|| env(COMPONENT_ENV))
            .or(file.component)
            .unwrap_or_default();

        let flag = |set: bool, key: &str, from_file: Option<bool>| {
            set || env(key).map_or_else(|| from_file.unwrap_or(false), |v| is_truthy(&v))
        };

        Ok(Self {
            connection: ConnectionSettings {
                host,
                port,
                user,
                component,
            },
            verbose: flag(overrides.verbose, VERBOSE_ENV, file.verbose),
            jstack: flag(overrides.jstack, JSTACK_ENV, file.jstack),
            policy_file: overrides
                .policy_file
                .or_else(|| env(POLICY_FILE_ENV).map(PathBuf::from))
                .or(file.policy_file),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "t" | "true" | "y" | "yes"
    )
}
