use configparser::ini::{Ini, IniDefault};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const REDIS_HOST: &str = "REDIS_HOST";
pub const REDIS_PORT: &str = "REDIS_PORT";
pub const REDIS_USERNAME: &str = "REDIS_USERNAME";
pub const REDIS_PASSWORD: &str = "REDIS_PASSWORD";

/// Default env file, looked up relative to the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required configuration: {}", .0.join(", "))]
  Missing(Vec<&'static str>),

  #[error("invalid redis port '{0}'")]
  InvalidPort(String),

  #[error("failed to load env file '{path}': {reason}")]
  EnvFile { path: String, reason: String },
}

/// Key=value pairs loaded from an env file
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
  vars: HashMap<String, String>,
}

impl EnvFile {
  /// Parse a file of `KEY=value` lines
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    // Only `=` separates key from value, and `#`/`;` start comments only at
    // the beginning of a line, so passwords keep those characters.
    let mut defaults = IniDefault::default();
    defaults.case_sensitive = true;
    defaults.delimiters = vec!['='];
    defaults.inline_comment_symbols = Some(vec![]);
    let mut ini = Ini::new_from_defaults(defaults);
    let sections = ini.load(path).map_err(|reason| ConfigError::EnvFile {
      path: path.display().to_string(),
      reason,
    })?;

    let mut vars = HashMap::new();
    // Lines before any [section] header land in the default section.
    if let Some(section) = sections.get("default") {
      for (key, value) in section {
        let key = key.strip_prefix("export ").unwrap_or(key).trim();
        if let Some(value) = value {
          vars.insert(key.to_string(), unquote(value).to_string());
        }
      }
    }

    Ok(Self { vars })
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }
}

fn unquote(value: &str) -> &str {
  let value = value.trim();
  for quote in ['"', '\''] {
    if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
      return &value[1..value.len() - 1];
    }
  }
  value
}

/// Redis connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
  pub host: String,
  pub port: String,
  pub username: String,
  pub password: String,
}

impl RedisConfig {
  /// Resolve every variable through `lookup`; empty values count as missing
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&'static str) -> Option<String>,
  {
    let mut missing = Vec::new();
    let mut require = |name: &'static str| match lookup(name) {
      Some(value) if !value.is_empty() => value,
      _ => {
        missing.push(name);
        String::new()
      }
    };

    let config = RedisConfig {
      host: require(REDIS_HOST),
      port: require(REDIS_PORT),
      username: require(REDIS_USERNAME),
      password: require(REDIS_PASSWORD),
    };

    if missing.is_empty() {
      Ok(config)
    } else {
      Err(ConfigError::Missing(missing))
    }
  }

  /// Process environment first, then the env file
  pub fn from_env(env_file: Option<&EnvFile>) -> Result<Self, ConfigError> {
    Self::from_sources(|name| std::env::var(name).ok(), env_file)
  }

  /// `env` wins over `env_file`; an empty `env` value falls through to the file
  pub fn from_sources<E>(env: E, env_file: Option<&EnvFile>) -> Result<Self, ConfigError>
  where
    E: Fn(&'static str) -> Option<String>,
  {
    Self::from_lookup(|name| {
      env(name)
        .filter(|value| !value.is_empty())
        .or_else(|| env_file.and_then(|file| file.get(name)).map(str::to_string))
    })
  }

  /// Parse the port for the client; the loader itself only checks presence
  pub fn port_number(&self) -> Result<u16, ConfigError> {
    self
      .port
      .trim()
      .parse()
      .map_err(|_| ConfigError::InvalidPort(self.port.clone()))
  }
}

impl fmt::Debug for RedisConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RedisConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}
