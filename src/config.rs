use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ShellError;

pub const DEFAULT_OUTPUT_CAPACITY: usize = 4096;
pub const DEFAULT_MAX_ARGS: usize = 100;
pub const DEFAULT_SHELL: &str = "/bin/sh";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_STATIC_ROOT: &str = "static";
pub const DEFAULT_MAX_COMMAND_LEN: usize = 1024;

/// Settings for the execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Bytes of text one command may produce.
    pub output_capacity: usize,
    /// Token cap for external dispatch, program name included.
    pub max_args: usize,
    /// Interpreter used for lines with pipes or redirections.
    pub shell: PathBuf,
    /// `None` waits forever.
    pub command_timeout: Option<Duration>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            max_args: DEFAULT_MAX_ARGS,
            shell: PathBuf::from(DEFAULT_SHELL),
            command_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Result<Self, ShellError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults
    /// for keys that are absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShellError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs: u64 = parse_or("WEBSHELL_TIMEOUT_SECS", &lookup, DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            output_capacity: parse_or("WEBSHELL_OUTPUT_CAPACITY", &lookup, defaults.output_capacity)?,
            max_args: parse_or("WEBSHELL_MAX_ARGS", &lookup, defaults.max_args)?,
            shell: lookup("WEBSHELL_SHELL").map(PathBuf::from).unwrap_or(defaults.shell),
            command_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }
}

/// Settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub static_root: PathBuf,
    pub max_command_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            max_command_len: DEFAULT_MAX_COMMAND_LEN,
        }
    }
}

impl ServerConfig {
    /// Reads the environment, then lets a port given as the first CLI
    /// argument replace the port of the bind address.
    pub fn from_env_and_args<I>(args: I) -> Result<Self, ShellError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        if let Some(port) = args.into_iter().nth(1) {
            config.set_port(&port)?;
        }
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShellError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            addr: lookup("WEBSHELL_ADDR").unwrap_or(defaults.addr),
            static_root: lookup("WEBSHELL_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            max_command_len: parse_or("WEBSHELL_MAX_COMMAND_LEN", &lookup, defaults.max_command_len)?,
        })
    }

    pub fn set_port(&mut self, port: &str) -> Result<(), ShellError> {
        let port: u16 = port.parse().map_err(|_| ShellError::Config {
            key: "port".to_string(),
            value: port.to_string(),
        })?;
        let host = self
            .addr
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.addr);
        self.addr = format!("{}:{}", host, port);
        Ok(())
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ShellError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ShellError::Config {
            key: key.to_string(),
            value,
        }),
    }
}
