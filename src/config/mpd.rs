use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, Result, services::mpd::Address};

/// Port MPD listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 6600;

/// Transport used to reach MPD
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// `host:port` over TCP
    #[default]
    Tcp,
    /// Unix domain socket, `host` is the socket path
    Unix,
}

/// Where and how to connect to MPD.
///
/// Empty strings mean "not configured"; resolution then falls back to the
/// environment the way `mpc` does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MpdConfig {
    /// Transport for an explicitly configured host
    #[serde(default)]
    pub network: Network,

    /// Host name, or socket path when `network = "unix"`
    #[serde(default)]
    pub host: String,

    /// TCP port, `MPD_PORT` or 6600 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Password sent after connecting
    #[serde(default)]
    pub password: String,

    /// File whose first line is the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            network: Network::Tcp,
            host: String::new(),
            port: None,
            password: String::new(),
            password_file: None,
        }
    }
}

/// Environment variables consulted when the host is not configured
#[derive(Debug, Clone, Default)]
pub struct MpdEnvironment {
    /// `MPD_HOST`, `[password@]host` or a socket path
    pub host: Option<String>,
    /// `MPD_PORT`
    pub port: Option<String>,
    /// `XDG_RUNTIME_DIR`, searched for `mpd/socket`
    pub runtime_dir: Option<PathBuf>,
}

impl MpdEnvironment {
    /// Snapshot of the current process environment
    pub fn from_process() -> Self {
        Self {
            host: env::var("MPD_HOST").ok(),
            port: env::var("MPD_PORT").ok(),
            runtime_dir: env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from),
        }
    }
}

/// Resolved connection target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Daemon address
    pub address: Address,
    /// Password, if any
    pub password: Option<String>,
}

impl MpdConfig {
    /// Work out the daemon address and password.
    ///
    /// Order: configured host, then `MPD_HOST`, then
    /// `$XDG_RUNTIME_DIR/mpd/socket` if it exists, then `localhost`. A
    /// password embedded in `MPD_HOST` only applies when none is configured.
    ///
    /// # Errors
    /// Returns error if both password sources are set, or the password file
    /// cannot be read or is empty
    pub fn endpoint(&self, environment: &MpdEnvironment) -> Result<Endpoint> {
        let mut password = self.password()?;
        let port = self
            .port
            .or_else(|| {
                environment
                    .port
                    .as_deref()
                    .and_then(|port| port.trim().parse().ok())
            })
            .unwrap_or(DEFAULT_PORT);

        if !self.host.is_empty() {
            let address = match self.network {
                Network::Tcp => Address::Tcp {
                    host: self.host.clone(),
                    port,
                },
                Network::Unix => Address::local(&self.host),
            };
            return Ok(Endpoint { address, password });
        }

        let address = match environment.host.as_deref().filter(|host| !host.is_empty()) {
            Some(env_host) => {
                let host = match split_password(env_host) {
                    Some((embedded, host)) => {
                        password = password.or_else(|| Some(embedded.to_string()));
                        host
                    }
                    None => env_host,
                };
                if host.starts_with('/') || host.starts_with('@') {
                    Address::local(host)
                } else {
                    Address::Tcp {
                        host: host.to_string(),
                        port,
                    }
                }
            }
            None => match local_socket(environment.runtime_dir.as_deref()) {
                Some(socket) => {
                    info!("Local MPD socket found at {}", socket.display());
                    Address::Unix(socket)
                }
                None => Address::Tcp {
                    host: "localhost".to_string(),
                    port,
                },
            },
        };

        Ok(Endpoint { address, password })
    }

    /// The configured password, read from `password_file` when given.
    ///
    /// Trailing line breaks in the file are dropped.
    ///
    /// # Errors
    /// Returns error if both sources are set, or the file is unreadable or empty
    pub fn password(&self) -> Result<Option<String>> {
        let file = self
            .password_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty());

        match (self.password.is_empty(), file) {
            (false, Some(_)) => Err(AppError::validation(
                "mpd",
                "only one of password and password_file may be set",
            )),
            (false, None) => Ok(Some(self.password.clone())),
            (true, Some(path)) => read_password_file(path).map(Some),
            (true, None) => Ok(None),
        }
    }
}

fn read_password_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| AppError::io(e, path))?;
    let password = content.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::validation(
            "mpd",
            format!("password file {} contains an empty password", path.display()),
        ));
    }
    Ok(password.to_string())
}

/// Split `password@host`. A leading `@` names an abstract socket and is not a separator.
fn split_password(env_host: &str) -> Option<(&str, &str)> {
    let (first, rest) = env_host.split_at(env_host.chars().next()?.len_utf8());
    let at = rest.find('@')? + first.len();
    Some((&env_host[..at], &env_host[at + 1..]))
}

fn local_socket(runtime_dir: Option<&Path>) -> Option<PathBuf> {
    let socket = runtime_dir?.join("mpd").join("socket");
    socket.exists().then_some(socket)
}
