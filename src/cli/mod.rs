//! Command-line flags.
//!
//! Flags mirror the config file and take precedence over it.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, LogLevel, Network};

/// Expose MPD as an MPRIS media player
#[derive(Debug, Parser)]
#[command(name = "mpd-mpris", version, about)]
pub struct Cli {
    /// Config file, defaults to `$XDG_CONFIG_HOME/mpd-mpris/config.toml`
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Transport used with `--host`
    #[arg(long, value_enum)]
    pub network: Option<Network>,

    /// MPD host name or socket path
    #[arg(long)]
    pub host: Option<String>,

    /// MPD port
    #[arg(long)]
    pub port: Option<u16>,

    /// MPD password
    #[arg(long = "pwd", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// File holding the MPD password
    #[arg(long = "pwd-file", value_name = "PATH")]
    pub password_file: Option<PathBuf>,

    /// Claim `org.mpris.MediaPlayer2.mpd` without an instance suffix
    #[arg(long, conflicts_with = "instance_name")]
    pub no_instance: bool,

    /// Claim `org.mpris.MediaPlayer2.mpd.<NAME>`
    #[arg(long, value_name = "NAME")]
    pub instance_name: Option<String>,

    /// Log verbosity, `RUST_LOG` overrides it
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

impl Cli {
    /// Layer the flags that were given over `config`.
    ///
    /// A password flag replaces both password settings from the file so the
    /// two sources never collide across layers.
    pub fn apply(&self, config: &mut Config) {
        if let Some(network) = self.network {
            config.mpd.network = network;
        }
        if let Some(host) = &self.host {
            config.mpd.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.mpd.port = Some(port);
        }
        if self.password.is_some() || self.password_file.is_some() {
            config.mpd.password = self.password.clone().unwrap_or_default();
            config.mpd.password_file.clone_from(&self.password_file);
        }
        if self.no_instance {
            config.mpris.no_instance = true;
            config.mpris.instance_name.clear();
        }
        if let Some(name) = &self.instance_name {
            config.mpris.instance_name.clone_from(name);
            config.mpris.no_instance = false;
        }
        if let Some(level) = self.log_level {
            config.general.log_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mpd-mpris").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        config.mpd.host = "from-file".to_string();
        config.mpd.password_file = Some(PathBuf::from("/etc/mpd.pwd"));

        parse(&[
            "--host",
            "box",
            "--port",
            "6601",
            "--pwd",
            "secret",
            "--instance-name",
            "desk",
            "--log-level",
            "debug",
        ])
        .apply(&mut config);

        assert_eq!(config.mpd.host, "box");
        assert_eq!(config.mpd.port, Some(6601));
        assert_eq!(config.mpd.password, "secret");
        assert_eq!(config.mpd.password_file, None);
        assert_eq!(config.mpris.instance_name, "desk");
        assert_eq!(config.general.log_level, LogLevel::Debug);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = Config::default();
        config.mpd.host = "from-file".to_string();
        let before = config.clone();

        parse(&[]).apply(&mut config);
        assert_eq!(config, before);
    }

    #[test]
    fn network_flag() {
        let cli = parse(&["--network", "unix", "--host", "/run/mpd/socket"]);
        assert_eq!(cli.network, Some(Network::Unix));
    }

    #[test]
    fn no_instance_conflicts_with_instance_name() {
        let result = Cli::try_parse_from(["mpd-mpris", "--no-instance", "--instance-name", "x"]);
        assert!(result.is_err());
    }
}
