//! mpd-mpris - MPD published as an MPRIS media player.
//!
//! Mirrors the state of a Music Player Daemon onto the D-Bus session bus
//! under `org.mpris.MediaPlayer2.mpd*`, so desktop media keys, applets and
//! `playerctl` can observe and drive it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mpd_mpris::services::{
//!     mpd::{Address, MpdClient},
//!     mpris::{Instance, InstanceOptions, Shutdown},
//! };
//!
//! # async fn run() -> mpd_mpris::Result<()> {
//! let address = Address::Tcp { host: "localhost".into(), port: 6600 };
//! let client = MpdClient::connect(address, None).await?;
//!
//! let instance = Instance::new(Arc::new(client), InstanceOptions::default(), Shutdown::new());
//! instance.run().await?;
//! # Ok(())
//! # }
//! ```

/// Command-line flags.
pub mod cli;

/// Configuration schema and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// MPD client and the MPRIS bridge.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{AppError, Result};
