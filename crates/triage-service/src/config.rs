//! Startup configuration, read once from file and environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use triage_core::id::ChannelId;

/// Service configuration.
///
/// `ticket_category` and `log_channel` are optional: without a category
/// ticket channels are created at the adapter's default location, and
/// without a log channel audit events are only persisted, not
/// forwarded.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Authentication token for the gateway connection. Consumed by the
  /// adapter, never by this crate.
  pub token: String,

  /// Path to the SQLite database file.
  pub database_path: PathBuf,

  /// Category under which ticket channels are created.
  #[serde(default)]
  pub ticket_category: Option<ChannelId>,

  /// Channel receiving audit notifications.
  #[serde(default)]
  pub log_channel: Option<ChannelId>,

  /// Delay before a closed ticket's channel is deleted, giving
  /// participants time to read the closure notice.
  #[serde(default = "default_cleanup_grace_secs")]
  pub cleanup_grace_secs: u64,
}

fn default_cleanup_grace_secs() -> u64 { 5 }

impl ServiceConfig {
  /// Load from a TOML file (optional) overlaid with `TRIAGE_`-prefixed
  /// environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("TRIAGE"))
      .build()?
      .try_deserialize()
  }
}
