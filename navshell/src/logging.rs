//! Logging to a file, since the terminal belongs to the UI.
//!
//! The filter comes from `NAVSHELL_LOG` (same syntax as `RUST_LOG`) and
//! defaults to `info`.

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const FILTER_VAR: &str = "NAVSHELL_LOG";

/// Where logs go unless told otherwise.
pub fn default_path() -> PathBuf {
  dirs::cache_dir()
    .unwrap_or_else(env::temp_dir)
    .join("navshell.log")
}

/// Installs the global subscriber, appending to `path`.
pub fn init(path: &Path) -> io::Result<()> {
  let file = OpenOptions::new().create(true).append(true).open(path)?;
  let filter = EnvFilter::try_from_env(FILTER_VAR)
    .unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}
