//! Navigator configuration.
//!
//! ```json
//! {
//!   "state": { "strategy": "push_state", "root_path": "/app" },
//!   "separators": { "pair": "&", "key_value": "=" }
//! }
//! ```
//!
//! Every field is optional; an empty object selects URI fragment state and
//! the default separators.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;

use crate::manager::NavigationStateManager;
use crate::manager::PushStateManager;
use crate::manager::UriFragmentManager;
use crate::page::Page;
use crate::state::Separators;
use crate::Error;

/// How a navigator keeps its state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StateStrategy {
  /// In the URI fragment, as `#!state`.
  #[default]
  UriFragment,
  /// In the location path below `root_path`.
  PushState {
    /// Path the application is served from.
    root_path: String,
  },
}

/// Configuration for
/// [`Navigator::with_config()`](crate::Navigator::with_config).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Where navigation state is kept.
  pub state: StateStrategy,
  /// Separators for parameter maps.
  pub separators: Separators,
}

impl Config {
  /// Parses a JSON configuration.
  pub fn from_json(json: &str) -> Result<Self, Error> {
    Ok(serde_json::from_str(json)?)
  }

  /// Reads a JSON configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading navigator config");
    Self::from_json(&fs::read_to_string(path)?)
  }

  /// Builds the state manager this configuration asks for.
  pub fn state_manager(
    &self,
    page: &Page,
  ) -> Result<Rc<dyn NavigationStateManager>, Error> {
    Ok(match &self.state {
      StateStrategy::UriFragment => {
        Rc::new(UriFragmentManager::new(page.clone()))
      }
      StateStrategy::PushState { root_path } => {
        Rc::new(PushStateManager::new(page.clone(), root_path)?)
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn empty_object_is_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    assert_eq!(Config::default().state, StateStrategy::UriFragment);
  }

  #[test]
  fn push_state_with_custom_separators() {
    let config = Config::from_json(
      r#"{
        "state": { "strategy": "push_state", "root_path": "/app" },
        "separators": { "pair": ";" }
      }"#,
    )
    .unwrap();
    assert_eq!(
      config.state,
      StateStrategy::PushState {
        root_path: "/app".to_string()
      }
    );
    assert_eq!(config.separators.pair, ";");
    assert_eq!(config.separators.key_value, "=");
  }

  #[test]
  fn unknown_strategy_is_rejected() {
    assert!(matches!(
      Config::from_json(r#"{ "state": { "strategy": "cookie" } }"#),
      Err(Error::Json(_))
    ));
  }

  #[test]
  fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "state": {{ "strategy": "uri_fragment" }} }}"#)
      .unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.state, StateStrategy::UriFragment);
  }

  #[test]
  fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      Config::load(dir.path().join("missing.json")),
      Err(Error::Io(_))
    ));
  }

  #[test]
  fn push_state_outside_root_fails() {
    let page = Page::parse("http://server/other").unwrap();
    let config = Config {
      state: StateStrategy::PushState {
        root_path: "/app".to_string(),
      },
      ..Config::default()
    };
    assert!(matches!(
      config.state_manager(&page),
      Err(Error::OutsideRootPath { .. })
    ));
  }
}
