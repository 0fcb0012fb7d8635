//! The crate-wide error type.

use std::io;

/// A navigation error.
///
/// A transition vetoed by a view or a listener is not an error; those
/// complete with `Ok(())` after rolling the navigation state back.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Nothing claims the requested state and no error view is registered.
  #[error(
    "trying to navigate to an unknown state '{0}' and an error view provider not present"
  )]
  UnknownState(String),

  /// A leave confirmation was used twice.
  #[error("navigate() can only be called once per leave confirmation")]
  LeaveAlreadyConfirmed,

  /// The page has no location to read or write navigation state from.
  #[error("the page does not have a location")]
  NoLocation,

  /// The page location is not below the configured application root.
  #[error("location path '{path}' is not below the root path '{root}'")]
  OutsideRootPath {
    /// The location path that was inspected.
    path: String,
    /// The configured root path.
    root: String,
  },

  #[allow(missing_docs)]
  #[error(transparent)]
  Url(#[from] url::ParseError),

  #[allow(missing_docs)]
  #[error(transparent)]
  Io(#[from] io::Error),

  #[allow(missing_docs)]
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
