//! Persisting navigation state outside the navigator.
//!
//! A [`NavigationStateManager`] reads and writes the externally visible
//! navigation state (normally part of the page URL) and, while bound to a
//! navigator, forwards external changes of it (back/forward, edits to the
//! address bar) to [`Navigator::navigate_to()`].

use std::cell::RefCell;
use std::fmt;

use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use url::Url;

use crate::navigator::WeakNavigator;
use crate::page::Page;
use crate::registration::Registration;
use crate::Error;

#[cfg(doc)]
use crate::navigator::Navigator;

/// Marks a URI fragment as owned by the navigator.
pub const FRAGMENT_MARKER: char = '!';

/// Bytes escaped when a state is written into a URL. Beyond what `url`
/// escapes itself, this covers the `?` and `#` delimiters, `\` (a path
/// separator in http URLs) and `%`, so that decoding gives back the state.
const STATE_ESCAPES: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'\\')
  .add(b'`')
  .add(b'{')
  .add(b'}');

fn encode_state(state: &str) -> String {
  utf8_percent_encode(state, STATE_ESCAPES).to_string()
}

fn decode_state(raw: &str) -> String {
  percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Reads, writes, and watches the externally visible navigation state.
pub trait NavigationStateManager {
  /// The current navigation state.
  fn state(&self) -> Result<String, Error>;

  /// Makes `state` the current navigation state, without reloading anything
  /// and without notifying the bound navigator.
  fn set_state(&self, state: &str) -> Result<(), Error>;

  /// Starts forwarding external state changes to `navigator`.
  fn bind(&self, navigator: WeakNavigator);

  /// Stops forwarding external state changes.
  fn unbind(&self);
}

/// Navigates after an external state change; there is no caller to report
/// failures to, so they are logged.
fn navigate_externally(
  navigator: &WeakNavigator,
  state: Result<String, Error>,
) {
  let navigator = match navigator.upgrade() {
    Some(navigator) => navigator,
    None => return,
  };
  let result = state.and_then(|state| {
    tracing::debug!(state = %state, "external navigation state change");
    navigator.navigate_to(&state)
  });
  if let Err(e) = result {
    tracing::error!(
      error = %e,
      "navigation after external state change failed"
    );
  }
}

/// Keeps navigation state in the URI fragment, as `#!state`.
pub struct UriFragmentManager {
  page: Page,
  listener: RefCell<Option<Registration>>,
}

impl UriFragmentManager {
  /// Creates a manager for `page`.
  pub fn new(page: Page) -> Self {
    Self {
      page,
      listener: RefCell::new(None),
    }
  }

  /// The page this manager works on.
  pub fn page(&self) -> &Page {
    &self.page
  }
}

/// Strips the [`FRAGMENT_MARKER`]; any other fragment is not ours and reads
/// as the empty state.
fn state_from_fragment(fragment: Option<&str>) -> String {
  fragment
    .and_then(|f| f.strip_prefix(FRAGMENT_MARKER))
    .map(decode_state)
    .unwrap_or_default()
}

impl NavigationStateManager for UriFragmentManager {
  fn state(&self) -> Result<String, Error> {
    Ok(state_from_fragment(self.page.uri_fragment()?.as_deref()))
  }

  fn set_state(&self, state: &str) -> Result<(), Error> {
    self
      .page
      .set_uri_fragment(
        &format!("{}{}", FRAGMENT_MARKER, encode_state(state)),
        false,
      )
  }

  fn bind(&self, navigator: WeakNavigator) {
    let registration = self.page.add_uri_fragment_listener(move |fragment| {
      navigate_externally(&navigator, Ok(state_from_fragment(fragment)))
    });
    if let Some(old) = self.listener.borrow_mut().replace(registration) {
      old.remove();
    }
  }

  fn unbind(&self) {
    if let Some(registration) = self.listener.borrow_mut().take() {
      registration.remove();
    }
  }
}

impl fmt::Debug for UriFragmentManager {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("UriFragmentManager")
      .field("page", &self.page)
      .field("bound", &self.listener.borrow().is_some())
      .finish()
  }
}

/// Keeps navigation state in the location path below a root path, using
/// the HTML5 history API.
pub struct PushStateManager {
  page: Page,
  root_path: String,
  listener: RefCell<Option<Registration>>,
}

impl PushStateManager {
  /// Creates a manager for an application served below `root_path`.
  ///
  /// Fails if the page has no location, or its location is not below
  /// `root_path`: either means the application is misconfigured.
  pub fn new(page: Page, root_path: &str) -> Result<Self, Error> {
    let manager = Self {
      page,
      root_path: normalize_root(root_path),
      listener: RefCell::new(None),
    };
    manager.state()?;
    Ok(manager)
  }

  /// The normalized root path, always starting with `/` and never ending
  /// with one (except for the bare root `/`).
  pub fn root_path(&self) -> &str {
    &self.root_path
  }

  /// The page this manager works on.
  pub fn page(&self) -> &Page {
    &self.page
  }

  fn state_of(&self, location: &Url) -> Result<String, Error> {
    state_below_root(&self.root_path, location.path())
  }
}

fn normalize_root(root_path: &str) -> String {
  let trimmed = root_path.trim_matches('/');
  format!("/{}", trimmed)
}

fn state_below_root(root: &str, path: &str) -> Result<String, Error> {
  let outside = || Error::OutsideRootPath {
    path: path.to_string(),
    root: root.to_string(),
  };

  let rest = if root == "/" {
    path
  } else {
    let rest = path.strip_prefix(root).ok_or_else(outside)?;
    if !rest.is_empty() && !rest.starts_with('/') {
      return Err(outside());
    }
    rest
  };
  Ok(decode_state(rest.strip_prefix('/').unwrap_or(rest)))
}

impl NavigationStateManager for PushStateManager {
  fn state(&self) -> Result<String, Error> {
    self.state_of(&self.page.location()?)
  }

  fn set_state(&self, state: &str) -> Result<(), Error> {
    let state = encode_state(state);
    let path = if self.root_path == "/" {
      format!("/{}", state)
    } else {
      format!("{}/{}", self.root_path, state)
    };
    self.page.push_state(&path)
  }

  fn bind(&self, navigator: WeakNavigator) {
    let root = self.root_path.clone();
    let registration = self.page.add_popstate_listener(move |location| {
      navigate_externally(&navigator, state_below_root(&root, location.path()))
    });
    if let Some(old) = self.listener.borrow_mut().replace(registration) {
      old.remove();
    }
  }

  fn unbind(&self) {
    if let Some(registration) = self.listener.borrow_mut().take() {
      registration.remove();
    }
  }
}

impl fmt::Debug for PushStateManager {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("PushStateManager")
      .field("page", &self.page)
      .field("root_path", &self.root_path)
      .field("bound", &self.listener.borrow().is_some())
      .finish()
  }
}

/// Keeps navigation state in memory. Nothing external ever changes it, so
/// binding is a no-op.
#[derive(Debug, Default)]
pub struct MemoryStateManager {
  state: RefCell<String>,
  writes: RefCell<Vec<String>>,
}

impl MemoryStateManager {
  /// Creates a manager holding `""`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a manager holding `state`.
  pub fn with_state(state: impl Into<String>) -> Self {
    Self {
      state: RefCell::new(state.into()),
      writes: RefCell::new(Vec::new()),
    }
  }

  /// Every state passed to [`NavigationStateManager::set_state()`], in order.
  pub fn writes(&self) -> Vec<String> {
    self.writes.borrow().clone()
  }
}

impl NavigationStateManager for MemoryStateManager {
  fn state(&self) -> Result<String, Error> {
    Ok(self.state.borrow().clone())
  }

  fn set_state(&self, state: &str) -> Result<(), Error> {
    *self.state.borrow_mut() = state.to_string();
    self.writes.borrow_mut().push(state.to_string());
    Ok(())
  }

  fn bind(&self, _: WeakNavigator) {}

  fn unbind(&self) {}
}
