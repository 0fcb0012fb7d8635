//! Resolution of navigation states to views.
//!
//! A [`ViewRegistry`] holds an ordered list of entries. Each entry may claim a
//! prefix of a state as its view name; among all claims the longest view name
//! wins, so `"admin/users"` takes precedence over `"admin"` for
//! `"admin/users/5"`. Ties go to the entry registered first.

use std::fmt;
use std::rc::Rc;

use crate::view::ViewHandle;

/// Dynamic view resolution, for views that are not registered by name.
pub trait ViewProvider {
  /// Returns the view name this provider claims for `state`, if any.
  ///
  /// The name is normally a prefix of `state` ending just before a `/`.
  fn view_name(&self, state: &str) -> Option<String>;

  /// Returns the view for a name previously returned by
  /// [`ViewProvider::view_name()`].
  fn view(&self, view_name: &str) -> Option<ViewHandle>;
}

/// Builds a fresh view each time its registration is resolved.
pub type ViewFactory = Rc<dyn Fn() -> ViewHandle>;

/// Where the view of a named registration comes from.
#[derive(Clone)]
pub enum ViewSource {
  /// The same instance every time.
  Instance(ViewHandle),
  /// A new instance on every resolution.
  Factory(ViewFactory),
}

impl ViewSource {
  /// Wraps a factory closure.
  pub fn factory(f: impl Fn() -> ViewHandle + 'static) -> Self {
    ViewSource::Factory(Rc::new(f))
  }

  fn get(&self) -> ViewHandle {
    match self {
      ViewSource::Instance(view) => Rc::clone(view),
      ViewSource::Factory(factory) => factory(),
    }
  }
}

impl fmt::Debug for ViewSource {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ViewSource::Instance(_) => f.write_str("Instance"),
      ViewSource::Factory(_) => f.write_str("Factory"),
    }
  }
}

pub(crate) enum Entry {
  Named { name: String, source: ViewSource },
  Provider(Rc<dyn ViewProvider>),
  // Error view: claims any state as its own view name.
  CatchAll(ViewSource),
}

impl Entry {
  fn claim(&self, state: &str) -> Option<String> {
    match self {
      Entry::Named { name, .. } => claims(name, state).then(|| name.clone()),
      Entry::Provider(provider) => provider.view_name(state),
      Entry::CatchAll(_) => {
        Some(state.strip_suffix('/').unwrap_or(state).to_string())
      }
    }
  }

  pub(crate) fn instantiate(&self, view_name: &str) -> Option<ViewHandle> {
    match self {
      Entry::Named { source, .. } | Entry::CatchAll(source) => {
        Some(source.get())
      }
      Entry::Provider(provider) => provider.view(view_name),
    }
  }

  /// Whether resolving this entry again for the same state may reuse the view
  /// it produced last time instead of instantiating a new one.
  pub(crate) fn is_stable(&self) -> bool {
    !matches!(self, Entry::Provider(_))
  }
}

/// Returns whether a registration named `name` claims `state`.
pub fn claims(name: &str, state: &str) -> bool {
  match state.strip_prefix(name) {
    Some(rest) => rest.is_empty() || rest.starts_with('/'),
    None => false,
  }
}

/// Splits `state` into the normalized state and the parameters following
/// `view_name/`.
///
/// A single trailing `/` with nothing after it is dropped, so `"test/"` and
/// `"test"` are the same state.
pub fn split_parameters(state: &str, view_name: &str) -> (String, String) {
  let parameters = state
    .strip_prefix(view_name)
    .and_then(|rest| rest.strip_prefix('/'))
    .unwrap_or("");
  let state = if parameters.is_empty() {
    view_name.to_string()
  } else {
    format!("{}/{}", view_name, parameters)
  };
  (state, parameters.to_string())
}

/// The outcome of resolving a state.
#[derive(Clone)]
pub struct Resolution {
  /// The name the view was found under.
  pub view_name: String,
  /// Everything after `view_name/` in the state.
  pub parameters: String,
  /// The resolved view.
  pub view: ViewHandle,
}

impl fmt::Debug for Resolution {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Resolution")
      .field("view_name", &self.view_name)
      .field("parameters", &self.parameters)
      .finish()
  }
}

/// A claim on a state, before any view is instantiated.
pub(crate) struct Claim {
  pub entry: Rc<Entry>,
  pub view_name: String,
}

/// An ordered set of view registrations.
#[derive(Default)]
pub struct ViewRegistry {
  entries: Vec<Rc<Entry>>,
  error: Option<Rc<Entry>>,
}

impl ViewRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `view` under `name`, replacing any view with that name.
  pub fn add_view(&mut self, name: impl Into<String>, view: ViewHandle) {
    self.register(name, ViewSource::Instance(view))
  }

  /// Registers a factory under `name`, replacing any view with that name.
  pub fn add_view_factory(
    &mut self,
    name: impl Into<String>,
    factory: impl Fn() -> ViewHandle + 'static,
  ) {
    self.register(name, ViewSource::factory(factory))
  }

  /// Registers `source` under `name`, replacing any view with that name.
  ///
  /// The replacement goes to the end of the registration order.
  pub fn register(&mut self, name: impl Into<String>, source: ViewSource) {
    let name = name.into();
    self.remove_view(&name);
    tracing::trace!(view = %name, source = ?source, "registering view");
    self.entries.push(Rc::new(Entry::Named { name, source }));
  }

  /// Removes every view registered under `name`.
  ///
  /// Providers are left alone even if they would claim `name`.
  pub fn remove_view(&mut self, name: &str) {
    self.entries.retain(|entry| match &**entry {
      Entry::Named { name: n, .. } => n != name,
      _ => true,
    });
  }

  /// Appends a dynamic provider.
  pub fn add_provider(&mut self, provider: Rc<dyn ViewProvider>) {
    self.entries.push(Rc::new(Entry::Provider(provider)));
  }

  /// Removes `provider`, compared by identity.
  pub fn remove_provider(&mut self, provider: &Rc<dyn ViewProvider>) {
    self.entries.retain(|entry| match &**entry {
      Entry::Provider(p) => !Rc::ptr_eq(p, provider),
      _ => true,
    });
  }

  /// Uses `view` for every state nothing else claims.
  pub fn set_error_view(&mut self, view: ViewHandle) {
    self.error = Some(Rc::new(Entry::CatchAll(ViewSource::Instance(view))));
  }

  /// Builds a fresh error view for every state nothing else claims.
  pub fn set_error_view_factory(
    &mut self,
    factory: impl Fn() -> ViewHandle + 'static,
  ) {
    self.error = Some(Rc::new(Entry::CatchAll(ViewSource::factory(factory))));
  }

  /// Consults `provider` for every state nothing else claims, or clears the
  /// error registration.
  pub fn set_error_provider(&mut self, provider: Option<Rc<dyn ViewProvider>>) {
    self.error = provider.map(|p| Rc::new(Entry::Provider(p)));
  }

  /// Whether an error view or provider is registered.
  pub fn has_error_view(&self) -> bool {
    self.error.is_some()
  }

  /// Names of the named registrations, in registration order.
  pub fn view_names(&self) -> Vec<&str> {
    self
      .entries
      .iter()
      .filter_map(|entry| match &**entry {
        Entry::Named { name, .. } => Some(name.as_str()),
        _ => None,
      })
      .collect()
  }

  /// Number of registrations, providers included.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether nothing is registered, ignoring the error view.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The entry with the longest claim on `state`.
  pub(crate) fn longest_claim(&self, state: &str) -> Option<Claim> {
    let mut best: Option<Claim> = None;
    for entry in &self.entries {
      let view_name = match entry.claim(state) {
        Some(name) => name,
        None => continue,
      };
      if best
        .as_ref()
        .map_or(true, |b| view_name.len() > b.view_name.len())
      {
        best = Some(Claim {
          entry: Rc::clone(entry),
          view_name,
        });
      }
    }
    best
  }

  /// The error registration's claim on `state`.
  pub(crate) fn error_claim(&self, state: &str) -> Option<Claim> {
    let entry = self.error.as_ref()?;
    Some(Claim {
      view_name: entry.claim(state)?,
      entry: Rc::clone(entry),
    })
  }

  /// Resolves `state` to a view, falling back to the error registration.
  ///
  /// Factories run on every call; use this for lookups, and
  /// [`Navigator::navigate_to()`](crate::Navigator::navigate_to) for actual
  /// navigation.
  pub fn resolve(&self, state: &str) -> Option<Resolution> {
    let claims = self
      .longest_claim(state)
      .into_iter()
      .chain(self.error_claim(state));
    for claim in claims {
      if let Some(view) = claim.entry.instantiate(&claim.view_name) {
        let (_, parameters) = split_parameters(state, &claim.view_name);
        tracing::trace!(state, view = %claim.view_name, "resolved");
        return Some(Resolution {
          view_name: claim.view_name,
          parameters,
          view,
        });
      }
    }
    None
  }

  /// Shorthand for the view of [`ViewRegistry::resolve()`].
  pub fn view(&self, state: &str) -> Option<ViewHandle> {
    self.resolve(state).map(|r| r.view)
  }
}

impl fmt::Debug for ViewRegistry {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("ViewRegistry")
      .field("views", &self.view_names())
      .field("entries", &self.entries.len())
      .field("has_error_view", &self.has_error_view())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_claim_drops_trailing_slash() {
    let mut registry = ViewRegistry::new();
    registry.set_error_view(Rc::new(crate::view::EmptyView));
    let claim = registry.error_claim("foo/").unwrap();
    assert_eq!(claim.view_name, "foo");
    assert_eq!(registry.error_claim("a/b").unwrap().view_name, "a/b");
  }

  #[test]
  fn claims_whole_name_or_name_and_slash() {
    assert!(claims("admin", "admin"));
    assert!(claims("admin", "admin/"));
    assert!(claims("admin", "admin/users"));
    assert!(!claims("admin", "administrator"));
    assert!(!claims("admin/users", "admin"));
    assert!(claims("", ""));
    assert!(claims("", "/x"));
    assert!(!claims("", "x"));
  }

  #[test]
  fn split_parameters_normalizes_trailing_slash() {
    assert_eq!(
      split_parameters("test2/", "test2"),
      ("test2".to_string(), "".to_string())
    );
    assert_eq!(
      split_parameters("test1/params", "test1"),
      ("test1/params".to_string(), "params".to_string())
    );
    assert_eq!(
      split_parameters("admin/users/5", "admin/users"),
      ("admin/users/5".to_string(), "5".to_string())
    );
  }

  #[test]
  fn split_parameters_ignores_non_prefix_names() {
    assert_eq!(
      split_parameters("", "main"),
      ("main".to_string(), "".to_string())
    );
  }
}
