//! Navigation state strings.
//!
//! A navigation state has the form `view-name[/parameters]`. The state itself
//! is opaque text: which prefix is the view name is decided by the
//! [`ViewRegistry`](crate::ViewRegistry), while [`NavigationState`] only offers
//! the naive split on the first `/` that convenience accessors rely on.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A `view-name[/parameters]` navigation state.
#[derive(
  Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NavigationState(String);

impl NavigationState {
  /// Wraps `state` without inspecting it.
  pub fn new(state: impl Into<String>) -> Self {
    Self(state.into())
  }

  /// Joins a view name and its parameters.
  ///
  /// The separating `/` is only added when `parameters` is non-empty, so
  /// `compose("home", "")` is just `"home"`.
  pub fn compose(view_name: &str, parameters: &str) -> Self {
    if parameters.is_empty() {
      Self(view_name.to_string())
    } else {
      Self(format!("{}/{}", view_name, parameters))
    }
  }

  /// Returns the raw state string.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Consumes the state, returning the raw string.
  pub fn into_string(self) -> String {
    self.0
  }

  /// Everything before the first `/`, or the whole state.
  pub fn view_name(&self) -> &str {
    match self.0.split_once('/') {
      Some((name, _)) => name,
      None => &self.0,
    }
  }

  /// Everything after the first `/`, or `""`.
  pub fn parameters(&self) -> &str {
    match self.0.split_once('/') {
      Some((_, parameters)) => parameters,
      None => "",
    }
  }

  /// Parses [`NavigationState::parameters()`] with the default separators.
  pub fn parameter_map(&self) -> HashMap<String, String> {
    self.parameter_map_with(&Separators::default())
  }

  /// Parses [`NavigationState::parameters()`] with custom separators.
  pub fn parameter_map_with(
    &self,
    separators: &Separators,
  ) -> HashMap<String, String> {
    parse_parameters(self.parameters(), separators)
  }
}

impl fmt::Display for NavigationState {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for NavigationState {
  fn from(state: &str) -> Self {
    Self::new(state)
  }
}

impl From<String> for NavigationState {
  fn from(state: String) -> Self {
    Self(state)
  }
}

impl AsRef<str> for NavigationState {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Separators used when decoding a parameter string into a map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Separators {
  /// Goes between `key=value` pairs; `&` by default.
  pub pair: String,
  /// Goes between a key and its value; `=` by default.
  pub key_value: String,
}

impl Default for Separators {
  fn default() -> Self {
    Self {
      pair: "&".to_string(),
      key_value: "=".to_string(),
    }
  }
}

impl Separators {
  /// Default key/value separator with a custom pair separator.
  pub fn with_pair(pair: impl Into<String>) -> Self {
    Self {
      pair: pair.into(),
      ..Self::default()
    }
  }
}

/// Decodes `key1=value1&key2=value2` style parameters.
///
/// Parsing never fails: a segment without a key/value separator maps to `""`,
/// and only the text up to a second key/value separator is kept as the value.
/// Empty segments are skipped, so `""` yields an empty map.
pub fn parse_parameters(
  parameters: &str,
  separators: &Separators,
) -> HashMap<String, String> {
  let mut map = HashMap::new();
  if parameters.is_empty() {
    return map;
  }

  for segment in split_nonempty(parameters, &separators.pair) {
    let mut kv = split_on(segment, &separators.key_value);
    let key = kv.next().unwrap_or("");
    let value = kv.next().unwrap_or("");
    map.insert(key.to_string(), value.to_string());
  }
  map
}

fn split_nonempty<'a>(
  s: &'a str,
  sep: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
  split_on(s, sep).filter(|segment| !segment.is_empty())
}

/// Like `str::split`, but an empty separator does not split at all.
fn split_on<'a>(
  s: &'a str,
  sep: &'a str,
) -> Box<dyn Iterator<Item = &'a str> + 'a> {
  if sep.is_empty() {
    Box::new(std::iter::once(s))
  } else {
    Box::new(s.split(sep))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
      .iter()
      .map(|&(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn view_name_and_parameters_split_on_first_slash() {
    let state = NavigationState::new("admin/users/5");
    assert_eq!(state.view_name(), "admin");
    assert_eq!(state.parameters(), "users/5");

    let bare = NavigationState::new("home");
    assert_eq!(bare.view_name(), "home");
    assert_eq!(bare.parameters(), "");
  }

  #[test]
  fn compose_skips_separator_without_parameters() {
    assert_eq!(NavigationState::compose("home", "").as_str(), "home");
    assert_eq!(NavigationState::compose("admin", "x=1").as_str(), "admin/x=1");
  }

  #[test]
  fn parameter_map_without_view_separator_is_empty() {
    let state = NavigationState::new("fooview");
    assert!(state.parameter_map().is_empty());
    assert!(state.parameter_map_with(&Separators::with_pair("foo")).is_empty());
  }

  #[test]
  fn parameter_map_with_empty_parameters_is_empty() {
    assert!(NavigationState::new("fooview/").parameter_map().is_empty());
  }

  #[test]
  fn parameter_without_value() {
    assert_eq!(
      NavigationState::new("fooview/bar").parameter_map(),
      map(&[("bar", "")])
    );
    assert_eq!(
      NavigationState::new("fooview/bar=").parameter_map(),
      map(&[("bar", "")])
    );
  }

  #[test]
  fn parameters_with_values() {
    assert_eq!(
      NavigationState::new("fooview/bar=baz").parameter_map(),
      map(&[("bar", "baz")])
    );
    assert_eq!(
      NavigationState::new("view/foo&bar=baz").parameter_map(),
      map(&[("foo", ""), ("bar", "baz")])
    );
  }

  #[test]
  fn custom_pair_separator() {
    assert_eq!(
      NavigationState::new("fooview/foo=bar&baz")
        .parameter_map_with(&Separators::with_pair("a")),
      map(&[("foo", "b"), ("r&b", ""), ("z", "")])
    );
    assert_eq!(
      parse_parameters("a&b=c&d", &Separators::with_pair("b")),
      map(&[("a&", ""), ("", "c&d")])
    );
  }

  #[test]
  fn custom_key_value_separator() {
    let separators = Separators {
      pair: ";".to_string(),
      key_value: ":".to_string(),
    };
    assert_eq!(
      parse_parameters("a:1;b;;c:2:3", &separators),
      map(&[("a", "1"), ("b", ""), ("c", "2")])
    );
  }

  #[test]
  fn serializes_as_plain_string() {
    let state = NavigationState::new("admin/users");
    assert_eq!(serde_json::to_string(&state).unwrap(), "\"admin/users\"");
  }
}
