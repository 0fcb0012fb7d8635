//! The browser location surface.
//!
//! A [`Page`] stands in for the browser page an application runs in: it has a
//! current location, a session history that can be walked back and forward,
//! and listeners for fragment changes and popstate events. The navigation
//! state managers read and write navigation state through it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::registration::ListenerList;
use crate::registration::Registration;
use crate::Error;

type FragmentListener = dyn Fn(Option<&str>);
type PopstateListener = dyn Fn(&Url);

/// A browser page with a location and a session history.
///
/// `Page` is a cheap handle; clones refer to the same page.
#[derive(Clone)]
pub struct Page {
  inner: Rc<PageInner>,
}

struct PageInner {
  history: RefCell<History>,
  fragment_listeners: Rc<ListenerList<FragmentListener>>,
  popstate_listeners: Rc<ListenerList<PopstateListener>>,
}

struct History {
  entries: Vec<Url>,
  current: usize,
}

impl Page {
  /// Creates a page showing `location`.
  pub fn new(location: Url) -> Self {
    Self::with_history(vec![location])
  }

  /// Creates a page showing the absolute URL `location`.
  pub fn parse(location: &str) -> Result<Self, Error> {
    Ok(Self::new(Url::parse(location)?))
  }

  /// Creates a page that has no location yet.
  pub fn without_location() -> Self {
    Self::with_history(Vec::new())
  }

  fn with_history(entries: Vec<Url>) -> Self {
    Self {
      inner: Rc::new(PageInner {
        history: RefCell::new(History {
          entries,
          current: 0,
        }),
        fragment_listeners: ListenerList::new(),
        popstate_listeners: ListenerList::new(),
      }),
    }
  }

  /// The current location.
  pub fn location(&self) -> Result<Url, Error> {
    let history = self.inner.history.borrow();
    history
      .entries
      .get(history.current)
      .cloned()
      .ok_or(Error::NoLocation)
  }

  /// The fragment of the current location, without the `#`.
  pub fn uri_fragment(&self) -> Result<Option<String>, Error> {
    Ok(self.location()?.fragment().map(str::to_string))
  }

  /// Changes the fragment of the current location, adding a history entry.
  ///
  /// Setting the fragment it already has does nothing. Fragment listeners are
  /// only notified if `fire_events` is set.
  pub fn set_uri_fragment(
    &self,
    fragment: &str,
    fire_events: bool,
  ) -> Result<(), Error> {
    let mut location = self.location()?;
    if location.fragment() == Some(fragment) {
      return Ok(());
    }

    location.set_fragment(Some(fragment));
    let fragment = location.fragment().map(str::to_string);
    self.push_entry(location);

    if fire_events {
      self.fire_fragment_changed(fragment.as_deref());
    }
    Ok(())
  }

  /// Adds a history entry for `uri`, resolved against the current location.
  ///
  /// No events fire, mirroring `history.pushState()`.
  pub fn push_state(&self, uri: &str) -> Result<(), Error> {
    let location = self.location()?.join(uri)?;
    tracing::trace!(location = %location, "push state");
    self.push_entry(location);
    Ok(())
  }

  /// Replaces the current history entry with `uri`, resolved against the
  /// current location. No events fire.
  pub fn replace_state(&self, uri: &str) -> Result<(), Error> {
    let location = self.location()?.join(uri)?;
    let mut history = self.inner.history.borrow_mut();
    let current = history.current;
    history.entries[current] = location;
    Ok(())
  }

  /// Moves to `uri` the way a user typing into the address bar would.
  ///
  /// `uri` is resolved against the current location, or parsed as an absolute
  /// URL if there is none. Fragment listeners fire if `fire_events` is set
  /// and the fragment changed; popstate listeners fire if `fire_popstate` is
  /// set.
  pub fn update_location(
    &self,
    uri: &str,
    fire_events: bool,
    fire_popstate: bool,
  ) -> Result<(), Error> {
    let (location, old_fragment) = match self.location() {
      Ok(base) => (base.join(uri)?, base.fragment().map(str::to_string)),
      Err(_) => (Url::parse(uri)?, None),
    };
    self.push_entry(location.clone());
    self.notify(&location, old_fragment.as_deref(), fire_events, fire_popstate);
    Ok(())
  }

  /// Goes one step back in history, like the browser's back button.
  ///
  /// Returns whether there was anywhere to go.
  pub fn back(&self) -> bool {
    self.go(-1)
  }

  /// Goes one step forward in history.
  pub fn forward(&self) -> bool {
    self.go(1)
  }

  /// Moves `delta` steps through history, clamped to the available entries.
  ///
  /// Popstate listeners always fire when the entry changes; fragment
  /// listeners fire when the fragment differs too.
  pub fn go(&self, delta: isize) -> bool {
    let (location, old_fragment) = {
      let mut history = self.inner.history.borrow_mut();
      if history.entries.is_empty() {
        return false;
      }
      let old = history.current;
      let new = ((old as isize).saturating_add(delta).max(0) as usize)
        .min(history.entries.len() - 1);
      if new == old {
        return false;
      }
      history.current = new;
      (
        history.entries[new].clone(),
        history.entries[old].fragment().map(str::to_string),
      )
    };

    tracing::trace!(location = %location, delta, "history traversal");
    self.notify(&location, old_fragment.as_deref(), true, true);
    true
  }

  /// Whether [`Page::back()`] would move.
  pub fn can_go_back(&self) -> bool {
    self.inner.history.borrow().current > 0
  }

  /// Whether [`Page::forward()`] would move.
  pub fn can_go_forward(&self) -> bool {
    let history = self.inner.history.borrow();
    history.current + 1 < history.entries.len()
  }

  /// All history entries, oldest first.
  pub fn history(&self) -> Vec<Url> {
    self.inner.history.borrow().entries.clone()
  }

  /// Index of the current entry in [`Page::history()`].
  pub fn history_index(&self) -> usize {
    self.inner.history.borrow().current
  }

  /// Calls `listener` with the new fragment whenever it changes through an
  /// event-firing operation.
  pub fn add_uri_fragment_listener(
    &self,
    listener: impl Fn(Option<&str>) + 'static,
  ) -> Registration {
    let listener: Rc<FragmentListener> = Rc::new(listener);
    self.inner.fragment_listeners.add(listener)
  }

  /// Calls `listener` with the new location on every popstate event.
  pub fn add_popstate_listener(
    &self,
    listener: impl Fn(&Url) + 'static,
  ) -> Registration {
    let listener: Rc<PopstateListener> = Rc::new(listener);
    self.inner.popstate_listeners.add(listener)
  }

  /// Number of fragment and popstate listeners currently attached.
  pub fn listener_count(&self) -> usize {
    self.inner.fragment_listeners.len() + self.inner.popstate_listeners.len()
  }

  fn push_entry(&self, location: Url) {
    let mut history = self.inner.history.borrow_mut();
    let keep = history.current + 1;
    history.entries.truncate(keep);
    history.entries.push(location);
    history.current = history.entries.len() - 1;
  }

  fn notify(
    &self,
    location: &Url,
    old_fragment: Option<&str>,
    fire_events: bool,
    fire_popstate: bool,
  ) {
    if fire_popstate {
      for listener in self.inner.popstate_listeners.snapshot() {
        listener(location);
      }
    }
    if fire_events && location.fragment() != old_fragment {
      self.fire_fragment_changed(location.fragment());
    }
  }

  fn fire_fragment_changed(&self, fragment: Option<&str>) {
    for listener in self.inner.fragment_listeners.snapshot() {
      listener(fragment);
    }
  }
}

impl fmt::Debug for Page {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let history = self.inner.history.borrow();
    f.debug_struct("Page")
      .field("location", &history.entries.get(history.current))
      .field("history_len", &history.entries.len())
      .finish()
  }
}
