//! Listener lists and the handles that detach listeners from them.

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A handle for removing a previously added listener.
///
/// Dropping the handle leaves the listener in place; call
/// [`Registration::remove()`] to detach it.
pub struct Registration {
  remove: Option<Box<dyn FnOnce()>>,
}

impl Registration {
  pub(crate) fn new(remove: impl FnOnce() + 'static) -> Self {
    Self {
      remove: Some(Box::new(remove)),
    }
  }

  /// Detaches the listener this handle was returned for.
  ///
  /// Removing a listener from a list that no longer exists is a no-op.
  pub fn remove(mut self) {
    if let Some(remove) = self.remove.take() {
      remove()
    }
  }
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Registration")
      .field("active", &self.remove.is_some())
      .finish()
  }
}

/// An ordered list of listeners, shared between its owner and the
/// [`Registration`]s it hands out.
pub(crate) struct ListenerList<L: ?Sized> {
  entries: RefCell<Vec<(u64, Rc<L>)>>,
  next_id: Cell<u64>,
}

impl<L: ?Sized + 'static> ListenerList<L> {
  pub fn new() -> Rc<Self> {
    Rc::new(Self {
      entries: RefCell::new(Vec::new()),
      next_id: Cell::new(0),
    })
  }

  /// Appends `listener`, returning a handle that removes it again.
  pub fn add(self: &Rc<Self>, listener: Rc<L>) -> Registration {
    let id = self.next_id.get();
    self.next_id.set(id + 1);
    self.entries.borrow_mut().push((id, listener));

    let list = Rc::downgrade(self);
    Registration::new(move || {
      if let Some(list) = list.upgrade() {
        list.entries.borrow_mut().retain(|&(i, _)| i != id);
      }
    })
  }

  /// Returns the listeners as they are right now.
  ///
  /// Callers iterate over the snapshot, so listeners may add or remove
  /// listeners while being notified.
  pub fn snapshot(&self) -> Vec<Rc<L>> {
    self
      .entries
      .borrow()
      .iter()
      .map(|(_, l)| Rc::clone(l))
      .collect()
  }

  pub fn len(&self) -> usize {
    self.entries.borrow().len()
  }
}
