//! Recording views and displays shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use navigator::view::same_view;
use navigator::BeforeLeaveEvent;
use navigator::Navigator;
use navigator::View;
use navigator::ViewChangeEvent;
use navigator::ViewDisplay;
use navigator::ViewHandle;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
  Rc::default()
}

pub fn entries(log: &Log) -> Vec<String> {
  log.borrow().clone()
}

pub fn push(log: &Log, entry: impl Into<String>) {
  log.borrow_mut().push(entry.into());
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeavePolicy {
  Allow,
  Deny,
  Defer,
}

/// A view that writes `enter`/`leave` lines to a shared log.
pub struct TestView {
  name: String,
  log: Log,
  leave: Cell<LeavePolicy>,
  deferred: RefCell<Option<BeforeLeaveEvent>>,
  entered: Cell<usize>,
  parameters: RefCell<Option<String>>,
}

impl TestView {
  pub fn new(name: &str, log: &Log) -> Rc<Self> {
    Self::with_leave(name, log, LeavePolicy::Allow)
  }

  pub fn with_leave(name: &str, log: &Log, leave: LeavePolicy) -> Rc<Self> {
    Rc::new(Self {
      name: name.to_string(),
      log: Rc::clone(log),
      leave: Cell::new(leave),
      deferred: RefCell::new(None),
      entered: Cell::new(0),
      parameters: RefCell::new(None),
    })
  }

  pub fn set_leave(&self, leave: LeavePolicy) {
    self.leave.set(leave);
  }

  /// The confirmation held back by [`LeavePolicy::Defer`].
  pub fn take_deferred(&self) -> Option<BeforeLeaveEvent> {
    self.deferred.borrow_mut().take()
  }

  pub fn enter_count(&self) -> usize {
    self.entered.get()
  }

  pub fn last_parameters(&self) -> Option<String> {
    self.parameters.borrow().clone()
  }
}

impl View for TestView {
  fn enter(&self, event: &ViewChangeEvent) {
    self.entered.set(self.entered.get() + 1);
    *self.parameters.borrow_mut() = Some(event.parameters().to_string());
    push(
      &self.log,
      format!("enter {} [{}]", self.name, event.parameters()),
    );
  }

  fn before_leave(&self, event: BeforeLeaveEvent) {
    push(&self.log, format!("leave {}", self.name));
    match self.leave.get() {
      LeavePolicy::Allow => event.navigate().unwrap(),
      LeavePolicy::Deny => event.deny(),
      LeavePolicy::Defer => *self.deferred.borrow_mut() = Some(event),
    }
  }
}

/// A display that logs every mount.
pub struct LogDisplay {
  log: Log,
}

impl LogDisplay {
  pub fn new(log: &Log) -> Rc<Self> {
    Rc::new(Self {
      log: Rc::clone(log),
    })
  }
}

impl ViewDisplay for LogDisplay {
  fn show_view(&self, _: &ViewHandle) {
    push(&self.log, "show");
  }
}

pub fn is_current(navigator: &Navigator, view: &Rc<TestView>) -> bool {
  let view: ViewHandle = view.clone();
  navigator
    .current_view()
    .map_or(false, |current| same_view(&current, &view))
}
