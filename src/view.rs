//! Views, the events they receive, and the displays that mount them.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::navigator::Navigator;
use crate::navigator::WeakNavigator;
use crate::state::NavigationState;
use crate::state::Separators;
use crate::Error;

/// A unit of UI content that the [`Navigator`] activates and deactivates.
///
/// Views are shared, so their hooks take `&self`; state that changes on
/// [`View::enter()`] lives behind a `Cell` or `RefCell`.
pub trait View {
  /// Called after the view has been mounted and made the active view.
  fn enter(&self, event: &ViewChangeEvent);

  /// Called when the navigator wants to leave this view.
  ///
  /// The transition only happens once [`BeforeLeaveEvent::navigate()`] is
  /// called, either from within this method or later. Returning without
  /// calling it postpones (or, if it is never called, cancels) the
  /// transition. The default implementation always allows leaving.
  fn before_leave(&self, event: BeforeLeaveEvent) {
    if let Err(e) = event.navigate() {
      tracing::error!(error = %e, "leaving view failed");
    }
  }
}

/// A shared reference to a [`View`].
pub type ViewHandle = Rc<dyn View>;

/// Returns whether `a` and `b` are the same view instance.
pub fn same_view(a: &ViewHandle, b: &ViewHandle) -> bool {
  Rc::ptr_eq(a, b)
}

/// A view that does nothing, handy as a placeholder or error view.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyView;

impl View for EmptyView {
  fn enter(&self, _: &ViewChangeEvent) {}
}

/// Describes a transition from one view to another.
///
/// The same event is passed to before-listeners, to the new view's
/// [`View::enter()`], and to after-listeners.
#[derive(Clone)]
pub struct ViewChangeEvent {
  navigator: WeakNavigator,
  old_view: Option<ViewHandle>,
  new_view: ViewHandle,
  view_name: String,
  parameters: String,
}

impl ViewChangeEvent {
  pub(crate) fn new(
    navigator: WeakNavigator,
    old_view: Option<ViewHandle>,
    new_view: ViewHandle,
    view_name: String,
    parameters: String,
  ) -> Self {
    Self {
      navigator,
      old_view,
      new_view,
      view_name,
      parameters,
    }
  }

  /// The navigator performing the transition, if it is still alive.
  pub fn navigator(&self) -> Option<Navigator> {
    self.navigator.upgrade()
  }

  /// The view being left; `None` on the first navigation.
  pub fn old_view(&self) -> Option<&ViewHandle> {
    self.old_view.as_ref()
  }

  /// The view being entered.
  pub fn new_view(&self) -> &ViewHandle {
    &self.new_view
  }

  /// The name the new view was resolved under.
  pub fn view_name(&self) -> &str {
    &self.view_name
  }

  /// Everything after `view_name/` in the requested state.
  pub fn parameters(&self) -> &str {
    &self.parameters
  }

  /// The navigation state this transition leads to.
  pub fn navigation_state(&self) -> NavigationState {
    NavigationState::compose(&self.view_name, &self.parameters)
  }

  /// Decodes [`ViewChangeEvent::parameters()`] with the default separators.
  pub fn parameter_map(&self) -> HashMap<String, String> {
    self.parameter_map_with(&Separators::default())
  }

  /// Decodes [`ViewChangeEvent::parameters()`] with custom separators.
  pub fn parameter_map_with(
    &self,
    separators: &Separators,
  ) -> HashMap<String, String> {
    crate::state::parse_parameters(&self.parameters, separators)
  }
}

impl fmt::Debug for ViewChangeEvent {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("ViewChangeEvent")
      .field("view_name", &self.view_name)
      .field("parameters", &self.parameters)
      .field("has_old_view", &self.old_view.is_some())
      .finish()
  }
}

/// The work a leave confirmation gates.
pub(crate) type LeaveAction = Box<dyn FnOnce() -> Result<(), Error>>;

enum Leave {
  Pending(LeaveAction),
  Running,
  Navigated,
  Denied,
}

struct LeaveShared {
  leave: RefCell<Leave>,
  // Set while the navigator is still inside `View::before_leave`.
  in_before_leave: Cell<bool>,
  // Serial of the navigation waiting on this event, if any.
  navigation: Option<u64>,
  // Failure of an action run from inside `View::before_leave`, reported by
  // the navigator rather than by `navigate()`.
  deferred_error: RefCell<Option<Error>>,
}

/// A single-use permission to leave the current view.
///
/// Cloning the event does not duplicate the permission: whichever clone calls
/// [`BeforeLeaveEvent::navigate()`] first runs the pending action.
#[derive(Clone)]
pub struct BeforeLeaveEvent {
  navigator: WeakNavigator,
  shared: Rc<LeaveShared>,
}

impl BeforeLeaveEvent {
  pub(crate) fn new(
    navigator: WeakNavigator,
    action: LeaveAction,
    navigation: Option<u64>,
  ) -> Self {
    Self {
      navigator,
      shared: Rc::new(LeaveShared {
        leave: RefCell::new(Leave::Pending(action)),
        in_before_leave: Cell::new(true),
        navigation,
        deferred_error: RefCell::new(None),
      }),
    }
  }

  /// The navigator asking for confirmation, if it is still alive.
  pub fn navigator(&self) -> Option<Navigator> {
    self.navigator.upgrade()
  }

  /// Confirms leaving the view and runs the pending action.
  ///
  /// May be called from within [`View::before_leave()`] or at any later
  /// point. Calling it a second time, or after [`BeforeLeaveEvent::deny()`],
  /// is a programming error and returns [`Error::LeaveAlreadyConfirmed`].
  pub fn navigate(&self) -> Result<(), Error> {
    let action = {
      let mut leave = self.shared.leave.borrow_mut();
      match std::mem::replace(&mut *leave, Leave::Running) {
        Leave::Pending(action) => action,
        other => {
          *leave = other;
          return Err(Error::LeaveAlreadyConfirmed);
        }
      }
    };

    let result = action();
    *self.shared.leave.borrow_mut() = Leave::Navigated;

    match result {
      Err(e) if self.shared.in_before_leave.get() => {
        *self.shared.deferred_error.borrow_mut() = Some(e);
        Ok(())
      }
      result => result,
    }
  }

  /// Refuses to leave the view.
  ///
  /// Equivalent to never calling [`BeforeLeaveEvent::navigate()`], but makes
  /// any later call to it fail.
  pub fn deny(&self) {
    let denied = {
      let mut leave = self.shared.leave.borrow_mut();
      match &*leave {
        Leave::Pending(_) => {
          *leave = Leave::Denied;
          true
        }
        _ => false,
      }
    };

    // A refusal after `View::before_leave` returned ends the wait here.
    if !denied || self.shared.in_before_leave.get() {
      return;
    }
    if let (Some(serial), Some(navigator)) =
      (self.shared.navigation, self.navigator.upgrade())
    {
      navigator.leave_denied(serial);
    }
  }

  /// Whether [`BeforeLeaveEvent::navigate()`] has been called.
  pub fn is_navigate_run(&self) -> bool {
    matches!(
      &*self.shared.leave.borrow(),
      Leave::Running | Leave::Navigated
    )
  }

  /// Whether the permission is still unused.
  pub fn is_pending(&self) -> bool {
    matches!(&*self.shared.leave.borrow(), Leave::Pending(_))
  }

  /// Marks the end of `View::before_leave`, returning the error of an action
  /// that ran inside it.
  pub(crate) fn finish_before_leave(&self) -> Result<(), Error> {
    self.shared.in_before_leave.set(false);
    match self.shared.deferred_error.borrow_mut().take() {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }
}

impl fmt::Debug for BeforeLeaveEvent {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let leave = match &*self.shared.leave.borrow() {
      Leave::Pending(_) => "pending",
      Leave::Running => "running",
      Leave::Navigated => "navigated",
      Leave::Denied => "denied",
    };
    f.debug_struct("BeforeLeaveEvent")
      .field("leave", &leave)
      .finish()
  }
}

/// Mounts the root of the active view into the page.
pub trait ViewDisplay {
  /// Replaces whatever is displayed with `view`.
  fn show_view(&self, view: &ViewHandle);
}

/// A [`ViewDisplay`] that keeps exactly one mounted view.
#[derive(Default)]
pub struct SingleViewDisplay {
  content: RefCell<Option<ViewHandle>>,
  mounts: Cell<usize>,
}

impl SingleViewDisplay {
  /// Creates an empty display.
  pub fn new() -> Self {
    Self::default()
  }

  /// The currently mounted view.
  pub fn content(&self) -> Option<ViewHandle> {
    self.content.borrow().clone()
  }

  /// How many times a view has been mounted.
  pub fn mount_count(&self) -> usize {
    self.mounts.get()
  }
}

impl ViewDisplay for SingleViewDisplay {
  fn show_view(&self, view: &ViewHandle) {
    *self.content.borrow_mut() = Some(Rc::clone(view));
    self.mounts.set(self.mounts.get() + 1);
  }
}
