//! The navigation controller.
//!
//! [`Navigator::navigate_to()`] resolves a state through the [`ViewRegistry`]
//! and runs the transition protocol:
//!
//! 1. The current view is asked for permission to leave
//!    ([`View::before_leave()`]). It may answer later.
//! 2. Before-listeners are asked in registration order; the first one to
//!    refuse stops the transition.
//! 3. The new state is persisted through the [`NavigationStateManager`], the
//!    view is mounted through the [`ViewDisplay`], it becomes the current view,
//!    and its [`View::enter()`] runs.
//! 4. After-listeners are notified in registration order.
//!
//! A refusal in step 1 or 2 writes the previously recorded state back to the
//! state manager, which undoes the URL change that a back-button press has
//! already made by the time the navigator hears of it.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::rc::Weak;

use crate::config::Config;
use crate::manager::NavigationStateManager;
use crate::page::Page;
use crate::registration::ListenerList;
use crate::registration::Registration;
use crate::registry::split_parameters;
use crate::registry::Entry;
use crate::registry::ViewProvider;
use crate::registry::ViewRegistry;
use crate::state::NavigationState;
use crate::state::Separators;
use crate::view::same_view;
use crate::view::BeforeLeaveEvent;
use crate::view::LeaveAction;
use crate::view::View;
use crate::view::ViewChangeEvent;
use crate::view::ViewDisplay;
use crate::view::ViewHandle;
use crate::Error;

/// Observes, and may veto, view changes.
pub trait ViewChangeListener {
  /// Called before a view change; returning `false` cancels it.
  fn before_view_change(&self, event: &ViewChangeEvent) -> bool {
    let _ = event;
    true
  }

  /// Called after a view change has completed.
  fn after_view_change(&self, event: &ViewChangeEvent) {
    let _ = event;
  }
}

struct BeforeFn<F>(F);

impl<F: Fn(&ViewChangeEvent) -> bool> ViewChangeListener for BeforeFn<F> {
  fn before_view_change(&self, event: &ViewChangeEvent) -> bool {
    (self.0)(event)
  }
}

struct AfterFn<F>(F);

impl<F: Fn(&ViewChangeEvent)> ViewChangeListener for AfterFn<F> {
  fn after_view_change(&self, event: &ViewChangeEvent) {
    (self.0)(event)
  }
}

/// Where the navigator is in the transition protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
  /// No transition in progress.
  Idle,
  /// Waiting for the current view to allow leaving; may last arbitrarily
  /// long if the view postpones its answer.
  AwaitingLeaveConfirmation,
  /// Asking before-listeners.
  AwaitingBeforeListeners,
  /// Persisting state, mounting and entering the new view.
  Committing,
}

/// How the current view answered a leave confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Leave {
  Confirmed,
  Postponed,
  Denied,
}

/// The view the navigator believes is on screen.
struct ActiveView {
  view: ViewHandle,
  entry: Rc<Entry>,
  view_name: String,
}

/// A resolved navigation target, carried through leave confirmation.
struct Target {
  entry: Rc<Entry>,
  view: ViewHandle,
  view_name: String,
  parameters: String,
  state: String,
}

struct Inner {
  registry: RefCell<ViewRegistry>,
  manager: Rc<dyn NavigationStateManager>,
  display: Option<Rc<dyn ViewDisplay>>,
  current: RefCell<Option<ActiveView>>,
  current_state: RefCell<Option<String>>,
  listeners: Rc<ListenerList<dyn ViewChangeListener>>,
  phase: Cell<TransitionPhase>,
  // Bumped for every navigation that asks the current view to leave.
  leave_serial: Cell<u64>,
  separators: Separators,
}

/// Switches between registered views in response to navigation states.
///
/// `Navigator` is a cheap handle; clones control the same navigation scope.
/// It is single-threaded, and every callback it makes (views, listeners,
/// providers, the display, the state manager) may call back into it.
#[derive(Clone)]
pub struct Navigator {
  inner: Rc<Inner>,
}

/// A non-owning [`Navigator`] handle.
#[derive(Clone, Default)]
pub struct WeakNavigator {
  inner: Weak<Inner>,
}

impl WeakNavigator {
  /// Returns the navigator, unless it has been dropped.
  pub fn upgrade(&self) -> Option<Navigator> {
    self.inner.upgrade().map(|inner| Navigator { inner })
  }
}

impl fmt::Debug for WeakNavigator {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("WeakNavigator")
      .field("alive", &(self.inner.strong_count() > 0))
      .finish()
  }
}

impl Navigator {
  /// Creates a navigator that keeps its state in `manager` and mounts views
  /// into `display`, and binds `manager` to it.
  pub fn new(
    manager: Rc<dyn NavigationStateManager>,
    display: Option<Rc<dyn ViewDisplay>>,
  ) -> Self {
    Self::with_separators(manager, display, Separators::default())
  }

  /// Creates a navigator for `page` as described by `config`.
  ///
  /// Fails if the configured state strategy cannot work with `page`.
  pub fn with_config(
    page: &Page,
    config: &Config,
    display: Option<Rc<dyn ViewDisplay>>,
  ) -> Result<Self, Error> {
    let manager = config.state_manager(page)?;
    Ok(Self::with_separators(
      manager,
      display,
      config.separators.clone(),
    ))
  }

  fn with_separators(
    manager: Rc<dyn NavigationStateManager>,
    display: Option<Rc<dyn ViewDisplay>>,
    separators: Separators,
  ) -> Self {
    let navigator = Self {
      inner: Rc::new(Inner {
        registry: RefCell::new(ViewRegistry::new()),
        manager,
        display,
        current: RefCell::new(None),
        current_state: RefCell::new(None),
        listeners: ListenerList::new(),
        phase: Cell::new(TransitionPhase::Idle),
        leave_serial: Cell::new(0),
        separators,
      }),
    };
    navigator.inner.manager.bind(navigator.downgrade());
    navigator
  }

  /// Returns a non-owning handle to this navigator.
  pub fn downgrade(&self) -> WeakNavigator {
    WeakNavigator {
      inner: Rc::downgrade(&self.inner),
    }
  }

  /// Detaches the state manager, so external state changes no longer reach
  /// this navigator.
  pub fn destroy(&self) {
    self.inner.manager.unbind();
  }

  /// Navigates to `state`.
  ///
  /// Fails with [`Error::UnknownState`] if no registration claims `state` and
  /// no error view is registered; the current view is left untouched then.
  /// A transition refused by the current view or a listener is not an error.
  ///
  /// Navigating to the state that is already active does not re-enter the
  /// view; it only makes sure the state manager agrees with the navigator.
  pub fn navigate_to(&self, state: &str) -> Result<(), Error> {
    let target = self.resolve_target(state)?;

    let is_current = {
      let current = self.inner.current.borrow();
      let current_state = self.inner.current_state.borrow();
      match (&*current, &*current_state) {
        (Some(active), Some(recorded)) => {
          same_view(&active.view, &target.view) && *recorded == target.state
        }
        _ => false,
      }
    };

    if is_current {
      tracing::trace!(state, "already active, reconciling state only");
      return self.update_navigation_state(&target.state);
    }

    tracing::debug!(
      state,
      view = %target.view_name,
      parameters = %target.parameters,
      "navigating",
    );
    self.navigate_to_target(target)
  }

  /// Finds the registration for `state` and its view, reusing the current
  /// view if the same registration claims the same state again.
  fn resolve_target(&self, state: &str) -> Result<Target, Error> {
    // Collected up front so that no borrow is held while factories and
    // providers run.
    let claims = {
      let registry = self.inner.registry.borrow();
      registry
        .longest_claim(state)
        .into_iter()
        .chain(registry.error_claim(state))
        .collect::<Vec<_>>()
    };

    for claim in claims {
      let (target_state, parameters) =
        split_parameters(state, &claim.view_name);

      let reused = {
        let current = self.inner.current.borrow();
        let current_state = self.inner.current_state.borrow();
        match (&*current, &*current_state) {
          (Some(active), Some(recorded))
            if claim.entry.is_stable()
              && Rc::ptr_eq(&active.entry, &claim.entry)
              && *recorded == target_state =>
          {
            Some(Rc::clone(&active.view))
          }
          _ => None,
        }
      };

      let view = reused.or_else(|| claim.entry.instantiate(&claim.view_name));
      let view = match view {
        Some(view) => view,
        None => continue,
      };

      return Ok(Target {
        entry: claim.entry,
        view,
        view_name: claim.view_name,
        parameters,
        state: target_state,
      });
    }

    Err(Error::UnknownState(state.to_string()))
  }

  fn navigate_to_target(&self, target: Target) -> Result<(), Error> {
    let this = self.downgrade();
    self.set_phase(TransitionPhase::AwaitingLeaveConfirmation);
    let action = Box::new(move || match this.upgrade() {
      Some(navigator) => navigator.perform_navigate_to(target),
      None => Ok(()),
    });
    let result = self.confirm_leave(action, true);

    // A postponed confirmation keeps the phase until it is answered.
    let postponed = matches!(result, Ok(Leave::Postponed));
    if !postponed && self.phase() == TransitionPhase::AwaitingLeaveConfirmation
    {
      self.set_phase(TransitionPhase::Idle);
    }
    result.map(drop)
  }

  /// Runs `action` once the current view allows leaving it.
  ///
  /// No view change listeners are involved, and the current view stays
  /// active; this gates arbitrary work (closing a window, logging out)
  /// behind the same confirmation a navigation would need. If the view
  /// postpones its answer, the recorded navigation state is written back to
  /// the state manager and `action` runs whenever the view confirms.
  pub fn run_after_leave_confirmation(
    &self,
    action: impl FnOnce() -> Result<(), Error> + 'static,
  ) -> Result<(), Error> {
    self.confirm_leave(Box::new(action), false).map(drop)
  }

  fn confirm_leave(
    &self,
    action: LeaveAction,
    gates_navigation: bool,
  ) -> Result<Leave, Error> {
    let view = match self.current_view() {
      Some(view) => view,
      None => return action().map(|()| Leave::Confirmed),
    };

    let navigation = gates_navigation.then(|| {
      let serial = self.inner.leave_serial.get() + 1;
      self.inner.leave_serial.set(serial);
      serial
    });
    let event = BeforeLeaveEvent::new(self.downgrade(), action, navigation);
    view.before_leave(event.clone());
    event.finish_before_leave()?;

    if event.is_navigate_run() {
      return Ok(Leave::Confirmed);
    }

    tracing::debug!("leave not confirmed, reverting navigation state");
    self.revert_navigation()?;
    if event.is_pending() {
      Ok(Leave::Postponed)
    } else {
      Ok(Leave::Denied)
    }
  }

  /// A postponed leave confirmation was refused after all.
  pub(crate) fn leave_denied(&self, serial: u64) {
    if self.phase() == TransitionPhase::AwaitingLeaveConfirmation
      && self.inner.leave_serial.get() == serial
    {
      tracing::debug!("postponed leave refused");
      self.set_phase(TransitionPhase::Idle);
    }
  }

  fn perform_navigate_to(&self, target: Target) -> Result<(), Error> {
    let old_view = self.current_view();
    let event = ViewChangeEvent::new(
      self.downgrade(),
      old_view,
      Rc::clone(&target.view),
      target.view_name.clone(),
      target.parameters.clone(),
    );

    self.set_phase(TransitionPhase::AwaitingBeforeListeners);
    if !self.fire_before_view_change(&event) {
      tracing::debug!(view = %target.view_name, "view change vetoed");
      self.set_phase(TransitionPhase::Idle);
      return self.revert_navigation();
    }

    self.set_phase(TransitionPhase::Committing);
    let result = self.commit(target, &event);
    self.set_phase(TransitionPhase::Idle);
    result?;

    self.fire_after_view_change(&event);
    Ok(())
  }

  fn commit(
    &self,
    target: Target,
    event: &ViewChangeEvent,
  ) -> Result<(), Error> {
    self.update_navigation_state(&target.state)?;

    if let Some(display) = &self.inner.display {
      display.show_view(&target.view);
    }

    *self.inner.current.borrow_mut() = Some(ActiveView {
      view: Rc::clone(&target.view),
      entry: target.entry,
      view_name: target.view_name,
    });

    target.view.enter(event);
    Ok(())
  }

  /// Writes `state` to the state manager unless it already reports it, and
  /// records it as the active state.
  fn update_navigation_state(&self, state: &str) -> Result<(), Error> {
    if self.inner.manager.state()? != state {
      self.inner.manager.set_state(state)?;
    }
    *self.inner.current_state.borrow_mut() = Some(state.to_string());
    Ok(())
  }

  /// Restores the recorded state in the state manager.
  fn revert_navigation(&self) -> Result<(), Error> {
    let recorded = self.inner.current_state.borrow().clone();
    if let Some(state) = recorded {
      if self.inner.manager.state()? != state {
        tracing::warn!(state = %state, "reverting navigation state");
        self.inner.manager.set_state(&state)?;
      }
    }
    Ok(())
  }

  fn fire_before_view_change(&self, event: &ViewChangeEvent) -> bool {
    self
      .inner
      .listeners
      .snapshot()
      .iter()
      .all(|l| l.before_view_change(event))
  }

  fn fire_after_view_change(&self, event: &ViewChangeEvent) {
    for l in self.inner.listeners.snapshot() {
      l.after_view_change(event);
    }
  }

  fn set_phase(&self, phase: TransitionPhase) {
    self.inner.phase.set(phase);
  }

  /// Where the navigator is in the transition protocol.
  pub fn phase(&self) -> TransitionPhase {
    self.inner.phase.get()
  }

  /// The active view, if any navigation has completed yet.
  pub fn current_view(&self) -> Option<ViewHandle> {
    self
      .inner
      .current
      .borrow()
      .as_ref()
      .map(|active| Rc::clone(&active.view))
  }

  /// The name the active view was resolved under.
  pub fn current_view_name(&self) -> Option<String> {
    self
      .inner
      .current
      .borrow()
      .as_ref()
      .map(|active| active.view_name.clone())
  }

  /// The navigation state recorded by the last successful navigation.
  pub fn active_navigation_state(&self) -> Option<String> {
    self.inner.current_state.borrow().clone()
  }

  /// The state as the state manager reports it right now.
  pub fn state(&self) -> Result<String, Error> {
    self.inner.manager.state()
  }

  /// The state manager this navigator is bound to.
  pub fn state_manager(&self) -> Rc<dyn NavigationStateManager> {
    Rc::clone(&self.inner.manager)
  }

  /// The display views are mounted into.
  pub fn display(&self) -> Option<Rc<dyn ViewDisplay>> {
    self.inner.display.clone()
  }

  /// Decodes the parameters of the state manager's current state, using the
  /// configured separators.
  ///
  /// The view name is taken to be everything before the first `/`.
  pub fn state_parameter_map(&self) -> Result<HashMap<String, String>, Error> {
    self.state_parameter_map_with(&self.inner.separators)
  }

  /// Like [`Navigator::state_parameter_map()`], with custom separators.
  pub fn state_parameter_map_with(
    &self,
    separators: &Separators,
  ) -> Result<HashMap<String, String>, Error> {
    Ok(NavigationState::new(self.state()?).parameter_map_with(separators))
  }

  /// Registers a listener for view changes.
  pub fn add_view_change_listener(
    &self,
    listener: Rc<dyn ViewChangeListener>,
  ) -> Registration {
    self.inner.listeners.add(listener)
  }

  /// Registers a closure that may veto view changes.
  pub fn on_before_view_change(
    &self,
    f: impl Fn(&ViewChangeEvent) -> bool + 'static,
  ) -> Registration {
    self.add_view_change_listener(Rc::new(BeforeFn(f)))
  }

  /// Registers a closure called after each completed view change.
  pub fn on_after_view_change(
    &self,
    f: impl Fn(&ViewChangeEvent) + 'static,
  ) -> Registration {
    self.add_view_change_listener(Rc::new(AfterFn(f)))
  }

  /// Registers `view` under `name`, replacing any view with that name.
  pub fn add_view(&self, name: impl Into<String>, view: Rc<dyn View>) {
    self.inner.registry.borrow_mut().add_view(name, view)
  }

  /// Registers a factory that builds the view for `name` on each navigation
  /// to it, replacing any view with that name.
  pub fn add_view_factory(
    &self,
    name: impl Into<String>,
    factory: impl Fn() -> ViewHandle + 'static,
  ) {
    self.inner.registry.borrow_mut().add_view_factory(name, factory)
  }

  /// Removes every view registered under `name`.
  pub fn remove_view(&self, name: &str) {
    self.inner.registry.borrow_mut().remove_view(name)
  }

  /// Appends a dynamic view provider.
  pub fn add_provider(&self, provider: Rc<dyn ViewProvider>) {
    self.inner.registry.borrow_mut().add_provider(provider)
  }

  /// Removes a provider previously passed to [`Navigator::add_provider()`].
  pub fn remove_provider(&self, provider: &Rc<dyn ViewProvider>) {
    self.inner.registry.borrow_mut().remove_provider(provider)
  }

  /// Shows `view` for every state nothing else claims.
  pub fn set_error_view(&self, view: Rc<dyn View>) {
    self.inner.registry.borrow_mut().set_error_view(view)
  }

  /// Builds a fresh error view for every state nothing else claims.
  pub fn set_error_view_factory(
    &self,
    factory: impl Fn() -> ViewHandle + 'static,
  ) {
    self.inner.registry.borrow_mut().set_error_view_factory(factory)
  }

  /// Consults `provider` for every state nothing else claims.
  pub fn set_error_provider(&self, provider: Option<Rc<dyn ViewProvider>>) {
    self.inner.registry.borrow_mut().set_error_provider(provider)
  }

  /// Resolves `state` without navigating; factories do run.
  pub fn view_for_state(&self, state: &str) -> Option<ViewHandle> {
    let claims = {
      let registry = self.inner.registry.borrow();
      registry
        .longest_claim(state)
        .into_iter()
        .chain(registry.error_claim(state))
        .collect::<Vec<_>>()
    };
    claims
      .into_iter()
      .find_map(|claim| claim.entry.instantiate(&claim.view_name))
  }

  /// Registered view names, in registration order.
  pub fn view_names(&self) -> Vec<String> {
    self
      .inner
      .registry
      .borrow()
      .view_names()
      .into_iter()
      .map(str::to_string)
      .collect()
  }
}

impl fmt::Debug for Navigator {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Navigator")
      .field("current_view_name", &self.current_view_name())
      .field("active_navigation_state", &self.active_navigation_state())
      .field("phase", &self.phase())
      .field("listeners", &self.inner.listeners.len())
      .field("registry", &*self.inner.registry.borrow())
      .finish()
  }
}
