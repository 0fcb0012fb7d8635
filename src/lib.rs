//! `navigator` switches the views of a single-page UI in response to
//! navigation states.
//!
//! A navigation state is a string of the form `view-name[/parameters]`. The
//! [`Navigator`] resolves it to a registered [`View`] through its
//! [`ViewRegistry`], asks the current view and any [`ViewChangeListener`]s
//! for permission, mounts the new view through a [`ViewDisplay`], and keeps
//! the state in sync with the page URL through a [`NavigationStateManager`].
//!
//! ```
//! use std::rc::Rc;
//!
//! use navigator::EmptyView;
//! use navigator::MemoryStateManager;
//! use navigator::Navigator;
//!
//! let navigator = Navigator::new(Rc::new(MemoryStateManager::new()), None);
//! navigator.add_view("home", Rc::new(EmptyView));
//! navigator.add_view("admin", Rc::new(EmptyView));
//!
//! navigator.navigate_to("admin/tab=users").unwrap();
//! assert_eq!(navigator.current_view_name().as_deref(), Some("admin"));
//! assert_eq!(navigator.state().unwrap(), "admin/tab=users");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod manager;
pub mod navigator;
pub mod page;
pub mod registration;
pub mod registry;
pub mod state;
pub mod view;

pub use config::Config;
pub use config::StateStrategy;
pub use error::Error;
pub use manager::MemoryStateManager;
pub use manager::NavigationStateManager;
pub use manager::PushStateManager;
pub use manager::UriFragmentManager;
pub use navigator::Navigator;
pub use navigator::TransitionPhase;
pub use navigator::ViewChangeListener;
pub use navigator::WeakNavigator;
pub use page::Page;
pub use registration::Registration;
pub use registry::Resolution;
pub use registry::ViewFactory;
pub use registry::ViewProvider;
pub use registry::ViewRegistry;
pub use registry::ViewSource;
pub use state::parse_parameters;
pub use state::NavigationState;
pub use state::Separators;
pub use view::BeforeLeaveEvent;
pub use view::EmptyView;
pub use view::SingleViewDisplay;
pub use view::View;
pub use view::ViewChangeEvent;
pub use view::ViewDisplay;
pub use view::ViewHandle;
