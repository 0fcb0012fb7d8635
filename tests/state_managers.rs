mod common;

use std::rc::Rc;

use common::is_current;
use common::log;
use common::LeavePolicy;
use common::TestView;
use navigator::Config;
use navigator::Error;
use navigator::NavigationStateManager;
use navigator::Navigator;
use navigator::Page;
use navigator::PushStateManager;
use navigator::StateStrategy;
use navigator::UriFragmentManager;

fn fragment_navigator(page: &Page) -> Navigator {
  Navigator::new(Rc::new(UriFragmentManager::new(page.clone())), None)
}

#[test]
fn fragment_follows_navigation() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  navigator.add_view("home", TestView::new("home", &log));

  navigator.navigate_to("home").unwrap();
  assert_eq!(page.location().unwrap().as_str(), "http://server/app#!home");
  assert_eq!(navigator.state().unwrap(), "home");
}

#[test]
fn fragment_state_survives_url_escaping() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let search = TestView::new("search", &log);
  navigator.add_view("search", search.clone());
  navigator.add_view("home", TestView::new("home", &log));

  for state in [
    "search/q=a b",
    "search/q=what?#top",
    "search/rate=100%",
    "search/q=a%20b",
  ] {
    navigator.navigate_to(state).unwrap();
    assert_eq!(navigator.state().unwrap(), state);
    let entries = page.history().len();
    navigator.navigate_to(state).unwrap();
    navigator.navigate_to(state).unwrap();
    assert_eq!(page.history().len(), entries, "{}", state);
  }
  assert_eq!(
    page.uri_fragment().unwrap().as_deref(),
    Some("!search/q=a%2520b")
  );

  navigator.navigate_to("search/q=a b").unwrap();
  navigator.navigate_to("home").unwrap();
  let entered = search.enter_count();
  assert!(page.back());
  assert!(is_current(&navigator, &search));
  assert_eq!(search.enter_count(), entered + 1);
  assert_eq!(search.last_parameters().as_deref(), Some("q=a b"));
}

#[test]
fn address_bar_escapes_are_decoded() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let search = TestView::new("search", &log);
  navigator.add_view("search", search.clone());

  page.update_location("#!search/q=a b", true, false).unwrap();
  assert!(is_current(&navigator, &search));
  assert_eq!(search.last_parameters().as_deref(), Some("q=a b"));
  assert_eq!(navigator.state().unwrap(), "search/q=a b");
}

#[test]
fn foreign_fragment_reads_as_empty_state() {
  let page = Page::parse("http://server/app#section-2").unwrap();
  let manager = UriFragmentManager::new(page);
  assert_eq!(manager.state().unwrap(), "");
}

#[test]
fn address_bar_and_back_button_navigate() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let home = TestView::new("home", &log);
  let admin = TestView::new("admin", &log);
  navigator.add_view("home", home.clone());
  navigator.add_view("admin", admin.clone());
  navigator.navigate_to("home").unwrap();

  page.update_location("#!admin/users", true, false).unwrap();
  assert!(is_current(&navigator, &admin));
  assert_eq!(admin.last_parameters().as_deref(), Some("users"));

  assert!(page.back());
  assert!(is_current(&navigator, &home));
  assert!(page.forward());
  assert!(is_current(&navigator, &admin));
  assert_eq!(home.enter_count(), 2);
}

#[test]
fn refused_back_navigation_restores_fragment() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let home = TestView::new("home", &log);
  let editor = TestView::with_leave("editor", &log, LeavePolicy::Deny);
  navigator.add_view("home", home);
  navigator.add_view("editor", editor.clone());
  navigator.navigate_to("home").unwrap();
  navigator.navigate_to("editor").unwrap();

  page.back();
  assert!(is_current(&navigator, &editor));
  assert_eq!(page.uri_fragment().unwrap().as_deref(), Some("!editor"));
  assert_eq!(navigator.state().unwrap(), "editor");
}

#[test]
fn vetoed_external_navigation_restores_state() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let a = TestView::new("viewA", &log);
  navigator.add_view("viewA", a.clone());
  navigator.add_view("viewB", TestView::new("viewB", &log));
  navigator.navigate_to("viewA").unwrap();
  navigator.on_before_view_change(|event| event.view_name() != "viewB");

  page.set_uri_fragment("!viewB", true).unwrap();
  assert!(is_current(&navigator, &a));
  assert_eq!(navigator.state().unwrap(), "viewA");
}

#[test]
fn unknown_external_state_is_ignored() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  let home = TestView::new("home", &log);
  navigator.add_view("home", home.clone());
  navigator.navigate_to("home").unwrap();

  page.set_uri_fragment("!nowhere", true).unwrap();
  assert!(is_current(&navigator, &home));
  assert_eq!(navigator.active_navigation_state().as_deref(), Some("home"));
}

#[test]
fn destroyed_navigator_stops_listening() {
  let page = Page::parse("http://server/app").unwrap();
  let navigator = fragment_navigator(&page);
  let log = log();
  navigator.add_view("home", TestView::new("home", &log));
  let admin = TestView::new("admin", &log);
  navigator.add_view("admin", admin.clone());
  navigator.navigate_to("home").unwrap();
  assert_eq!(page.listener_count(), 1);

  navigator.destroy();
  assert_eq!(page.listener_count(), 0);
  page.set_uri_fragment("!admin", true).unwrap();
  assert!(!is_current(&navigator, &admin));
}

#[test]
fn page_without_location_fails_navigation() {
  let page = Page::without_location();
  let navigator = fragment_navigator(&page);
  let log = log();
  navigator.add_view("home", TestView::new("home", &log));

  assert!(matches!(navigator.navigate_to("home"), Err(Error::NoLocation)));
  assert!(navigator.current_view().is_none());
}

#[test]
fn push_state_keeps_state_below_root() {
  let page = Page::parse("http://server/app").unwrap();
  let manager = Rc::new(PushStateManager::new(page.clone(), "/app/").unwrap());
  assert_eq!(manager.root_path(), "/app");
  let navigator = Navigator::new(manager, None);
  let log = log();
  let main = TestView::new("main", &log);
  let users = TestView::new("users", &log);
  navigator.add_view("", main.clone());
  navigator.add_view("admin/users", users.clone());

  navigator.navigate_to("").unwrap();
  navigator.navigate_to("admin/users/5").unwrap();
  assert_eq!(
    page.location().unwrap().as_str(),
    "http://server/app/admin/users/5"
  );
  assert_eq!(users.last_parameters().as_deref(), Some("5"));

  assert!(page.back());
  assert!(is_current(&navigator, &main));
  assert_eq!(navigator.state().unwrap(), "");
}

#[test]
fn push_state_escapes_url_delimiters() {
  let page = Page::parse("http://server/app").unwrap();
  let manager = Rc::new(PushStateManager::new(page.clone(), "/app").unwrap());
  let navigator = Navigator::new(manager, None);
  let log = log();
  let search = TestView::new("search", &log);
  navigator.add_view("", TestView::new("main", &log));
  navigator.add_view("search", search.clone());
  navigator.navigate_to("").unwrap();

  for state in ["search/what?x", "search/a b", "search/x#y", "search/100%"] {
    navigator.navigate_to(state).unwrap();
    assert_eq!(navigator.state().unwrap(), state);
    let entries = page.history().len();
    navigator.navigate_to(state).unwrap();
    assert_eq!(page.history().len(), entries, "{}", state);
  }
  assert_eq!(page.location().unwrap().path(), "/app/search/100%25");

  navigator.navigate_to("search/what?x").unwrap();
  assert_eq!(page.location().unwrap().path(), "/app/search/what%3Fx");
  assert_eq!(page.location().unwrap().query(), None);
  navigator.navigate_to("").unwrap();
  assert!(page.back());
  assert!(is_current(&navigator, &search));
  assert_eq!(search.last_parameters().as_deref(), Some("what?x"));
}

#[test]
fn push_state_outside_root_is_rejected() {
  let page = Page::parse("http://server/other/place").unwrap();
  assert!(matches!(
    PushStateManager::new(page, "/app"),
    Err(Error::OutsideRootPath { .. })
  ));
  assert!(matches!(
    PushStateManager::new(Page::without_location(), "/app"),
    Err(Error::NoLocation)
  ));
}

#[test]
fn navigator_from_config() {
  let page = Page::parse("http://server/shop").unwrap();
  let config = Config::from_json(
    r#"{
      "state": { "strategy": "push_state", "root_path": "shop" },
      "separators": { "pair": ";", "key_value": ":" }
    }"#,
  )
  .unwrap();
  assert_eq!(
    config.state,
    StateStrategy::PushState {
      root_path: "shop".to_string()
    }
  );

  let navigator = Navigator::with_config(&page, &config, None).unwrap();
  let log = log();
  navigator.add_view("cart", TestView::new("cart", &log));
  navigator.navigate_to("cart/item:3;qty:2").unwrap();
  assert_eq!(
    page.location().unwrap().path(),
    "/shop/cart/item:3;qty:2"
  );

  let map = navigator.state_parameter_map().unwrap();
  assert_eq!(map["item"], "3");
  assert_eq!(map["qty"], "2");
}
