//! The demo views, and the screen they draw into.
//!
//! Views cannot be inspected once they are handed to the navigator, so
//! instead of rendering themselves each frame they write their content into a
//! shared [`Screen`] when they are entered. The screen is also the
//! [`ViewDisplay`], and mounting a view clears it.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use navigator::BeforeLeaveEvent;
use navigator::Navigator;
use navigator::View;
use navigator::ViewChangeEvent;
use navigator::ViewDisplay;
use navigator::ViewHandle;

/// The body area of the shell.
#[derive(Default)]
pub struct Screen {
  title: RefCell<String>,
  lines: RefCell<Vec<String>>,
  mounts: Cell<usize>,
}

impl Screen {
  pub fn new() -> Rc<Self> {
    Rc::default()
  }

  /// Replaces the screen contents.
  pub fn write(&self, title: impl Into<String>, lines: Vec<String>) {
    *self.title.borrow_mut() = title.into();
    *self.lines.borrow_mut() = lines;
  }

  pub fn push_line(&self, line: impl Into<String>) {
    self.lines.borrow_mut().push(line.into());
  }

  pub fn title(&self) -> String {
    self.title.borrow().clone()
  }

  pub fn lines(&self) -> Vec<String> {
    self.lines.borrow().clone()
  }

  pub fn mounts(&self) -> usize {
    self.mounts.get()
  }
}

impl ViewDisplay for Screen {
  fn show_view(&self, _: &ViewHandle) {
    self.write("", Vec::new());
    self.mounts.set(self.mounts.get() + 1);
  }
}

/// A static page of text.
pub struct TextView {
  screen: Rc<Screen>,
  title: &'static str,
  text: &'static [&'static str],
}

impl TextView {
  pub fn new(
    screen: &Rc<Screen>,
    title: &'static str,
    text: &'static [&'static str],
  ) -> Rc<Self> {
    Rc::new(Self {
      screen: Rc::clone(screen),
      title,
      text,
    })
  }
}

impl View for TextView {
  fn enter(&self, event: &ViewChangeEvent) {
    let mut lines =
      self.text.iter().map(|l| l.to_string()).collect::<Vec<_>>();
    if !event.parameters().is_empty() {
      lines.push(String::new());
      lines.push(format!("parameters: {}", event.parameters()));
    }
    self.screen.write(self.title, lines);
  }
}

/// Shows its parameters, raw and decoded.
pub struct UsersView {
  screen: Rc<Screen>,
}

impl UsersView {
  pub fn new(screen: &Rc<Screen>) -> Rc<Self> {
    Rc::new(Self {
      screen: Rc::clone(screen),
    })
  }
}

impl View for UsersView {
  fn enter(&self, event: &ViewChangeEvent) {
    let mut lines = vec![
      format!("view name:  {}", event.view_name()),
      format!("parameters: {:?}", event.parameters()),
      String::new(),
    ];

    let mut map = event.parameter_map().into_iter().collect::<Vec<_>>();
    map.sort();
    if map.is_empty() {
      lines.push("(no parameters)".to_string());
    }
    for (key, value) in map {
      lines.push(format!("  {:<12} = {}", key, value));
    }
    self.screen.write("Users", lines);
  }
}

/// Holds a leave confirmation until the user answers it.
pub type Prompt = Rc<RefCell<Option<BeforeLeaveEvent>>>;

/// A document editor that asks before throwing away unsaved edits.
pub struct EditorView {
  screen: Rc<Screen>,
  prompt: Prompt,
  document: RefCell<String>,
  edits: RefCell<Vec<String>>,
  dirty: Cell<bool>,
}

impl EditorView {
  pub fn new(screen: &Rc<Screen>, prompt: &Prompt) -> Rc<Self> {
    Rc::new(Self {
      screen: Rc::clone(screen),
      prompt: Rc::clone(prompt),
      document: RefCell::new(String::new()),
      edits: RefCell::new(Vec::new()),
      dirty: Cell::new(false),
    })
  }

  /// Makes an unsaved change.
  pub fn edit(&self) {
    let n = self.edits.borrow().len() + 1;
    let line = format!("edit #{} (unsaved)", n);
    self.edits.borrow_mut().push(line.clone());
    self.dirty.set(true);
    self.screen.push_line(line);
  }

  /// Throws away unsaved changes.
  pub fn discard(&self) {
    self.edits.borrow_mut().clear();
    self.dirty.set(false);
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty.get()
  }

  fn redraw(&self) {
    let mut lines = vec![
      format!("document: {}", self.document.borrow()),
      "press e to make an edit".to_string(),
      String::new(),
    ];
    lines.extend(self.edits.borrow().iter().cloned());
    self.screen.write("Editor", lines);
  }
}

impl View for EditorView {
  fn enter(&self, event: &ViewChangeEvent) {
    let map = event.parameter_map();
    let document = map
      .get("doc")
      .cloned()
      .unwrap_or_else(|| "untitled".to_string());
    *self.document.borrow_mut() = document;
    self.discard();
    self.redraw();
  }

  fn before_leave(&self, event: BeforeLeaveEvent) {
    if !self.is_dirty() {
      if let Err(e) = event.navigate() {
        tracing::error!(error = %e, "leaving editor failed");
      }
      return;
    }

    tracing::info!("editor has unsaved changes, asking");
    if let Some(stale) = self.prompt.borrow_mut().replace(event) {
      stale.deny();
    }
  }
}

/// Shown for every state nothing else claims.
pub struct NotFoundView {
  screen: Rc<Screen>,
}

impl NotFoundView {
  pub fn new(screen: &Rc<Screen>) -> Rc<Self> {
    Rc::new(Self {
      screen: Rc::clone(screen),
    })
  }
}

impl View for NotFoundView {
  fn enter(&self, event: &ViewChangeEvent) {
    self.screen.write(
      "Not found",
      vec![format!("nothing is registered for {:?}", event.view_name())],
    );
  }
}

/// The demo states bound to the number keys.
pub const BOOKMARKS: [&str; 4] = [
  "home",
  "admin",
  "admin/users/role=editor&sort=name",
  "editor/doc=notes.txt",
];

/// Registers the demo views with `navigator`, returning the editor so the
/// shell can drive it.
pub fn install(
  navigator: &Navigator,
  screen: &Rc<Screen>,
  prompt: &Prompt,
) -> Rc<EditorView> {
  navigator.add_view(
    "",
    TextView::new(screen, "Welcome", &["press 1-4 to jump around"]),
  );
  navigator.add_view(
    "home",
    TextView::new(screen, "Home", &["the home view", "try the back button"]),
  );
  navigator.add_view(
    "admin",
    TextView::new(screen, "Admin", &["claims admin and admin/*"]),
  );
  navigator.add_view("admin/users", UsersView::new(screen));

  let editor = EditorView::new(screen, prompt);
  navigator.add_view("editor", editor.clone());
  navigator.set_error_view(NotFoundView::new(screen));
  editor
}
