//! The root UI type.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;

use navigator::view::same_view;
use navigator::Config;
use navigator::Navigator;
use navigator::Page;
use navigator::StateStrategy;
use navigator::ViewHandle;

use tui::backend::Backend;
use tui::layout::Constraint;
use tui::layout::Direction;
use tui::layout::Layout;
use tui::style::Color;
use tui::style::Modifier;
use tui::style::Style;
use tui::text::Span;
use tui::text::Spans;
use tui::widgets::Block;
use tui::widgets::Borders;
use tui::widgets::Paragraph;
use tui::widgets::Wrap;
use tui::Frame;

use crate::views;
use crate::views::EditorView;
use crate::views::Prompt;
use crate::views::Screen;

/// How many visited states the side panel keeps.
const TRAIL_LEN: usize = 16;

/// Whether the event loop should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

enum Mode {
  Normal,
  /// Editing the address bar.
  Location(String),
}

/// A single browser tab running the demo application.
pub struct Shell {
  page: Page,
  navigator: Navigator,
  screen: Rc<Screen>,
  prompt: Prompt,
  editor: Rc<EditorView>,
  trail: Rc<RefCell<Vec<String>>>,
  mode: Mode,
  status: Option<String>,
}

/// Where the page starts, so that push-state configurations begin below
/// their root.
fn start_location(config: &Config) -> String {
  match &config.state {
    StateStrategy::UriFragment => "http://localhost/".to_string(),
    StateStrategy::PushState { root_path } => {
      format!("http://localhost/{}", root_path.trim_matches('/'))
    }
  }
}

impl Shell {
  /// Opens the demo application and navigates to whatever state the start
  /// location holds.
  pub fn new(config: &Config) -> Result<Self, navigator::Error> {
    let page = Page::parse(&start_location(config))?;
    let screen = Screen::new();
    let navigator =
      Navigator::with_config(&page, config, Some(screen.clone()))?;
    let prompt = Prompt::default();
    let editor = views::install(&navigator, &screen, &prompt);

    let trail: Rc<RefCell<Vec<String>>> = Rc::default();
    let visited = Rc::clone(&trail);
    navigator.on_after_view_change(move |event| {
      let state = event.navigation_state();
      tracing::info!(state = %state, "view changed");
      let mut visited = visited.borrow_mut();
      visited.push(state.into_string());
      let excess = visited.len().saturating_sub(TRAIL_LEN);
      visited.drain(..excess);
    });

    navigator.navigate_to(&navigator.state()?)?;
    Ok(Self {
      page,
      navigator,
      screen,
      prompt,
      editor,
      trail,
      mode: Mode::Normal,
      status: None,
    })
  }

  /// Processes a key press.
  pub fn process_key(&mut self, k: KeyEvent) -> Flow {
    if k.code == KeyCode::Char('c') && k.modifiers == KeyModifiers::CONTROL {
      return Flow::Quit;
    }

    if let Mode::Location(buf) = &mut self.mode {
      match k.code {
        KeyCode::Esc => self.mode = Mode::Normal,
        KeyCode::Enter => {
          let uri = mem::take(buf);
          self.mode = Mode::Normal;
          let result = self.page.update_location(&uri, true, true);
          self.report(result);
        }
        KeyCode::Backspace => {
          buf.pop();
        }
        KeyCode::Char(c) => buf.push(c),
        _ => {}
      }
      return Flow::Continue;
    }

    if self.prompt.borrow().is_some() {
      match k.code {
        KeyCode::Char('y') => self.answer_prompt(true),
        KeyCode::Char('n') | KeyCode::Esc => self.answer_prompt(false),
        KeyCode::Char('q') => return Flow::Quit,
        _ => {}
      }
      return Flow::Continue;
    }

    self.status = None;
    match k.code {
      KeyCode::Char('q') => return Flow::Quit,
      KeyCode::Char(':') => {
        let location = self.page.location().map(|l| l.to_string());
        self.mode = Mode::Location(location.unwrap_or_default());
      }

      // History control.
      KeyCode::PageUp | KeyCode::Char('[') => {
        self.page.back();
      }
      KeyCode::PageDown | KeyCode::Char(']') => {
        self.page.forward();
      }

      KeyCode::Char(c @ '1'..='4') => {
        let idx = c as usize - '1' as usize;
        let result = self.navigator.navigate_to(views::BOOKMARKS[idx]);
        self.report(result);
      }

      KeyCode::Char('e') if self.editor_is_current() => self.editor.edit(),
      _ => {}
    }
    Flow::Continue
  }

  fn editor_is_current(&self) -> bool {
    let editor: ViewHandle = self.editor.clone();
    self
      .navigator
      .current_view()
      .map_or(false, |current| same_view(&current, &editor))
  }

  fn answer_prompt(&mut self, leave: bool) {
    let event = self.prompt.borrow_mut().take();
    let event = match event {
      Some(event) => event,
      None => return,
    };

    if leave {
      self.editor.discard();
      let result = event.navigate();
      self.report(result);
    } else {
      event.deny();
      self.status = Some("kept unsaved changes".to_string());
    }
  }

  fn report(&mut self, result: Result<(), navigator::Error>) {
    if let Err(e) = result {
      tracing::warn!(error = %e, "navigation failed");
      self.status = Some(e.to_string());
    }
  }

  /// Renders the shell onto a `Frame`.
  pub fn render<B: Backend>(&self, f: &mut Frame<B>) {
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints(
        [
          Constraint::Length(4),
          Constraint::Min(3),
          Constraint::Length(1),
        ]
        .as_ref(),
      )
      .split(f.size());
    let body = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Min(20), Constraint::Length(32)].as_ref())
      .split(rows[1]);

    f.render_widget(self.chrome(), rows[0]);

    let lines = self
      .screen
      .lines()
      .into_iter()
      .map(Spans::from)
      .collect::<Vec<_>>();
    let content = Paragraph::new(lines)
      .block(
        Block::default()
          .borders(Borders::ALL)
          .title(self.screen.title()),
      )
      .wrap(Wrap { trim: false });
    f.render_widget(content, body[0]);

    let trail = self
      .trail
      .borrow()
      .iter()
      .rev()
      .map(|state| Spans::from(state.clone()))
      .collect::<Vec<_>>();
    let trail = Paragraph::new(trail)
      .block(Block::default().borders(Borders::ALL).title("Visited"));
    f.render_widget(trail, body[1]);

    f.render_widget(self.footer(), rows[2]);
  }

  fn chrome(&self) -> Paragraph<'static> {
    let location = match &self.mode {
      Mode::Location(buf) => Spans::from(vec![
        Span::styled(":", Style::default().fg(Color::Yellow)),
        Span::raw(buf.clone()),
      ]),
      Mode::Normal => match self.page.location() {
        Ok(location) => Spans::from(location.to_string()),
        Err(e) => Spans::from(e.to_string()),
      },
    };

    let state = self
      .navigator
      .active_navigation_state()
      .unwrap_or_else(|| "-".to_string());
    let details = format!(
      "state: {:?}  phase: {:?}  history: {}/{}  mounts: {}{}",
      state,
      self.navigator.phase(),
      self.page.history_index() + 1,
      self.page.history().len(),
      self.screen.mounts(),
      if self.editor.is_dirty() { "  [unsaved]" } else { "" },
    );

    Paragraph::new(vec![location, Spans::from(details)])
      .block(Block::default().borders(Borders::ALL).title("navshell"))
  }

  fn footer(&self) -> Paragraph<'static> {
    let (text, style) = if self.prompt.borrow().is_some() {
      (
        "unsaved changes in the editor; leave anyway? [y/n]".to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
      )
    } else if let Some(status) = &self.status {
      (status.clone(), Style::default().fg(Color::Red))
    } else if let Mode::Location(_) = self.mode {
      (
        "enter: go  esc: cancel".to_string(),
        Style::default().fg(Color::DarkGray),
      )
    } else {
      (
        "1-4: bookmarks  :: location  [ ]: back/forward  e: edit  q: quit"
          .to_string(),
        Style::default().fg(Color::DarkGray),
      )
    };
    Paragraph::new(Spans::from(Span::styled(text, style)))
  }
}

#[cfg(test)]
mod tests {
  use tui::backend::TestBackend;
  use tui::Terminal;

  use super::*;

  fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
  }

  fn press(shell: &mut Shell, keys: &str) {
    for c in keys.chars() {
      assert_eq!(shell.process_key(key(c)), Flow::Continue);
    }
  }

  fn state(shell: &Shell) -> String {
    shell.navigator.active_navigation_state().unwrap()
  }

  #[test]
  fn starts_on_main_view() {
    let shell = Shell::new(&Config::default()).unwrap();
    assert_eq!(state(&shell), "");
    assert_eq!(shell.screen.title(), "Welcome");
  }

  #[test]
  fn bookmarks_and_history() {
    let mut shell = Shell::new(&Config::default()).unwrap();
    press(&mut shell, "23");
    assert_eq!(state(&shell), "admin/users/role=editor&sort=name");
    assert!(shell
      .screen
      .lines()
      .iter()
      .any(|l| l.contains("role") && l.contains("editor")));

    press(&mut shell, "[");
    assert_eq!(state(&shell), "admin");
    assert_eq!(shell.screen.title(), "Admin");
    press(&mut shell, "]");
    assert_eq!(shell.screen.title(), "Users");
  }

  #[test]
  fn address_bar_navigates() {
    let mut shell = Shell::new(&Config::default()).unwrap();
    shell.process_key(key(':'));
    for _ in 0.."http://localhost/".len() {
      shell.process_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
    }
    press(&mut shell, "#!nowhere");
    shell.process_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    assert_eq!(state(&shell), "nowhere");
    assert_eq!(shell.screen.title(), "Not found");
  }

  #[test]
  fn unsaved_edits_hold_navigation() {
    let mut shell = Shell::new(&Config::default()).unwrap();
    press(&mut shell, "4e1");
    assert!(shell.prompt.borrow().is_some());
    assert_eq!(state(&shell), "editor/doc=notes.txt");

    press(&mut shell, "n");
    assert!(shell.prompt.borrow().is_none());
    assert!(shell.editor.is_dirty());
    assert_eq!(state(&shell), "editor/doc=notes.txt");

    press(&mut shell, "1y");
    assert_eq!(state(&shell), "home");
    assert!(!shell.editor.is_dirty());
  }

  #[test]
  fn push_state_config_starts_below_root() {
    let config = Config {
      state: StateStrategy::PushState {
        root_path: "/demo".to_string(),
      },
      ..Config::default()
    };
    let mut shell = Shell::new(&config).unwrap();
    press(&mut shell, "2");
    assert_eq!(
      shell.page.location().unwrap().as_str(),
      "http://localhost/demo/admin"
    );
  }

  #[test]
  fn renders_chrome_and_view() {
    let mut shell = Shell::new(&Config::default()).unwrap();
    press(&mut shell, "1");
    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| shell.render(f)).unwrap();

    let text = terminal
      .backend()
      .buffer()
      .content
      .iter()
      .map(|cell| cell.symbol.as_str())
      .collect::<String>();
    assert!(text.contains("http://localhost/#!home"));
    assert!(text.contains("Home"));
    assert!(text.contains("Visited"));
  }
}
