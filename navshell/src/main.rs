//! A terminal browser for the navigator.
//!
//! The browser has a single tab showing a small demo application. Its
//! address bar, back/forward buttons and the application's own links all go
//! through the same `Page`, so every path into the navigator can be tried by
//! hand.

use std::env;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crossterm::event::Event;
use crossterm::execute;
use crossterm::terminal;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;

use navigator::Config;

use tui::backend::CrosstermBackend;
use tui::Terminal;

mod logging;
mod shell;
mod views;

use shell::Flow;
use shell::Shell;

/// The config file named on the command line, or the user's one if it
/// exists.
fn config_path() -> Option<PathBuf> {
  if let Some(path) = env::args_os().nth(1) {
    return Some(PathBuf::from(path));
  }
  let path = dirs::config_dir()?.join("navshell").join("config.json");
  path.exists().then(|| path)
}

fn main() -> Result<(), Box<dyn Error>> {
  logging::init(&logging::default_path())?;

  let config = match config_path() {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  tracing::info!(?config, "starting");
  let mut shell = Shell::new(&config)?;

  let (events_sink, events) = mpsc::channel();
  thread::spawn(move || loop {
    let event = crossterm::event::read();
    let failed = event.is_err();
    if events_sink.send(event).is_err() || failed {
      return;
    }
  });

  terminal::enable_raw_mode()?;
  execute!(io::stdout(), EnterAlternateScreen)?;
  let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

  let result = run(&mut terminal, &mut shell, &events);

  terminal::disable_raw_mode()?;
  execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
  terminal.show_cursor()?;
  result
}

fn run(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  shell: &mut Shell,
  events: &mpsc::Receiver<crossterm::Result<Event>>,
) -> Result<(), Box<dyn Error>> {
  loop {
    terminal.draw(|f| shell.render(f))?;

    // Block for one event, then drain whatever else piled up.
    let mut next = Some(events.recv()?);
    while let Some(e) = next {
      if let Event::Key(k) = e? {
        if shell.process_key(k) == Flow::Quit {
          tracing::info!("quitting");
          return Ok(());
        }
      }
      next = events.try_recv().ok();
    }
  }
}
