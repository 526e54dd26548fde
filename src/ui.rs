use crate::app::App;
use crate::input::{self, Flow};
use crate::render::{self, FrameClock, Layout};
use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::thread;
use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_millis(33);

/// Runs the interactive loop until quit, then restores the terminal and
/// writes the notebook one last time.
pub fn run(mut app: App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut app, &mut terminal);
    let teardown = teardown_terminal(&mut terminal);
    close_session(&mut app, result, teardown)
}

/// Writes the notebook whatever the loop and the teardown returned, then
/// reports the first error.
fn close_session(app: &mut App, session: Result<()>, teardown: Result<()>) -> Result<()> {
    info!("leaving, final save");
    if !app.save() {
        warn!("final save did not complete");
    }
    session.and(teardown)
}

fn event_loop(app: &mut App, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    loop {
        let now = Instant::now();
        app.tick(now);
        let size = terminal.size().context("querying terminal size")?;
        let layout = Layout::compute(size.width as usize, size.height as usize);

        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && input::handle_key(app, key, layout.notes_wrap_width()) == Flow::Quit
                {
                    break;
                }
            }
        }

        let clock = FrameClock {
            now,
            today: Local::now().date_naive(),
        };
        let canvas = render::compose(app, &layout, &clock);
        terminal.draw(|f| f.render_widget(&canvas, f.size()))?;
        thread::sleep(TICK);
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
