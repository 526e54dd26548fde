use crate::app::{App, PromptAction, Tab, STATUS_ERR_TTL, STATUS_OK_TTL};
use crate::editor::CopyScope;
use crate::model::{parse_deadline, Priority, Todo, DEADLINE_FORMAT};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies one key press to the application state.
///
/// An open prompt takes every key. Otherwise the notes editor takes every key
/// while it has focus, and the remaining shortcuts apply.
pub fn handle_key(app: &mut App, key: KeyEvent, wrap_width: usize) -> Flow {
    if app.prompt.is_some() {
        handle_prompt_key(app, key);
        return Flow::Continue;
    }
    if app.active_tab == Tab::Notes && !app.nav_mode {
        handle_notes_key(app, key, wrap_width);
        return Flow::Continue;
    }
    // Shortcuts below are plain keys; Ctrl/Alt chords do nothing here.
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('S') => {
            app.save();
        }
        KeyCode::Char('s') if !app.nav_mode && app.active_tab == Tab::Todos => {
            if app.current_topic().is_some() {
                app.cycle_sort();
                debug!("sort mode now {:?}", app.sort_mode);
            }
        }
        KeyCode::Enter => handle_enter(app),
        KeyCode::Esc => app.nav_mode = true,
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('n') => open_create_prompt(app),
        KeyCode::Char('d') => open_delete_prompt(app),
        KeyCode::Char(' ') if app.active_tab == Tab::Todos => {
            if app.current_todo().is_some() {
                if let Err(err) = app.toggle_todo() {
                    warn!("toggle failed: {}", err);
                }
            }
        }
        _ if app.nav_mode => handle_nav_key(app, key),
        _ => match app.active_tab {
            Tab::Topics => handle_topics_key(app, key),
            Tab::Todos => handle_todos_key(app, key),
            Tab::Notes => {}
        },
    }
    Flow::Continue
}

fn handle_enter(app: &mut App) {
    if app.nav_mode {
        app.nav_mode = false;
        return;
    }
    match app.active_tab {
        Tab::Topics => app.active_tab = Tab::Todos,
        Tab::Todos => {
            if app.current_topic().is_none() {
                return;
            }
            if app.current_todo().is_none() {
                app.set_status("No todos in topic", STATUS_OK_TTL);
                return;
            }
            app.with_notes(|editor, text| editor.seed(text));
            app.active_tab = Tab::Notes;
        }
        Tab::Notes => {}
    }
}

fn handle_nav_key(app: &mut App, key: KeyEvent) {
    if let KeyCode::Char('j') | KeyCode::Char('k') | KeyCode::Up | KeyCode::Down = key.code {
        app.active_tab = match app.active_tab {
            Tab::Topics => Tab::Todos,
            Tab::Todos => Tab::Topics,
            Tab::Notes => Tab::Notes,
        };
    }
}

fn handle_topics_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('k') | KeyCode::Up => app.select_topic(app.topic_index.saturating_sub(1)),
        KeyCode::Char('j') | KeyCode::Down => app.select_topic(app.topic_index + 1),
        _ => {}
    }
}

/// Moves along the displayed order and maps back to the stored index.
fn handle_todos_key(app: &mut App, key: KeyEvent) {
    let order = app.display_order();
    if order.is_empty() {
        return;
    }
    let pos = order
        .iter()
        .position(|&i| i == app.todo_index)
        .unwrap_or(0);
    let next = match key.code {
        KeyCode::Char('k') | KeyCode::Up => pos.saturating_sub(1),
        KeyCode::Char('j') | KeyCode::Down => (pos + 1).min(order.len() - 1),
        _ => return,
    };
    app.todo_index = order[next];
}

fn open_create_prompt(app: &mut App) {
    match app.active_tab {
        Tab::Topics => app.open_prompt("Enter new topic name: ", PromptAction::NewTopic),
        Tab::Todos if app.current_topic().is_some() => {
            app.open_prompt("Enter todo name: ", PromptAction::TodoName)
        }
        _ => {}
    }
}

fn open_delete_prompt(app: &mut App) {
    match app.active_tab {
        Tab::Topics => {
            let Some(topic) = app.current_topic() else {
                return;
            };
            let text = format!("Delete topic '{}' (y/n)? ", topic.name);
            let index = app.topic_index;
            app.open_prompt(text, PromptAction::DeleteTopic { index });
        }
        Tab::Todos => {
            let Some(todo) = app.current_todo() else {
                return;
            };
            let text = format!("Delete todo '{}' (y/n)? ", todo.name);
            let action = PromptAction::DeleteTodo {
                topic: app.topic_index,
                todo: app.todo_index,
            };
            app.open_prompt(text, action);
        }
        Tab::Notes => {}
    }
}

fn handle_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            if let Some(prompt) = app.prompt.take() {
                commit_prompt(app, prompt.action, prompt.buffer);
            }
        }
        KeyCode::Esc => {
            app.prompt = None;
        }
        KeyCode::Backspace => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.buffer.pop();
            }
        }
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.buffer.push(ch);
            }
        }
        _ => {}
    }
}

/// Runs the continuation for a submitted prompt. Invalid input is defaulted,
/// so every step either finishes or opens the next prompt.
fn commit_prompt(app: &mut App, action: PromptAction, input: String) {
    match action {
        PromptAction::NewTopic => {
            let name = input.trim();
            if name.is_empty() {
                app.set_status("Topic name is empty", STATUS_ERR_TTL);
            } else {
                app.create_topic(name);
            }
        }
        PromptAction::TodoName => {
            let text = format!(
                "Priority? (1={},2={},3={},4={}): ",
                Priority::High.label(),
                Priority::Medium.label(),
                Priority::Low.label(),
                Priority::None.label()
            );
            app.open_prompt(text, PromptAction::TodoPriority { name: input });
        }
        PromptAction::TodoPriority { name } => {
            let priority = parse_priority(&input);
            app.open_prompt(
                "Deadline? (DD-MM-YYYY) or press 's' to skip: ",
                PromptAction::TodoDeadline { name, priority },
            );
        }
        PromptAction::TodoDeadline { name, priority } => {
            let deadline = parse_deadline_input(&input);
            if name.trim().is_empty() {
                info!("todo creation finished without a name");
                return;
            }
            match app.create_todo(Todo::new(name, priority, deadline)) {
                Ok(()) => {
                    app.active_tab = Tab::Todos;
                    app.nav_mode = false;
                }
                Err(err) => app.set_status(format!("Create failed: {}", err), STATUS_ERR_TTL),
            }
        }
        PromptAction::DeleteTopic { index } => {
            if confirmed(&input) {
                if let Err(err) = app.delete_topic(index) {
                    app.set_status(format!("Delete failed: {}", err), STATUS_ERR_TTL);
                }
            }
        }
        PromptAction::DeleteTodo { topic, todo } => {
            if confirmed(&input) {
                if let Err(err) = app.delete_todo(topic, todo) {
                    app.set_status(format!("Delete failed: {}", err), STATUS_ERR_TTL);
                }
            }
        }
    }
}

/// `1`..`4` pick a priority; anything else is the lowest.
fn parse_priority(input: &str) -> Priority {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .map(Priority::from_index)
        .unwrap_or(Priority::None)
}

/// Empty input, `s`, or an unparseable date all mean no deadline.
fn parse_deadline_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("s") {
        return None;
    }
    let date = parse_deadline(trimmed);
    if date.is_none() {
        debug!("ignoring deadline {:?}", trimmed);
    }
    date.map(|d| d.format(DEADLINE_FORMAT).to_string())
}

fn confirmed(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

fn handle_notes_key(app: &mut App, key: KeyEvent, wrap_width: usize) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            app.editor.clear_selection();
            app.active_tab = Tab::Todos;
        }
        KeyCode::Char('c') if ctrl => {
            let scope = app.with_notes(|editor, text| editor.copy(text));
            match scope {
                Some(CopyScope::Selection) => app.set_status("Copied selection", STATUS_OK_TTL),
                Some(CopyScope::All) => app.set_status("Copied all notes", STATUS_OK_TTL),
                None => {}
            }
        }
        KeyCode::Char('x') if ctrl => {
            if app.with_notes(|editor, text| editor.cut(text)) == Some(true) {
                app.set_status("Cut selection", STATUS_OK_TTL);
            }
        }
        KeyCode::Char('v') if ctrl => {
            app.with_notes(|editor, text| editor.paste(text));
        }
        KeyCode::Char('s') if ctrl => {
            app.save();
        }
        KeyCode::Char(' ') if ctrl => app.editor.toggle_anchor(),
        KeyCode::Enter => {
            app.with_notes(|editor, text| editor.newline(text));
        }
        KeyCode::Backspace => {
            app.with_notes(|editor, text| editor.backspace(text));
        }
        KeyCode::Left => {
            app.with_notes(|editor, text| editor.move_left(text));
        }
        KeyCode::Right => {
            app.with_notes(|editor, text| editor.move_right(text));
        }
        KeyCode::Up | KeyCode::Down => {
            let up = key.code == KeyCode::Up;
            let moved = app.with_notes(|editor, text| {
                if up {
                    editor.move_up(text, wrap_width)
                } else {
                    editor.move_down(text, wrap_width)
                }
            });
            if let Some(Err(err)) = moved {
                warn!("caret move skipped: {}", err);
            }
        }
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            app.with_notes(|editor, text| editor.insert_char(text, ch));
        }
        _ => {}
    }
}
