use crate::app::{App, Tab};
use crate::canvas::{draw_box, BoxState, BoxTheme, Canvas, StyledLine};
use crate::geometry;
use crate::model::{DeadlineStatus, Priority};
use chrono::NaiveDate;
use log::debug;
use ratatui::style::{Color, Modifier, Style};
use std::time::Instant;

pub const INFO_HEIGHT: usize = 7;
pub const MIN_SIDE_WIDTH: usize = 20;

const CARET: char = '|';
const URGENT: char = '!';

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Panel {
    Topics,
    Todos,
    Info,
    Notes,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Topics, Panel::Todos, Panel::Info, Panel::Notes];
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PanelRect {
    /// Panels of two cells or less in either direction are skipped.
    pub fn drawable(&self) -> bool {
        self.width > 2 && self.height > 2
    }

    pub fn inner_width(&self) -> usize {
        self.width.saturating_sub(2)
    }

    pub fn inner_height(&self) -> usize {
        self.height.saturating_sub(2)
    }

    /// Exclusive right edge of the interior.
    fn inner_right(&self) -> usize {
        self.x + self.width.saturating_sub(1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    topics: PanelRect,
    todos: PanelRect,
    info: PanelRect,
    notes: PanelRect,
}

impl Layout {
    /// Splits the terminal into the side column (topics over todos), the main
    /// column (info over notes) and a bottom help row.
    pub fn compute(width: usize, height: usize) -> Self {
        let usable = height.saturating_sub(1);
        let side = (width / 4).max(MIN_SIDE_WIDTH).min(width / 3);
        let main = width - side;
        let topics_height = usable / 2;
        let info_height = INFO_HEIGHT.min(usable);
        Layout {
            width,
            height,
            topics: PanelRect {
                x: 0,
                y: 0,
                width: side,
                height: topics_height,
            },
            todos: PanelRect {
                x: 0,
                y: topics_height,
                width: side,
                height: usable - topics_height,
            },
            info: PanelRect {
                x: side,
                y: 0,
                width: main,
                height: info_height,
            },
            notes: PanelRect {
                x: side,
                y: info_height,
                width: main,
                height: usable - info_height,
            },
        }
    }

    pub fn rect(&self, panel: Panel) -> PanelRect {
        match panel {
            Panel::Topics => self.topics,
            Panel::Todos => self.todos,
            Panel::Info => self.info,
            Panel::Notes => self.notes,
        }
    }

    /// Width the notes text wraps at, or 0 when the notes panel is hidden.
    pub fn notes_wrap_width(&self) -> usize {
        if self.notes.drawable() {
            self.notes.inner_width()
        } else {
            0
        }
    }
}

/// Time inputs for one frame.
#[derive(Copy, Clone, Debug)]
pub struct FrameClock {
    pub now: Instant,
    pub today: NaiveDate,
}

/// First visible row so that `selected` sits near the middle of the window.
pub fn window_start(selected: usize, visible: usize, total: usize) -> usize {
    selected
        .saturating_sub(visible / 2)
        .min(total.saturating_sub(visible))
}

fn box_theme() -> BoxTheme {
    BoxTheme {
        plain: Style::default(),
        selected: Style::default().fg(Color::Blue),
        active: Style::default().fg(Color::Green),
        selected_title: label_style(),
        active_title: Style::default().fg(Color::White).bg(Color::Blue),
    }
}

fn selected_style() -> Style {
    Style::default().fg(Color::Blue)
}

fn label_style() -> Style {
    Style::default().fg(Color::Cyan)
}

fn muted_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn ok_style() -> Style {
    Style::default().fg(Color::Green)
}

fn warn_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn inverted_style() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

fn priority_style(priority: Priority) -> Style {
    let color = match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
        Priority::None => Color::White,
    };
    Style::default().fg(color)
}

fn deadline_style(status: DeadlineStatus) -> Style {
    match status {
        DeadlineStatus::Past => warn_style(),
        DeadlineStatus::Today | DeadlineStatus::Ok => muted_style(),
    }
}

fn box_state(app: &App, tab: Tab) -> BoxState {
    if app.active_tab != tab {
        BoxState::Plain
    } else if app.nav_mode {
        BoxState::Selected
    } else {
        BoxState::Active
    }
}

/// Builds the whole screen for the current state.
pub fn compose(app: &App, layout: &Layout, clock: &FrameClock) -> Canvas {
    let mut canvas = Canvas::new(layout.width, layout.height);
    for panel in Panel::ALL {
        let rect = layout.rect(panel);
        if !rect.drawable() {
            continue;
        }
        match panel {
            Panel::Topics => draw_topics(&mut canvas, rect, app),
            Panel::Todos => draw_todos(&mut canvas, rect, app, clock.today),
            Panel::Info => draw_info(&mut canvas, rect, app, clock),
            Panel::Notes => draw_notes(&mut canvas, rect, app),
        }
    }
    draw_bottom_row(&mut canvas, layout, app);
    canvas
}

fn draw_topics(canvas: &mut Canvas, rect: PanelRect, app: &App) {
    let frame = draw_box(rect.width, rect.height, "Topics", box_state(app, Tab::Topics), &box_theme());
    canvas.write_region(rect.x, rect.y, &frame);

    let topics = &app.notebook.topics;
    let visible = rect.inner_height();
    let start = window_start(app.topic_index, visible, topics.len());
    for (row, (idx, topic)) in topics.iter().enumerate().skip(start).take(visible).enumerate() {
        let selected = idx == app.topic_index;
        let line = format!("{} {}", if selected { ">" } else { " " }, topic.name);
        let style = if selected {
            selected_style()
        } else {
            Style::default()
        };
        canvas.put_str(rect.x + 1, rect.y + 1 + row, &line, style, rect.inner_right());
    }
}

fn draw_todos(canvas: &mut Canvas, rect: PanelRect, app: &App, today: NaiveDate) {
    let frame = draw_box(rect.width, rect.height, "Todos", box_state(app, Tab::Todos), &box_theme());
    canvas.write_region(rect.x, rect.y, &frame);

    let Some(topic) = app.current_topic() else {
        return;
    };

    let badge_label = "Sort:";
    let badge = format!("{} {}", badge_label, app.sort_mode.label());
    let badge_len = badge.chars().count();
    let badge_x = rect.x + rect.width.saturating_sub(1 + badge_len).max(1);
    for (k, ch) in badge.chars().enumerate() {
        let style = if k < badge_label.len() {
            label_style()
        } else {
            muted_style()
        };
        if badge_x + k < rect.inner_right() {
            canvas.put(badge_x + k, rect.y, ch, style);
        }
    }

    let order = app.display_order();
    let show_marker = matches!(app.active_tab, Tab::Todos | Tab::Notes);
    let selected_pos = order
        .iter()
        .position(|&i| i == app.todo_index)
        .unwrap_or(0);
    let visible = rect.inner_height();
    let start = window_start(selected_pos, visible, order.len());
    let right = rect.inner_right();

    for (row, &idx) in order.iter().skip(start).take(visible).enumerate() {
        let todo = &topic.todos[idx];
        let y = rect.y + 1 + row;
        let marker = if show_marker && idx == app.todo_index {
            ">"
        } else {
            " "
        };
        let check = if todo.completed { "☑" } else { "☐" };
        let mut x = rect.x + 1;
        x += canvas.put_str(x, y, &format!("{} {} ", marker, check), Style::default(), right);
        x += canvas.put_str(x, y, &todo.name, priority_style(todo.priority), right);
        let status = todo.deadline_status(today);
        if status != DeadlineStatus::Ok {
            let style = match status {
                DeadlineStatus::Past => warn_style(),
                _ => muted_style(),
            };
            canvas.put_str(x, y, &URGENT.to_string(), style, right);
        }
    }
}

fn draw_info(canvas: &mut Canvas, rect: PanelRect, app: &App, clock: &FrameClock) {
    let frame = draw_box(rect.width, rect.height, "Info", BoxState::Plain, &box_theme());
    canvas.write_region(rect.x, rect.y, &frame);

    let mut lines = Vec::new();
    match app.current_topic() {
        None => lines.push(StyledLine::new().text("No topics")),
        Some(topic) => {
            lines.push(
                StyledLine::new()
                    .style(label_style())
                    .text("Topic: ")
                    .style(selected_style())
                    .text(&topic.name)
                    .reset(),
            );
            match app.current_todo() {
                None => lines.push(StyledLine::new().text("No todo selected")),
                Some(todo) => {
                    let (state, state_style) = if todo.completed {
                        ("Completed", ok_style())
                    } else {
                        ("Not Completed", warn_style())
                    };
                    let status = todo.deadline_status(clock.today);
                    let mut prio = StyledLine::new()
                        .style(label_style())
                        .text("Prio:  ")
                        .style(priority_style(todo.priority))
                        .text(todo.priority.label())
                        .style(deadline_style(status))
                        .text(format!(
                            " | Due: {}",
                            todo.deadline.as_deref().unwrap_or("None")
                        ));
                    if status != DeadlineStatus::Ok {
                        prio = prio.text(format!(" {}", URGENT));
                    }
                    lines.push(
                        StyledLine::new()
                            .style(label_style())
                            .text("Todo:  ")
                            .reset()
                            .text(&todo.name),
                    );
                    lines.push(
                        StyledLine::new()
                            .style(label_style())
                            .text("State: ")
                            .style(state_style)
                            .text(state)
                            .reset(),
                    );
                    lines.push(prio.reset());
                    lines.push(
                        StyledLine::new()
                            .style(label_style())
                            .text("Date:  ")
                            .style(muted_style())
                            .text(&todo.created_at)
                            .reset(),
                    );
                }
            }
        }
    }
    lines.truncate(rect.inner_height());
    write_clipped(canvas, rect, &lines);

    if let Some(message) = app.status_text(clock.now) {
        // Drawn below the info lines, over the bottom border when they fill the panel.
        let row = rect.y + 1 + lines.len().min(rect.inner_height());
        canvas.put_str(rect.x + 1, row, message, Style::default(), rect.inner_right());
    }
}

/// Writes styled lines into a panel interior, cut at the right border.
fn write_clipped(canvas: &mut Canvas, rect: PanelRect, lines: &[StyledLine]) {
    let mut scratch = Canvas::new(rect.inner_width(), lines.len());
    scratch.write_region(0, 0, lines);
    for y in 0..scratch.height() {
        for x in 0..scratch.width() {
            if let Some(cell) = scratch.cell(x, y) {
                canvas.put(rect.x + 1 + x, rect.y + 1 + y, cell.ch, cell.style);
            }
        }
    }
}

fn draw_notes(canvas: &mut Canvas, rect: PanelRect, app: &App) {
    let frame = draw_box(rect.width, rect.height, "Notes", box_state(app, Tab::Notes), &box_theme());
    canvas.write_region(rect.x, rect.y, &frame);

    let Some(todo) = app.current_todo() else {
        return;
    };
    let width = rect.inner_width();
    let visible = rect.inner_height();
    let editing = app.active_tab == Tab::Notes && !app.nav_mode;

    let lines = match geometry::wrap(&todo.notes, width) {
        Ok(lines) => lines,
        Err(err) => {
            debug!("notes not drawn: {}", err);
            return;
        }
    };
    let cursor = app.editor.cursor();
    let caret = if editing {
        geometry::offset_to_row_col(&todo.notes, width, cursor).ok()
    } else {
        None
    };
    let top = match caret {
        Some((row, _)) if row >= visible => row + 1 - visible,
        _ => 0,
    };
    let selection = if editing {
        app.editor.selection()
    } else {
        None
    };
    let selected = |offset: usize| selection.is_some_and(|(s, e)| s <= offset && offset < e);

    for (row, line) in lines.iter().skip(top).take(visible).enumerate() {
        for (col, ch) in line.text.chars().enumerate() {
            let style = if selected(line.start + col) {
                inverted_style()
            } else {
                Style::default()
            };
            canvas.put(rect.x + 1 + col, rect.y + 1 + row, ch, style);
        }
    }

    if let Some((row, col)) = caret {
        if app.caret.visible && col < width {
            let style = if selected(cursor) {
                inverted_style()
            } else {
                selected_style()
            };
            canvas.put(rect.x + 1 + col, rect.y + 1 + row - top, CARET, style);
        }
    }
}

pub fn help_text(app: &App) -> &'static str {
    if app.nav_mode {
        return "NAV MODE | Enter: focus tab, j/k: switch tabs, n: new, S: save, q: quit";
    }
    match app.active_tab {
        Tab::Topics => {
            "TOPICS | j/k: select, n: new topic, d: delete, Enter: todos, Esc: nav, S: save, q: quit"
        }
        Tab::Todos => {
            "TODOS | j/k: select, n: new todo, d: delete, s: cycle sort, Enter: open notes, Space: toggle, Esc: nav, S: save, q: quit"
        }
        Tab::Notes => {
            "NOTES | type: edit, Enter: newline, Ctrl+Space: select, Ctrl+C/X/V: copy/cut/paste, Ctrl+S: save, Esc: close"
        }
    }
}

fn draw_bottom_row(canvas: &mut Canvas, layout: &Layout, app: &App) {
    let Some(y) = layout.height.checked_sub(1) else {
        return;
    };
    match &app.prompt {
        Some(prompt) => {
            let line = format!("{}{}_", prompt.text, prompt.buffer);
            canvas.put_str(0, y, &line, Style::default(), layout.width);
        }
        None => {
            let style = Style::default().fg(Color::LightCyan);
            canvas.put_str(0, y, help_text(app), style, layout.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with, todo};
    use crate::app::PromptAction;
    use crate::model::Topic;
    use pretty_assertions::assert_eq;

    fn clock() -> FrameClock {
        FrameClock {
            now: Instant::now(),
            today: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        }
    }

    fn screen(app: &App, width: usize, height: usize) -> Vec<String> {
        let canvas = compose(app, &Layout::compute(width, height), &clock());
        (0..canvas.height()).map(|y| canvas.row_text(y)).collect()
    }

    #[test]
    fn side_width_is_clamped() {
        assert_eq!(Layout::compute(120, 40).rect(Panel::Topics).width, 30);
        assert_eq!(Layout::compute(70, 40).rect(Panel::Topics).width, 20);
        // Narrow terminals give up the 20-column minimum for the one-third cap.
        assert_eq!(Layout::compute(45, 40).rect(Panel::Topics).width, 15);
    }

    #[test]
    fn panels_tile_the_screen() {
        let layout = Layout::compute(100, 31);
        let topics = layout.rect(Panel::Topics);
        let todos = layout.rect(Panel::Todos);
        let info = layout.rect(Panel::Info);
        let notes = layout.rect(Panel::Notes);
        assert_eq!((topics.height, todos.y, todos.height), (15, 15, 15));
        assert_eq!((info.x, info.width, info.height), (25, 75, INFO_HEIGHT));
        assert_eq!((notes.y, notes.height), (INFO_HEIGHT, 23));
        assert_eq!(layout.notes_wrap_width(), 73);
    }

    #[test]
    fn window_keeps_selection_centered_and_in_bounds() {
        assert_eq!(window_start(0, 5, 20), 0);
        assert_eq!(window_start(10, 5, 20), 8);
        assert_eq!(window_start(19, 5, 20), 15);
        assert_eq!(window_start(3, 10, 4), 0);
    }

    #[test]
    fn empty_state_renders() {
        let app = app_with(Vec::new());
        let rows = screen(&app, 80, 24);
        assert!(rows[1].contains("No topics"));
        assert!(rows[23].starts_with("NAV MODE"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = app_with(vec![Topic::new("a")]);
        for (w, h) in [(0, 0), (1, 1), (3, 2), (10, 4), (2, 40)] {
            let canvas = compose(&app, &Layout::compute(w, h), &clock());
            assert_eq!((canvas.width(), canvas.height()), (w, h));
        }
    }

    #[test]
    fn long_topic_list_scrolls_to_selection() {
        let topics = (0..30).map(|i| Topic::new(format!("topic{:02}", i))).collect();
        let mut app = app_with(topics);
        app.select_topic(25);
        // 20 rows usable: topics panel 10 high, 8 visible rows.
        let rows = screen(&app, 80, 21);
        assert!(rows[1].contains("topic21"));
        assert!(rows[5].contains("> topic25"));
        assert!(!rows.iter().any(|r| r.contains("topic00")));
    }

    #[test]
    fn todos_follow_sort_projection_with_badge_and_urgency() {
        let mut topic = Topic::new("work");
        let mut overdue = todo("overdue", crate::model::Priority::Low);
        overdue.deadline = Some("01-06-2025".into());
        let mut done = todo("done", crate::model::Priority::High);
        done.completed = true;
        topic.todos = vec![overdue, done];
        let mut app = app_with(vec![topic]);
        app.active_tab = Tab::Todos;
        let rows = screen(&app, 80, 24);
        // Todos panel starts at row 11 (23 usable rows, topics take 11).
        assert!(rows[11].contains("Sort: Priority"));
        assert!(rows[12].contains("> ☑ done"));
        assert!(rows[13].contains("  ☐ overdue!"));
    }

    #[test]
    fn info_panel_lists_selected_todo() {
        let mut topic = Topic::new("home");
        let mut t = todo("water plants", crate::model::Priority::Medium);
        t.deadline = Some("15-06-2025".into());
        topic.todos = vec![t];
        let app = app_with(vec![topic]);
        let rows = screen(&app, 80, 24);
        assert!(rows[1].contains("Topic: home"));
        assert!(rows[2].contains("Todo:  water plants"));
        assert!(rows[3].contains("State: Not Completed"));
        assert!(rows[4].contains("Prio:  Medium | Due: 15-06-2025 !"));
        assert!(rows[5].contains("Date:  01-01-2025 09:00:00"));
    }

    #[test]
    fn notes_show_caret_and_inverted_selection() {
        let mut topic = Topic::new("t");
        let mut t = todo("n", crate::model::Priority::None);
        t.notes = "hello\nworld".into();
        topic.todos = vec![t];
        let mut app = app_with(vec![topic]);
        app.active_tab = Tab::Notes;
        app.nav_mode = false;
        app.with_notes(|editor, text| {
            editor.seed(text);
            editor.move_left(text);
            editor.move_left(text);
            editor.toggle_anchor();
            editor.move_left(text);
        });

        let layout = Layout::compute(80, 24);
        let canvas = compose(&app, &layout, &clock());
        let notes = layout.rect(Panel::Notes);
        let (x, y) = (notes.x + 1, notes.y + 1);
        let first: String = (0..5).map(|c| canvas.cell(x + c, y).unwrap().ch).collect();
        assert_eq!(first, "hello");
        let text: String = (0..5).map(|c| canvas.cell(x + c, y + 1).unwrap().ch).collect();
        // Caret sits on offset 8, inside the selection.
        assert_eq!(text, "wo|ld");
        assert!(canvas
            .cell(x + 2, y + 1)
            .unwrap()
            .style
            .add_modifier
            .contains(Modifier::REVERSED));
        assert!(!canvas
            .cell(x + 3, y + 1)
            .unwrap()
            .style
            .add_modifier
            .contains(Modifier::REVERSED));
    }

    #[test]
    fn caret_hidden_during_blink_off_phase() {
        let mut topic = Topic::new("t");
        let mut t = todo("n", crate::model::Priority::None);
        t.notes = "abc".into();
        topic.todos = vec![t];
        let mut app = app_with(vec![topic]);
        app.active_tab = Tab::Notes;
        app.nav_mode = false;
        app.with_notes(|editor, text| {
            editor.seed(text);
            editor.move_left(text);
        });

        let layout = Layout::compute(80, 24);
        let notes = layout.rect(Panel::Notes);
        let (x, y) = (notes.x + 1, notes.y + 1);
        let row = |canvas: &Canvas| -> String {
            (0..4).map(|c| canvas.cell(x + c, y).unwrap().ch).collect()
        };

        assert_eq!(row(&compose(&app, &layout, &clock())), "ab| ");
        app.caret.visible = false;
        let hidden = compose(&app, &layout, &clock());
        assert_eq!(row(&hidden), "abc ");
        assert!(!hidden.row_text(y).contains('|'));
    }

    #[test]
    fn caret_scrolls_long_notes_into_view() {
        let mut topic = Topic::new("t");
        let mut t = todo("n", crate::model::Priority::None);
        t.notes = (0..40).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n");
        topic.todos = vec![t];
        let mut app = app_with(vec![topic]);
        app.active_tab = Tab::Notes;
        app.nav_mode = false;
        app.with_notes(|editor, text| editor.seed(text));
        let rows = screen(&app, 80, 24);
        // Notes interior spans rows 8..=21 (14 rows); the last one holds the caret.
        assert!(rows[21].contains("line39|"));
        assert!(rows[8].contains("line26"));
    }

    #[test]
    fn prompt_replaces_help_row() {
        let mut app = app_with(Vec::new());
        app.open_prompt("Enter new topic name: ", PromptAction::NewTopic);
        if let Some(prompt) = app.prompt.as_mut() {
            prompt.buffer.push_str("Gar");
        }
        let rows = screen(&app, 80, 24);
        assert!(rows[23].starts_with("Enter new topic name: Gar_"));
    }

    #[test]
    fn help_depends_on_mode() {
        let mut app = app_with(Vec::new());
        app.nav_mode = false;
        app.active_tab = Tab::Todos;
        assert!(help_text(&app).starts_with("TODOS"));
        app.active_tab = Tab::Notes;
        assert!(help_text(&app).starts_with("NOTES"));
    }
}
