use crate::editor::NotesEditor;
use crate::model::{order_todos, Notebook, NotebookError, Priority, SortMode, Todo, Topic};
use crate::storage;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);
pub const STATUS_OK_TTL: Duration = Duration::from_secs(2);
pub const STATUS_ERR_TTL: Duration = Duration::from_secs(3);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Topics,
    Todos,
    Notes,
}

/// What happens to the prompt buffer once Enter is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    NewTopic,
    TodoName,
    TodoPriority { name: String },
    TodoDeadline { name: String, priority: Priority },
    DeleteTopic { index: usize },
    DeleteTodo { topic: usize, todo: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub buffer: String,
    pub action: PromptAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub until: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretBlink {
    pub visible: bool,
    pub last_toggle: Instant,
}

pub struct App {
    pub notebook: Notebook,
    pub data_path: PathBuf,
    pub active_tab: Tab,
    pub nav_mode: bool,
    pub topic_index: usize,
    /// Index into the stored (unsorted) todos of the selected topic.
    pub todo_index: usize,
    pub sort_mode: SortMode,
    pub prompt: Option<Prompt>,
    pub editor: NotesEditor,
    pub status: Option<StatusMessage>,
    pub caret: CaretBlink,
}

impl App {
    pub fn new(notebook: Notebook, data_path: PathBuf) -> Self {
        let mut app = App {
            notebook,
            data_path,
            active_tab: Tab::Topics,
            nav_mode: true,
            topic_index: 0,
            todo_index: 0,
            sort_mode: SortMode::Priority,
            prompt: None,
            editor: NotesEditor::default(),
            status: None,
            caret: CaretBlink {
                visible: true,
                last_toggle: Instant::now(),
            },
        };
        app.reseed_todo_selection();
        app
    }

    pub fn current_topic(&self) -> Option<&Topic> {
        self.notebook.topic(self.topic_index)
    }

    pub fn current_todo(&self) -> Option<&Todo> {
        self.current_topic()
            .and_then(|topic| topic.todos.get(self.todo_index))
    }

    /// Display order of the selected topic's todos under the current sort mode.
    pub fn display_order(&self) -> Vec<usize> {
        self.current_topic()
            .map(|topic| order_todos(topic, self.sort_mode))
            .unwrap_or_default()
    }

    /// Runs `f` on the editor and the selected todo's notes, if there is one.
    pub fn with_notes<R>(&mut self, f: impl FnOnce(&mut NotesEditor, &mut String) -> R) -> Option<R> {
        let App {
            notebook,
            editor,
            topic_index,
            todo_index,
            ..
        } = self;
        let todo = notebook
            .topic_mut(*topic_index)
            .and_then(|topic| topic.todos.get_mut(*todo_index))?;
        Some(f(editor, &mut todo.notes))
    }

    pub fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status = Some(StatusMessage {
            text: text.into(),
            until: Instant::now() + ttl,
        });
    }

    pub fn status_text(&self, now: Instant) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| now < s.until)
            .map(|s| s.text.as_str())
    }

    /// Per-frame housekeeping: caret blink and status expiry.
    pub fn tick(&mut self, now: Instant) {
        if now.duration_since(self.caret.last_toggle) >= BLINK_INTERVAL {
            self.caret.visible = !self.caret.visible;
            self.caret.last_toggle = now;
        }
        if self.status.as_ref().is_some_and(|s| now >= s.until) {
            self.status = None;
        }
    }

    pub fn open_prompt(&mut self, text: impl Into<String>, action: PromptAction) {
        self.prompt = Some(Prompt {
            text: text.into(),
            buffer: String::new(),
            action,
        });
    }

    /// Selects a topic (clamped) and, if the selection changed, moves the
    /// todo selection to the first displayed row of that topic.
    pub fn select_topic(&mut self, index: usize) {
        let clamped = index.min(self.notebook.len().saturating_sub(1));
        if clamped != self.topic_index {
            self.topic_index = clamped;
            self.reseed_todo_selection();
        }
    }

    fn reseed_todo_selection(&mut self) {
        self.todo_index = self.display_order().first().copied().unwrap_or(0);
    }

    /// Brings both selection indices back into range after a removal.
    pub fn clamp_selection(&mut self) {
        self.topic_index = self.topic_index.min(self.notebook.len().saturating_sub(1));
        let todo_count = self.current_topic().map_or(0, |t| t.todos.len());
        self.todo_index = self.todo_index.min(todo_count.saturating_sub(1));
    }

    pub fn create_topic(&mut self, name: &str) {
        let index = self.notebook.add_topic(name);
        info!("created topic #{} {:?}", index, name);
        self.select_topic(index);
        self.active_tab = Tab::Topics;
        self.nav_mode = false;
    }

    pub fn delete_topic(&mut self, index: usize) -> Result<(), NotebookError> {
        let removed = self.notebook.remove_topic(index)?;
        info!(
            "deleted topic {:?} with {} todos",
            removed.name,
            removed.todos.len()
        );
        self.topic_index = index.min(self.notebook.len().saturating_sub(1));
        self.reseed_todo_selection();
        Ok(())
    }

    /// Appends a todo to the selected topic and selects it.
    pub fn create_todo(&mut self, todo: Todo) -> Result<(), NotebookError> {
        info!("creating todo {:?} in topic #{}", todo.name, self.topic_index);
        self.todo_index = self.notebook.add_todo(self.topic_index, todo)?;
        Ok(())
    }

    pub fn delete_todo(&mut self, topic: usize, todo: usize) -> Result<(), NotebookError> {
        let removed = self.notebook.remove_todo(topic, todo)?;
        info!("deleted todo {:?}", removed.name);
        if topic == self.topic_index {
            let remaining = self.current_topic().map_or(0, |t| t.todos.len());
            self.todo_index = todo.min(remaining.saturating_sub(1));
        }
        self.clamp_selection();
        Ok(())
    }

    pub fn toggle_todo(&mut self) -> Result<(), NotebookError> {
        self.notebook
            .update_todo(self.topic_index, self.todo_index, |todo| {
                todo.completed = !todo.completed
            })
    }

    pub fn cycle_sort(&mut self) {
        self.sort_mode = self.sort_mode.next();
    }

    /// Writes the notebook to disk and reports the outcome on the status line.
    pub fn save(&mut self) -> bool {
        match storage::save(&self.data_path, &self.notebook) {
            Ok(()) => {
                let file = self
                    .data_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| storage::DATA_FILE.to_string());
                info!("saved {}", self.data_path.display());
                self.set_status(format!("Saved {}", file), STATUS_OK_TTL);
                true
            }
            Err(err) => {
                warn!("save failed: {:#}", err);
                self.set_status(format!("Save failed: {}", err), STATUS_ERR_TTL);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) fn todo(name: &str, priority: Priority) -> Todo {
        Todo {
            name: name.into(),
            priority,
            completed: false,
            created_at: "01-01-2025 09:00:00".into(),
            deadline: None,
            notes: String::new(),
        }
    }

    pub(crate) fn app_with(topics: Vec<Topic>) -> App {
        App::new(Notebook::new(topics), PathBuf::from("/nonexistent/todos.todo"))
    }

    fn named(names: &[&str]) -> Vec<Topic> {
        names.iter().map(|n| Topic::new(*n)).collect()
    }

    #[test]
    fn deleting_last_selected_topic_moves_selection_up() {
        let mut app = app_with(named(&["A", "B", "C"]));
        app.select_topic(2);
        app.delete_topic(2).unwrap();
        assert_eq!(app.topic_index, 1);
        assert_eq!(app.notebook.len(), 2);
    }

    #[test]
    fn deleting_first_topic_keeps_selection_at_zero() {
        let mut app = app_with(named(&["A", "B", "C"]));
        app.delete_topic(0).unwrap();
        assert_eq!(app.topic_index, 0);
        assert_eq!(app.current_topic().unwrap().name, "B");
    }

    #[test]
    fn deleting_missing_topic_is_an_error() {
        let mut app = app_with(named(&["A"]));
        assert_eq!(app.delete_topic(4), Err(NotebookError::TopicNotFound(4)));
    }

    #[test]
    fn switching_topic_selects_first_displayed_todo() {
        let mut work = Topic::new("work");
        work.todos = vec![todo("low", Priority::Low), todo("high", Priority::High)];
        let mut app = app_with(vec![Topic::new("home"), work]);
        app.select_topic(1);
        assert_eq!(app.todo_index, 1);
    }

    #[test]
    fn deleting_todo_reclamps_selection() {
        let mut topic = Topic::new("t");
        topic.todos = vec![todo("a", Priority::None), todo("b", Priority::None)];
        let mut app = app_with(vec![topic]);
        app.todo_index = 1;
        app.delete_todo(0, 1).unwrap();
        assert_eq!(app.todo_index, 0);
        app.delete_todo(0, 0).unwrap();
        assert_eq!(app.todo_index, 0);
        assert!(app.current_todo().is_none());
    }

    #[test]
    fn toggle_flips_completion() {
        let mut topic = Topic::new("t");
        topic.todos = vec![todo("a", Priority::None)];
        let mut app = app_with(vec![topic]);
        app.toggle_todo().unwrap();
        assert!(app.current_todo().unwrap().completed);
        app.toggle_todo().unwrap();
        assert!(!app.current_todo().unwrap().completed);
    }

    #[test]
    fn creating_todo_without_topics_fails() {
        let mut app = app_with(Vec::new());
        assert_eq!(
            app.create_todo(todo("x", Priority::High)),
            Err(NotebookError::TopicNotFound(0))
        );
    }

    #[test]
    fn caret_blinks_on_interval() {
        let mut app = app_with(Vec::new());
        let start = app.caret.last_toggle;
        app.tick(start + Duration::from_millis(100));
        assert!(app.caret.visible);
        app.tick(start + BLINK_INTERVAL);
        assert!(!app.caret.visible);
    }

    #[test]
    fn status_expires() {
        let mut app = app_with(Vec::new());
        app.set_status("hello", STATUS_OK_TTL);
        let now = Instant::now();
        assert_eq!(app.status_text(now), Some("hello"));
        app.tick(now + STATUS_ERR_TTL);
        assert_eq!(app.status_text(now), None);
    }

    #[test]
    fn failed_save_reports_on_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let mut app = app_with(named(&["A"]));
        app.data_path = blocker.join("todos.todo");
        assert!(!app.save());
        assert!(app.status.unwrap().text.starts_with("Save failed"));
    }
}
