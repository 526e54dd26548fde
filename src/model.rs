use chrono::{Local, NaiveDate, NaiveDateTime};

pub const CREATED_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
pub const DEADLINE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
    None,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::None,
    ];

    /// Rank used for sorting and persistence; `High` is 0.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Out-of-range indices fall back to the lowest priority.
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or(Priority::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Priority,
    Deadline,
    Created,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Priority => SortMode::Deadline,
            SortMode::Deadline => SortMode::Created,
            SortMode::Created => SortMode::Priority,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Priority => "Priority",
            SortMode::Deadline => "Deadline",
            SortMode::Created => "Created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Ok,
    Today,
    Past,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub name: String,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: String,
    pub deadline: Option<String>,
    pub notes: String,
}

impl Todo {
    pub fn new(name: impl Into<String>, priority: Priority, deadline: Option<String>) -> Self {
        Todo {
            name: name.into(),
            priority,
            completed: false,
            created_at: Local::now().format(CREATED_FORMAT).to_string(),
            deadline,
            notes: String::new(),
        }
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.as_deref().and_then(parse_deadline)
    }

    pub fn created_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.created_at, CREATED_FORMAT).ok()
    }

    pub fn deadline_status(&self, today: NaiveDate) -> DeadlineStatus {
        deadline_status(self.deadline.as_deref(), today)
    }
}

pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DEADLINE_FORMAT).ok()
}

/// Missing or unparseable deadlines are never urgent.
pub fn deadline_status(deadline: Option<&str>, today: NaiveDate) -> DeadlineStatus {
    match deadline.and_then(parse_deadline) {
        Some(date) if date < today => DeadlineStatus::Past,
        Some(date) if date == today => DeadlineStatus::Today,
        _ => DeadlineStatus::Ok,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub todos: Vec<Todo>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Topic {
            name: name.into(),
            todos: Vec::new(),
        }
    }
}

/// Display order of a topic's todos as indices into `topic.todos`.
///
/// Storage order is never touched; ties keep their stored order.
pub fn order_todos(topic: &Topic, mode: SortMode) -> Vec<usize> {
    let todos = &topic.todos;
    let mut indices: Vec<usize> = (0..todos.len()).collect();
    let deadline_key = |t: &Todo| t.deadline_date().unwrap_or(NaiveDate::MAX);
    match mode {
        SortMode::Priority => {
            indices.sort_by_key(|&i| (todos[i].priority.index(), deadline_key(&todos[i])))
        }
        SortMode::Deadline => {
            indices.sort_by_key(|&i| (deadline_key(&todos[i]), todos[i].priority.index()))
        }
        SortMode::Created => indices.sort_by(|&a, &b| {
            let ka = todos[a].created_timestamp();
            let kb = todos[b].created_timestamp();
            (ka.is_none(), ka, &todos[a].created_at).cmp(&(kb.is_none(), kb, &todos[b].created_at))
        }),
    }
    indices
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Notebook {
    pub topics: Vec<Topic>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum NotebookError {
    #[error("topic not found: #{0}")]
    TopicNotFound(usize),
    #[error("todo not found: #{0}")]
    TodoNotFound(usize),
}

impl Notebook {
    pub fn new(topics: Vec<Topic>) -> Self {
        Notebook { topics }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn topic(&self, idx: usize) -> Option<&Topic> {
        self.topics.get(idx)
    }

    pub fn topic_mut(&mut self, idx: usize) -> Option<&mut Topic> {
        self.topics.get_mut(idx)
    }

    /// Appends a topic and returns its index. Duplicate names are allowed.
    pub fn add_topic(&mut self, name: impl Into<String>) -> usize {
        self.topics.push(Topic::new(name));
        self.topics.len() - 1
    }

    /// Removes a topic together with all of its todos.
    pub fn remove_topic(&mut self, idx: usize) -> Result<Topic, NotebookError> {
        if idx >= self.topics.len() {
            return Err(NotebookError::TopicNotFound(idx));
        }
        Ok(self.topics.remove(idx))
    }

    pub fn add_todo(&mut self, topic_idx: usize, todo: Todo) -> Result<usize, NotebookError> {
        let topic = self
            .topics
            .get_mut(topic_idx)
            .ok_or(NotebookError::TopicNotFound(topic_idx))?;
        topic.todos.push(todo);
        Ok(topic.todos.len() - 1)
    }

    pub fn remove_todo(&mut self, topic_idx: usize, todo_idx: usize) -> Result<Todo, NotebookError> {
        let topic = self
            .topics
            .get_mut(topic_idx)
            .ok_or(NotebookError::TopicNotFound(topic_idx))?;
        if todo_idx >= topic.todos.len() {
            return Err(NotebookError::TodoNotFound(todo_idx));
        }
        Ok(topic.todos.remove(todo_idx))
    }

    pub fn update_todo<F>(&mut self, topic_idx: usize, todo_idx: usize, f: F) -> Result<(), NotebookError>
    where
        F: FnOnce(&mut Todo),
    {
        let topic = self
            .topics
            .get_mut(topic_idx)
            .ok_or(NotebookError::TopicNotFound(topic_idx))?;
        let todo = topic
            .todos
            .get_mut(todo_idx)
            .ok_or(NotebookError::TodoNotFound(todo_idx))?;
        f(todo);
        Ok(())
    }
}
