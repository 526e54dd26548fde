use crate::model::{Notebook, Priority, Todo, Topic};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use directories::ProjectDirs;
use log::{debug, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "TODO_V1";
pub const DATA_FILE: &str = "todos.todo";
pub const LOG_FILE: &str = "todos.log";

const TOPIC_TAG: &str = "TOPIC:";
const COUNT_TAG: &str = "NUM_TODOS:";
const TODO_TAG: &str = "TODO_META:";
const FIELD_SEP: &str = "\x1f";

/// The data file lives next to the executable; the platform data directory
/// is used when the executable's directory cannot be determined.
pub fn data_path() -> Result<PathBuf> {
    if let Some(dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        return Ok(dir.join(DATA_FILE));
    }
    let dirs = ProjectDirs::from("", "", "termtodo").context("locating data directory")?;
    Ok(dirs.data_dir().join(DATA_FILE))
}

/// Reads the data file. A missing file or a foreign header yields `None`.
pub fn load(path: &Path) -> Result<Option<Notebook>> {
    if !path.exists() {
        debug!("no data file at {}", path.display());
        return Ok(None);
    }
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let notebook = decode(&data);
    if notebook.is_none() {
        warn!("{} does not start with {}, ignoring it", path.display(), HEADER);
    }
    Ok(notebook)
}

pub fn save(path: &Path, notebook: &Notebook) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    fs::write(path, encode(notebook)).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

pub fn encode(notebook: &Notebook) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for topic in &notebook.topics {
        out.push_str(&format!("{}{}\n", TOPIC_TAG, topic.name));
        out.push_str(&format!("{}{}\n", COUNT_TAG, topic.todos.len()));
        for todo in &topic.todos {
            out.push_str(TODO_TAG);
            out.push_str(&encode_todo(todo));
            out.push('\n');
        }
    }
    out
}

fn encode_todo(todo: &Todo) -> String {
    let name = todo.name.replace('\n', "\\n");
    let priority = todo.priority.index().to_string();
    let completed = if todo.completed { "1" } else { "0" };
    let deadline = todo.deadline.as_deref().unwrap_or_default();
    let notes = BASE64.encode(todo.notes.as_bytes());
    [
        name.as_str(),
        priority.as_str(),
        completed,
        todo.created_at.as_str(),
        deadline,
        notes.as_str(),
    ]
    .join(FIELD_SEP)
}

/// Parses file contents. Returns `None` only when the header does not match;
/// bad records and fields are skipped or defaulted.
pub fn decode(data: &str) -> Option<Notebook> {
    let lines: Vec<&str> = data.lines().collect();
    if lines.first() != Some(&HEADER) {
        return None;
    }
    let mut topics = Vec::new();
    let mut idx = 1;
    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;
        let Some(name) = line.strip_prefix(TOPIC_TAG) else {
            continue;
        };
        let mut topic = Topic::new(name);
        if let Some(count) = lines.get(idx).and_then(|l| l.strip_prefix(COUNT_TAG)) {
            let count: usize = count.trim().parse().unwrap_or(0);
            idx += 1;
            for _ in 0..count {
                let Some(record) = lines.get(idx) else {
                    break;
                };
                idx += 1;
                if let Some(todo) = record.strip_prefix(TODO_TAG).and_then(decode_todo) {
                    topic.todos.push(todo);
                }
            }
        }
        topics.push(topic);
    }
    Some(Notebook::new(topics))
}

fn decode_todo(record: &str) -> Option<Todo> {
    let fields: Vec<&str> = record.split(FIELD_SEP).collect();
    if fields.len() < 6 {
        return None;
    }
    let priority = fields[1]
        .parse::<usize>()
        .map(Priority::from_index)
        .unwrap_or(Priority::None);
    let deadline = Some(fields[4])
        .filter(|d| !d.is_empty())
        .map(String::from);
    let notes = BASE64
        .decode(fields[5])
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default();
    Some(Todo {
        name: fields[0].replace("\\n", "\n"),
        priority,
        completed: fields[2] == "1",
        created_at: fields[3].to_string(),
        deadline,
        notes,
    })
}
