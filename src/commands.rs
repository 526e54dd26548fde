use crate::app::{App, STATUS_ERR_TTL};
use crate::model::Notebook;
use crate::storage;
use crate::ui;
use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;

/// Loads the notebook next to the executable and runs the terminal UI.
pub fn tui(data_path: PathBuf) -> Result<()> {
    let mut load_error = None;
    let notebook = match storage::load(&data_path) {
        Ok(Some(notebook)) => {
            info!(
                "loaded {} topics from {}",
                notebook.len(),
                data_path.display()
            );
            notebook
        }
        Ok(None) => Notebook::default(),
        Err(err) => {
            warn!("load failed: {:#}", err);
            load_error = Some(err);
            Notebook::default()
        }
    };

    let mut app = App::new(notebook, data_path);
    if let Some(err) = load_error {
        app.set_status(format!("Load failed: {}", err), STATUS_ERR_TTL);
    }
    ui::run(app)
}
