mod app;
mod canvas;
mod cli;
mod commands;
mod editor;
mod geometry;
mod input;
mod model;
mod render;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::Path;

fn main() -> Result<()> {
    let _args = cli::Cli::parse();
    let data_path = storage::data_path()?;
    init_logging(&data_path);
    info!("starting with data file {}", data_path.display());
    commands::tui(data_path)
}

/// Logs go to a file beside the data file; the terminal belongs to the UI.
fn init_logging(data_path: &Path) {
    let log_path = data_path.with_file_name(storage::LOG_FILE);
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(file) = File::create(log_path) {
        let _ = WriteLogger::init(LevelFilter::Debug, config, file);
    }
}
