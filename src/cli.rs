use clap::Parser;

/// Takes no arguments; the data file lives next to the executable.
#[derive(Parser, Debug)]
#[command(
    name = "termtodo",
    version,
    about = "Terminal todo lists grouped by topic, with notes"
)]
pub struct Cli {}
