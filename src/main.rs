mod app;
mod cli;
mod config;
mod db;
mod event;
mod logging;
mod projection;
mod store;
mod suggest;
mod tui;
mod types;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let config = config::load(cli_opts.config.as_deref()).context("failed to load config")?;

    if let Err(err) = logging::init_logging(&config.log.level, &config.log_path()) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let db_path = cli_opts.db.clone().unwrap_or_else(|| config.db_path());
    let conn = db::init(&db_path)?;
    let mut store = store::Store::load(conn);
    let source = suggest::build_source(&config.suggestions);

    if let Some(command) = cli_opts.command {
        return cli::run(command, &mut store, source.as_ref());
    }

    let mut app = app::App::new(store, source, config.suggestions.stage_interval());
    let mut terminal = tui::init()?;
    let result = event::run(&mut app, &mut terminal);

    tui::restore()?;

    result
}
