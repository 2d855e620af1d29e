use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, fs, io, sync::Mutex};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod error;
mod normalize;
mod prefs;
mod units;
mod weather;
mod weatherapi;

use crate::app::{fetch_weather, report, run_app, App};
use crate::cli::Args;
use crate::error::WxError;
use crate::prefs::Store;
use crate::weatherapi::{WeatherApi, AUTO_IP};

const LOG_ENV: &str = "WX_LOG";
const LOG_FILE: &str = "wx.log";

/// The TUI owns the terminal, so its logs go to a file in the config dir.
fn init_logging(store: &Store, to_file: bool) -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        fs::create_dir_all(store.dir())?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(store.dir().join(LOG_FILE))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = Args::parse();
    let store = Store::new(args.config_dir.clone().unwrap_or_else(Store::default_dir));
    init_logging(&store, args.command.is_none() && !args.once && !args.json)?;

    if let Some(command) = args.command.take() {
        commands::run(&store, command, &mut io::stdout().lock())?;
        return Ok(());
    }

    let settings = store.settings()?;
    let unit = args.unit.unwrap_or(settings.default_unit);
    let query = match args.query() {
        Some(query) => query,
        None => store
            .last_location()?
            .unwrap_or_else(|| AUTO_IP.to_string()),
    };
    let api_key = args
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(WxError::MissingApiKey)?;
    let api = WeatherApi::new(api_key, &args.base_url)?;

    if args.json {
        let weather = fetch_weather(&api, &store, &query)?;
        println!("{}", serde_json::to_string_pretty(&weather)?);
        return Ok(());
    }

    if args.once {
        let weather = fetch_weather(&api, &store, &query)?;
        print!("{}", report(&weather, unit));
        return Ok(());
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let res = run_app(&mut terminal, App::new(api, store, settings, unit, query));

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err}")
    }

    Ok(())
}
