use std::io::Write;

use crate::cli::{Command, HistoryCommand, LocationsCommand, SettingsCommand, SettingsUpdate};
use crate::error::Result;
use crate::prefs::{Settings, Store};

pub fn run(store: &Store, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Locations(command) => locations(store, command, out),
        Command::History(command) => history(store, command, out),
        Command::Settings(command) => settings(store, command, out),
    }
}

fn print_list(items: &[String], out: &mut impl Write) -> Result<()> {
    if items.is_empty() {
        writeln!(out, "--")?;
    }
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "{:>2}. {item}", i + 1)?;
    }
    Ok(())
}

fn locations(store: &Store, command: LocationsCommand, out: &mut impl Write) -> Result<()> {
    match command {
        LocationsCommand::List => print_list(&store.saved_locations()?, out)?,
        LocationsCommand::Add { location } => {
            if store.save_location(&location)? {
                writeln!(out, "Saved {}", location.trim())?;
            } else if !store.settings()?.save_locations {
                writeln!(out, "Saving locations is turned off in settings")?;
            } else {
                writeln!(out, "{} is already saved", location.trim())?;
            }
        }
        LocationsCommand::Remove { location } => {
            if store.remove_location(&location)? {
                writeln!(out, "Removed {location}")?;
            } else {
                writeln!(out, "{location} is not saved")?;
            }
        }
    }
    Ok(())
}

fn history(store: &Store, command: HistoryCommand, out: &mut impl Write) -> Result<()> {
    match command {
        HistoryCommand::List => print_list(&store.history()?, out)?,
        HistoryCommand::Remove { location } => {
            if store.remove_from_history(&location)? {
                writeln!(out, "Removed {location}")?;
            } else {
                writeln!(out, "{location} is not in the history")?;
            }
        }
        HistoryCommand::Clear => {
            store.clear_history()?;
            writeln!(out, "Search history cleared")?;
        }
    }
    Ok(())
}

fn settings(store: &Store, command: SettingsCommand, out: &mut impl Write) -> Result<()> {
    match command {
        SettingsCommand::Show => show_settings(&store.settings()?, out),
        SettingsCommand::Set(update) => {
            let settings = apply(store.settings()?, update);
            store.save_settings(&settings)?;
            show_settings(&settings, out)
        }
        SettingsCommand::Reset => {
            store.clear_all()?;
            writeln!(out, "All app data has been reset to defaults")?;
            Ok(())
        }
    }
}

fn apply(mut settings: Settings, update: SettingsUpdate) -> Settings {
    if let Some(unit) = update.unit {
        settings.default_unit = unit;
    }
    if let Some(auto_refresh) = update.auto_refresh {
        settings.auto_refresh = auto_refresh;
    }
    if let Some(interval) = update.refresh_interval {
        settings.refresh_interval = interval;
    }
    if let Some(save_history) = update.save_history {
        settings.save_search_history = save_history;
    }
    if let Some(save_locations) = update.save_locations {
        settings.save_locations = save_locations;
    }
    settings
}

fn show_settings(settings: &Settings, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{:18}{}", "Unit", settings.default_unit.symbol())?;
    writeln!(out, "{:18}{}", "Auto refresh", settings.auto_refresh)?;
    writeln!(
        out,
        "{:18}{} min",
        "Refresh interval",
        settings.refresh_interval.minutes()
    )?;
    writeln!(out, "{:18}{}", "Save history", settings.save_search_history)?;
    writeln!(out, "{:18}{}", "Save locations", settings.save_locations)?;
    Ok(())
}
