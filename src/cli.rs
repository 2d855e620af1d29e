use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::prefs::RefreshInterval;
use crate::units::TemperatureUnit;
use crate::weatherapi::BASE_URL;

const ABOUT: &str = "Weather forecast TUI";

const LONG_ABOUT: &str = "
TUI for viewing current conditions, a rolling 24-hour forecast and a 3-day outlook sourced from
WeatherAPI.com.

The user supplies a place name (e.g. \"Madison\", \"Oslo, Norway\") or coordinates. The last
location is remembered, so subsequent runs of `wx` show it unless another is given. With no
location at all, the provider locates you by IP address.

An API key from https://www.weatherapi.com is required.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT, args_conflicts_with_subcommands = true)]
pub struct Args {
    #[arg(help = "Place to look up (e.g. Madison, \"Oslo, Norway\", 10001)")]
    pub location: Option<String>,

    #[arg(long, requires = "lon", allow_hyphen_values = true, help = "Latitude, used with --lon instead of a place name")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true, help = "Longitude, used with --lat")]
    pub lon: Option<f64>,

    #[arg(short, long, value_enum, help = "Temperature unit (defaults to the saved setting)")]
    pub unit: Option<TemperatureUnit>,

    #[arg(long, help = "Print a plain text report and exit")]
    pub once: bool,

    #[arg(long, conflicts_with = "once", help = "Print the forecast as JSON and exit")]
    pub json: bool,

    #[arg(long, env = "WEATHERAPI_KEY", hide_env_values = true, help = "WeatherAPI.com API key")]
    pub api_key: Option<String>,

    #[arg(long, env = "WEATHERAPI_BASE_URL", default_value = BASE_URL, hide = true)]
    pub base_url: String,

    #[arg(long, env = "WX_CONFIG_DIR", help = "Directory for settings, saved locations and history")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Explicit location from the command line, coordinates taking precedence.
    pub fn query(&self) -> Option<String> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(format!("{lat},{lon}")),
            _ => self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage saved locations
    #[command(subcommand)]
    Locations(LocationsCommand),

    /// Manage search history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
pub enum LocationsCommand {
    List,
    Add { location: String },
    Remove { location: String },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    List,
    Remove { location: String },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    Set(SettingsUpdate),
    /// Clear saved locations and history and restore default settings
    Reset,
}

#[derive(ClapArgs, Debug, Default)]
pub struct SettingsUpdate {
    #[arg(long, value_enum)]
    pub unit: Option<TemperatureUnit>,

    #[arg(long)]
    pub auto_refresh: Option<bool>,

    #[arg(long, value_enum)]
    pub refresh_interval: Option<RefreshInterval>,

    #[arg(long)]
    pub save_history: Option<bool>,

    #[arg(long)]
    pub save_locations: Option<bool>,
}
