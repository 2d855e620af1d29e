use std::fmt::Write as _;
use std::{time::Duration, time::Instant};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame, Terminal,
};
use tracing::{info, warn};

use crate::error::Result;
use crate::normalize::normalize;
use crate::prefs::{Settings, Store};
use crate::units::{format_wind, TemperatureUnit};
use crate::weather::{Condition, Weather};
use crate::weatherapi::WeatherApi;

const MISSING: &str = "--";
const TICK: Duration = Duration::from_millis(250);

/// Fetches and normalizes the forecast for `query`, then remembers the
/// resolved location in the search history and as the last location.
/// Failing to write those preferences is logged and does not fail the lookup.
pub fn fetch_weather(api: &WeatherApi, store: &Store, query: &str) -> Result<Weather> {
    let forecast = api.forecast(query)?;
    let days = forecast.raw_days()?;
    let reference = forecast
        .local_time()
        .unwrap_or_else(|| Local::now().naive_local());
    let weather = normalize(
        &days,
        &forecast.current_readings(),
        &forecast.location_label(),
        reference,
    )?;

    info!(query, location = %weather.location, hours = weather.hourly.len(), "forecast updated");
    if let Err(err) = store.record_search(&weather.location) {
        warn!(error = %err, "could not record search history");
    }
    if let Err(err) = store.set_last_location(&weather.location) {
        warn!(error = %err, "could not remember last location");
    }
    Ok(weather)
}

pub struct App {
    api: WeatherApi,
    store: Store,
    settings: Settings,
    unit: TemperatureUnit,
    query: String,
    weather: Option<Weather>,
    fetched_at: Option<DateTime<Local>>,
    status: Option<String>,
    saved: Vec<String>,
    history: Vec<String>,
    next_refresh: Option<Instant>,
}

impl App {
    pub fn new(
        api: WeatherApi,
        store: Store,
        settings: Settings,
        unit: TemperatureUnit,
        query: String,
    ) -> Self {
        Self {
            api,
            store,
            settings,
            unit,
            query,
            weather: None,
            fetched_at: None,
            status: None,
            saved: Vec::new(),
            history: Vec::new(),
            next_refresh: None,
        }
    }

    /// Refetches the current location. A failure keeps the last good data.
    fn refresh(&mut self) {
        match fetch_weather(&self.api, &self.store, &self.query) {
            Ok(weather) => {
                self.query = weather.location.clone();
                self.weather = Some(weather);
                self.fetched_at = Some(Local::now());
                self.status = None;
            }
            Err(err) => {
                warn!(query = %self.query, error = %err, "refresh failed");
                self.status = Some(err.to_string());
            }
        }
        self.reload_lists();
        self.next_refresh = self.settings.auto_refresh.then(|| {
            Instant::now() + Duration::from_secs(self.settings.refresh_interval.minutes() * 60)
        });
    }

    fn reload_lists(&mut self) {
        match (self.store.saved_locations(), self.store.history()) {
            (Ok(saved), Ok(history)) => {
                self.saved = saved;
                self.history = history;
            }
            (Err(err), _) | (_, Err(err)) => self.status = Some(err.to_string()),
        }
    }

    fn save_current(&mut self) {
        let Some(location) = self.weather.as_ref().map(|w| w.location.clone()) else {
            return;
        };
        self.status = Some(match self.store.save_location(&location) {
            Ok(true) => format!("Saved {location}"),
            Ok(false) if !self.settings.save_locations => {
                "Saving locations is turned off in settings".to_string()
            }
            Ok(false) => format!("{location} is already saved"),
            Err(err) => err.to_string(),
        });
        self.reload_lists();
    }

    fn select_saved(&mut self, index: usize) {
        if let Some(location) = self.saved.get(index) {
            self.query = location.clone();
            self.refresh();
        }
    }

    fn refresh_due(&self) -> bool {
        self.next_refresh
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Applies a key press. Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            _ if key.kind != KeyEventKind::Press => {}
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('u') => self.unit = self.unit.toggled(),
            KeyCode::Char('s') => self.save_current(),
            KeyCode::Char(c @ '1'..='9') => self.select_saved(c as usize - '1' as usize),
            _ => {}
        }
        false
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    app.refresh();
    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
        }

        if app.refresh_due() {
            app.refresh();
        }
    }
}

fn condition_color(condition: Condition) -> Color {
    match condition {
        Condition::Sunny => Color::Yellow,
        Condition::Cloudy => Color::Gray,
        Condition::PartlyCloudy => Color::LightYellow,
        Condition::Rainy => Color::Blue,
        Condition::Windy => Color::Cyan,
    }
}

fn condition_cell<'a>(condition: Condition) -> Cell<'a> {
    Cell::from(format!("{} {}", condition.glyph(), condition.label()))
        .style(Style::default().fg(condition_color(condition)))
}

fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn display_current_conditions<'a>(weather: Option<&Weather>, unit: TemperatureUnit) -> Table<'a> {
    let value = |text: String| Cell::from(text).style(Style::default().fg(Color::Green));

    let mut rows = vec![Row::new(vec![Cell::from("")])];
    match weather.map(|w| &w.current) {
        Some(current) => {
            rows.push(Row::new(vec![
                Cell::from(" Temperature"),
                value(unit.format_temp(current.temp)),
            ]));
            rows.push(Row::new(vec![
                Cell::from(" Conditions"),
                condition_cell(current.condition),
            ]));
            rows.push(Row::new(vec![
                Cell::from(" Humidity"),
                value(format!("{}%", current.humidity)),
            ]));
            rows.push(Row::new(vec![
                Cell::from(" Wind"),
                value(format_wind(current.wind)),
            ]));
        }
        None => rows.push(Row::new(vec![Cell::from(format!(" {MISSING}"))])),
    }

    Table::new(rows, [Constraint::Length(13), Constraint::Min(15)])
        .block(titled_block("Current Conditions"))
}

fn display_daily<'a>(weather: Option<&Weather>, unit: TemperatureUnit) -> Table<'a> {
    let rows: Vec<Row> = weather
        .map(|w| w.forecast.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|day| {
            Row::new(vec![
                Cell::from(format!(" {}", day.day)),
                Cell::from(unit.format_temp(day.temp)).style(Style::default().fg(Color::Green)),
                condition_cell(day.condition),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(7),
            Constraint::Min(15),
        ],
    )
    .block(titled_block("3-Day Forecast"))
}

fn display_hourly<'a>(weather: Option<&Weather>, unit: TemperatureUnit) -> Table<'a> {
    let rows: Vec<Row> = weather
        .map(|w| w.hourly.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|hour| {
            Row::new(vec![
                Cell::from(format!(" {:>5}", hour.time)),
                Cell::from(unit.format_temp(hour.temp)).style(Style::default().fg(Color::Green)),
                condition_cell(hour.condition),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(15),
        ],
    )
    .block(titled_block("Next 24 Hours"))
}

fn display_places<'a>(saved: &'a [String], history: &'a [String]) -> List<'a> {
    let heading = |text: &'a str| {
        ListItem::new(Line::from(Span::styled(
            text,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )))
    };

    let mut items = vec![heading(" Saved")];
    if saved.is_empty() {
        items.push(ListItem::new(format!("   {MISSING}")));
    }
    items.extend(
        saved
            .iter()
            .enumerate()
            .map(|(i, location)| ListItem::new(format!("   {} {location}", i + 1))),
    );

    items.push(heading(" Recent"));
    if history.is_empty() {
        items.push(ListItem::new(format!("   {MISSING}")));
    }
    items.extend(
        history
            .iter()
            .map(|location| ListItem::new(format!("     {location}"))),
    );

    List::new(items).block(titled_block("Locations"))
}

fn display_headline<'a>(app: &'a App) -> Paragraph<'a> {
    let location = app
        .weather
        .as_ref()
        .map_or(app.query.as_str(), |w| w.location.as_str());
    let fetched = app.fetched_at.map_or_else(
        || MISSING.to_string(),
        |at| at.format("%d-%m-%Y %H:%M").to_string(),
    );
    let refresh = if app.settings.auto_refresh {
        format!("every {} min", app.settings.refresh_interval.minutes())
    } else {
        "manual".to_string()
    };

    let accent = app
        .weather
        .as_ref()
        .map_or(Color::Cyan, |w| condition_color(w.current.condition));

    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                location,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!(
            " {fetched}  ·  {}  ·  refresh {refresh}",
            app.unit.symbol()
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .border_type(BorderType::Rounded),
    )
}

fn display_status(status: Option<&str>) -> Paragraph<'_> {
    match status {
        Some(message) => Paragraph::new(format!(" {message}")).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(" q quit  r refresh  u °C/°F  s save location  1-9 open saved")
            .style(Style::default().fg(Color::DarkGray)),
    }
}

fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(display_headline(app), vert_layout[0]);
    f.render_widget(display_status(app.status.as_deref()), vert_layout[2]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vert_layout[1]);

    let lchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    let weather = app.weather.as_ref();
    f.render_widget(display_current_conditions(weather, app.unit), lchunks[0]);
    f.render_widget(display_daily(weather, app.unit), lchunks[1]);
    f.render_widget(display_places(&app.saved, &app.history), lchunks[2]);
    f.render_widget(display_hourly(weather, app.unit), chunks[1]);
}

/// Plain text rendering used by `--once`.
pub fn report(weather: &Weather, unit: TemperatureUnit) -> String {
    let mut out = String::new();
    let current = &weather.current;

    // writing to a String cannot fail
    let _ = writeln!(out, "{}", weather.location);
    let _ = writeln!(
        out,
        "Now: {} {}, humidity {}%, wind {}",
        unit.format_temp(current.temp),
        current.condition,
        current.humidity,
        format_wind(current.wind),
    );

    let _ = writeln!(out, "\nNext 24 hours");
    for hour in &weather.hourly {
        let _ = writeln!(
            out,
            "  {:>5}  {:>5}  {}",
            hour.time,
            unit.format_temp(hour.temp),
            hour.condition
        );
    }

    let _ = writeln!(out, "\n{}-day forecast", weather.forecast.len());
    for day in &weather.forecast {
        let _ = writeln!(
            out,
            "  {:<10} {:>5}  {}",
            day.day,
            unit.format_temp(day.temp),
            day.condition
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{Current, Daily, Hourly};
    use crate::prefs::RefreshInterval;
    use crate::weatherapi::forecast::Forecast;
    use crate::weatherapi::tests::{forecast_ok, Provider};
    use chrono::Timelike;
    use crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn weather() -> Weather {
        Weather {
            location: "Oslo, Norway".to_string(),
            current: Current {
                temp: 4,
                condition: Condition::Windy,
                humidity: 80,
                wind: 32,
            },
            hourly: vec![
                Hourly {
                    time: "23:00".to_string(),
                    temp: 3,
                    condition: Condition::Cloudy,
                },
                Hourly {
                    time: "0:00".to_string(),
                    temp: 2,
                    condition: Condition::Rainy,
                },
            ],
            forecast: vec![Daily {
                day: "Monday".to_string(),
                temp: 5,
                condition: Condition::PartlyCloudy,
            }],
        }
    }

    #[test]
    fn test_report_celsius() {
        let text = report(&weather(), TemperatureUnit::Celsius);
        assert!(text.starts_with("Oslo, Norway\n"));
        assert!(text.contains("Now: 4°C Windy, humidity 80%, wind 32 km/h"));
        assert!(text.contains("  23:00    3°C  Cloudy"));
        assert!(text.contains("   0:00    2°C  Rainy"));
        assert!(text.contains("1-day forecast"));
        assert!(text.contains("  Monday       5°C  Partly Cloudy"));
    }

    #[test]
    fn test_report_fahrenheit() {
        let text = report(&weather(), TemperatureUnit::Fahrenheit);
        assert!(text.contains("Now: 39°F Windy, humidity 80%, wind 32 km/h"));
        assert!(text.contains("  Monday      41°F  Partly Cloudy"));
    }

    #[test]
    fn test_provider_response_to_display_model() {
        let forecast: Forecast =
            serde_json::from_value(crate::weatherapi::tests::sample()).unwrap();
        let reference = forecast.local_time().unwrap();
        let weather = normalize(
            &forecast.raw_days().unwrap(),
            &forecast.current_readings(),
            &forecast.location_label(),
            reference,
        )
        .unwrap();

        assert_eq!(reference.hour(), 9);
        assert_eq!(weather.location, "Madison, United States of America");
        assert_eq!(weather.current.temp, 13);
        assert_eq!(weather.current.wind, 19);
        assert_eq!(weather.current.condition, Condition::PartlyCloudy);
        assert_eq!(weather.hourly.len(), 24);
        assert_eq!(weather.hourly[0].time, "9:00");
        assert_eq!(weather.hourly[15].time, "0:00");
        assert_eq!(weather.hourly[15].temp, 3);
        let days: Vec<_> = weather.forecast.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(days, ["Monday", "Tuesday", "Wednesday"]);
        assert_eq!(weather.forecast[2].condition, Condition::Cloudy);
    }

    const MADISON: &str = "Madison, United States of America";

    fn app_with(provider: &Provider, store: &Store, settings: Settings, query: &str) -> App {
        App::new(
            provider.api(),
            store.clone(),
            settings,
            TemperatureUnit::Celsius,
            query.to_string(),
        )
    }

    #[test]
    fn test_fetch_survives_unreadable_history() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        fs::write(dir.path().join("history.json"), "{oops").unwrap();
        let provider = Provider::start();
        provider.mount(forecast_ok());

        let weather = fetch_weather(&provider.api(), &store, "Madison").unwrap();
        assert_eq!(weather.location, MADISON);
        assert_eq!(weather.hourly.len(), 24);
        assert_eq!(store.last_location().unwrap().as_deref(), Some(MADISON));
    }

    #[test]
    fn test_fetch_records_history_and_last_location() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let provider = Provider::start();
        provider.mount(forecast_ok());

        fetch_weather(&provider.api(), &store, "Madison").unwrap();
        assert_eq!(store.history().unwrap(), vec![MADISON]);
        assert_eq!(store.last_location().unwrap().as_deref(), Some(MADISON));
    }

    #[test]
    fn test_failed_refresh_keeps_last_weather() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let provider = Provider::start();
        provider.mount(forecast_ok());

        let mut app = app_with(&provider, &store, Settings::default(), "Madison");
        app.refresh();
        assert_eq!(app.query, MADISON);
        assert_eq!(app.status, None);
        assert_eq!(app.history, vec![MADISON]);
        let fetched_at = app.fetched_at;
        let before = app.weather.clone().unwrap();

        provider.reset();
        provider.mount(
            Mock::given(method("GET"))
                .and(path("/forecast.json"))
                .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                    "error": {"code": 9999, "message": "Internal application error."}
                }))),
        );
        app.refresh();

        assert_eq!(app.weather.as_ref(), Some(&before));
        assert_eq!(app.fetched_at, fetched_at);
        let status = app.status.clone().unwrap();
        assert!(status.contains("Internal application error."), "{status}");
    }

    #[test]
    fn test_refresh_schedule_follows_setting() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let provider = Provider::start();
        provider.mount(forecast_ok());

        let mut app = app_with(&provider, &store, Settings::default(), "Madison");
        app.refresh();
        assert_eq!(app.next_refresh, None);
        assert!(!app.refresh_due());

        let settings = Settings {
            auto_refresh: true,
            refresh_interval: RefreshInterval::Fifteen,
            ..Settings::default()
        };
        let mut app = app_with(&provider, &store, settings, "Madison");
        let started = Instant::now();
        app.refresh();
        let deadline = app.next_refresh.unwrap();
        assert!(deadline >= started + Duration::from_secs(15 * 60));
        assert!(!app.refresh_due());

        app.next_refresh = Some(Instant::now());
        assert!(app.refresh_due());
    }

    #[test]
    fn test_select_saved_fetches_that_location() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.save_location("Oslo, Norway").unwrap();
        let provider = Provider::start();
        provider.mount(
            Mock::given(method("GET"))
                .and(path("/forecast.json"))
                .and(query_param("q", "Oslo, Norway"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(crate::weatherapi::tests::sample()),
                )
                .expect(1),
        );

        let mut app = app_with(&provider, &store, Settings::default(), "Madison");
        app.reload_lists();
        app.select_saved(4);
        assert!(app.weather.is_none());

        app.select_saved(0);
        assert!(app.weather.is_some());
        assert_eq!(app.status, None);
    }

    #[test]
    fn test_save_current() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let provider = Provider::start();
        provider.mount(forecast_ok());

        let mut app = app_with(&provider, &store, Settings::default(), "Madison");
        app.save_current();
        assert_eq!(app.status, None);

        app.refresh();
        app.save_current();
        assert_eq!(app.status.as_deref(), Some("Saved Madison, United States of America"));
        assert_eq!(app.saved, vec![MADISON]);

        app.save_current();
        assert_eq!(
            app.status.as_deref(),
            Some("Madison, United States of America is already saved")
        );
    }

    #[test]
    fn test_save_current_when_disabled() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let settings = Settings {
            save_locations: false,
            ..Settings::default()
        };
        store.save_settings(&settings).unwrap();
        let provider = Provider::start();
        provider.mount(forecast_ok());

        let mut app = app_with(&provider, &store, settings, "Madison");
        app.refresh();
        app.save_current();
        assert_eq!(
            app.status.as_deref(),
            Some("Saving locations is turned off in settings")
        );
        assert!(app.saved.is_empty());
    }

    #[test]
    fn test_handle_key() {
        let dir = TempDir::new().unwrap();
        let provider = Provider::start();
        let mut app = app_with(&provider, &Store::new(dir.path()), Settings::default(), "X");

        let release = KeyEvent::new_with_kind(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        assert!(!app.handle_key(release));

        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::NONE)));
        assert_eq!(app.unit, TemperatureUnit::Fahrenheit);

        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
    }
}
