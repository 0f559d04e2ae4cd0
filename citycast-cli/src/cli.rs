use anyhow::Context;
use chrono::{Days, Local};
use citycast_core::{
    Config, DailySummary, FavoritesStore, Units, WeatherSession, session::title_case,
};
use clap::{Parser, Subcommand};
use inquire::{Password, Select};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "Current weather, forecasts and favorite cities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred unit system.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, optionally with a country code, e.g. "Paris,FR".
        city: String,

        /// Also add the city to favorites.
        #[arg(long)]
        favorite: bool,
    },

    /// Show the daily forecast for a city.
    Forecast {
        city: String,

        /// Number of days to list (1-5, the provider's horizon).
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
        days: u8,

        /// Print the 3-hour breakdown for every day, not just today and tomorrow.
        #[arg(long)]
        hourly: bool,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List favorite cities.
    List,
    /// Look the city up, then add it to favorites.
    Add { city: String },
    /// Remove a city from favorites.
    Remove { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, favorite } => show(&mut open_session()?, &city, favorite).await,
            Command::Forecast { city, days, hourly } => {
                let mut session = open_session()?;
                session.search_city(&city).await?;
                print_forecast(&session, &city, usize::from(days), hourly);
                Ok(())
            }
            Command::Favorites { action } => match action {
                FavoritesAction::List => list_favorites(&mut open_favorites(&Config::load()?)?),
                FavoritesAction::Add { city } => {
                    let mut session = open_session()?;
                    session.search_city(&city).await?;
                    report_added(&city, session.add_current_to_favorites(Some(&city))?);
                    Ok(())
                }
                FavoritesAction::Remove { city } => {
                    remove_favorite(&mut open_favorites(&Config::load()?)?, &city)
                }
            },
        }
    }
}

fn open_session() -> anyhow::Result<WeatherSession> {
    WeatherSession::from_config(&Config::load()?)
}

/// Favorites are local, so listing and removing work without an API key.
fn open_favorites(config: &Config) -> anyhow::Result<FavoritesStore> {
    Ok(FavoritesStore::new(config.favorites_path()?))
}

async fn show(session: &mut WeatherSession, city: &str, favorite: bool) -> anyhow::Result<()> {
    let fetched_at = session.search_city(city).await?.fetched_at;
    println!("{}", session.format_summary());
    println!("Updated: {}", fetched_at.with_timezone(&Local).format("%H:%M:%S"));

    if favorite {
        report_added(city, session.add_current_to_favorites(None)?);
    }
    Ok(())
}

fn list_favorites(store: &mut FavoritesStore) -> anyhow::Result<()> {
    let favorites = store.list();
    if favorites.is_empty() {
        println!("No favorite cities yet.");
    } else {
        println!("Your Favorite Cities ({} cities)", favorites.len());
        for city in favorites.iter() {
            println!("  {city}");
        }
    }
    Ok(())
}

fn remove_favorite(store: &mut FavoritesStore, city: &str) -> anyhow::Result<()> {
    let removed = store
        .remove(city)
        .with_context(|| format!("Failed to update favorites while removing {city}"))?;
    if removed {
        println!("Removed {city} from favorites");
    } else {
        println!("{city} is not in favorites");
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let start = Units::all().iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Unit system:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read unit system")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn report_added(city: &str, added: bool) {
    if added {
        println!("{city} added to favorites!");
    } else {
        println!("{city} is already in favorites");
    }
}

fn print_forecast(session: &WeatherSession, city: &str, days: usize, hourly: bool) {
    let units = session.units();
    let t = units.temperature_symbol();

    println!("{days}-Day Forecast - {city}");
    if let Some(stats) = session.forecast_stats() {
        println!(
            "Max {:.1}{t}  Min {:.1}{t}  Average {:.1}{t}",
            stats.max, stats.min, stats.mean
        );
    }

    let tomorrow = Local::now().date_naive().checked_add_days(Days::new(1));
    for day in session.daily_forecast(days).values() {
        println!();
        print_day(day, units);
        if hourly || tomorrow.is_some_and(|limit| day.date <= limit) {
            print_hours(day, units);
        }
    }
}

fn print_day(day: &DailySummary, units: Units) {
    let t = units.temperature_symbol();
    println!("{}", day.date.format("%A, %B %d, %Y"));
    println!(
        "  Temperature Range: {:.1}{t} - {:.1}{t}",
        day.min_temperature, day.max_temperature
    );
    println!("  Main Condition: {}", title_case(&day.dominant_condition));
    println!("  Average Humidity: {:.0}%", day.avg_humidity);
    println!("  Average Wind: {:.1} {}", day.avg_wind_speed, units.wind_speed_symbol());
}

fn print_hours(day: &DailySummary, units: Units) {
    let t = units.temperature_symbol();
    for sample in &day.samples {
        println!(
            "    {}  {:>6.1}{t}  {:>3}%  {}",
            sample.time.with_timezone(&Local).format("%H:%M"),
            sample.temperature,
            sample.humidity_pct,
            title_case(&sample.condition),
        );
    }
}
