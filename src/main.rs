use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use ridecast::error::ProviderFailure;
use ridecast::providers::{OpenMeteoPlaces, SuggestionProvider, bounded};
use ridecast::{
    FieldRole, Panel, ProviderDeadlines, RideConfig, RideSession, SessionHandle, SessionSnapshot,
    VERSION, logging,
};

#[derive(Parser)]
#[command(name = "ridecast")]
#[command(
    about = "Ride estimates and destination weather from free-text places",
    long_about = None
)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List place suggestions for partial text
    Suggest {
        /// Text as typed into a pickup or destination field
        text: String,
    },

    /// Resolve pickup and destination, then show the ride estimate and weather
    Estimate {
        /// Pickup search text
        #[arg(long)]
        pickup: String,

        /// Destination search text
        #[arg(long)]
        destination: String,

        /// Which suggestion to accept for each field (1 = first)
        #[arg(long, default_value_t = 1)]
        pick: usize,

        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RideConfig::load_from_path(cli.config).context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;
    debug!(
        "Routing profile '{}', vehicle policy '{}'",
        config.routing.profile, config.pricing.vehicle_policy
    );

    match cli.command {
        Commands::Suggest { text } => suggest(&config, &text).await,
        Commands::Estimate {
            pickup,
            destination,
            pick,
            json,
        } => estimate(&config, &pickup, &destination, pick, json).await,
    }
}

async fn suggest(config: &RideConfig, text: &str) -> Result<()> {
    let places = OpenMeteoPlaces::new(config.places.clone())?;
    let deadline = ProviderDeadlines::from_config(config).suggestions;

    match bounded(deadline, places.suggest(text)).await {
        Ok(suggestions) => {
            for (i, suggestion) in suggestions.iter().enumerate() {
                println!("{:>2}. {}", i + 1, suggestion.description);
            }
        }
        Err(e) => println!("{}", e.user_message()),
    }
    Ok(())
}

async fn estimate(
    config: &RideConfig,
    pickup: &str,
    destination: &str,
    pick: usize,
    json: bool,
) -> Result<()> {
    if pick == 0 {
        bail!("--pick starts at 1");
    }

    let session = RideSession::spawn_from_config(config)?;

    resolve_field(&session, FieldRole::Pickup, pickup, pick).await?;
    resolve_field(&session, FieldRole::Destination, destination, pick).await?;

    let snapshot = session
        .wait_for(|s| settled(&s.estimate) && settled(&s.weather))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_summary(&snapshot);
    }
    Ok(())
}

fn settled<T, E>(panel: &Panel<T, E>) -> bool {
    matches!(panel, Panel::Ready(_) | Panel::Failed(_))
}

/// Type `text` into a field, then accept its `pick`-th suggestion
async fn resolve_field(
    session: &SessionHandle,
    role: FieldRole,
    text: &str,
    pick: usize,
) -> Result<()> {
    session.type_text(role, text)?;
    let snapshot = session
        .wait_for(|s| {
            let field = s.field(role);
            field.text == text && !field.loading
        })
        .await?;

    let field = snapshot.field(role);
    if let Some(error) = &field.error {
        bail!("{}: {}", role, error.user_message());
    }

    let description = field
        .suggestions
        .get(pick - 1)
        .map(|s| s.description.clone())
        .ok_or_else(|| {
            anyhow!(
                "{}: {} suggestion(s) for '{}', cannot pick #{}",
                role,
                field.suggestions.len(),
                text,
                pick
            )
        })?;

    session.select_suggestion(role, description.as_str())?;
    let snapshot = session
        .wait_for(|s| {
            let field = s.field(role);
            field.resolved_label.as_deref() == Some(description.as_str())
                || (field.error.is_some() && !field.resolving)
        })
        .await?;

    match &snapshot.field(role).error {
        Some(error) => bail!("{}: {}", role, error.user_message()),
        None => Ok(()),
    }
}

fn print_summary(snapshot: &SessionSnapshot) {
    for field in [&snapshot.pickup, &snapshot.destination] {
        if let Some(at) = field.resolved {
            println!("{:<12} {} ({})", format!("{}:", field.role), field.text, at);
        }
    }
    println!();

    match &snapshot.estimate {
        Panel::Ready(estimate) => {
            println!("Vehicle:     {}", estimate.vehicle_class);
            println!("Price:       {}", estimate.price);
            println!("Duration:    {} min", estimate.display_minutes());
            println!("Distance:    {:.1} km", estimate.display_km());
            println!("Quoted at:   {}", estimate.quoted_at.format("%Y-%m-%d %H:%M UTC"));
        }
        Panel::Failed(error) => println!("Estimate:    {}", error.user_message()),
        Panel::Idle | Panel::Loading => println!("Estimate:    unavailable"),
    }
    println!();

    match &snapshot.weather {
        Panel::Ready(weather) => {
            let current = &weather.current;
            println!(
                "Weather:     {}, {} (feels like {:.0}°C), humidity {}%, wind {}",
                current.description,
                current.format_temperature(),
                current.feels_like_c,
                current.humidity_pct,
                current.format_wind()
            );
            for day in &weather.forecast {
                println!("  {:<10} {:<16} {}", day.weekday(), day.format_range(), day.description);
            }
        }
        Panel::Failed(error) => println!("Weather:     {}", error.user_message()),
        Panel::Idle | Panel::Loading => println!("Weather:     unavailable"),
    }
}
