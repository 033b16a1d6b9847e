//! Print a short summary of the authenticated athlete.
//!
//! Reads `STRAVA_CLIENT_ID`, `STRAVA_CLIENT_SECRET` and `STRAVA_REFRESH_TOKEN`
//! from the environment.
//!
//! Run with: cargo run --example athlete_summary

use strava_sdk::{ActivityQuery, StravaClient, StravaError, StravaResult};

fn env(name: &str) -> StravaResult<String> {
    std::env::var(name).map_err(|_| StravaError::Config(format!("{} is not set", name)))
}

#[tokio::main]
async fn main() -> StravaResult<()> {
    tracing_subscriber::fmt::init();

    let client = StravaClient::builder()
        .client_id(env("STRAVA_CLIENT_ID")?)
        .client_secret(env("STRAVA_CLIENT_SECRET")?)
        .refresh_token(env("STRAVA_REFRESH_TOKEN")?)
        .build()?;

    let athlete = client.athletes().current().await?;
    println!(
        "Athlete {}: {} {}",
        athlete.id,
        athlete.firstname.as_deref().unwrap_or(""),
        athlete.lastname.as_deref().unwrap_or("")
    );

    let stats = client.athletes().stats(athlete.id).await?;
    if let Some(totals) = stats.all_run_totals {
        println!("All-time running: {:.1} km", totals.distance.unwrap_or(0.0) / 1000.0);
    }

    println!("\nRecent activities:");
    for activity in client.activities().list(&ActivityQuery::recent(5)).await? {
        println!(
            "  {} {} ({:.1} km)",
            activity.id,
            activity.name.as_deref().unwrap_or("Untitled"),
            activity.distance.unwrap_or(0.0) / 1000.0
        );

        let laps = client.activities().laps(activity.id).await?;
        println!("    {} laps", laps.len());
    }

    Ok(())
}
