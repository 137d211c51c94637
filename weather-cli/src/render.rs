//! Plain-text rendering of a weather report.

use chrono::NaiveDate;
use std::fmt::Write;
use weather_core::{
    CurrentWeatherReading, FetchOutcome, UnavailableKind, UnavailableReason, WeatherReport,
    WeeklyForecast,
    display::{day_label, format_temperature, truncate_temperature},
};

pub fn report(report: &WeatherReport, today: NaiveDate) -> String {
    let mut out = String::new();
    let mut notes: Vec<String> = Vec::new();

    let place = report.place.value().map(String::as_str).unwrap_or("Location unknown");
    let _ = writeln!(out, "{place}");

    match &report.current {
        FetchOutcome::Fresh(current) | FetchOutcome::Stale(current) => {
            current_block(&mut out, current)
        }
        FetchOutcome::Unavailable(reason) => notes.push(unavailable_message(reason, "current")),
    }

    match &report.weekly {
        FetchOutcome::Fresh(weekly) | FetchOutcome::Stale(weekly) => {
            weekly_block(&mut out, weekly, today)
        }
        FetchOutcome::Unavailable(reason) => notes.push(unavailable_message(reason, "weekly")),
    }

    if let Some(advisory) = report.advisory {
        notes.push(advisory.message().to_string());
    }

    notes.dedup();
    for note in notes {
        let _ = writeln!(out, "\n{note}");
    }

    out
}

fn current_block(out: &mut String, current: &CurrentWeatherReading) {
    let _ = writeln!(
        out,
        "{} °C, {}",
        format_temperature(current.temperature_c),
        current.description()
    );
    let _ = writeln!(out, "Feels like {} °C", format_temperature(current.feels_like_c));
    let _ = writeln!(out, "Wind speed: {} m/s", current.wind_speed_ms);
    let _ = writeln!(out, "Cloud cover: {} %", current.cloud_cover_pct);
    let _ = writeln!(out, "Humidity: {} %", current.humidity_pct);
    let _ = writeln!(
        out,
        "Precipitation probability: {} %",
        current.precipitation_probability_pct
    );
}

fn weekly_block(out: &mut String, weekly: &WeeklyForecast, today: NaiveDate) {
    let _ = writeln!(out, "\nDaily forecast");
    for day in &weekly.days {
        let _ = writeln!(
            out,
            "  {:<12} min {:>3} °C   max {:>3} °C",
            day_label(&day.date, today),
            truncate_temperature(day.temperature_min_c),
            truncate_temperature(day.temperature_max_c),
        );
    }
}

fn unavailable_message(reason: &UnavailableReason, what: &str) -> String {
    match reason.kind() {
        UnavailableKind::ProviderError => {
            format!("Could not update the {what} forecast. Try again later.")
        }
        UnavailableKind::OfflineNoCache => {
            "No internet connection and no cached data.".to_string()
        }
        UnavailableKind::PlaceUnknown => "Location unknown.".to_string(),
    }
}
