//! Tomorrow.io weather code table.
//! See: https://docs.tomorrow.io/reference/data-layers-weather-codes

/// Shown for any code missing from the table.
pub const UNKNOWN_DESCRIPTION: &str = "description unavailable";

/// Human-readable description for a provider weather code. Never fails and
/// never returns an empty string.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Unknown",
        1000 => "Clear, Sunny",
        1001 => "Cloudy",
        1100 => "Mostly Clear",
        1101 => "Partly Cloudy",
        1102 => "Mostly Cloudy",
        2000 => "Fog",
        2100 => "Light Fog",
        4000 => "Drizzle",
        4001 => "Rain",
        4200 => "Light Rain",
        4201 => "Heavy Rain",
        5000 => "Snow",
        5001 => "Flurries",
        5100 => "Light Snow",
        5101 => "Heavy Snow",
        6000 => "Freezing Drizzle",
        6001 => "Freezing Rain",
        6200 => "Light Freezing Rain",
        6201 => "Heavy Freezing Rain",
        7000 => "Ice Pellets",
        7101 => "Heavy Ice Pellets",
        7102 => "Light Ice Pellets",
        8000 => "Thunderstorm",
        _ => UNKNOWN_DESCRIPTION,
    }
}
