use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single point-in-time observation, as returned by the provider's
/// current-weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temp_c: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

/// One timestamped sub-day sample from the 5-day/3-hour forecast feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub at: NaiveDateTime,
    pub temp_c: f64,
}

/// Raw forecast response: every sample plus the response-level
/// description (taken from the first sample, not per day).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBundle {
    pub samples: Vec<ForecastSample>,
    pub description: String,
}

/// One calendar day's averaged reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Mean of the day's sample temperatures, rounded to 2 decimals.
    pub temp_c: f64,
    pub description: String,
}
