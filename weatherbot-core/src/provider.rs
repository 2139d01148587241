use crate::model::{ForecastBundle, WeatherReading};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Abstraction over the upstream weather service.
///
/// Both operations distinguish "the provider answered, but not with
/// data" (`Ok(None)`, any non-success HTTP status) from transport-level
/// failure (`Err`). Callers that only care about "did we get weather"
/// treat the two alike; the distinction exists so the cause can be
/// logged.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a free-text city name.
    async fn current(&self, city: &str) -> anyhow::Result<Option<WeatherReading>>;

    /// Raw multi-day forecast samples for a free-text city name.
    async fn forecast(&self, city: &str) -> anyhow::Result<Option<ForecastBundle>>;
}
