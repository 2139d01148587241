//! Core library for the Telegram weather bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider
//! - Forecast aggregation (3-hour samples into daily averages)
//! - The per-user dialogue state machine
//! - The append-only request log
//!
//! It is used by `weatherbot-telegram`, but can also be reused by other
//! binaries or services.

pub mod config;
pub mod dialogue;
pub mod forecast;
pub mod format;
pub mod model;
pub mod provider;
pub mod store;

pub use config::Config;
pub use dialogue::{Dialogue, Event, Keyboard, Reply};
pub use model::{ForecastBundle, ForecastDay, ForecastSample, WeatherReading};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use store::RequestLog;
