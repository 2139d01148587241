//! Message texts and menu labels. Pure formatting; replies are sent
//! with HTML parse mode, so user-controlled values are escaped here.

use crate::model::{ForecastDay, WeatherReading};

pub const TODAY_LABEL: &str = "Today's weather";
pub const WEEK_LABEL: &str = "Weekly forecast";
pub const CHOOSE_CITY_LABEL: &str = "Choose city";
pub const MENU_PLACEHOLDER: &str = "Pick an option from the menu :)";

pub const CHOOSE_CITY_PROMPT: &str = "Choose the city you want the weather for:";
pub const NEW_CITY_PROMPT: &str = "Enter a new city:";
pub const EMPTY_CITY_PROMPT: &str = "Please send a city name:";
pub const PERIOD_PROMPT: &str =
    "Great! Would you like today's weather or the forecast for the week?";
pub const UNRECOGNIZED_PERIOD: &str = "Please choose one of the menu options.";
pub const WEATHER_FAILURE: &str = "Could not fetch weather data.";
pub const FORECAST_FAILURE: &str = "Could not fetch forecast data.";
pub const NO_SESSION_HINT: &str = "Send /start to begin.";

pub fn greeting(first_name: &str) -> String {
    format!(
        "Hi, {}!\nI'm a bot that can tell you the weather in any city on the planet!\nWhich city would you like the weather for?",
        escape_html(first_name)
    )
}

pub fn current_weather(city: &str, reading: &WeatherReading) -> String {
    format!(
        "Weather in {} today:\n\
         Temperature: {}°C\n\
         Description: {}\n\
         Humidity: {}%\n\
         Wind speed: {} m/s",
        escape_html(city),
        reading.temp_c,
        reading.description,
        reading.humidity_pct,
        reading.wind_speed_mps,
    )
}

pub fn weekly_forecast(city: &str, days: &[ForecastDay]) -> String {
    let mut message = format!("Weather forecast for {} for the week:\n", escape_html(city));
    for day in days {
        message.push_str(&format!(
            "{}: Temperature: {}°C, Description: {}\n",
            day.date.format("%d-%m-%Y"),
            day.temp_c,
            day.description,
        ));
    }
    message
}

/// Minimal escaping for Telegram's HTML parse mode.
pub fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
