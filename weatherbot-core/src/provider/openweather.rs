use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{ForecastBundle, ForecastSample, WeatherReading};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const LANG: &str = "en";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Same as [`Self::new`] but against a custom endpoint, so tests can
    /// point the client at a local mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }

    async fn get(&self, resource: &str, city: &str) -> Result<Option<String>> {
        let url = format!("{}/data/2.5/{resource}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("lang", LANG),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({resource})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {resource} response body"))?;

        if !status.is_success() {
            // Not-found, rate-limited and server errors all collapse to
            // "no data"; the status is only interesting to operators.
            tracing::warn!(%status, body = %truncate_body(&body), city, resource, "OpenWeather request failed");
            return Ok(None);
        }

        Ok(Some(body))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<Option<WeatherReading>> {
        let Some(body) = self.get("weather", city).await? else {
            return Ok(None);
        };

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        let description = parsed
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(Some(WeatherReading {
            temp_c: parsed.main.temp,
            description,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
        }))
    }

    async fn forecast(&self, city: &str) -> Result<Option<ForecastBundle>> {
        let Some(body) = self.get("forecast", city).await? else {
            return Ok(None);
        };

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        let description = parsed
            .list
            .first()
            .and_then(|e| e.weather.first())
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let samples = parsed
            .list
            .iter()
            .filter_map(|entry| match parse_dt_txt(&entry.dt_txt) {
                Some(at) => Some(ForecastSample {
                    at,
                    temp_c: entry.main.temp,
                }),
                None => {
                    tracing::warn!(dt_txt = %entry.dt_txt, "Skipping forecast sample with unparseable timestamp");
                    None
                }
            })
            .collect();

        Ok(Some(ForecastBundle {
            samples,
            description,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwCurrentMain,
    weather: Vec<OwDescription>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwDescription>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Parse a forecast timestamp. OpenWeather sends `YYYY-MM-DD HH:MM:SS`;
/// an ISO `T` separator and a trailing `Z` (UTC offset zero) are also
/// accepted.
fn parse_dt_txt(raw: &str) -> Option<NaiveDateTime> {
    let normalized = raw.trim().trim_end_matches('Z').replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S").ok()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::with_base_url("TESTKEY".to_string(), server.uri())
            .expect("client must build")
    }

    #[test]
    fn parses_space_and_iso_timestamps() {
        let space = parse_dt_txt("2024-05-10 12:00:00").expect("space form");
        let iso = parse_dt_txt("2024-05-10T12:00:00Z").expect("iso form");

        assert_eq!(space, iso);
        assert!(parse_dt_txt("not a timestamp").is_none());
    }

    #[tokio::test]
    async fn current_maps_all_fields_on_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Moscow"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "TESTKEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Moscow",
                "main": { "temp": 7.3, "feels_like": 4.1, "humidity": 81 },
                "weather": [{ "description": "light rain" }],
                "wind": { "speed": 3.6 }
            })))
            .mount(&server)
            .await;

        let reading = provider(&server)
            .current("Moscow")
            .await
            .expect("request succeeds")
            .expect("reading present");

        assert_eq!(
            reading,
            WeatherReading {
                temp_c: 7.3,
                description: "light rain".to_string(),
                humidity_pct: 81,
                wind_speed_mps: 3.6,
            }
        );
    }

    #[tokio::test]
    async fn current_returns_none_on_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .mount(&server)
            .await;

        let reading = provider(&server)
            .current("Atlantis")
            .await
            .expect("non-200 is not a transport error");

        assert!(reading.is_none());
    }

    #[tokio::test]
    async fn forecast_collects_samples_and_first_description() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("q", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    {
                        "dt_txt": "2024-05-10 12:00:00",
                        "main": { "temp": 10.0 },
                        "weather": [{ "description": "scattered clouds" }]
                    },
                    {
                        "dt_txt": "2024-05-10 15:00:00",
                        "main": { "temp": 12.0 },
                        "weather": [{ "description": "overcast clouds" }]
                    },
                    {
                        "dt_txt": "garbage",
                        "main": { "temp": 99.0 },
                        "weather": []
                    }
                ]
            })))
            .mount(&server)
            .await;

        let bundle = provider(&server)
            .forecast("Oslo")
            .await
            .expect("request succeeds")
            .expect("bundle present");

        assert_eq!(bundle.description, "scattered clouds");
        assert_eq!(bundle.samples.len(), 2);
        assert_eq!(bundle.samples[0].temp_c, 10.0);
        assert_eq!(bundle.samples[1].temp_c, 12.0);
    }

    #[tokio::test]
    async fn forecast_returns_none_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let bundle = provider(&server)
            .forecast("Oslo")
            .await
            .expect("non-200 is not a transport error");

        assert!(bundle.is_none());
    }
}
