//! Per-user dialogue: collect a city, offer a period choice, answer.
//!
//! Sessions live in a concurrency-safe map keyed by user id. They are
//! inserted explicitly on /start (or /city) and removed on every
//! terminal transition, successful or not; a user can always recover
//! with /city.

use std::sync::Arc;

use chrono::Local;
use dashmap::DashMap;

use crate::forecast;
use crate::format;
use crate::provider::WeatherProvider;
use crate::store::RequestLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingCity,
    AwaitingPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub stage: Stage,
    pub city: Option<String>,
}

impl Session {
    fn awaiting_city() -> Self {
        Self {
            stage: Stage::AwaitingCity,
            city: None,
        }
    }
}

/// Incoming dialogue triggers: the two named commands plus free text.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Start { first_name: &'a str },
    ChooseCity,
    Text(&'a str),
}

/// Which reply keyboard accompanies a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    Remove,
    PeriodMenu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Remove,
        }
    }

    fn with_menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::PeriodMenu,
        }
    }
}

/// The period menu decoded from raw text. Matching is case-insensitive
/// on the trimmed input; anything else is `Unrecognized` rather than a
/// silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodChoice {
    Today,
    Week,
    ChooseCity,
    Unrecognized,
}

impl PeriodChoice {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        if trimmed.eq_ignore_ascii_case(format::TODAY_LABEL) {
            PeriodChoice::Today
        } else if trimmed.eq_ignore_ascii_case(format::WEEK_LABEL) {
            PeriodChoice::Week
        } else if trimmed.eq_ignore_ascii_case(format::CHOOSE_CITY_LABEL) {
            PeriodChoice::ChooseCity
        } else {
            PeriodChoice::Unrecognized
        }
    }
}

#[derive(Debug)]
pub struct Dialogue {
    sessions: DashMap<i64, Session>,
    provider: Arc<dyn WeatherProvider>,
    log: RequestLog,
}

impl Dialogue {
    pub fn new(provider: Arc<dyn WeatherProvider>, log: RequestLog) -> Self {
        Self {
            sessions: DashMap::new(),
            provider,
            log,
        }
    }

    /// Snapshot of a user's session, if any.
    pub fn session(&self, user_id: i64) -> Option<Session> {
        self.sessions.get(&user_id).map(|entry| entry.value().clone())
    }

    pub async fn handle(&self, user_id: i64, event: Event<'_>) -> Reply {
        match event {
            Event::Start { first_name } => {
                self.sessions.insert(user_id, Session::awaiting_city());
                Reply::plain(format::greeting(first_name))
            }
            Event::ChooseCity => {
                self.sessions.insert(user_id, Session::awaiting_city());
                Reply::plain(format::CHOOSE_CITY_PROMPT)
            }
            Event::Text(text) => self.handle_text(user_id, text).await,
        }
    }

    async fn handle_text(&self, user_id: i64, text: &str) -> Reply {
        let Some(session) = self.session(user_id) else {
            return Reply::plain(format::NO_SESSION_HINT);
        };

        match session.stage {
            Stage::AwaitingCity => {
                let city = text.trim();
                if city.is_empty() {
                    return Reply::plain(format::EMPTY_CITY_PROMPT);
                }

                self.sessions.insert(
                    user_id,
                    Session {
                        stage: Stage::AwaitingPeriod,
                        city: Some(city.to_string()),
                    },
                );
                Reply::with_menu(format::PERIOD_PROMPT)
            }
            Stage::AwaitingPeriod => {
                let Some(city) = session.city else {
                    // A period stage without a city means the session is
                    // corrupt; start the city step over.
                    self.sessions.insert(user_id, Session::awaiting_city());
                    return Reply::plain(format::CHOOSE_CITY_PROMPT);
                };

                match PeriodChoice::parse(text) {
                    PeriodChoice::Today => {
                        self.sessions.remove(&user_id);
                        self.answer_today(user_id, &city).await
                    }
                    PeriodChoice::Week => {
                        self.sessions.remove(&user_id);
                        self.answer_week(user_id, &city).await
                    }
                    PeriodChoice::ChooseCity => {
                        self.sessions.insert(user_id, Session::awaiting_city());
                        Reply::plain(format::NEW_CITY_PROMPT)
                    }
                    PeriodChoice::Unrecognized => Reply::with_menu(format::UNRECOGNIZED_PERIOD),
                }
            }
        }
    }

    async fn answer_today(&self, user_id: i64, city: &str) -> Reply {
        let reading = match self.provider.current(city).await {
            Ok(Some(reading)) => reading,
            Ok(None) => return Reply::plain(format::WEATHER_FAILURE),
            Err(error) => {
                tracing::warn!(error = %error, city, "Current weather fetch failed");
                return Reply::plain(format::WEATHER_FAILURE);
            }
        };

        self.record(user_id, city).await;
        Reply::plain(format::current_weather(city, &reading))
    }

    async fn answer_week(&self, user_id: i64, city: &str) -> Reply {
        let bundle = match self.provider.forecast(city).await {
            Ok(Some(bundle)) => bundle,
            Ok(None) => return Reply::plain(format::FORECAST_FAILURE),
            Err(error) => {
                tracing::warn!(error = %error, city, "Forecast fetch failed");
                return Reply::plain(format::FORECAST_FAILURE);
            }
        };

        let today = Local::now().date_naive();
        let days = forecast::aggregate(&bundle.samples, &bundle.description, today);
        if days.is_empty() {
            return Reply::plain(format::FORECAST_FAILURE);
        }

        self.record(user_id, city).await;
        Reply::plain(format::weekly_forecast(city, &days))
    }

    /// A log failure must not take down a reply that already succeeded.
    async fn record(&self, user_id: i64, city: &str) {
        if let Err(error) = self.log.record(user_id, city).await {
            tracing::warn!(error = %error, user_id, city, "Failed to record weather request");
        }
    }
}
