//! Minimal Telegram Bot API client: only the handful of methods this
//! bot needs, spoken as plain JSON over HTTPS.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use weatherbot_core::Keyboard;
use weatherbot_core::format;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Server-side long-poll hold time for getUpdates, in seconds.
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct TelegramApi {
    token: String,
    base_url: String,
    http: Client,
}

impl TelegramApi {
    pub fn new(token: String) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    /// Same as [`Self::new`] but against a custom endpoint, so tests can
    /// point the client at a local mock server.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self> {
        // The transport timeout must outlast a held long poll.
        let http = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
            .build()
            .context("Failed to build HTTP client for Telegram")?;

        Ok(Self {
            token,
            base_url,
            http,
        })
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Drop any webhook plus pending updates, as a polling bot should at
    /// startup.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({ "drop_pending_updates": true }),
            )
            .await?;
        Ok(())
    }

    /// Register the two bot commands shown in the client UI.
    pub async fn set_my_commands(&self) -> Result<()> {
        let commands = [
            BotCommand {
                command: "start",
                description: "Meet the bot",
            },
            BotCommand {
                command: "city",
                description: "Choose a new city",
            },
        ];

        let _: bool = self
            .call("setMyCommands", &serde_json::json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": LONG_POLL_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_markup: reply_markup(keyboard),
        };

        let _: Message = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Telegram ({method})"))?;

        let envelope: ApiEnvelope<T> = res
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {method} response"))?;

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(anyhow!("Telegram {method} failed: {description}"));
        }

        envelope
            .result
            .ok_or_else(|| anyhow!("Telegram {method} response contained no result"))
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct BotCommand {
    command: &'static str,
    description: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    reply_markup: ReplyMarkup,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
    input_field_placeholder: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardRemove {
    remove_keyboard: bool,
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    text: String,
}

/// Map a dialogue keyboard request onto the Bot API payload.
pub fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::PeriodMenu => ReplyMarkup::Keyboard(period_menu()),
        Keyboard::Remove => ReplyMarkup::Remove(ReplyKeyboardRemove {
            remove_keyboard: true,
        }),
    }
}

/// The one-shot period menu: two period buttons on the first row, the
/// city switch on the second.
fn period_menu() -> ReplyKeyboardMarkup {
    let button = |label: &str| KeyboardButton {
        text: label.to_string(),
    };

    ReplyKeyboardMarkup {
        keyboard: vec![
            vec![button(format::TODAY_LABEL), button(format::WEEK_LABEL)],
            vec![button(format::CHOOSE_CITY_LABEL)],
        ],
        resize_keyboard: true,
        one_time_keyboard: true,
        input_field_placeholder: format::MENU_PLACEHOLDER.to_string(),
    }
}
