//! Long-poll loop: fetch updates and route each message through the
//! dialogue. Updates are handled on their own tasks so one user's
//! provider call never stalls another's.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use weatherbot_core::{Dialogue, Event};

use crate::telegram::{Message, TelegramApi};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    City,
}

/// Recognize `/start` and `/city`, with an optional `@botname` suffix.
/// Anything else is free text for the dialogue.
fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let command = first.split('@').next().unwrap_or(first);

    match command {
        "/start" => Some(Command::Start),
        "/city" => Some(Command::City),
        _ => None,
    }
}

pub async fn run(api: TelegramApi, dialogue: Arc<Dialogue>) -> anyhow::Result<()> {
    api.delete_webhook().await?;
    api.set_my_commands().await?;

    let me = api.get_me().await?;
    info!(
        bot = %me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Telegram, polling for updates"
    );

    let api = Arc::new(api);
    let mut offset = 0i64;

    loop {
        let updates = match api.get_updates(offset).await {
            Ok(updates) => updates,
            Err(error) => {
                warn!(error = %error, "getUpdates failed, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(message) = update.message {
                let api = Arc::clone(&api);
                let dialogue = Arc::clone(&dialogue);
                tokio::spawn(async move {
                    handle_message(&api, &dialogue, message).await;
                });
            }
        }
    }
}

async fn handle_message(api: &TelegramApi, dialogue: &Dialogue, message: Message) {
    let Some(text) = message.text.as_deref() else {
        return;
    };

    let chat_id = message.chat.id;
    // Channel posts carry no sender; key those by chat instead.
    let user_id = message.from.as_ref().map_or(chat_id, |user| user.id);
    let first_name = message
        .from
        .as_ref()
        .map_or("there", |user| user.first_name.as_str());

    let event = match parse_command(text) {
        Some(Command::Start) => Event::Start { first_name },
        Some(Command::City) => Event::ChooseCity,
        None => Event::Text(text),
    };

    let reply = dialogue.handle(user_id, event).await;

    if let Err(error) = api.send_message(chat_id, &reply.text, reply.keyboard).await {
        warn!(error = %error, chat_id, "Failed to send reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_bare_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/city"), Some(Command::City));
    }

    #[test]
    fn recognizes_suffixed_and_padded_commands() {
        assert_eq!(parse_command("/start@weather_bot"), Some(Command::Start));
        assert_eq!(parse_command("  /city  "), Some(Command::City));
        assert_eq!(parse_command("/start hello"), Some(Command::Start));
    }

    #[test]
    fn everything_else_is_free_text() {
        assert_eq!(parse_command("Moscow"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("start"), None);
    }
}
