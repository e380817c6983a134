pub mod report;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;

/// Delivery channel for rendered reports. Sinks never see snapshots or
/// events, only finished text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
    fn describe(&self) -> String;
}

pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

/// Telegram bot delivery via the sendMessage API.
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("rollcall/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build Telegram HTTP client");
        Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        self.client
            .post(&url)
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", text),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn describe(&self) -> String {
        // Keep the bot token out of logs.
        format!("telegram:{}", self.chat_id)
    }
}

pub fn build_notifiers(config: &Config) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if config.notify.enable_stdout {
        notifiers.push(Box::new(StdoutNotifier));
    }
    if let Some((token, chat_id)) = config.notify.telegram_credentials() {
        notifiers.push(Box::new(TelegramNotifier::new(token, chat_id)));
    }
    notifiers
}
