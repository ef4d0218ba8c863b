use crate::error::AlerterError;
use crate::rounded;
use configuration::TelegramConfig;
use core_types::AlertRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// The envelope every Bot API reply is wrapped in.
#[derive(Debug, Deserialize)]
struct BotApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Forwards alert text to one Telegram chat through the Bot API.
pub struct TelegramAlerter {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Returns `None` when the token or chat id is blank, which turns forwarding off.
    pub fn new(config: &TelegramConfig) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::info!("Telegram forwarding disabled (missing token or chat_id).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Points the alerter at another Bot API host, such as a self-hosted server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Posts `message` to the configured chat as MarkdownV2.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The Bot API reports failures as `{"ok": false, "description": ...}`,
        // usually alongside a 4xx status.
        match serde_json::from_str::<BotApiReply>(&body) {
            Ok(reply) if reply.ok && status.is_success() => Ok(()),
            Ok(reply) => Err(AlerterError::ApiError(
                reply.description.unwrap_or_else(|| format!("HTTP {status}")),
            )),
            Err(_) if status.is_success() => Ok(()),
            Err(_) => Err(AlerterError::ApiError(format!("HTTP {status}: {body}"))),
        }
    }
}

/// A long-running service that forwards every broadcast alert to Telegram.
///
/// Ends when the sending side of the channel is dropped.
pub async fn run_alerter_service(alerter: TelegramAlerter, mut alert_rx: broadcast::Receiver<AlertRecord>) {
    tracing::info!("Telegram alerter started.");

    if let Err(e) = alerter.send_message("✅ *Price monitor started*").await {
        tracing::error!(error = %e, "Failed to send Telegram startup message.");
    }

    loop {
        match alert_rx.recv().await {
            Ok(record) => {
                let message = telegram_message(&record);
                if let Err(e) = alerter.send_message(&message).await {
                    tracing::error!(error = ?e, pair = %record.pair, "Failed to send Telegram alert.");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Telegram alerter lagged, skipped {} alerts.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Alert channel closed. Telegram alerter shutting down.");
                break;
            }
        }
    }
}

fn telegram_message(record: &AlertRecord) -> String {
    let icon = if record.current_price >= record.previous_price { "📈" } else { "📉" };
    format!(
        "{} *{}* moved `{:.4}%`\n`{:.3}` → `{:.3}`",
        icon,
        escape_markdown(&record.pair),
        rounded(record.change_pct, 4),
        rounded(record.previous_price, 3),
        rounded(record.current_price, 3),
    )
}

/// A helper function to escape characters that have special meaning in Telegram's MarkdownV2.
fn escape_markdown(text: &str) -> String {
    let special_chars = r"_*[]()~`>#+-=|{}.!";
    text.chars().fold(String::with_capacity(text.len()), |mut s, c| {
        if special_chars.contains(c) {
            s.push('\\');
        }
        s.push(c);
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Answers one HTTP request per canned `(status, body)` and reports each
    /// request's path and body.
    async fn serve(replies: Vec<(u16, &'static str)>) -> (String, mpsc::UnboundedReceiver<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                let header_end = loop {
                    if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                    let n = socket.read(&mut buf).await.unwrap();
                    assert!(n > 0, "connection closed before headers");
                    request.extend_from_slice(&buf[..n]);
                };
                let head = String::from_utf8_lossy(&request[..header_end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while request.len() < header_end + content_length {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                let request_body = String::from_utf8_lossy(&request[header_end..]).to_string();
                seen_tx.send((path, request_body)).unwrap();

                let response = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        (format!("http://{addr}"), seen_rx)
    }

    fn alerter_for(api_base: &str) -> TelegramAlerter {
        let config = TelegramConfig { token: "123:abc".into(), chat_id: "42".into() };
        TelegramAlerter::new(&config).unwrap().with_api_base(api_base)
    }

    fn eth_drop() -> AlertRecord {
        AlertRecord {
            pair: "ETH-USD".to_string(),
            previous_price: dec!(3000),
            current_price: dec!(2970),
            change_pct: dec!(1),
            alert_time: Utc::now(),
            bot_config_id: 1,
        }
    }

    #[tokio::test]
    async fn send_message_posts_markdown_to_the_chat() {
        let (base, mut seen) = serve(vec![(200, r#"{"ok":true,"result":{}}"#)]).await;

        alerter_for(&base).send_message("hello").await.unwrap();

        let (path, body) = seen.recv().await.unwrap();
        assert_eq!(path, "/bot123:abc/sendMessage");
        assert!(body.contains(r#""chat_id":"42""#));
        assert!(body.contains(r#""text":"hello""#));
        assert!(body.contains(r#""parse_mode":"MarkdownV2""#));
    }

    #[tokio::test]
    async fn send_message_surfaces_the_api_description() {
        let (base, _seen) = serve(vec![(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )])
        .await;

        let err = alerter_for(&base).send_message("hello").await.unwrap_err();
        assert!(matches!(err, AlerterError::ApiError(ref d) if d.contains("chat not found")));
    }

    #[tokio::test]
    async fn service_forwards_alerts_until_the_channel_closes() {
        let (base, mut seen) = serve(vec![
            (500, r#"{"ok":false,"description":"startup hiccup"}"#),
            (200, r#"{"ok":true,"result":{}}"#),
        ])
        .await;
        let (alert_tx, alert_rx) = broadcast::channel(8);
        let service = tokio::spawn(run_alerter_service(alerter_for(&base), alert_rx));

        alert_tx.send(eth_drop()).unwrap();
        drop(alert_tx);
        tokio::time::timeout(Duration::from_secs(5), service).await.unwrap().unwrap();

        // A failed startup message does not stop the alert from going out.
        let (_, startup) = seen.recv().await.unwrap();
        assert!(startup.contains("Price monitor started"));
        let (_, alert) = seen.recv().await.unwrap();
        assert!(alert.contains("2970.000"));
        assert!(alert.contains("3000.000"));
    }

    #[test]
    fn escapes_markdown_specials_once() {
        assert_eq!(escape_markdown("BTC-USD"), "BTC\\-USD");
        assert_eq!(escape_markdown("a.b_c"), "a\\.b\\_c");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn disabled_without_credentials() {
        assert!(TelegramAlerter::new(&TelegramConfig::default()).is_none());
        let partial = TelegramConfig { token: "t".into(), chat_id: String::new() };
        assert!(TelegramAlerter::new(&partial).is_none());
    }

    #[test]
    fn message_shows_direction_and_prices() {
        let message = telegram_message(&eth_drop());
        assert!(message.starts_with("📉 *ETH\\-USD*"));
        assert!(message.contains("`2970.000`"));
    }
}
