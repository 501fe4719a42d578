use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::Result;

const BEEHIIV_API_URL: &str = "https://api.beehiiv.com/v2";
const DEFAULT_ERROR: &str = "Failed to subscribe. Please try again.";
const NOT_FOUND_ERROR: &str =
    "Beehiiv API endpoint not found (404). Check your publication ID configuration.";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
        .is_match(email)
}

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    email: &'a str,
    reactivate_existing: bool,
    send_welcome_email: bool,
    referring_site: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    /// Body returned by the audience API, passed through to the caller.
    Subscribed(Value),
    /// The API refused; status is the upstream one.
    Rejected { status: StatusCode, message: String },
}

pub struct BeehiivClient {
    client: Client,
    publication_id: String,
    api_key: String,
}

impl BeehiivClient {
    pub fn http_client() -> Result<Client> {
        Ok(Client::builder().timeout(Duration::from_secs(30)).build()?)
    }

    pub fn new(client: Client, publication_id: String, api_key: String) -> Self {
        Self {
            client,
            publication_id,
            api_key,
        }
    }

    pub async fn subscribe(&self, email: &str, referring_site: &str) -> Result<SubscribeOutcome> {
        let request = SubscribeRequest {
            email,
            reactivate_existing: true,
            send_welcome_email: true,
            referring_site,
        };

        let response = self
            .client
            .post(format!(
                "{}/publications/{}/subscriptions",
                BEEHIIV_API_URL, self.publication_id
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = parse_body(&response.text().await?);

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Beehiiv API error");
            return Ok(SubscribeOutcome::Rejected {
                status,
                message: error_message(status, &body),
            });
        }

        info!("Subscriber added");
        Ok(SubscribeOutcome::Subscribed(body))
    }
}

/// Empty or non-JSON bodies become an empty object.
fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        error!("Failed to parse Beehiiv response as JSON: {}", e);
        Value::Object(Default::default())
    })
}

fn error_message(status: StatusCode, body: &Value) -> String {
    if status == StatusCode::NOT_FOUND {
        return NOT_FOUND_ERROR.to_string();
    }

    if let Some(message) = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
    {
        return message.to_string();
    }

    match body.get("errors") {
        Some(Value::Array(errors)) => errors
            .first()
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ERROR)
            .to_string(),
        Some(Value::String(message)) => message.clone(),
        _ => DEFAULT_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email("a.b+tag@sub.example.co"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("reader example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(SubscribeRequest {
            email: "reader@example.com",
            reactivate_existing: true,
            send_welcome_email: true,
            referring_site: "https://site.example.com/",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "email": "reader@example.com",
                "reactivate_existing": true,
                "send_welcome_email": true,
                "referring_site": "https://site.example.com/"
            })
        );
    }

    #[test]
    fn test_not_found_message_wins() {
        let body = json!({"error": {"message": "nope"}});
        assert_eq!(error_message(StatusCode::NOT_FOUND, &body), NOT_FOUND_ERROR);
    }

    #[test]
    fn test_error_message_extraction_order() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, &json!({"error": {"message": "Email blocked"}, "errors": ["x"]})),
            "Email blocked"
        );
        assert_eq!(
            error_message(status, &json!({"errors": ["Too many requests", "other"]})),
            "Too many requests"
        );
        assert_eq!(error_message(status, &json!({"errors": "Bad input"})), "Bad input");
        assert_eq!(error_message(status, &json!({"error": {"message": ""}})), DEFAULT_ERROR);
        assert_eq!(error_message(status, &json!({})), DEFAULT_ERROR);
    }

    #[test]
    fn test_unparseable_body_is_empty_object() {
        assert_eq!(parse_body("<html>oops</html>"), json!({}));
        assert_eq!(parse_body("   "), json!({}));
        assert_eq!(parse_body(r#"{"data":{"id":"sub_1"}}"#), json!({"data": {"id": "sub_1"}}));
    }
}
