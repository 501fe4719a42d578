use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::ApiState;
use crate::services::{is_valid_email, BeehiivClient, SubscribeOutcome};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

type Reply = (StatusCode, Json<SubscribeResponse>);

fn failure(status: StatusCode, error: impl Into<String>) -> Reply {
    (
        status,
        Json(SubscribeResponse {
            success: false,
            message: None,
            error: Some(error.into()),
            data: None,
        }),
    )
}

pub async fn subscribe(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Reply {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected subscribe body: {}", rejection);
            return failure(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let email = request.email.unwrap_or_default();
    if email.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Email is required");
    }
    if !is_valid_email(&email) {
        return failure(StatusCode::BAD_REQUEST, "Invalid email format");
    }

    let Some(publication_id) = state.beehiiv_publication_id.clone() else {
        error!("Missing BEEHIIV_PUBLICATION_ID");
        return failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error: Missing publication ID",
        );
    };
    let Some(api_key) = state.beehiiv_api_key.clone() else {
        error!("Missing BEEHIIV_API_KEY");
        return failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error: API key not set",
        );
    };

    let referring_site = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let client = BeehiivClient::new(state.http_client.clone(), publication_id, api_key);
    match client.subscribe(&email, referring_site).await {
        Ok(SubscribeOutcome::Subscribed(data)) => (
            StatusCode::OK,
            Json(SubscribeResponse {
                success: true,
                message: Some("Successfully subscribed".to_string()),
                error: None,
                data: Some(data),
            }),
        ),
        Ok(SubscribeOutcome::Rejected { status, message }) => failure(status, message),
        Err(e) => {
            error!("Subscription API error: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
        }
    }
}
