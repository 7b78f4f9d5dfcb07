use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    marketing_client::{self, ContactProfile, ListAttach},
    web::{
        types::{DataParsingError, DeserSignup, ValidSignup},
        ClientError, WebResult,
    },
    AppState,
};

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("request body could not be read as a signup: {0}")]
    InvalidBody(String),
    #[error("invalid signup: {0}")]
    Validation(#[from] DataParsingError),
    #[error("marketing platform credentials are not configured")]
    NotConfigured,
    #[error("marketing platform call failed")]
    Integration(#[from] marketing_client::Error),
}

impl SubscribeError {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use SubscribeError::*;

        match self {
            InvalidBody(_) => (StatusCode::BAD_REQUEST, ClientError::InvalidBody),
            Validation(DataParsingError::MissingFields) => {
                (StatusCode::BAD_REQUEST, ClientError::MissingFields)
            }
            Validation(DataParsingError::InvalidPostcode) => {
                (StatusCode::BAD_REQUEST, ClientError::InvalidPostcode)
            }
            NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::ConfigurationError,
            ),
            Integration(_) => (StatusCode::INTERNAL_SERVER_ERROR, ClientError::ServiceError),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            SubscribeError::InvalidBody(_) => "invalid_body",
            SubscribeError::Validation(DataParsingError::MissingFields) => "missing_fields",
            SubscribeError::Validation(DataParsingError::InvalidPostcode) => "invalid_postcode",
            SubscribeError::NotConfigured => "configuration_error",
            SubscribeError::Integration(er) => er.as_ref(),
        }
    }
}

// ###################################
// ->   API
// ###################################
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Validates a signup, upserts the contact on the marketing platform and adds it to the
/// configured list. A rejected list attach is logged but still answers with success.
#[tracing::instrument(
    name = "Forwarding a new signup",
    skip(app_state, payload),
    fields(postcode = tracing::field::Empty)
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    payload: Result<Json<DeserSignup>, JsonRejection>,
) -> WebResult<Json<SubscribeResponse>> {
    let Json(signup) = payload.map_err(|er| SubscribeError::InvalidBody(er.body_text()))?;
    let signup = ValidSignup::try_from(signup).map_err(SubscribeError::Validation)?;
    tracing::Span::current().record("postcode", signup.postcode.as_ref());

    let client = app_state
        .marketing_client
        .as_ref()
        .ok_or(SubscribeError::NotConfigured)?;

    let profile = ContactProfile {
        first_name: signup.first_name.as_ref(),
        phone_number: signup.phone.as_ref(),
        postcode: signup.postcode.as_ref(),
        source: &app_state.source,
        signup_date: Utc::now().to_rfc3339(),
    };

    let profile_id = client
        .upsert_profile(&profile)
        .await
        .map_err(SubscribeError::Integration)?;

    match client
        .add_to_list(&profile_id)
        .await
        .map_err(SubscribeError::Integration)?
    {
        ListAttach::Attached => info!(
            "{:<12} - profile {} subscribed to the list",
            "SUBSCRIBE",
            profile_id.as_ref()
        ),
        ListAttach::Rejected(status) => warn!(
            "{:<12} - list attach for {} returned {status}",
            "SUBSCRIBE",
            profile_id.as_ref()
        ),
    }

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Successfully subscribed",
    }))
}
