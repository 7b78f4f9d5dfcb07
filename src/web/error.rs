use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::routes::SubscribeError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        match self {
            Error::Subscribe(er) => er.status_code_and_client_error(),
        }
    }

    /// Short machine readable tag of the underlying failure, used in the request log.
    pub fn tag(&self) -> &str {
        match self {
            Error::Subscribe(er) => er.tag(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The errors a caller gets to see. `Display` is the message sent in the response body.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Missing required fields")]
    MissingFields,
    #[display("Invalid postcode format")]
    InvalidPostcode,
    #[display("Invalid request body")]
    InvalidBody,
    #[display("Server configuration error")]
    ConfigurationError,
    #[display("Failed to process subscription")]
    ServiceError,
}
