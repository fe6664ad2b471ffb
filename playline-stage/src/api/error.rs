//! Error-to-response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use playline_common::api::ErrorResponse;
use playline_common::model::StageName;
use playline_common::Error;

/// An error leaving this service as an HTTP response.
///
/// `stage` is the stage the error originated at; a hop propagating a
/// downstream transport failure leaves it unset.
#[derive(Debug)]
pub struct ApiError {
    pub stage: Option<StageName>,
    pub error: Error,
}

impl ApiError {
    pub fn new(stage: StageName, error: Error) -> Self {
        Self {
            stage: Some(stage),
            error,
        }
    }

    pub fn unattributed(error: Error) -> Self {
        Self { stage: None, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            Error::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Error::Transport { .. } | Error::UpstreamStage { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse::from_error(self.stage, &self.error));
        (status, body).into_response()
    }
}
