//! Backend errors -> STAPI error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use planet_client::ClientError;
use stapi_convert::ConvertError;
use stapi_types::{ProblemDetail, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Client(e) => match e {
                ClientError::MissingCredentials | ClientError::InvalidCredentials(_) => {
                    StatusCode::UNAUTHORIZED
                }
                ClientError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                ClientError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                ClientError::UpstreamRequest { .. }
                | ClientError::Protocol(_)
                | ClientError::UpstreamJob { .. }
                | ClientError::Transport(_)
                | ClientError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Convert(e) => match e {
                ConvertError::InvalidProductId(_) => StatusCode::BAD_REQUEST,
                ConvertError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ConvertError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ProblemDetail {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
