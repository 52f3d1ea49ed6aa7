use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use lens_track_engine::traits::{RiderApiError, ShopOrderApiError, TrackingApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("API key is missing.")]
    MissingApiKey,
    #[error("Access denied. Invalid API key.")]
    InvalidApiKey,
    #[error("{0}")]
    TrackingError(#[from] TrackingApiError),
    #[error("{0}")]
    RiderError(#[from] RiderApiError),
    #[error("{0}")]
    ShopOrderError(#[from] ShopOrderApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::TrackingError(e) => match e {
                TrackingApiError::NotFound(_) => StatusCode::NOT_FOUND,
                TrackingApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                TrackingApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TrackingApiError::InvalidState(_) |
                TrackingApiError::BatchNotReady { .. } |
                TrackingApiError::InvalidOtp |
                TrackingApiError::InvalidRider |
                TrackingApiError::InvalidDeliveryType |
                TrackingApiError::RiderUnavailable |
                TrackingApiError::AlreadyAssigned(_) |
                TrackingApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            },
            Self::RiderError(e) => match e {
                RiderApiError::EmailExists | RiderApiError::UnknownRider | RiderApiError::WrongPassword => {
                    StatusCode::UNAUTHORIZED
                },
                RiderApiError::OnAssignment => StatusCode::BAD_REQUEST,
                RiderApiError::NotFound | RiderApiError::NoHistory => StatusCode::NOT_FOUND,
                RiderApiError::DatabaseError(_) | RiderApiError::HashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::ShopOrderError(e) => match e {
                ShopOrderApiError::ShopNotFound | ShopOrderApiError::OrderNotFound => StatusCode::NOT_FOUND,
                ShopOrderApiError::OrderBundled | ShopOrderApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
                ShopOrderApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Batch validation failures carry the offending ids so the client can fix the batch.
        let body = match self {
            Self::TrackingError(TrackingApiError::BatchNotReady { invalid_ids }) => serde_json::json!({
                "success": false,
                "message": self.to_string(),
                "invalid_ids": invalid_ids,
            }),
            _ => serde_json::json!({ "success": false, "message": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}
