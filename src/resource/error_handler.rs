//! Presentation of resource failures.

use axum::http::StatusCode;
use url::Url;

use crate::pipeline::response::SchemeResponse;
use crate::resource::ResourceError;

pub const STATUS_TEXT_FILE_NOT_FOUND: &str = "File not found.";
pub const STATUS_TEXT_ZERO_FILE_SIZE: &str = "Resource loading error: file size is zero.";
pub const STATUS_TEXT_BAD_REQUEST: &str = "Resource loading error.";

/// Turns a resource failure into the response shown to the page.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, url: &Url, error: &ResourceError) -> SchemeResponse;
}

/// Short plain-text status responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle_error(&self, url: &Url, error: &ResourceError) -> SchemeResponse {
        match error {
            ResourceError::NotFound(_) => {
                tracing::warn!(url = %url, error = %error, "{}", STATUS_TEXT_FILE_NOT_FOUND);
                SchemeResponse::failure(StatusCode::NOT_FOUND, STATUS_TEXT_FILE_NOT_FOUND)
            }
            ResourceError::ZeroLength(_) => {
                tracing::warn!(url = %url, error = %error, "{}", STATUS_TEXT_ZERO_FILE_SIZE);
                SchemeResponse::failure(StatusCode::BAD_REQUEST, STATUS_TEXT_ZERO_FILE_SIZE)
            }
            ResourceError::BadRequest(_) => {
                tracing::warn!(url = %url, error = %error, "{}", STATUS_TEXT_BAD_REQUEST);
                SchemeResponse::failure(StatusCode::BAD_REQUEST, STATUS_TEXT_BAD_REQUEST)
            }
            ResourceError::Io { .. } => {
                tracing::error!(url = %url, error = %error, "{}", STATUS_TEXT_BAD_REQUEST);
                SchemeResponse::failure(StatusCode::BAD_REQUEST, STATUS_TEXT_BAD_REQUEST)
            }
        }
    }
}
