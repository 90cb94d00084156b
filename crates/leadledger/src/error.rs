//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadledger_core::Error;
use serde::Serialize;
use tracing::error;

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: &'static str,
    message: &'static str,
}

impl ApiError {
    /// Status code for the wrapped error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) | Error::MissingFields(_) | Error::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Send(_) => StatusCode::BAD_GATEWAY,
            Error::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match &self.0 {
            Error::Validation(errors) => ErrorBody {
                error: "Validation failed".to_string(),
                fields: errors
                    .iter()
                    .map(|e| FieldError {
                        field: e.field(),
                        message: e.message(),
                    })
                    .collect(),
            },
            Error::MissingFields(fields) => ErrorBody {
                error: self.0.to_string(),
                fields: fields
                    .iter()
                    .map(|&field| FieldError {
                        field,
                        message: "Required",
                    })
                    .collect(),
            },
            Error::Send(_) => ErrorBody {
                error: "Email could not be sent".to_string(),
                fields: Vec::new(),
            },
            Error::Database(_) => ErrorBody {
                error: "Service temporarily unavailable".to_string(),
                fields: Vec::new(),
            },
            Error::InvalidInput(_) | Error::Unauthorized | Error::NotFound(_) => ErrorBody {
                error: self.0.to_string(),
                fields: Vec::new(),
            },
            Error::InvalidRecord(_) => ErrorBody {
                error: "Internal error".to_string(),
                fields: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadledger_core::{EnquiryId, SendError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Validation(vec![ValidationError::InvalidEmail]), 400),
            (Error::MissingFields(vec!["subject"]), 400),
            (Error::InvalidInput("bad".to_string()), 400),
            (Error::Unauthorized, 401),
            (Error::NotFound(EnquiryId(4)), 404),
            (Error::Send(SendError::Transport("timeout".to_string())), 502),
            (Error::Database(sqlx_pool_closed()), 503),
            (Error::InvalidRecord("bad row".to_string()), 500),
        ];

        for (err, code) in cases {
            assert_eq!(ApiError(err).status().as_u16(), code);
        }
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let err = ApiError(Error::Validation(vec![
            ValidationError::EmptyFirstName,
            ValidationError::MessageTooShort,
        ]));
        let body = err.body();

        assert_eq!(body.fields.len(), 2);
        assert_eq!(body.fields[0].field, "firstName");
        assert_eq!(body.fields[1].field, "message");
    }

    #[test]
    fn test_internal_details_hidden() {
        let body = ApiError(Error::InvalidRecord("row 7: bad timestamp".to_string())).body();
        assert_eq!(body.error, "Internal error");
    }

    fn sqlx_pool_closed() -> sqlx::Error {
        sqlx::Error::PoolClosed
    }
}
