use crate::ports::identity::IdentityError;
use crate::ports::store::StoreError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

/// Domain error taxonomy. Partial failures of best-effort fan-out are not
/// represented here: they are logged at the failure site and never surfaced
/// to the actor whose primary write succeeded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => Error::Validation("email is already registered".to_string()),
            IdentityError::InvalidCredentials => Error::Unauthorized("invalid email or password"),
            IdentityError::Backend(message) => Error::Store(StoreError::Backend(message)),
        }
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Error::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn status__should_map_taxonomy_to_http_codes() {
        // Then
        assert_eq!(Error::NotFound("diary").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Unauthorized("sign in first").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden("owners only").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::validation("empty content").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::Store(StoreError::Backend("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
