use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lingo_common::{ErrorBody, ErrorKind};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Every way an operation can fail, one variant per kind so clients can
/// branch on the rejection instead of parsing a message. Domain checks
/// run before any write; `Internal` covers the store and everything
/// else infrastructural.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("all fields are required")]
    MissingFields(Vec<&'static str>),
    #[error("not found")]
    NotFound,
    #[error("you are not authorized to accept this request")]
    Forbidden,
    #[error("you can't send a friend request to yourself")]
    SelfRequest,
    #[error("you are already friends with this user")]
    AlreadyFriends,
    #[error("a friend request already exists between you and this user")]
    DuplicateRequest,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFields(_) => ErrorKind::MissingFields,
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::SelfRequest => ErrorKind::SelfRequest,
            Self::AlreadyFriends => ErrorKind::AlreadyFriends,
            Self::DuplicateRequest => ErrorKind::DuplicateRequest,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_)
            | Self::SelfRequest
            | Self::AlreadyFriends
            | Self::DuplicateRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Tell axum how to convert `ApiError` into a response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let missing_fields = match &self {
            Self::MissingFields(fields) => fields.iter().map(|f| f.to_string()).collect(),
            _ => Vec::new(),
        };
        let message = match &self {
            Self::Internal(error) => {
                tracing::error!("internal error: {error:#}");
                String::from("internal server error")
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
            missing_fields,
        };
        (self.status(), Json(body)).into_response()
    }
}
