use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let rejection = if let Some(rejection) = err.find::<ApiRejection>() {
        rejection.clone()
    } else if err.is_not_found() {
        ApiRejection::new(ApiErrorCode::NotFound, "route not found")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiRejection::new(ApiErrorCode::ValidationError, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiRejection::new(ApiErrorCode::ValidationError, e.to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        ApiRejection::from(ApiErrorCode::InvalidToken)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiRejection::new(ApiErrorCode::NotFound, "route not found")
    } else {
        ApiRejection::new(
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
        )
    };

    let status = rejection.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::rejected(rejection));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_hours: Option<i64>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum ApiErrorCode {
    ValidationError,
    Unauthorized,
    NotFound,
    NotConnected,
    Blocked,
    ContentViolation,
    Cooldown,
    Conflict,
    DuplicateRequest,
    InvalidToken,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::ValidationError
            | ApiErrorCode::ContentViolation
            | ApiErrorCode::DuplicateRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthorized | ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotConnected | ApiErrorCode::Blocked => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::Cooldown => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidToken => "Token is not valid",
            ApiErrorCode::InternalError => "Internal error",
            _ => "Request failed",
        }
    }
}

/// Rejection carried from handlers to [`recover_error`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
    pub retry_after_hours: Option<i64>,
}

impl ApiRejection {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> ApiRejection {
        ApiRejection {
            code,
            message: message.into(),
            retry_after_hours: None,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiRejection {
        warn!("Internal error: {}", error);
        ApiRejection::from(ApiErrorCode::InternalError)
    }
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection::new(code, code.default_message())
    }
}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid | AuthError::TokenExpired => {
                ApiRejection::new(ApiErrorCode::InvalidToken, error.to_string())
            }
            AuthError::InternalError(e) => ApiRejection::internal(e),
        }
    }
}

impl From<ContactError> for ApiRejection {
    fn from(error: ContactError) -> Self {
        let code = match &error {
            ContactError::InvalidRequest(_) => ApiErrorCode::ValidationError,
            ContactError::PostNotFound | ContactError::NotFound => ApiErrorCode::NotFound,
            ContactError::DuplicateRequest => ApiErrorCode::DuplicateRequest,
            ContactError::Blocked => ApiErrorCode::Blocked,
            ContactError::Cooldown { remaining } => {
                return ApiRejection {
                    code: ApiErrorCode::Cooldown,
                    message: error.to_string(),
                    retry_after_hours: Some(remaining_hours(remaining)),
                };
            }
            ContactError::Unauthorized => ApiErrorCode::Unauthorized,
            ContactError::Conflict(_) => ApiErrorCode::Conflict,
            ContactError::Store(e) => return ApiRejection::internal(e),
        };
        ApiRejection::new(code, error.to_string())
    }
}

impl From<ChatError> for ApiRejection {
    fn from(error: ChatError) -> Self {
        let code = match &error {
            ChatError::Validation(_) => ApiErrorCode::ValidationError,
            ChatError::NotConnected => ApiErrorCode::NotConnected,
            ChatError::ContentViolation(_) => ApiErrorCode::ContentViolation,
            ChatError::Blocked => ApiErrorCode::Blocked,
            ChatError::ConversationNotFound => ApiErrorCode::NotFound,
            ChatError::NotParticipant => ApiErrorCode::Unauthorized,
            ChatError::Store(e) => return ApiRejection::internal(e),
        };
        ApiRejection::new(code, error.to_string())
    }
}

impl From<NotificationError> for ApiRejection {
    fn from(error: NotificationError) -> Self {
        let code = match &error {
            NotificationError::NotFound => ApiErrorCode::NotFound,
            NotificationError::Unauthorized => ApiErrorCode::Unauthorized,
            NotificationError::Store(e) => return ApiRejection::internal(e),
        };
        ApiRejection::new(code, error.to_string())
    }
}

impl From<UserError> for ApiRejection {
    fn from(error: UserError) -> Self {
        let code = match &error {
            UserError::UserNotFound => ApiErrorCode::NotFound,
            UserError::Validation(_) => ApiErrorCode::ValidationError,
            UserError::Store(e) => return ApiRejection::internal(e),
        };
        ApiRejection::new(code, error.to_string())
    }
}

impl From<FeedError> for ApiRejection {
    fn from(error: FeedError) -> Self {
        let code = match &error {
            FeedError::PostNotFound => ApiErrorCode::NotFound,
            FeedError::NotOwner => ApiErrorCode::Unauthorized,
            FeedError::Broadcast(e) | FeedError::Store(e) => return ApiRejection::internal(e),
        };
        ApiRejection::new(code, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cooldown_carries_remaining_hours() {
        let rejection = ApiRejection::from(ContactError::Cooldown {
            remaining: Duration::minutes(90),
        });
        assert_eq!(rejection.code, ApiErrorCode::Cooldown);
        assert_eq!(rejection.retry_after_hours, Some(1));
        assert_eq!(rejection.code.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn remaining_hours_floor_at_one() {
        let just_rejected = Duration::hours(24) - Duration::milliseconds(20);
        assert_eq!(remaining_hours(&just_rejected), 23);
        assert_eq!(remaining_hours(&Duration::minutes(10)), 1);
        assert_eq!(remaining_hours(&Duration::hours(5)), 5);
    }

    #[test]
    fn not_connected_is_distinct_from_unauthorized() {
        let not_connected = ApiRejection::from(ChatError::NotConnected);
        let outsider = ApiRejection::from(ChatError::NotParticipant);
        assert_eq!(not_connected.code, ApiErrorCode::NotConnected);
        assert_eq!(not_connected.code.status(), StatusCode::FORBIDDEN);
        assert_eq!(outsider.code.status(), StatusCode::UNAUTHORIZED);
    }
}
